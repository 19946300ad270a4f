//!
//! Database connections.
//!
//! `Database` owns one SQLite connection. Opening never fails loudly: a
//! database that could not be opened is returned in the closed state and
//! `is_open()` reports it (use `try_open_with` to get the reason instead).
//! Every operation on a closed database returns `Error::NotOpen`.
//!
//! Besides `prepare`, the one-shot helpers (`execute`, `query`,
//! `execute_value`, `execute_cursor`) compile a statement, bind, run it and
//! drop it again.
//!
//! Arguments for the one-shot helpers come either from the call itself or
//! from values queued with `bind`, never both:
//!
//! ```rust,ignore
//! let name: String = db.bind("john").bind(10).execute_value(
//!     "SELECT name FROM people WHERE name = ? AND age = ?",
//!     (),
//! )?;
//! ```
//!
//! The queue is emptied by the next one-shot call, whether it succeeds or not.
//!

use std::cell::RefCell;
use std::fmt;
use std::path::Path;
use std::rc::Rc;

use tracing::debug;

use crate::config::DatabaseConfig;
use crate::cursor::Cursor;
use crate::errors::{ContractViolation, Error, Result};
use crate::raw::{RawConnection, RawStatement};
use crate::row::Binder;
use crate::statement::Statement;
use crate::typed_row::{FromRow, Params};
use crate::value::Value;

pub struct Database {
    conn: Option<Rc<RawConnection>>,
    pending: RefCell<Vec<Value>>,
}

impl Database {
    /// Opens (creating if needed) the database file at `path`.
    pub fn open(path: impl AsRef<Path>) -> Self {
        Self::open_with(&DatabaseConfig::new(path.as_ref()))
    }

    pub fn open_in_memory() -> Self {
        Self::open_with(&DatabaseConfig::in_memory())
    }

    /// Opens with `config`; on failure the database is returned closed.
    pub fn open_with(config: &DatabaseConfig) -> Self {
        match Self::try_open_with(config) {
            Ok(db) => db,
            Err(err) => {
                debug!(error = %err, "database left closed");
                Self::closed()
            }
        }
    }

    pub fn try_open_with(config: &DatabaseConfig) -> Result<Self> {
        let conn = RawConnection::open(&config.path_str(), config.open_flags())?;
        if let Some(millis) = config.busy_timeout_ms {
            conn.set_busy_timeout(millis)?;
        }
        Ok(Self {
            conn: Some(Rc::new(conn)),
            pending: RefCell::new(Vec::new()),
        })
    }

    fn closed() -> Self {
        Self {
            conn: None,
            pending: RefCell::new(Vec::new()),
        }
    }

    pub fn is_open(&self) -> bool {
        self.conn.is_some()
    }

    pub fn path(&self) -> Option<&str> {
        self.conn.as_deref().map(RawConnection::path)
    }

    /// Closes the connection. Closing a closed database does nothing.
    ///
    /// Statements and cursors still alive keep the connection open until
    /// they are dropped; the database itself reports closed right away.
    pub fn close(&mut self) -> Result<()> {
        self.pending.borrow_mut().clear();
        match self.conn.take() {
            Some(conn) => match Rc::try_unwrap(conn) {
                Ok(conn) => conn.close(),
                Err(_) => Ok(()),
            },
            None => Ok(()),
        }
    }

    /// Compiles `sql` into a statement whose rows decode as `R`.
    /// Use `R = ()` for a statement without a result.
    pub fn prepare<R>(&self, sql: &str) -> Result<Statement<R>> {
        Statement::prepare(self.connection()?, sql)
    }

    /// Queues one value for the next one-shot call.
    pub fn bind(&self, value: impl Into<Value>) -> &Self {
        self.pending.borrow_mut().push(value.into());
        self
    }

    /// Queues several values for the next one-shot call.
    pub fn bind_all<I>(&self, values: I) -> &Self
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        self.pending
            .borrow_mut()
            .extend(values.into_iter().map(Into::into));
        self
    }

    /// Runs a statement without a result type.
    pub fn execute<P: Params>(&self, sql: &str, params: P) -> Result<()> {
        let params = self.one_shot_params(params)?;
        self.prepare::<()>(sql)?.execute(params)
    }

    /// Runs a query and collects every row.
    pub fn query<R: FromRow, P: Params>(&self, sql: &str, params: P) -> Result<Vec<R>> {
        let params = self.one_shot_params(params)?;
        self.prepare::<R>(sql)?.query(params)
    }

    /// Runs a query and decodes its first row; `Error::NotFound` if there is none.
    pub fn execute_value<R: FromRow, P: Params>(&self, sql: &str, params: P) -> Result<R> {
        let params = self.one_shot_params(params)?;
        self.prepare::<R>(sql)?.execute_value(params)
    }

    pub fn execute_optional<R: FromRow, P: Params>(
        &self,
        sql: &str,
        params: P,
    ) -> Result<Option<R>> {
        let params = self.one_shot_params(params)?;
        self.prepare::<R>(sql)?.execute_optional(params)
    }

    /// Runs a query and returns a cursor that owns the compiled statement.
    pub fn execute_cursor<R: FromRow, P: Params>(
        &self,
        sql: &str,
        params: P,
    ) -> Result<Cursor<'static, R>> {
        let params = self.one_shot_params(params)?;
        self.prepare::<R>(sql)?.into_cursor(params)
    }

    /// Untyped `query`: each row is one `Value` per column.
    pub fn query_dynamic<P: Params>(&self, sql: &str, params: P) -> Result<Vec<Vec<Value>>> {
        self.query::<Vec<Value>, P>(sql, params)
    }

    /// Untyped `execute_value`: the first column of the first row.
    pub fn query_value_dynamic<P: Params>(&self, sql: &str, params: P) -> Result<Value> {
        self.execute_value::<Value, P>(sql, params)
    }

    /// Runs every statement in `sql`, discarding any rows they produce.
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        self.pending.borrow_mut().clear();
        let conn = self.connection()?;
        let mut remaining = sql;
        loop {
            let (stmt, consumed) = RawStatement::compile(conn, remaining)?;
            if let Some(stmt) = stmt {
                while stmt.step()? {}
                stmt.finalize()?;
            }
            remaining = remaining.get(consumed..).unwrap_or("");
            if consumed == 0 || remaining.trim().is_empty() {
                return Ok(());
            }
        }
    }

    /// Rows changed by the most recent INSERT, UPDATE or DELETE.
    pub fn changes(&self) -> Result<u64> {
        Ok(self.connection()?.changes())
    }

    pub fn last_insert_rowid(&self) -> Result<i64> {
        Ok(self.connection()?.last_insert_rowid())
    }

    fn connection(&self) -> Result<&Rc<RawConnection>> {
        self.conn.as_ref().ok_or(Error::NotOpen)
    }

    fn one_shot_params<P: Params>(&self, params: P) -> Result<OneShotParams<P>> {
        let queued = self.pending.take();
        if queued.is_empty() {
            return Ok(OneShotParams::Typed(params));
        }
        if params.param_count() > 0 {
            return Err(ContractViolation::MixedBinding.into());
        }
        Ok(OneShotParams::Queued(queued))
    }
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("path", &self.path())
            .field("pending", &self.pending.borrow().len())
            .finish()
    }
}

enum OneShotParams<P> {
    Typed(P),
    Queued(Vec<Value>),
}

impl<P: Params> Params for OneShotParams<P> {
    fn param_count(&self) -> usize {
        match self {
            OneShotParams::Typed(params) => params.param_count(),
            OneShotParams::Queued(values) => values.len(),
        }
    }

    fn bind_params(&self, binder: &Binder<'_>) -> Result<()> {
        match self {
            OneShotParams::Typed(params) => params.bind_params(binder),
            OneShotParams::Queued(values) => values.bind_params(binder),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;

    #[test]
    fn test_open_failure_leaves_database_closed() {
        let config = DatabaseConfig::new("/nonexistent/dir/test.db").read_only(true);
        let db = Database::open_with(&config);
        assert!(!db.is_open());

        let err = db.execute("SELECT 1", ()).expect_err("Closed database must fail");
        assert!(matches!(err, Error::NotOpen));
        assert_eq!(err.kind(), ErrorKind::Connection);

        let err = Database::try_open_with(&config).expect_err("Open must fail");
        assert!(matches!(err, Error::Connection { .. }));
    }

    #[test]
    fn test_close_is_idempotent() {
        let mut db = Database::open_in_memory();
        assert!(db.is_open());
        db.close().expect("Failed to close");
        assert!(!db.is_open());
        db.close().expect("Closing twice must be a no-op");
        assert!(matches!(db.prepare::<i64>("SELECT 1"), Err(Error::NotOpen)));
    }

    #[test]
    fn test_statement_keeps_connection_alive() {
        let mut db = Database::open_in_memory();
        let mut stmt = db.prepare::<i64>("SELECT 42").expect("Failed to prepare");
        db.close().expect("Failed to close");

        assert!(!db.is_open());
        assert_eq!(stmt.execute_value(()).expect("Failed to query"), 42);
    }

    #[test]
    fn test_queued_values_feed_next_call_only() {
        let db = Database::open_in_memory();
        let sum: i64 = db
            .bind(2)
            .bind(3)
            .execute_value("SELECT ? + ?", ())
            .expect("Failed to query");
        assert_eq!(sum, 5);

        let err = db
            .execute_value::<i64, _>("SELECT ? + ?", ())
            .expect_err("Queue must be empty after the previous call");
        assert!(matches!(err, Error::ParameterCount { expected: 2, given: 0 }));
    }

    #[test]
    fn test_queued_values_and_typed_arguments_do_not_mix() {
        let db = Database::open_in_memory();
        let err = db
            .bind(1)
            .execute_value::<i64, _>("SELECT ?", 2)
            .expect_err("Mixed binding must fail");
        assert!(matches!(
            err,
            Error::Contract(ContractViolation::MixedBinding)
        ));

        let value: i64 = db.execute_value("SELECT ?", 2).expect("Failed to query");
        assert_eq!(value, 2);
    }

    #[test]
    fn test_execute_batch_and_counters() {
        let db = Database::open_in_memory();
        db.execute_batch(
            "-- schema
             CREATE TABLE t (x INTEGER);
             INSERT INTO t VALUES (1);
             INSERT INTO t VALUES (2);
             SELECT x FROM t;",
        )
        .expect("Failed to run batch");

        db.execute("UPDATE t SET x = x + 1", ()).expect("Failed to update");
        assert_eq!(db.changes().expect("Failed to count changes"), 2);

        db.execute("INSERT INTO t VALUES (?)", 9).expect("Failed to insert");
        assert_eq!(db.last_insert_rowid().expect("Failed to read rowid"), 3);
    }

    #[test]
    fn test_prepare_errors() {
        let db = Database::open_in_memory();
        let err = db.prepare::<i64>("SELEC 1").expect_err("Syntax error");
        assert_eq!(err.kind(), ErrorKind::Prepare);
        assert!(err.engine_code().is_some());

        let err = db.prepare::<i64>("   ").expect_err("Nothing to compile");
        assert!(matches!(err, Error::EmptyQuery));

        let err = db.prepare::<i64>("SELECT 1\0").expect_err("Interior NUL");
        assert_eq!(err.kind(), ErrorKind::Conversion);

        let err = db
            .execute("INSERT INTO missing VALUES (1)", ())
            .expect_err("Unknown table");
        assert_eq!(err.kind(), ErrorKind::Prepare);
    }

    #[test]
    fn test_step_error_surfaces() {
        let db = Database::open_in_memory();
        db.execute_batch("CREATE TABLE u (x INTEGER UNIQUE); INSERT INTO u VALUES (1);")
            .expect("Failed to create table");

        let mut insert: Statement = db
            .prepare("INSERT INTO u VALUES (?)")
            .expect("Failed to prepare");
        let err = insert.execute(1).expect_err("Constraint violation");
        assert_eq!(err.kind(), ErrorKind::Step);

        // The statement stays usable after a failed step.
        insert.execute(2).expect("Failed to insert after a failure");
    }
}
