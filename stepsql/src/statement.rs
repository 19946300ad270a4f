//!
//! Prepared statements.
//!
//! A `Statement<R>` owns one compiled query whose rows decode as `R`.
//! `Statement<()>` is a statement without a result type and only offers
//! `execute`. Every execution starts with `bind`, which resets the compiled
//! statement, clears previous bindings and writes the new arguments, so a
//! statement can be reused any number of times:
//!
//! ```rust,ignore
//! let mut older = db.prepare::<String>("SELECT name FROM people WHERE age > ?")?;
//! let names = older.query(10)?;
//! let fewer = older.query(20)?;
//! ```
//!
//! State of the compiled statement: fresh after `bind`, on a row while
//! stepping, done once a step reports no more rows. Done is terminal until
//! the next `bind`. The scalar fetches (`execute_value`, `execute_optional`)
//! stop after the first row and leave the statement fresh again.
//!

use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

use tracing::trace;

use crate::cursor::Cursor;
use crate::errors::{ContractViolation, Error, Result};
use crate::raw::{RawConnection, RawStatement, StepState};
use crate::row::Binder;
use crate::typed_row::{FromRow, Params};

pub struct Statement<R = ()> {
    raw: RawStatement,
    _row: PhantomData<fn() -> R>,
}

impl<R> Statement<R> {
    pub(crate) fn prepare(conn: &Rc<RawConnection>, sql: &str) -> Result<Self> {
        let raw = RawStatement::prepare(conn, sql)?;
        Ok(Self {
            raw,
            _row: PhantomData,
        })
    }

    /// Resets the statement and binds `params` to placeholders `1..=n`.
    pub fn bind<P: Params>(&mut self, params: P) -> Result<&mut Self> {
        self.raw.reset()?;

        let expected = self.raw.parameter_count();
        let given = params.param_count();
        if expected != given {
            return Err(Error::ParameterCount { expected, given });
        }
        params.bind_params(&Binder::new(&self.raw))?;
        trace!(sql = %self.raw.sql(), params = given, "bound statement");
        Ok(self)
    }

    pub fn sql(&self) -> &str {
        self.raw.sql()
    }

    pub fn parameter_count(&self) -> usize {
        self.raw.parameter_count()
    }

    pub fn column_count(&self) -> usize {
        self.raw.column_count()
    }

    /// True once the current pass has stepped past the last row.
    pub fn is_exhausted(&self) -> bool {
        self.raw.state() == StepState::Done
    }

    /// Finalizes the compiled statement now, surfacing any failure.
    /// Dropping a statement finalizes it too, but can only log a failure.
    pub fn finalize(self) -> Result<()> {
        self.raw.finalize()
    }
}

impl Statement<()> {
    /// Binds `params` and runs the statement, which must not produce a row.
    pub fn execute<P: Params>(&mut self, params: P) -> Result<()> {
        self.bind(params)?;
        if self.raw.step()? {
            return Err(ContractViolation::UnexpectedRow.into());
        }
        Ok(())
    }
}

impl<R: FromRow> Statement<R> {
    /// Binds `params` and collects every row.
    pub fn query<P: Params>(&mut self, params: P) -> Result<Vec<R>> {
        self.execute_cursor(params)?.collect()
    }

    /// Binds `params` and decodes the first row; `Error::NotFound` if there is none.
    pub fn execute_value<P: Params>(&mut self, params: P) -> Result<R> {
        self.execute_optional(params)?.ok_or(Error::NotFound)
    }

    /// Binds `params` and decodes the first row, if any.
    ///
    /// The statement is reset before returning, so a kept statement does
    /// not hold the read transaction of an unfinished pass.
    pub fn execute_optional<P: Params>(&mut self, params: P) -> Result<Option<R>> {
        let first = self.execute_cursor(params)?.next().transpose();
        self.raw.reset()?;
        first
    }

    /// Binds `params` and returns a cursor over the rows. Nothing is stepped yet.
    pub fn execute_cursor<P: Params>(&mut self, params: P) -> Result<Cursor<'_, R>> {
        self.bind(params)?;
        self.check_shape()?;
        Ok(Cursor::borrowed(&self.raw))
    }

    /// Like `execute_cursor`, but the cursor takes over the compiled statement.
    pub fn into_cursor<P: Params>(mut self, params: P) -> Result<Cursor<'static, R>> {
        self.bind(params)?;
        self.check_shape()?;
        Ok(Cursor::owned(self.raw))
    }

    fn check_shape(&self) -> Result<()> {
        if let Some(arity) = R::ARITY {
            let actual = self.raw.column_count();
            if arity != actual {
                return Err(Error::ColumnCount {
                    expected: R::kinds(),
                    actual,
                });
            }
        }
        Ok(())
    }
}

impl<R> fmt::Debug for Statement<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Statement")
            .field("sql", &self.raw.sql())
            .field("state", &self.raw.state())
            .finish()
    }
}
