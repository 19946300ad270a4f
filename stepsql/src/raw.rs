//!
//! Raw SQLite handles.
//!
//! `RawConnection` and `RawStatement` own the `sqlite3*` and
//! `sqlite3_stmt*` pointers and turn every status code into a `Result`.
//! Everything above this module is safe code.
//!
//! A statement keeps an `Rc` to its connection, so the connection is only
//! closed once every statement compiled from it has been finalized. Both
//! types are `!Send` and `!Sync`; a connection is driven by one thread.
//!

use std::cell::Cell;
use std::ffi::{c_char, c_int, c_void, CStr, CString};
use std::mem::ManuallyDrop;
use std::ptr::{self, NonNull};
use std::rc::Rc;

use rusqlite::ffi;
use tracing::{debug, trace, warn};

use crate::errors::{ContractViolation, Error, Result};
use crate::kind::Kind;

pub(crate) struct RawConnection {
    db: NonNull<ffi::sqlite3>,
    path: String,
}

impl RawConnection {
    pub(crate) fn open(path: &str, flags: c_int) -> Result<Self> {
        let c_path = CString::new(path).map_err(|_| Error::InteriorNul { what: "path" })?;
        let mut db: *mut ffi::sqlite3 = ptr::null_mut();
        let rc = unsafe { ffi::sqlite3_open_v2(c_path.as_ptr(), &mut db, flags, ptr::null()) };

        if rc != ffi::SQLITE_OK {
            let (code, message) = if db.is_null() {
                (rc, errstr(rc))
            } else {
                let failure = unsafe { (ffi::sqlite3_extended_errcode(db), errmsg(db)) };
                unsafe { ffi::sqlite3_close(db) };
                failure
            };
            return Err(Error::Connection {
                path: path.to_string(),
                code,
                message,
            });
        }

        let db = NonNull::new(db).ok_or_else(|| Error::Connection {
            path: path.to_string(),
            code: ffi::SQLITE_CANTOPEN,
            message: "engine returned no connection handle".to_string(),
        })?;
        debug!(path, "opened database");
        Ok(Self {
            db,
            path: path.to_string(),
        })
    }

    pub(crate) fn path(&self) -> &str {
        &self.path
    }

    pub(crate) fn set_busy_timeout(&self, millis: u32) -> Result<()> {
        let millis = c_int::try_from(millis).unwrap_or(c_int::MAX);
        let rc = unsafe { ffi::sqlite3_busy_timeout(self.db.as_ptr(), millis) };
        if rc != ffi::SQLITE_OK {
            let (code, message) = self.last_error();
            return Err(Error::Connection {
                path: self.path.clone(),
                code,
                message,
            });
        }
        Ok(())
    }

    pub(crate) fn changes(&self) -> u64 {
        let changes = unsafe { ffi::sqlite3_changes(self.db.as_ptr()) };
        u64::try_from(changes).unwrap_or(0)
    }

    pub(crate) fn last_insert_rowid(&self) -> i64 {
        unsafe { ffi::sqlite3_last_insert_rowid(self.db.as_ptr()) }
    }

    /// Extended result code and message of the most recent failed call.
    fn last_error(&self) -> (i32, String) {
        unsafe {
            (
                ffi::sqlite3_extended_errcode(self.db.as_ptr()),
                errmsg(self.db.as_ptr()),
            )
        }
    }

    /// Closes the connection, reporting a failure instead of logging it.
    pub(crate) fn close(self) -> Result<()> {
        let mut this = ManuallyDrop::new(self);
        let path = std::mem::take(&mut this.path);
        let rc = unsafe { ffi::sqlite3_close(this.db.as_ptr()) };
        if rc != ffi::SQLITE_OK {
            let message = unsafe { errmsg(this.db.as_ptr()) };
            // Hand the handle to the engine so it is released once it can be.
            unsafe { ffi::sqlite3_close_v2(this.db.as_ptr()) };
            return Err(Error::Close { code: rc, message });
        }
        debug!(path = %path, "closed database");
        Ok(())
    }
}

impl Drop for RawConnection {
    fn drop(&mut self) {
        let rc = unsafe { ffi::sqlite3_close(self.db.as_ptr()) };
        if rc != ffi::SQLITE_OK {
            let message = unsafe { errmsg(self.db.as_ptr()) };
            warn!(path = %self.path, code = rc, %message, "failed to close database");
            unsafe { ffi::sqlite3_close_v2(self.db.as_ptr()) };
        } else {
            debug!(path = %self.path, "closed database");
        }
    }
}

/// Where a compiled statement is in its current pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StepState {
    Fresh,
    Row,
    Done,
    Failed,
}

pub(crate) struct RawStatement {
    stmt: NonNull<ffi::sqlite3_stmt>,
    conn: Rc<RawConnection>,
    sql: String,
    state: Cell<StepState>,
}

impl RawStatement {
    /// Compiles the single statement `sql` starts with.
    pub(crate) fn prepare(conn: &Rc<RawConnection>, sql: &str) -> Result<Self> {
        match Self::compile(conn, sql)? {
            (Some(stmt), _) => Ok(stmt),
            (None, _) => Err(Error::EmptyQuery),
        }
    }

    /// Compiles the first statement of `sql`, returning it (if the text held
    /// one) together with the number of bytes consumed.
    pub(crate) fn compile(conn: &Rc<RawConnection>, sql: &str) -> Result<(Option<Self>, usize)> {
        if sql.contains('\0') {
            return Err(Error::InteriorNul { what: "query" });
        }
        let len = c_int::try_from(sql.len()).map_err(|_| Error::Prepare {
            sql: truncate_sql(sql),
            code: ffi::SQLITE_TOOBIG,
            message: "query text is too long".to_string(),
        })?;

        let mut stmt: *mut ffi::sqlite3_stmt = ptr::null_mut();
        let mut tail: *const c_char = ptr::null();
        let rc = unsafe {
            ffi::sqlite3_prepare_v2(
                conn.db.as_ptr(),
                sql.as_ptr() as *const c_char,
                len,
                &mut stmt,
                &mut tail,
            )
        };
        if rc != ffi::SQLITE_OK {
            let (code, message) = conn.last_error();
            return Err(Error::Prepare {
                sql: truncate_sql(sql),
                code,
                message,
            });
        }

        let consumed = if tail.is_null() {
            sql.len()
        } else {
            (tail as usize).saturating_sub(sql.as_ptr() as usize).min(sql.len())
        };

        let compiled = NonNull::new(stmt).map(|stmt| {
            let text = sql.get(..consumed).unwrap_or(sql).trim().to_string();
            debug!(sql = %text, "prepared statement");
            Self {
                stmt,
                conn: Rc::clone(conn),
                sql: text,
                state: Cell::new(StepState::Fresh),
            }
        });
        Ok((compiled, consumed))
    }

    pub(crate) fn sql(&self) -> &str {
        &self.sql
    }

    pub(crate) fn state(&self) -> StepState {
        self.state.get()
    }

    pub(crate) fn parameter_count(&self) -> usize {
        let count = unsafe { ffi::sqlite3_bind_parameter_count(self.stmt.as_ptr()) };
        usize::try_from(count).unwrap_or(0)
    }

    pub(crate) fn column_count(&self) -> usize {
        let count = unsafe { ffi::sqlite3_column_count(self.stmt.as_ptr()) };
        usize::try_from(count).unwrap_or(0)
    }

    /// Rewinds to the start of the result set and clears every binding.
    pub(crate) fn reset(&self) -> Result<()> {
        let rc = unsafe { ffi::sqlite3_reset(self.stmt.as_ptr()) };
        // After a failed step, reset repeats the error that step already reported.
        if rc != ffi::SQLITE_OK && self.state.get() != StepState::Failed {
            let (code, message) = self.conn.last_error();
            return Err(Error::Step { code, message });
        }
        let rc = unsafe { ffi::sqlite3_clear_bindings(self.stmt.as_ptr()) };
        if rc != ffi::SQLITE_OK {
            return Err(Error::Bind {
                index: 0,
                code: rc,
                message: errstr(rc),
            });
        }
        self.state.set(StepState::Fresh);
        Ok(())
    }

    /// Advances one row. `Ok(true)` means a row is available.
    pub(crate) fn step(&self) -> Result<bool> {
        if self.state.get() == StepState::Done {
            return Err(ContractViolation::StepAfterExhaustion.into());
        }
        let rc = unsafe { ffi::sqlite3_step(self.stmt.as_ptr()) };
        match rc {
            ffi::SQLITE_ROW => {
                self.state.set(StepState::Row);
                Ok(true)
            }
            ffi::SQLITE_DONE => {
                self.state.set(StepState::Done);
                trace!(sql = %self.sql, "statement done");
                Ok(false)
            }
            _ => {
                self.state.set(StepState::Failed);
                let (code, message) = self.conn.last_error();
                Err(Error::Step { code, message })
            }
        }
    }

    pub(crate) fn bind_i64(&self, index: usize, value: i64) -> Result<()> {
        let rc = unsafe { ffi::sqlite3_bind_int64(self.stmt.as_ptr(), param_index(index)?, value) };
        check_bind(index, rc)
    }

    pub(crate) fn bind_f64(&self, index: usize, value: f64) -> Result<()> {
        let rc = unsafe { ffi::sqlite3_bind_double(self.stmt.as_ptr(), param_index(index)?, value) };
        check_bind(index, rc)
    }

    pub(crate) fn bind_null(&self, index: usize) -> Result<()> {
        let rc = unsafe { ffi::sqlite3_bind_null(self.stmt.as_ptr(), param_index(index)?) };
        check_bind(index, rc)
    }

    /// Binds text; the engine copies the bytes before returning.
    pub(crate) fn bind_text(&self, index: usize, value: &str) -> Result<()> {
        let len = byte_len(index, value.len())?;
        let rc = unsafe {
            ffi::sqlite3_bind_text(
                self.stmt.as_ptr(),
                param_index(index)?,
                value.as_ptr() as *const c_char,
                len,
                ffi::SQLITE_TRANSIENT(),
            )
        };
        check_bind(index, rc)
    }

    /// Binds a blob; the engine copies the bytes before returning.
    pub(crate) fn bind_blob(&self, index: usize, value: &[u8]) -> Result<()> {
        let len = byte_len(index, value.len())?;
        let rc = unsafe {
            ffi::sqlite3_bind_blob(
                self.stmt.as_ptr(),
                param_index(index)?,
                value.as_ptr() as *const c_void,
                len,
                ffi::SQLITE_TRANSIENT(),
            )
        };
        check_bind(index, rc)
    }

    pub(crate) fn column_i64(&self, col: usize) -> i64 {
        unsafe { ffi::sqlite3_column_int64(self.stmt.as_ptr(), col as c_int) }
    }

    pub(crate) fn column_f64(&self, col: usize) -> f64 {
        unsafe { ffi::sqlite3_column_double(self.stmt.as_ptr(), col as c_int) }
    }

    /// Copies exactly `sqlite3_column_bytes` bytes of the column's text.
    pub(crate) fn column_text(&self, col: usize) -> Vec<u8> {
        unsafe {
            let data = ffi::sqlite3_column_text(self.stmt.as_ptr(), col as c_int);
            let len = ffi::sqlite3_column_bytes(self.stmt.as_ptr(), col as c_int);
            copy_bytes(data as *const u8, len)
        }
    }

    /// Copies exactly `sqlite3_column_bytes` bytes of the column's blob.
    pub(crate) fn column_blob(&self, col: usize) -> Vec<u8> {
        unsafe {
            let data = ffi::sqlite3_column_blob(self.stmt.as_ptr(), col as c_int);
            let len = ffi::sqlite3_column_bytes(self.stmt.as_ptr(), col as c_int);
            copy_bytes(data as *const u8, len)
        }
    }

    pub(crate) fn column_kind(&self, col: usize) -> Kind {
        let code = unsafe { ffi::sqlite3_column_type(self.stmt.as_ptr(), col as c_int) };
        Kind::from_storage_class(code)
    }

    pub(crate) fn column_decltype(&self, col: usize) -> Option<String> {
        unsafe { owned_str(ffi::sqlite3_column_decltype(self.stmt.as_ptr(), col as c_int)) }
    }

    pub(crate) fn column_name(&self, col: usize) -> Option<String> {
        unsafe { owned_str(ffi::sqlite3_column_name(self.stmt.as_ptr(), col as c_int)) }
    }

    /// Finalizes the statement, reporting a failure instead of logging it.
    pub(crate) fn finalize(self) -> Result<()> {
        let mut this = ManuallyDrop::new(self);
        let rc = unsafe { ffi::sqlite3_finalize(this.stmt.as_ptr()) };
        let result = if rc != ffi::SQLITE_OK && this.state.get() != StepState::Failed {
            let (code, message) = this.conn.last_error();
            Err(Error::Finalize { code, message })
        } else {
            Ok(())
        };
        let sql = std::mem::take(&mut this.sql);
        debug!(%sql, "finalized statement");
        // The statement is gone; release the connection reference it held.
        drop(unsafe { ptr::read(&this.conn) });
        result
    }
}

impl Drop for RawStatement {
    fn drop(&mut self) {
        let rc = unsafe { ffi::sqlite3_finalize(self.stmt.as_ptr()) };
        if rc != ffi::SQLITE_OK && self.state.get() != StepState::Failed {
            let (code, message) = self.conn.last_error();
            warn!(sql = %self.sql, code, %message, "failed to finalize statement");
        } else {
            debug!(sql = %self.sql, "finalized statement");
        }
    }
}

fn param_index(index: usize) -> Result<c_int> {
    c_int::try_from(index).map_err(|_| Error::Bind {
        index,
        code: ffi::SQLITE_RANGE,
        message: errstr(ffi::SQLITE_RANGE),
    })
}

fn byte_len(index: usize, len: usize) -> Result<c_int> {
    c_int::try_from(len).map_err(|_| Error::Bind {
        index,
        code: ffi::SQLITE_TOOBIG,
        message: errstr(ffi::SQLITE_TOOBIG),
    })
}

fn check_bind(index: usize, rc: c_int) -> Result<()> {
    if rc == ffi::SQLITE_OK {
        trace!(index, "bound parameter");
        Ok(())
    } else {
        Err(Error::Bind {
            index,
            code: rc,
            message: errstr(rc),
        })
    }
}

fn truncate_sql(sql: &str) -> String {
    const MAX: usize = 200;
    let sql = sql.trim();
    match sql.char_indices().nth(MAX) {
        Some((cut, _)) => format!("{}...", &sql[..cut]),
        None => sql.to_string(),
    }
}

unsafe fn copy_bytes(data: *const u8, len: c_int) -> Vec<u8> {
    let len = usize::try_from(len).unwrap_or(0);
    if data.is_null() || len == 0 {
        return Vec::new();
    }
    unsafe { std::slice::from_raw_parts(data, len) }.to_vec()
}

unsafe fn owned_str(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    Some(unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned())
}

unsafe fn errmsg(db: *mut ffi::sqlite3) -> String {
    unsafe { owned_str(ffi::sqlite3_errmsg(db)) }.unwrap_or_default()
}

fn errstr(rc: c_int) -> String {
    unsafe { owned_str(ffi::sqlite3_errstr(rc)) }.unwrap_or_else(|| format!("error code {}", rc))
}
