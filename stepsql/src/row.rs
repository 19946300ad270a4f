//!
//! Row and parameter accessors.
//!
//! `Row` reads the columns of the row a statement is positioned on
//! (0-based column indices). `Binder` writes parameters (1-based
//! placeholder indices, as the engine numbers them). Both borrow the
//! compiled statement for the duration of one read or one bind call.
//!

use crate::errors::{Error, Result};
use crate::kind::Kind;
use crate::raw::RawStatement;

/// The current row of an executing statement.
pub struct Row<'a> {
    raw: &'a RawStatement,
}

impl<'a> Row<'a> {
    pub(crate) fn new(raw: &'a RawStatement) -> Self {
        Self { raw }
    }

    pub fn column_count(&self) -> usize {
        self.raw.column_count()
    }

    pub fn column_name(&self, index: usize) -> Result<Option<String>> {
        self.check_index(index)?;
        Ok(self.raw.column_name(index))
    }

    /// The type name the column was declared with, if it maps to a table column.
    pub fn declared_type(&self, index: usize) -> Result<Option<String>> {
        self.check_index(index)?;
        Ok(self.raw.column_decltype(index))
    }

    /// The storage class of the value actually held in this row.
    pub fn storage_kind(&self, index: usize) -> Result<Kind> {
        self.check_index(index)?;
        Ok(self.raw.column_kind(index))
    }

    pub fn is_null(&self, index: usize) -> Result<bool> {
        Ok(self.storage_kind(index)? == Kind::Null)
    }

    pub fn read_integer(&self, index: usize) -> Result<i64> {
        self.check_index(index)?;
        Ok(self.raw.column_i64(index))
    }

    pub fn read_float(&self, index: usize) -> Result<f64> {
        self.check_index(index)?;
        Ok(self.raw.column_f64(index))
    }

    /// Text bytes are not validated; invalid UTF-8 is replaced.
    pub fn read_text(&self, index: usize) -> Result<String> {
        self.check_index(index)?;
        let bytes = self.raw.column_text(index);
        Ok(match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(err) => String::from_utf8_lossy(err.as_bytes()).into_owned(),
        })
    }

    pub fn read_blob(&self, index: usize) -> Result<Vec<u8>> {
        self.check_index(index)?;
        Ok(self.raw.column_blob(index))
    }

    fn check_index(&self, index: usize) -> Result<()> {
        let count = self.raw.column_count();
        if index >= count {
            return Err(Error::ColumnIndex { index, count });
        }
        Ok(())
    }
}

/// Writes parameters of a statement that has just been reset.
pub struct Binder<'a> {
    raw: &'a RawStatement,
}

impl<'a> Binder<'a> {
    pub(crate) fn new(raw: &'a RawStatement) -> Self {
        Self { raw }
    }

    pub fn parameter_count(&self) -> usize {
        self.raw.parameter_count()
    }

    pub fn bind_integer(&self, index: usize, value: i64) -> Result<()> {
        self.raw.bind_i64(index, value)
    }

    pub fn bind_float(&self, index: usize, value: f64) -> Result<()> {
        self.raw.bind_f64(index, value)
    }

    pub fn bind_text(&self, index: usize, value: &str) -> Result<()> {
        self.raw.bind_text(index, value)
    }

    pub fn bind_blob(&self, index: usize, value: &[u8]) -> Result<()> {
        self.raw.bind_blob(index, value)
    }

    pub fn bind_null(&self, index: usize) -> Result<()> {
        self.raw.bind_null(index)
    }
}
