//!
//! Column codecs.
//!
//! `FromColumn` reads one column of the current row into a Rust type and
//! `ToParam` writes one Rust value into a placeholder. The implementations
//! below are the whole static dispatch table:
//!
//! | Rust type              | Kind    | read                 | write          |
//! |------------------------|---------|----------------------|----------------|
//! | `i64`, `i32`           | Integer | `column_int64`       | `bind_int64`   |
//! | `f64`                  | Float   | `column_double`      | `bind_double`  |
//! | `String` / `str`       | Text    | `column_text` + len  | `bind_text`    |
//! | `Vec<u8>` / `[u8]`     | Blob    | `column_blob` + len  | `bind_blob`    |
//! | `Option<T>`            | T's     | `None` on NULL       | NULL on `None` |
//!
//! A type without an implementation cannot be bound or read; the compiler
//! rejects it.
//!

use crate::errors::{Error, Result};
use crate::kind::Kind;
use crate::row::{Binder, Row};

/// Reads one column of the current row.
pub trait FromColumn: Sized {
    /// The kind this type reads. `Value` resolves its kind per read instead.
    const KIND: Kind;

    fn from_column(row: &Row<'_>, index: usize) -> Result<Self>;
}

/// Writes one value into a 1-based placeholder.
pub trait ToParam {
    fn bind_param(&self, binder: &Binder<'_>, index: usize) -> Result<()>;
}

impl FromColumn for i64 {
    const KIND: Kind = Kind::Integer;

    fn from_column(row: &Row<'_>, index: usize) -> Result<Self> {
        row.read_integer(index)
    }
}

impl FromColumn for i32 {
    const KIND: Kind = Kind::Integer;

    fn from_column(row: &Row<'_>, index: usize) -> Result<Self> {
        let value = row.read_integer(index)?;
        i32::try_from(value).map_err(|_| Error::IntegerOutOfRange { index, value })
    }
}

impl FromColumn for f64 {
    const KIND: Kind = Kind::Float;

    fn from_column(row: &Row<'_>, index: usize) -> Result<Self> {
        row.read_float(index)
    }
}

impl FromColumn for String {
    const KIND: Kind = Kind::Text;

    fn from_column(row: &Row<'_>, index: usize) -> Result<Self> {
        row.read_text(index)
    }
}

impl FromColumn for Vec<u8> {
    const KIND: Kind = Kind::Blob;

    fn from_column(row: &Row<'_>, index: usize) -> Result<Self> {
        row.read_blob(index)
    }
}

impl<T: FromColumn> FromColumn for Option<T> {
    const KIND: Kind = T::KIND;

    fn from_column(row: &Row<'_>, index: usize) -> Result<Self> {
        if row.is_null(index)? {
            Ok(None)
        } else {
            T::from_column(row, index).map(Some)
        }
    }
}

impl ToParam for i64 {
    fn bind_param(&self, binder: &Binder<'_>, index: usize) -> Result<()> {
        binder.bind_integer(index, *self)
    }
}

impl ToParam for i32 {
    fn bind_param(&self, binder: &Binder<'_>, index: usize) -> Result<()> {
        binder.bind_integer(index, i64::from(*self))
    }
}

impl ToParam for f64 {
    fn bind_param(&self, binder: &Binder<'_>, index: usize) -> Result<()> {
        binder.bind_float(index, *self)
    }
}

impl ToParam for str {
    fn bind_param(&self, binder: &Binder<'_>, index: usize) -> Result<()> {
        binder.bind_text(index, self)
    }
}

impl ToParam for String {
    fn bind_param(&self, binder: &Binder<'_>, index: usize) -> Result<()> {
        binder.bind_text(index, self)
    }
}

impl ToParam for [u8] {
    fn bind_param(&self, binder: &Binder<'_>, index: usize) -> Result<()> {
        binder.bind_blob(index, self)
    }
}

impl ToParam for Vec<u8> {
    fn bind_param(&self, binder: &Binder<'_>, index: usize) -> Result<()> {
        binder.bind_blob(index, self)
    }
}

impl<T: ToParam> ToParam for Option<T> {
    fn bind_param(&self, binder: &Binder<'_>, index: usize) -> Result<()> {
        match self {
            Some(value) => value.bind_param(binder, index),
            None => binder.bind_null(index),
        }
    }
}

impl<T: ToParam + ?Sized> ToParam for &T {
    fn bind_param(&self, binder: &Binder<'_>, index: usize) -> Result<()> {
        (**self).bind_param(binder, index)
    }
}
