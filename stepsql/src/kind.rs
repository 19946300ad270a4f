//!
//! Semantic column kinds.
//!
//! A `Kind` is chosen two ways: statically, from the Rust type a caller
//! asks for, and dynamically, from the SQL type name a column was declared
//! with. The declared-type table is a constant; nothing is initialized at
//! runtime.
//!

use std::ffi::c_int;
use std::fmt;

use rusqlite::ffi;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Kind {
    #[default]
    Null,
    Integer,
    Float,
    Text,
    Blob,
}

/// Declared SQL type names with a dedicated kind. Anything else reads as `Null`.
const DECLARED_TYPES: [(&str, Kind); 4] = [
    ("INTEGER", Kind::Integer),
    ("FLOAT", Kind::Float),
    ("TEXT", Kind::Text),
    ("BLOB", Kind::Blob),
];

impl Kind {
    /// Looks up a column's declared type name, ignoring ASCII case.
    pub fn from_declared_type(name: Option<&str>) -> Kind {
        let Some(name) = name else {
            return Kind::Null;
        };
        DECLARED_TYPES
            .iter()
            .find(|(declared, _)| declared.eq_ignore_ascii_case(name.trim()))
            .map(|(_, kind)| *kind)
            .unwrap_or(Kind::Null)
    }

    /// Maps a runtime storage class code (`sqlite3_column_type`).
    pub(crate) fn from_storage_class(code: c_int) -> Kind {
        match code {
            ffi::SQLITE_INTEGER => Kind::Integer,
            ffi::SQLITE_FLOAT => Kind::Float,
            ffi::SQLITE_TEXT => Kind::Text,
            ffi::SQLITE_BLOB => Kind::Blob,
            _ => Kind::Null,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Null => "NULL",
            Kind::Integer => "INTEGER",
            Kind::Float => "FLOAT",
            Kind::Text => "TEXT",
            Kind::Blob => "BLOB",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
