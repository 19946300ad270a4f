//!
//! Error types for stepsql.
//!
//! Every engine status other than the one an operation expects becomes an
//! `Error`. Nothing is retried or swallowed; `Error::kind()` groups the
//! variants so callers can tell a bad query from a bad bind, a failed step
//! or a misuse of the API.
//!

use std::path::PathBuf;
use thiserror::Error;

use crate::kind::Kind;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Failed to open database at {path}: {message} (code {code})")]
    Connection {
        path: String,
        code: i32,
        message: String,
    },

    #[error("Database is not open")]
    NotOpen,

    #[error("Failed to prepare `{sql}`: {message} (code {code})")]
    Prepare {
        sql: String,
        code: i32,
        message: String,
    },

    #[error("Query contains no SQL statement")]
    EmptyQuery,

    #[error(
        "Statement yields {actual} columns but the row type reads {} ({})",
        expected.len(),
        format_kinds(expected)
    )]
    ColumnCount { expected: Vec<Kind>, actual: usize },

    #[error("Failed to bind parameter {index}: {message} (code {code})")]
    Bind {
        index: usize,
        code: i32,
        message: String,
    },

    #[error("Statement expects {expected} parameters, {given} given")]
    ParameterCount { expected: usize, given: usize },

    #[error("Step failed: {message} (code {code})")]
    Step { code: i32, message: String },

    #[error("Failed to finalize statement: {message} (code {code})")]
    Finalize { code: i32, message: String },

    #[error("Failed to close database: {message} (code {code})")]
    Close { code: i32, message: String },

    #[error("Contract violation: {0}")]
    Contract(#[from] ContractViolation),

    #[error("Query returned no rows")]
    NotFound,

    #[error("Column index {index} out of range for a row of {count} columns")]
    ColumnIndex { index: usize, count: usize },

    #[error("Integer {value} in column {index} does not fit the requested type")]
    IntegerOutOfRange { index: usize, value: i64 },

    #[error("{what} contains an interior NUL byte")]
    InteriorNul { what: &'static str },

    #[error("Invalid configuration in {}: {reason}", display_source(path))]
    Config {
        path: Option<PathBuf>,
        reason: String,
    },

    #[error("{0}")]
    Io(#[from] std::io::Error),
}

/// Caller-side misuse of a statement or cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ContractViolation {
    #[error("cursor has not been started")]
    CursorNotStarted,

    #[error("cursor is exhausted")]
    CursorExhausted,

    #[error("cursor cannot be restarted; bind and execute again")]
    CursorRestarted,

    #[error("statement stepped again after reporting no more rows")]
    StepAfterExhaustion,

    #[error("statement without a result type produced a row")]
    UnexpectedRow,

    #[error("dynamic bound values and typed arguments cannot be mixed")]
    MixedBinding,
}

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Connection,
    Prepare,
    Bind,
    Step,
    Finalize,
    Contract,
    NotFound,
    Conversion,
    Config,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Connection { .. } | Error::NotOpen => ErrorKind::Connection,
            Error::Prepare { .. } | Error::EmptyQuery | Error::ColumnCount { .. } => {
                ErrorKind::Prepare
            }
            Error::Bind { .. } | Error::ParameterCount { .. } => ErrorKind::Bind,
            Error::Step { .. } => ErrorKind::Step,
            Error::Finalize { .. } | Error::Close { .. } => ErrorKind::Finalize,
            Error::Contract(_) => ErrorKind::Contract,
            Error::NotFound => ErrorKind::NotFound,
            Error::ColumnIndex { .. }
            | Error::IntegerOutOfRange { .. }
            | Error::InteriorNul { .. } => ErrorKind::Conversion,
            Error::Config { .. } | Error::Io(_) => ErrorKind::Config,
        }
    }

    /// The engine's extended result code, when the failure came from SQLite.
    pub fn engine_code(&self) -> Option<i32> {
        match self {
            Error::Connection { code, .. }
            | Error::Prepare { code, .. }
            | Error::Bind { code, .. }
            | Error::Step { code, .. }
            | Error::Finalize { code, .. }
            | Error::Close { code, .. } => Some(*code),
            _ => None,
        }
    }
}

fn format_kinds(kinds: &[Kind]) -> String {
    kinds
        .iter()
        .map(Kind::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

fn display_source(path: &Option<PathBuf>) -> String {
    match path {
        Some(path) => path.display().to_string(),
        None => "<inline>".to_string(),
    }
}
