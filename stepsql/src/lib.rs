//!
//! # stepsql - Typed queries over SQLite's step API
//!
//! stepsql sits directly on SQLite's procedural interface (prepare, bind by
//! position, step, read columns by position, finalize) and exposes it as
//! typed Rust: the result shape of a query is a type parameter, arguments
//! are tuples, and rows are either collected or streamed one step at a time.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use stepsql::{Database, Statement};
//!
//! let db = Database::open("people.db");
//! assert!(db.is_open());
//!
//! db.execute("INSERT INTO people (name, age) VALUES (?, ?)", ("john", 10))?;
//!
//! let age: i64 = db.execute_value("SELECT age FROM people WHERE name = ?", "john")?;
//! let rows: Vec<(i64, String)> = db.query("SELECT age, name FROM people", ())?;
//!
//! let mut older = db.prepare::<String>("SELECT name FROM people WHERE age > ?")?;
//! for name in older.execute_cursor(10)? {
//!     println!("{}", name?);
//! }
//! ```
//!
//! ## Layers
//!
//! - `kind` / `codec`: which engine accessor serves which Rust type
//! - `value`: the dynamic `Value` for result shapes known only at runtime
//! - `typed_row`: tuples of codecs for rows and argument lists
//! - `statement` / `cursor`: reusable compiled queries and lazy row streams
//! - `database`: the connection and one-shot helpers
//!

pub mod codec;
pub mod config;
pub mod cursor;
pub mod database;
pub mod errors;
pub mod kind;
mod raw;
pub mod row;
pub mod statement;
pub mod typed_row;
pub mod value;

pub use codec::{FromColumn, ToParam};
pub use config::DatabaseConfig;
pub use cursor::Cursor;
pub use database::Database;
pub use errors::{ContractViolation, Error, ErrorKind, Result};
pub use kind::Kind;
pub use row::{Binder, Row};
pub use statement::Statement;
pub use typed_row::{FromRow, Params};
pub use value::Value;
