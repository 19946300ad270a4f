//!
//! # Connection Configuration
//!
//! `DatabaseConfig` describes how a database is opened. It can be built in
//! code or read from a TOML document:
//!
//! ```toml
//! path = "data/people.db"
//! read_only = false
//! create = true
//! busy_timeout_ms = 5000
//! ```
//!
//! Only `path` is required. `":memory:"` opens a private in-memory database.
//! `read_only` wins over `create`: a read-only database is never created.
//!

use std::ffi::c_int;
use std::path::{Path, PathBuf};

use rusqlite::ffi;
use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result};

pub const IN_MEMORY: &str = ":memory:";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DatabaseConfig {
    pub path: PathBuf,
    #[serde(default)]
    pub read_only: bool,
    #[serde(default = "default_create")]
    pub create: bool,
    #[serde(default)]
    pub busy_timeout_ms: Option<u32>,
}

fn default_create() -> bool {
    true
}

impl DatabaseConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            read_only: false,
            create: default_create(),
            busy_timeout_ms: None,
        }
    }

    pub fn in_memory() -> Self {
        Self::new(IN_MEMORY)
    }

    pub fn read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    pub fn create(mut self, create: bool) -> Self {
        self.create = create;
        self
    }

    pub fn busy_timeout_ms(mut self, millis: u32) -> Self {
        self.busy_timeout_ms = Some(millis);
        self
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config {
            path: None,
            reason: e.to_string(),
        })
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| Error::Config {
            path: Some(path.to_path_buf()),
            reason: e.to_string(),
        })
    }

    pub(crate) fn path_str(&self) -> String {
        self.path.to_string_lossy().into_owned()
    }

    pub(crate) fn open_flags(&self) -> c_int {
        if self.read_only {
            ffi::SQLITE_OPEN_READONLY
        } else if self.create {
            ffi::SQLITE_OPEN_READWRITE | ffi::SQLITE_OPEN_CREATE
        } else {
            ffi::SQLITE_OPEN_READWRITE
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self::in_memory()
    }
}
