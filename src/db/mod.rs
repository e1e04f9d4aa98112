pub mod repository;
pub mod sqlite;
pub mod vocabulary;

pub use repository::*;
pub use sqlite::*;
pub use vocabulary::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Invalid enum value for {field}: {value}")]
    InvalidEnum { field: String, value: String },

    #[error("Migration failed at version {version}: {reason}")]
    MigrationFailed { version: i64, reason: String },

    #[error("Could not create database directory {path}: {reason}")]
    DirectoryCreation { path: String, reason: String },
}

/// Storage format for OMOP datetime columns.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Storage format for OMOP date columns.
pub const DATE_FORMAT: &str = "%Y-%m-%d";
