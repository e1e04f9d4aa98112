//! Error types for the generation phases.

use thiserror::Error;

use crate::db::DatabaseError;

#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Vocabulary has no concept for code {code} in {vocabulary}")]
    IncompleteVocabulary { code: String, vocabulary: String },

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("Configuration error: {0}")]
    Config(String),
}
