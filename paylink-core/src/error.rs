//! Error types for paylink-core

use thiserror::Error;

use crate::validation::FieldErrors;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    #[error("Invalid status: {0}")]
    InvalidStatus(String),

    #[error("Search query must be at least {min} characters")]
    QueryTooShort { min: usize },

    #[error("Invalid link token")]
    InvalidToken,
}
