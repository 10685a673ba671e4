//! Database errors

use thiserror::Error;

/// Database errors
#[derive(Error, Debug)]
pub enum DbError {
    /// SQLx error
    #[error("database error: {0}")]
    Sqlx(sqlx::Error),

    /// Record not found
    #[error("record not found")]
    NotFound,

    /// Unique constraint violated
    #[error("record already exists")]
    Conflict,

    /// A stored value could not be interpreted
    #[error("invalid stored data: {0}")]
    InvalidData(String),
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => Self::Conflict,
            sqlx::Error::RowNotFound => Self::NotFound,
            _ => Self::Sqlx(err),
        }
    }
}

impl From<rider_types::ParseError> for DbError {
    fn from(err: rider_types::ParseError) -> Self {
        Self::InvalidData(err.to_string())
    }
}

/// Result type for repository operations
pub type DbResult<T> = Result<T, DbError>;
