use thiserror::Error;

/// Errors surfaced by the persistence layer.
///
/// Uniqueness violations are mapped to their own variants so the HTTP layer
/// can answer with the right status instead of leaking a raw database error.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("This account already exists.")]
    DuplicateEmail,

    #[error("A note with this slug already exists.")]
    DuplicateSlug,

    #[error("Record not found.")]
    NotFound,

    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
}

/// True when the error is a UNIQUE constraint violation on the given column
/// (rusqlite reports the column as `table.column` in the message).
pub(crate) fn is_unique_violation(err: &rusqlite::Error, column: &str) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(e, Some(msg)) => {
            e.code == rusqlite::ErrorCode::ConstraintViolation && msg.contains(column)
        }
        _ => false,
    }
}
