use std::fmt;

/// Errors raised by a [`ContestStore`](super::ContestStore) implementation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The requested row does not exist.
    NotFound(String),
    /// An insert collided with an existing `(event, actor, kind)` row.
    UniqueViolation(String),
    /// The backing storage failed.
    Backend(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(what) => write!(f, "{what} not found"),
            Self::UniqueViolation(what) => write!(f, "unique constraint violated: {what}"),
            Self::Backend(msg) => write!(f, "storage backend error: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {}
