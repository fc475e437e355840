//! Error types shared by every container.

use thiserror::Error;

/// Error type for container and storage operations.
#[derive(Debug, Error)]
pub enum Error {
    /// A map key or set member is absent.
    #[error("key not found")]
    KeyNotFound,

    /// A sequence index, after resolving negative offsets, is outside `0..len`.
    #[error("sequence index {index} out of range for length {len}")]
    IndexOutOfRange { index: i64, len: usize },

    /// A pop-style operation was attempted on an empty container.
    #[error("container is empty")]
    EmptyContainer,

    /// A key or index that the container cannot address.
    #[error("invalid key type: {0}")]
    InvalidKeyType(String),

    /// The coder failed to turn a value into text.
    #[error("failed to encode value: {0}")]
    Encode(String),

    /// The coder failed to turn stored text back into a value.
    #[error("failed to decode value: {0}")]
    Decode(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A thread panicked while holding the engine lock.
    #[error("storage lock poisoned")]
    LockPoisoned,
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Whether this error reports a missing key, index or element rather
    /// than a storage failure.
    pub fn is_lookup_failure(&self) -> bool {
        matches!(
            self,
            Error::KeyNotFound | Error::IndexOutOfRange { .. } | Error::EmptyContainer
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_failures() {
        assert!(Error::KeyNotFound.is_lookup_failure());
        assert!(Error::EmptyContainer.is_lookup_failure());
        assert!(Error::IndexOutOfRange { index: 3, len: 2 }.is_lookup_failure());
        assert!(!Error::LockPoisoned.is_lookup_failure());
    }

    #[test]
    fn test_index_error_message() {
        let err = Error::IndexOutOfRange { index: -4, len: 3 };
        assert_eq!(
            err.to_string(),
            "sequence index -4 out of range for length 3"
        );
    }
}
