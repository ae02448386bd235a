//! Cache error type.

use thiserror::Error;

/// Errors surfaced by cache store implementations.
#[derive(Debug, Error)]
pub enum CacheError {
    /// I/O failure in a disk-backed store.
    #[error("cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Engine-specific storage failure.
    #[error("cache storage error: {0}")]
    Storage(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_io_error() {
        let err = CacheError::from(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "denied",
        ));
        assert!(err.to_string().contains("cache I/O error"));
    }

    #[test]
    fn test_display_storage_error() {
        let err = CacheError::Storage("column family missing".to_string());
        assert!(err.to_string().contains("column family missing"));
    }
}
