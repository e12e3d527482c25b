//! Error type shared by every layer of mkdict.
//!
//! Only transport, uninitialized-engine and worker failures ever reach a
//! caller of the lexicon. Cache errors are logged and swallowed, and "no
//! result" is never an error.

use thiserror::Error;

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, LexiconError>;

/// Error types for lexicon operations
///
/// `Clone` because a memoized initialization outcome is handed to every
/// caller that awaited it.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LexiconError {
    /// Query issued before the dataset reached the worker
    #[error("query engine is not initialized")]
    Uninitialized,
    /// Worker thread unreachable or the reply channel closed
    #[error("worker transport error: {0}")]
    Transport(String),
    /// Worker reported a failure while processing a request
    #[error("worker error: {0}")]
    Worker(String),
    /// Dataset download failed
    #[error("dataset fetch failed: {0}")]
    Fetch(String),
    /// Local cache store could not be opened, read or written
    #[error("cache error: {0}")]
    Cache(String),
    /// Result columns did not match the record being built
    #[error("unexpected result shape: {0}")]
    Schema(String),
    /// SQLite error outside the worker (cache store, fixtures)
    #[error("SQLite error: {0}")]
    Sqlite(String),
    /// IO error
    #[error("IO error: {0}")]
    Io(String),
}

impl From<rusqlite::Error> for LexiconError {
    fn from(err: rusqlite::Error) -> Self {
        LexiconError::Sqlite(err.to_string())
    }
}

impl From<std::io::Error> for LexiconError {
    fn from(err: std::io::Error) -> Self {
        LexiconError::Io(err.to_string())
    }
}

impl From<reqwest::Error> for LexiconError {
    fn from(err: reqwest::Error) -> Self {
        LexiconError::Fetch(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_converts() {
        let err: LexiconError =
            std::io::Error::new(std::io::ErrorKind::NotFound, "missing").into();
        assert!(matches!(err, LexiconError::Io(ref msg) if msg.contains("missing")));
    }

    #[test]
    fn test_display_messages() {
        assert_eq!(
            LexiconError::Uninitialized.to_string(),
            "query engine is not initialized"
        );
        assert_eq!(
            LexiconError::Worker("no such table: words".to_string()).to_string(),
            "worker error: no such table: words"
        );
    }
}
