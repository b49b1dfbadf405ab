//! Error types shared by the library store and its configuration.

use rusqlite::ErrorCode;

/// Errors raised by library store operations.
#[derive(Debug, thiserror::Error)]
pub enum LibraryError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("library store lock poisoned")]
    StorePoisoned,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl LibraryError {
    /// True when the store rejected the statement because another connection
    /// holds a conflicting lock.
    pub fn is_store_busy(&self) -> bool {
        match self {
            Self::Sqlite(rusqlite::Error::SqliteFailure(err, _)) => matches!(
                err.code,
                ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked
            ),
            _ => false,
        }
    }
}

pub type LibraryResult<T> = Result<T, LibraryError>;

/// Errors raised while loading or persisting `library.toml`.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not determine the user config directory")]
    NoConfigDir,
    #[error("config io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[cfg(test)]
mod tests {
    use super::LibraryError;
    use rusqlite::ffi;

    #[test]
    fn test_is_store_busy_matches_busy_and_locked_codes_only() {
        let busy = LibraryError::Sqlite(rusqlite::Error::SqliteFailure(
            ffi::Error::new(ffi::SQLITE_BUSY),
            None,
        ));
        let locked = LibraryError::Sqlite(rusqlite::Error::SqliteFailure(
            ffi::Error::new(ffi::SQLITE_LOCKED),
            None,
        ));
        let constraint = LibraryError::Sqlite(rusqlite::Error::SqliteFailure(
            ffi::Error::new(ffi::SQLITE_CONSTRAINT),
            None,
        ));

        assert!(busy.is_store_busy());
        assert!(locked.is_store_busy());
        assert!(!constraint.is_store_busy());
        assert!(!LibraryError::StorePoisoned.is_store_busy());
    }
}
