//! Error types for taskchime.
//!
//! Each module defines its own focused error enum; this module aggregates
//! them into [`ChimeError`] for callers that cross module boundaries, with
//! a crate-wide [`Result`] alias.
//!
//! Propagation follows the taxonomy in the design notes: input and lookup
//! errors stay local to the menu, storage errors are fatal at startup and
//! reported-but-nonfatal afterwards, announcement failures are logged and
//! swallowed at the boundary.

use thiserror::Error;

use crate::announce::AnnounceError;
use crate::config::ConfigError;
use crate::storage::StorageError;
use crate::store::StoreError;

/// Errors that can occur during taskchime operations.
#[derive(Error, Debug)]
pub enum ChimeError {
    /// Configuration-related error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Storage snapshot load or save error.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Task store mutation error.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Speech backend error.
    #[error("announcement error: {0}")]
    Announce(#[from] AnnounceError),

    /// Terminal or file system I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A specialized `Result` type for taskchime operations.
pub type Result<T> = std::result::Result<T, ChimeError>;

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn config_error_display() {
        let err: ChimeError = ConfigError::InvalidValue {
            key: "TASKCHIME_TICK_SECS".to_string(),
            message: "expected a positive integer".to_string(),
        }
        .into();
        assert_eq!(
            err.to_string(),
            "configuration error: invalid value for TASKCHIME_TICK_SECS: \
             expected a positive integer"
        );
    }

    #[test]
    fn store_not_found_display() {
        let id = Uuid::nil();
        let err: ChimeError = StoreError::NotFound { id }.into();
        assert!(err.to_string().contains("no longer exists"));
    }

    #[test]
    fn io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: ChimeError = io_err.into();
        assert!(matches!(err, ChimeError::Io(_)));
        assert!(err.to_string().contains("I/O error"));
    }

    #[test]
    fn error_source_chain_preserved() {
        use std::error::Error;

        let io_err = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        let storage_err = StorageError::Io(io_err);
        let err: ChimeError = storage_err.into();

        assert!(err.source().is_some());
    }

    #[test]
    fn result_alias_works() {
        fn ok() -> Result<u32> {
            Ok(7)
        }
        assert_eq!(ok().unwrap(), 7);
    }
}
