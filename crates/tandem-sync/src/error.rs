//! Errors

use std::io;

/// Errors raised by the sync primitives
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// The operating system refused to create the worker thread
    #[error("Failed to spawn worker thread '{name}': {source}")]
    Spawn {
        name: String,
        #[source]
        source: io::Error,
    },
}

/// Result alias for this crate
pub type Result<T> = std::result::Result<T, SyncError>;
