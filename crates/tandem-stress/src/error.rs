//! Errors

use std::io;

/// Errors raised while setting up a stress run
#[derive(Debug, thiserror::Error)]
pub enum StressError {
    /// A test thread could not be spawned; threads spawned before it were
    /// aborted and joined without calling the function under test
    #[error("Failed to spawn stress thread #{index}: {source}")]
    Spawn {
        index: usize,
        #[source]
        source: io::Error,
    },
}

/// Result alias for this crate
pub type Result<T> = std::result::Result<T, StressError>;
