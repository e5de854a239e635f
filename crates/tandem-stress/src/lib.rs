//! Tandem Stress
//!
//! Harness for stress-testing concurrent code.
//!
//! [`StressHarness`] spawns `N` threads that all park at one gate. Once every
//! thread has arrived, the gate opens and all of them call the function under
//! test at the same moment, so data races and deadlocks are not hidden by the
//! order in which threads happened to be spawned.
//!
//! # Example
//! ```rust
//! use parking_lot::Mutex;
//! use tandem_stress::StressHarness;
//!
//! let counter = Mutex::new(0);
//! let report = StressHarness::<100>::run(|| *counter.lock() += 1).unwrap();
//!
//! assert!(report.is_clean());
//! assert_eq!(*counter.lock(), 100);
//! ```

mod config;
mod error;
mod gate;
pub mod harness;

pub use config::{DEFAULT_THREAD_PREFIX, StressConfig};
pub use error::{Result, StressError};
pub use harness::{StressHarness, StressReport};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
