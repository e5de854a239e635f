//! Tandem Sync
//!
//! Monitor-based building blocks for threaded code.
//!
//! # Components
//! - [`ActiveObject`]: runs an [`Action`] repeatedly on a dedicated thread
//!   until told to stop.
//! - [`BlockingPriorityQueue`]: ordered, thread-safe queue with blocking and
//!   timed retrieval. Equal-priority items come out oldest first.
//!
//! Both types guard their state with a single mutex and use a condition
//! variable to wait on it. No lock is held while caller-supplied code runs.
//!
//! # Example
//! ```rust
//! use std::time::Duration;
//! use tandem_sync::BlockingPriorityQueue;
//!
//! let queue = BlockingPriorityQueue::new();
//! queue.insert(3);
//! queue.insert(7);
//! assert_eq!(queue.pop(Duration::ZERO), Some(7));
//! assert_eq!(queue.try_pop(), Some(3));
//! assert_eq!(queue.try_pop(), None);
//! ```

mod config;
mod error;
pub mod queue;
pub mod worker;

pub use config::{DEFAULT_WORKER_NAME, WorkerConfig};
pub use error::{Result, SyncError};
pub use queue::BlockingPriorityQueue;
pub use worker::{Action, ActiveObject, LoopControl, WorkerLifecycle};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
