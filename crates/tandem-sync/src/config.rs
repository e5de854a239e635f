//! Worker Configuration

use std::thread;

/// Default worker thread name
pub const DEFAULT_WORKER_NAME: &str = "tandem-worker";

/// Options for the thread an [`ActiveObject`](crate::ActiveObject) spawns
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerConfig {
    /// Thread name, visible in debuggers and panic messages
    pub name: String,

    /// Stack size in bytes (platform default when `None`)
    pub stack_size: Option<usize>,
}

impl WorkerConfig {
    /// Create config with the given thread name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stack_size: None,
        }
    }

    /// Set the stack size
    pub fn with_stack_size(mut self, bytes: usize) -> Self {
        self.stack_size = Some(bytes);
        self
    }

    pub(crate) fn thread_builder(&self) -> thread::Builder {
        let builder = thread::Builder::new().name(self.name.clone());
        match self.stack_size {
            Some(bytes) => builder.stack_size(bytes),
            None => builder,
        }
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self::new(DEFAULT_WORKER_NAME)
    }
}
