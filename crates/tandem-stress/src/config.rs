//! Stress Run Configuration

use std::thread;

/// Default prefix for test thread names
pub const DEFAULT_THREAD_PREFIX: &str = "tandem-stress";

/// Options for the threads a stress run spawns
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StressConfig {
    /// Thread `k` is named `"{prefix}-{k}"`
    pub thread_name_prefix: String,

    /// Stack size in bytes (platform default when `None`)
    pub stack_size: Option<usize>,
}

impl StressConfig {
    /// Create config with the given thread name prefix
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            thread_name_prefix: prefix.into(),
            stack_size: None,
        }
    }

    /// Set the stack size of every test thread
    pub fn with_stack_size(mut self, bytes: usize) -> Self {
        self.stack_size = Some(bytes);
        self
    }

    /// Name of test thread `index`
    pub fn thread_name(&self, index: usize) -> String {
        format!("{}-{}", self.thread_name_prefix, index)
    }

    pub(crate) fn thread_builder(&self, index: usize) -> thread::Builder {
        let builder = thread::Builder::new().name(self.thread_name(index));
        match self.stack_size {
            Some(bytes) => builder.stack_size(bytes),
            None => builder,
        }
    }
}

impl Default for StressConfig {
    fn default() -> Self {
        Self::new(DEFAULT_THREAD_PREFIX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thread_names() {
        let config = StressConfig::default();
        assert_eq!(config.thread_name(0), "tandem-stress-0");
        assert_eq!(StressConfig::new("queue").thread_name(12), "queue-12");
    }
}
