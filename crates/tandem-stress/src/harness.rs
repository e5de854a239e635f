//! Stress Harness
//!
//! Runs a function on `N` threads released together through a shared gate.
//!
//! Two forms:
//! - [`StressHarness::new`] arms the threads up front; [`start_test`]
//!   releases them later. Dropping an unstarted harness aborts the threads
//!   without calling the function.
//! - [`StressHarness::run`] arms, releases and joins in one call on scoped
//!   threads, so the function may borrow from the caller's stack.
//!
//! [`start_test`]: StressHarness::start_test

use std::fmt;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::config::StressConfig;
use crate::error::{Result, StressError};
use crate::gate::Gate;

/// Outcome of one stress run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StressReport {
    /// Number of threads that were released
    pub threads: usize,
    /// Threads whose call to the function under test panicked
    pub panicked: usize,
    /// Wall time from release until the last thread was joined
    pub elapsed: Duration,
}

impl StressReport {
    /// True when no call panicked
    pub fn is_clean(&self) -> bool {
        self.panicked == 0
    }
}

/// Barrier-released stress test over `N` threads.
///
/// Every thread owns a clone of the function under test. The function must
/// return in finite time; if it deadlocks, [`start_test`](Self::start_test)
/// never returns, which is how the deadlock shows up.
pub struct StressHarness<const N: usize> {
    gate: Arc<Gate>,
    threads: Vec<JoinHandle<()>>,
    usable: bool,
}

impl<const N: usize> fmt::Debug for StressHarness<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StressHarness")
            .field("threads", &N)
            .field("usable", &self.usable)
            .finish()
    }
}

impl<const N: usize> StressHarness<N> {
    /// Spawn `N` threads parked at the gate, each holding a clone of `f`
    pub fn new<F>(f: F) -> Result<Self>
    where
        F: Fn() + Clone + Send + 'static,
    {
        Self::with_config(&StressConfig::default(), f)
    }

    /// Like [`new`](Self::new), with custom thread options
    pub fn with_config<F>(config: &StressConfig, f: F) -> Result<Self>
    where
        F: Fn() + Clone + Send + 'static,
    {
        let gate = Arc::new(Gate::new());
        let mut threads = Vec::with_capacity(N);

        for index in 0..N {
            let gate_ref = Arc::clone(&gate);
            let f = f.clone();
            let spawned = config.thread_builder(index).spawn(move || {
                if gate_ref.arrive_and_wait() {
                    f();
                }
            });

            match spawned {
                Ok(handle) => threads.push(handle),
                Err(source) => {
                    tracing::warn!(index, "Stress thread spawn failed, aborting armed threads");
                    gate.abort();
                    join_all(threads);
                    return Err(StressError::Spawn { index, source });
                }
            }
        }

        tracing::debug!(threads = N, "Stress harness armed");
        Ok(Self {
            gate,
            threads,
            usable: true,
        })
    }

    /// Release all threads at once and join them.
    ///
    /// # Panics
    /// If called more than once on the same harness.
    pub fn start_test(&mut self) -> StressReport {
        assert!(
            self.usable,
            "StressHarness::start_test can be called only once per harness"
        );
        self.usable = false;

        self.gate.release_when_arrived(N);
        tracing::debug!(threads = N, "Stress threads released");

        let started = Instant::now();
        let panicked = join_all(self.threads.drain(..));
        finish(N, panicked, started)
    }

    /// True until [`start_test`](Self::start_test) is called
    pub fn is_usable(&self) -> bool {
        self.usable
    }

    /// One-shot run: spawn `N` scoped threads, release them together, and
    /// return once every call to `f` has completed.
    pub fn run<F>(f: F) -> Result<StressReport>
    where
        F: Fn() + Sync,
    {
        Self::run_with_config(&StressConfig::default(), f)
    }

    /// Like [`run`](Self::run), with custom thread options
    pub fn run_with_config<F>(config: &StressConfig, f: F) -> Result<StressReport>
    where
        F: Fn() + Sync,
    {
        let gate = Gate::new();
        let (gate, f) = (&gate, &f);

        thread::scope(|scope| {
            let mut threads = Vec::with_capacity(N);

            for index in 0..N {
                let spawned = config.thread_builder(index).spawn_scoped(scope, move || {
                    if gate.arrive_and_wait() {
                        f();
                    }
                });

                match spawned {
                    Ok(handle) => threads.push(handle),
                    Err(source) => {
                        tracing::warn!(index, "Stress thread spawn failed, aborting armed threads");
                        gate.abort();
                        for handle in threads {
                            let _ = handle.join();
                        }
                        return Err(StressError::Spawn { index, source });
                    }
                }
            }

            gate.release_when_arrived(N);
            tracing::debug!(threads = N, "Scoped stress threads released");

            let started = Instant::now();
            let panicked = threads
                .into_iter()
                .map(|handle| handle.join())
                .filter(|joined| joined.is_err())
                .count();
            Ok(finish(N, panicked, started))
        })
    }
}

impl<const N: usize> Drop for StressHarness<N> {
    fn drop(&mut self) {
        if self.usable {
            tracing::debug!(threads = N, "Unstarted stress harness dropped, aborting");
            self.gate.abort();
            join_all(self.threads.drain(..));
        }
    }
}

/// Join every handle, returning how many threads panicked
fn join_all(threads: impl IntoIterator<Item = JoinHandle<()>>) -> usize {
    threads
        .into_iter()
        .map(JoinHandle::join)
        .filter(|joined| joined.is_err())
        .count()
}

fn finish(threads: usize, panicked: usize, started: Instant) -> StressReport {
    let report = StressReport {
        threads,
        panicked,
        elapsed: started.elapsed(),
    };
    if report.is_clean() {
        tracing::debug!(threads, elapsed = ?report.elapsed, "Stress run finished");
    } else {
        tracing::warn!(threads, panicked, "Stress run finished with panicking threads");
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counter() -> Arc<Mutex<usize>> {
        Arc::new(Mutex::new(0))
    }

    fn incrementer(counter: Arc<Mutex<usize>>) -> impl Fn() + Clone + Send + 'static {
        move || *counter.lock() += 1
    }

    #[test]
    fn test_drop_unstarted_never_calls() {
        let count = counter();
        {
            let harness = StressHarness::<10>::new(incrementer(Arc::clone(&count))).unwrap();
            assert!(harness.is_usable());
        }
        assert_eq!(*count.lock(), 0);
    }

    #[test]
    fn test_no_call_before_release() {
        let count = counter();
        let mut harness = StressHarness::<10>::new(incrementer(Arc::clone(&count))).unwrap();

        thread::sleep(Duration::from_millis(50));
        assert_eq!(*count.lock(), 0);

        harness.start_test();
        assert_eq!(*count.lock(), 10);
    }

    #[test]
    fn test_start_test_flips_usable() {
        let count = counter();
        let mut harness = StressHarness::<100>::new(incrementer(Arc::clone(&count))).unwrap();
        assert!(harness.is_usable());

        let report = harness.start_test();
        assert!(!harness.is_usable());
        assert_eq!(report.threads, 100);
        assert!(report.is_clean());
        assert_eq!(*count.lock(), 100);
    }

    #[test]
    fn test_counts_for_various_sizes() {
        fn check<const N: usize>() {
            let count = counter();
            StressHarness::<N>::new(incrementer(Arc::clone(&count)))
                .unwrap()
                .start_test();
            assert_eq!(*count.lock(), N);
        }

        check::<1>();
        check::<10>();
        check::<100>();
    }

    #[test]
    #[should_panic(expected = "only once")]
    fn test_second_start_panics() {
        let mut harness = StressHarness::<2>::new(|| {}).unwrap();
        harness.start_test();
        harness.start_test();
    }

    #[test]
    fn test_static_run_borrows_stack() {
        let count = Mutex::new(0usize);
        let report = StressHarness::<100>::run(|| *count.lock() += 1).unwrap();

        assert!(report.is_clean());
        assert_eq!(count.into_inner(), 100);
    }

    #[test]
    fn test_multiple_captures() {
        let values = Mutex::new((0, 0, 0));
        StressHarness::<50>::run(|| {
            let mut v = values.lock();
            v.0 += 1;
            v.1 += 2;
            v.2 += 3;
        })
        .unwrap();

        assert_eq!(values.into_inner(), (50, 100, 150));
    }

    #[test]
    fn test_panics_are_counted() {
        let next = AtomicUsize::new(0);
        let report = StressHarness::<8>::run(|| {
            if next.fetch_add(1, Ordering::SeqCst) < 3 {
                panic!("injected failure");
            }
        })
        .unwrap();

        assert_eq!(report.panicked, 3);
        assert!(!report.is_clean());
    }

    #[test]
    fn test_custom_thread_names() {
        let names = Mutex::new(Vec::new());
        let config = StressConfig::new("burst");
        StressHarness::<3>::run_with_config(&config, || {
            let name = thread::current().name().map(str::to_owned);
            names.lock().push(name);
        })
        .unwrap();

        let mut names: Vec<_> = names.into_inner().into_iter().flatten().collect();
        names.sort();
        assert_eq!(names, vec!["burst-0", "burst-1", "burst-2"]);
    }
}
