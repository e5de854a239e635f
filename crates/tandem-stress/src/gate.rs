//! Release Gate
//!
//! Monitor the test threads park on until they are released together.

use parking_lot::{Condvar, Mutex};

#[derive(Debug, Default)]
struct GateState {
    /// Threads that reached the gate
    arrived: usize,
    /// Set once by the starter
    released: bool,
    /// Set instead of `released` when the run is cancelled
    aborted: bool,
}

/// One mutex, one condition variable. Arrivals and the release are both
/// broadcast, the starter and the parked threads re-check their own
/// predicate on every wakeup.
#[derive(Debug, Default)]
pub(crate) struct Gate {
    state: Mutex<GateState>,
    changed: Condvar,
}

impl Gate {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Register the calling thread and block until the gate opens.
    ///
    /// Returns true if released, false if the run was aborted. The lock is
    /// dropped before returning.
    pub(crate) fn arrive_and_wait(&self) -> bool {
        let mut state = self.state.lock();
        state.arrived += 1;
        self.changed.notify_all();

        while !state.released && !state.aborted {
            self.changed.wait(&mut state);
        }
        state.released
    }

    /// Wait until `parties` threads have arrived, then release them all
    pub(crate) fn release_when_arrived(&self, parties: usize) {
        let mut state = self.state.lock();
        while state.arrived < parties {
            self.changed.wait(&mut state);
        }
        state.released = true;
        self.changed.notify_all();
    }

    /// Send every parked and future arrival home without releasing it
    pub(crate) fn abort(&self) {
        let mut state = self.state.lock();
        if !state.released {
            state.aborted = true;
        }
        self.changed.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    #[test]
    fn test_release_waits_for_all_arrivals() {
        let gate = Arc::new(Gate::new());
        let passed = Arc::new(AtomicUsize::new(0));

        let threads: Vec<_> = (0..4)
            .map(|_| {
                let gate = Arc::clone(&gate);
                let passed = Arc::clone(&passed);
                thread::spawn(move || {
                    if gate.arrive_and_wait() {
                        passed.fetch_add(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();

        gate.release_when_arrived(4);
        for t in threads {
            t.join().unwrap();
        }
        assert_eq!(passed.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_release_blocks_until_last_arrival() {
        let gate = Arc::new(Gate::new());
        let released = Arc::new(AtomicUsize::new(0));

        let starter = {
            let gate = Arc::clone(&gate);
            let released = Arc::clone(&released);
            thread::spawn(move || {
                gate.release_when_arrived(2);
                released.store(1, Ordering::SeqCst);
            })
        };

        let first = {
            let gate = Arc::clone(&gate);
            thread::spawn(move || gate.arrive_and_wait())
        };
        thread::sleep(std::time::Duration::from_millis(50));
        assert_eq!(released.load(Ordering::SeqCst), 0);

        assert!(gate.arrive_and_wait());
        assert!(first.join().unwrap());
        starter.join().unwrap();
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_abort_before_arrival() {
        let gate = Gate::new();
        gate.abort();
        assert!(!gate.arrive_and_wait());
    }

    #[test]
    fn test_abort_after_release_is_ignored() {
        let gate = Gate::new();
        gate.release_when_arrived(0);
        gate.abort();
        assert!(gate.arrive_and_wait());
    }
}
