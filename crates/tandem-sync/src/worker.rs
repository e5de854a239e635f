//! Active Objects
//!
//! An [`ActiveObject`] owns one background thread that calls an [`Action`]
//! over and over until it is stopped.
//!
//! The lifecycle is a small monitor: the phase (`Stopped` / `Running`), the
//! identity of the live worker thread and its join handle sit behind one
//! mutex, and a condition variable is signalled whenever a worker exits.
//! The worker checks the phase before every call, so after a stop request at
//! most one more call completes. The action itself always runs unlocked.

use std::fmt;
use std::sync::Arc;
use std::thread::{self, JoinHandle, ThreadId};

use parking_lot::{Condvar, Mutex};

use crate::config::WorkerConfig;
use crate::error::{Result, SyncError};

/// Work performed by an [`ActiveObject`] on its own thread.
///
/// `action` is called repeatedly until the object is stopped. It must return
/// in finite time and must not panic. State it mutates has to live behind
/// interior mutability, since the owner may read it concurrently through
/// [`ActiveObject::action`].
pub trait Action: Send + Sync + 'static {
    /// One iteration of the work loop
    fn action(&self, control: &LoopControl);
}

impl<F> Action for F
where
    F: Fn(&LoopControl) + Send + Sync + 'static,
{
    fn action(&self, control: &LoopControl) {
        self(control)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Stopped,
    Running,
}

#[derive(Debug)]
struct LoopState {
    phase: Phase,
    /// Worker thread that has not exited yet, even if it is winding down
    worker: Option<ThreadId>,
    /// Handle of the most recent worker, unless it was joined or detached
    handle: Option<JoinHandle<()>>,
}

/// Lifecycle monitor shared between the owner and its worker thread.
///
/// The action receives a reference to it on every call and can use it to end
/// the loop from the inside.
pub struct LoopControl {
    state: Mutex<LoopState>,
    exited: Condvar,
}

impl fmt::Debug for LoopControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("LoopControl")
            .field("phase", &state.phase)
            .field("worker", &state.worker)
            .finish()
    }
}

impl LoopControl {
    fn new() -> Self {
        Self {
            state: Mutex::new(LoopState {
                phase: Phase::Stopped,
                worker: None,
                handle: None,
            }),
            exited: Condvar::new(),
        }
    }

    /// Check whether the loop is set to keep running
    pub fn is_started(&self) -> bool {
        self.state.lock().phase == Phase::Running
    }

    /// Mark the loop stopped without joining or detaching the worker.
    ///
    /// The current call to the action finishes normally and the action is
    /// not called again.
    pub fn stop_on_next_loop(&self) {
        self.state.lock().phase = Phase::Stopped;
    }

    /// Block until no worker thread is alive
    fn wait_for_exit(&self) {
        let mut state = self.state.lock();
        while state.worker.is_some() {
            self.exited.wait(&mut state);
        }
    }
}

/// Clears the worker slot when the worker thread leaves its loop, including
/// by unwinding.
struct ExitGuard<'a> {
    control: &'a LoopControl,
}

impl Drop for ExitGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.control.state.lock();
        if thread::panicking() {
            state.phase = Phase::Stopped;
            tracing::error!("Worker action panicked, loop stopped");
        }
        state.worker = None;
        self.control.exited.notify_all();
    }
}

struct Shared<A> {
    control: LoopControl,
    action: A,
}

fn run_loop<A: Action>(shared: Arc<Shared<A>>) {
    let _exit = ExitGuard {
        control: &shared.control,
    };
    tracing::trace!("Worker loop entered");

    while shared.control.is_started() {
        shared.action.action(&shared.control);
    }

    tracing::trace!("Worker loop exited");
}

/// Object that performs its [`Action`] in a thread of its own.
///
/// Created stopped. [`start`](Self::start) spawns the worker, one of the
/// `stop` methods ends it. At most one worker thread exists per object at a
/// time. Dropping a running object stops it and joins the worker, unless it
/// is dropped on that worker from inside the action.
pub struct ActiveObject<A: Action> {
    shared: Arc<Shared<A>>,
    config: WorkerConfig,
}

/// Alias naming the lifecycle role of [`ActiveObject`]
pub type WorkerLifecycle<A> = ActiveObject<A>;

impl<A: Action> fmt::Debug for ActiveObject<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActiveObject")
            .field("name", &self.config.name)
            .field("control", &self.shared.control)
            .finish()
    }
}

impl<F> ActiveObject<F>
where
    F: Fn(&LoopControl) + Send + Sync + 'static,
{
    /// Create from a closure
    pub fn from_fn(action: F) -> Self {
        Self::new(action)
    }
}

impl<A: Action> ActiveObject<A> {
    /// Create a stopped object with the default worker config
    pub fn new(action: A) -> Self {
        Self::with_config(action, WorkerConfig::default())
    }

    /// Create a stopped object with a custom worker config
    pub fn with_config(action: A, config: WorkerConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                control: LoopControl::new(),
                action,
            }),
            config,
        }
    }

    /// Start the worker if it is not already running.
    ///
    /// A worker left over from a detached stop or from
    /// [`stop_on_next_loop`](Self::stop_on_next_loop) is waited for before
    /// its successor is spawned. Called from inside the action after
    /// [`stop_on_next_loop`](Self::stop_on_next_loop) or an in-action stop,
    /// this re-arms the current loop instead. It does nothing there while a
    /// stop from another thread is joining or detaching the worker.
    pub fn start(&self) -> Result<()> {
        let control = &self.shared.control;
        let mut state = control.state.lock();
        if state.phase == Phase::Running {
            return Ok(());
        }

        let me = thread::current().id();
        if state.worker == Some(me) {
            // Only a stop that left the handle in place may be undone. A
            // stop from outside has taken the handle to join or detach it.
            let owns_handle = state.handle.as_ref().is_some_and(|h| h.thread().id() == me);
            if owns_handle {
                state.phase = Phase::Running;
                tracing::debug!(name = %self.config.name, "Worker re-armed from its own action");
            } else {
                tracing::debug!(name = %self.config.name, "Worker is being stopped, start ignored");
            }
            return Ok(());
        }

        while state.worker.is_some() {
            control.exited.wait(&mut state);
            if state.phase == Phase::Running {
                // Another caller started the successor while we waited
                return Ok(());
            }
        }

        let shared = Arc::clone(&self.shared);
        let handle = self
            .config
            .thread_builder()
            .spawn(move || run_loop(shared))
            .map_err(|source| SyncError::Spawn {
                name: self.config.name.clone(),
                source,
            })?;

        state.phase = Phase::Running;
        state.worker = Some(handle.thread().id());
        let previous = state.handle.replace(handle);
        drop(state);

        // Already signalled its exit, so this does not block for long
        if let Some(previous) = previous {
            if previous.join().is_err() {
                tracing::warn!(name = %self.config.name, "Previous worker had panicked");
            }
        }

        tracing::debug!(name = %self.config.name, "Worker started");
        Ok(())
    }

    /// Stop the worker and wait for it to exit
    pub fn stop(&self) {
        self.stop_with(true);
    }

    /// Stop the worker without waiting; it finishes its current action and
    /// exits on its own
    pub fn stop_detached(&self) {
        self.stop_with(false);
    }

    /// Stop the worker, joining it when `wait` is true and detaching it
    /// otherwise. No-op when already stopped.
    ///
    /// From inside the action this behaves like
    /// [`stop_on_next_loop`](Self::stop_on_next_loop), since a thread cannot
    /// join itself.
    pub fn stop_with(&self, wait: bool) {
        let mut state = self.shared.control.state.lock();
        if state.phase == Phase::Stopped {
            return;
        }
        state.phase = Phase::Stopped;

        if state.worker == Some(thread::current().id()) {
            return;
        }

        let handle = state.handle.take();
        drop(state);

        match handle {
            Some(handle) if wait => {
                if handle.join().is_err() {
                    tracing::warn!(name = %self.config.name, "Joined worker had panicked");
                }
                tracing::debug!(name = %self.config.name, "Worker stopped");
            }
            Some(_detached) => {
                tracing::debug!(name = %self.config.name, "Worker detached");
            }
            None => {}
        }
    }

    /// Check whether the worker is set to run
    pub fn is_started(&self) -> bool {
        self.shared.control.is_started()
    }

    /// Let the action finish its current call, then end the loop.
    ///
    /// Unlike the `stop` methods, the worker is neither joined nor detached.
    /// Equivalent to [`LoopControl::stop_on_next_loop`].
    pub fn stop_on_next_loop(&self) {
        self.shared.control.stop_on_next_loop();
    }

    /// Access the action, e.g. to read state it accumulated
    pub fn action(&self) -> &A {
        &self.shared.action
    }

    /// Worker thread configuration
    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }
}

impl<A: Action> Drop for ActiveObject<A> {
    fn drop(&mut self) {
        self.stop();

        let control = &self.shared.control;
        if control.state.lock().worker == Some(thread::current().id()) {
            // Dropped from inside the action: the loop is already stopped
            // and ends after this call. The handle goes with the shared state.
            tracing::debug!(name = %self.config.name, "Dropped on its own worker thread");
            return;
        }

        // Self-stopped and detached workers still hold the shared state
        control.wait_for_exit();
        let handle = control.state.lock().handle.take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                tracing::warn!(name = %self.config.name, "Joined worker had panicked");
            }
        }
    }
}
