use crate::error::BufferError;
use parking_lot::{Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// State guarded by a [`Monitor`].
pub(crate) trait MonitorState {
    /// Whether there is nothing left for a consumer to read.
    fn is_drained(&self) -> bool;
    fn is_interrupted(&self) -> bool;
    fn set_interrupted(&mut self, interrupted: bool);
}

/// A mutex paired with a single condition variable.
///
/// Every state change calls [`Monitor::notify`], and every waiter re-checks its
/// own predicate after waking, so one condition variable serves consumers,
/// blocked producers and drain waiters alike.
#[derive(Debug)]
pub(crate) struct Monitor<S> {
    state: Mutex<S>,
    changed: Condvar,
}

impl<S: MonitorState> Monitor<S> {
    pub(crate) fn new(state: S) -> Self {
        Self {
            state: Mutex::new(state),
            changed: Condvar::new(),
        }
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, S> {
        self.state.lock()
    }

    pub(crate) fn notify(&self) {
        self.changed.notify_all();
    }

    pub(crate) fn wait(&self, guard: &mut MutexGuard<'_, S>) {
        self.changed.wait(guard);
    }

    /// Waits until the state has something to read, then hands it to `take`.
    ///
    /// Returns `Interrupted` if the wait was cut short and `take` found
    /// nothing.
    pub(crate) fn wait_for_element<R>(
        &self,
        take: impl FnOnce(&mut S) -> Option<R>,
    ) -> Result<R, BufferError> {
        let mut guard = self.state.lock();
        while !guard.is_interrupted() && guard.is_drained() {
            self.changed.wait(&mut guard);
        }
        let result = take(&mut guard);
        self.changed.notify_all();
        result.ok_or(BufferError::Interrupted)
    }

    /// Like [`Monitor::wait_for_element`], but gives up at `deadline` and
    /// returns `Ok(None)` if nothing arrived by then.
    pub(crate) fn wait_for_element_until<R>(
        &self,
        deadline: Instant,
        take: impl FnOnce(&mut S) -> Option<R>,
    ) -> Result<Option<R>, BufferError> {
        let mut guard = self.state.lock();
        while !guard.is_interrupted() && guard.is_drained() {
            if self.changed.wait_until(&mut guard, deadline).timed_out() {
                break;
            }
        }
        let result = take(&mut guard);
        self.changed.notify_all();
        match result {
            None if guard.is_interrupted() => Err(BufferError::Interrupted),
            result => Ok(result),
        }
    }

    pub(crate) fn wait_until_drained(&self, timeout: Duration) -> bool {
        let mut guard = self.state.lock();
        if timeout.is_zero() {
            while !guard.is_interrupted() && !guard.is_drained() {
                self.changed.wait(&mut guard);
            }
        } else {
            let deadline = Instant::now() + timeout;
            while !guard.is_interrupted() && !guard.is_drained() {
                if self.changed.wait_until(&mut guard, deadline).timed_out() {
                    break;
                }
            }
        }
        guard.is_drained()
    }

    pub(crate) fn interrupt(&self, interrupt: bool) {
        self.state.lock().set_interrupted(interrupt);
        self.changed.notify_all();
    }
}
