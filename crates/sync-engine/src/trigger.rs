//! Button-style trigger around one async operation at a time

use crate::operation::{CancelHandle, Completion};
use std::sync::{Arc, Mutex, MutexGuard};

/// Visible state of a trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerState {
    /// Idle, never run or reset
    Ready,
    /// An operation is outstanding
    Busy,
    /// The last operation succeeded
    Success,
    /// The last operation failed
    Failure,
}

struct TriggerInner {
    state: TriggerState,
    generation: u64,
    handle: Option<CancelHandle>,
}

/// Starts an operation on press; a press while busy cancels it instead
///
/// Completions from an operation that was cancelled or superseded are
/// ignored, so the state always reflects the latest press.
#[derive(Clone)]
pub struct Trigger {
    inner: Arc<Mutex<TriggerInner>>,
}

impl Trigger {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(TriggerInner {
                state: TriggerState::Ready,
                generation: 0,
                handle: None,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, TriggerInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn state(&self) -> TriggerState {
        self.lock().state
    }

    pub fn is_busy(&self) -> bool {
        self.state() == TriggerState::Busy
    }

    /// Presses the trigger and returns the resulting state
    ///
    /// `start` receives the completion to hand to the operation and returns
    /// its cancel handle. It is not called when the press cancels.
    pub fn press<S>(&self, start: S) -> TriggerState
    where
        S: FnOnce(Completion) -> CancelHandle,
    {
        let generation = {
            let mut inner = self.lock();
            if inner.state == TriggerState::Busy {
                Self::cancel_locked(&mut inner);
                return inner.state;
            }
            inner.generation += 1;
            inner.state = TriggerState::Busy;
            inner.generation
        };

        let weak = Arc::downgrade(&self.inner);
        let completion: Completion = Box::new(move |ok| {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            let mut inner = inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            if inner.generation == generation && inner.state == TriggerState::Busy {
                inner.state = if ok {
                    TriggerState::Success
                } else {
                    TriggerState::Failure
                };
                inner.handle = None;
            }
        });

        let handle = start(completion);

        let mut inner = self.lock();
        if inner.generation == generation && inner.state == TriggerState::Busy {
            inner.handle = Some(handle);
        }
        inner.state
    }

    /// Cancels anything outstanding and returns to `Ready`
    pub fn reset(&self) {
        let mut inner = self.lock();
        Self::cancel_locked(&mut inner);
    }

    fn cancel_locked(inner: &mut TriggerInner) {
        if let Some(handle) = inner.handle.take() {
            handle.cancel();
        }
        inner.generation += 1;
        inner.state = TriggerState::Ready;
    }
}

impl Default for Trigger {
    fn default() -> Self {
        Self::new()
    }
}
