//! Cancellable asynchronous operations
//!
//! [`spawn_operation`] runs a future on the Tokio runtime and returns a
//! [`CancelHandle`] straight away. The completion callback receives exactly
//! one `ok` flag, unless the handle is cancelled first, in which case it
//! never runs. Errors and panics inside the future are logged and reported
//! as `false`; they never reach the caller.
//!
//! A chain of dependent calls is one future awaiting each step in turn, so
//! cancelling its handle abandons whichever step is outstanding while steps
//! that already finished stay committed.

use crate::error::SyncResult;
use futures::FutureExt;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex};
use tokio::task::AbortHandle;

/// Callback receiving the outcome of an operation
pub type Completion = Box<dyn FnOnce(bool) + Send + 'static>;

const RUNNING: u8 = 0;
const CANCELLED: u8 = 1;
const FINISHED: u8 = 2;

struct HandleState {
    name: String,
    phase: AtomicU8,
    abort: Mutex<Option<AbortHandle>>,
}

/// Requests that an outstanding operation be abandoned
///
/// Cloning yields another handle to the same operation. Cancelling is
/// idempotent and a no-op once the operation has completed.
#[derive(Clone)]
pub struct CancelHandle {
    state: Arc<HandleState>,
}

impl CancelHandle {
    fn new(name: String) -> Self {
        Self {
            state: Arc::new(HandleState {
                name,
                phase: AtomicU8::new(RUNNING),
                abort: Mutex::new(None),
            }),
        }
    }

    /// A handle for work that finished inline; cancelling it does nothing
    pub fn completed(name: impl Into<String>) -> Self {
        let handle = Self::new(name.into());
        handle.state.phase.store(FINISHED, Ordering::Release);
        handle
    }

    /// Abandons the operation and suppresses its callback
    pub fn cancel(&self) {
        if self
            .state
            .phase
            .compare_exchange(RUNNING, CANCELLED, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }

        let abort = match self.state.abort.lock() {
            Ok(mut slot) => slot.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(abort) = abort {
            abort.abort();
        }
        log::info!("{} cancelled", self.state.name);
    }

    pub fn is_cancelled(&self) -> bool {
        self.state.phase.load(Ordering::Acquire) == CANCELLED
    }

    /// True once the callback has been delivered
    pub fn is_finished(&self) -> bool {
        self.state.phase.load(Ordering::Acquire) == FINISHED
    }

    /// Claims the right to deliver the outcome
    fn finish(&self) -> bool {
        self.state
            .phase
            .compare_exchange(RUNNING, FINISHED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

impl std::fmt::Debug for CancelHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancelHandle")
            .field("name", &self.state.name)
            .field("phase", &self.state.phase.load(Ordering::Relaxed))
            .finish()
    }
}

/// Starts `operation` and delivers its outcome to `on_complete`
///
/// Must be called from within a Tokio runtime.
pub fn spawn_operation<F, T, C>(name: impl Into<String>, operation: F, on_complete: C) -> CancelHandle
where
    F: Future<Output = SyncResult<T>> + Send + 'static,
    T: Send + 'static,
    C: FnOnce(bool) + Send + 'static,
{
    let handle = CancelHandle::new(name.into());
    let task_handle = handle.clone();

    // The slot stays locked until the abort handle is stored, so a cancel
    // racing with the spawn still reaches the task.
    let mut slot = match handle.state.abort.lock() {
        Ok(slot) => slot,
        Err(poisoned) => poisoned.into_inner(),
    };

    let task = tokio::spawn(async move {
        let name = task_handle.state.name.clone();
        let ok = match AssertUnwindSafe(operation).catch_unwind().await {
            Ok(Ok(_)) => true,
            Ok(Err(e)) => {
                log::warn!("{} failed: {}", name, e);
                false
            }
            Err(panic) => {
                log::error!("{} panicked: {}", name, panic_message(panic.as_ref()));
                false
            }
        };

        if task_handle.finish() {
            on_complete(ok);
        } else {
            log::debug!("{} finished after cancellation, outcome discarded", name);
        }
    });

    if handle.is_cancelled() {
        task.abort();
    } else {
        *slot = Some(task.abort_handle());
    }
    drop(slot);

    handle
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SyncError;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;
    use tokio::sync::oneshot;

    #[tokio::test]
    async fn test_success_delivers_true() {
        let (tx, rx) = oneshot::channel();
        let handle = spawn_operation("ok", async { Ok::<_, SyncError>(()) }, move |ok| {
            let _ = tx.send(ok);
        });

        assert!(rx.await.unwrap());
        assert!(handle.is_finished());
    }

    #[tokio::test]
    async fn test_error_delivers_false() {
        let (tx, rx) = oneshot::channel();
        spawn_operation("err", async { Err::<(), _>(SyncError::NotJoined) }, move |ok| {
            let _ = tx.send(ok);
        });

        assert!(!rx.await.unwrap());
    }

    #[tokio::test]
    async fn test_panic_delivers_false() {
        let (tx, rx) = oneshot::channel();
        spawn_operation(
            "panics",
            async {
                if true {
                    panic!("malformed response");
                }
                Ok::<_, SyncError>(())
            },
            move |ok| {
                let _ = tx.send(ok);
            },
        );

        assert!(!rx.await.unwrap());
    }

    #[tokio::test]
    async fn test_cancel_suppresses_callback() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let handle = spawn_operation(
            "hangs",
            async {
                futures::future::pending::<()>().await;
                Ok::<_, SyncError>(())
            },
            move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            },
        );

        tokio::task::yield_now().await;
        handle.cancel();
        handle.cancel();
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert!(handle.is_cancelled());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_cancel_after_completion_is_noop() {
        let (tx, rx) = oneshot::channel();
        let handle = spawn_operation("quick", async { Ok::<_, SyncError>(1) }, move |ok| {
            let _ = tx.send(ok);
        });

        assert!(rx.await.unwrap());
        handle.cancel();
        assert!(handle.is_finished());
        assert!(!handle.is_cancelled());
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");
        let payload: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(payload.as_ref()), "bang");
    }
}
