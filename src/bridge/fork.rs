//! # Fork: start plus a join handle.
//!
//! [`Task::fork`] starts an execution and keeps both ends: the cancel handle
//! and a receiver for the outcome. It is the bridge for call sites that want
//! to race their own logic against a running task, or cancel it later, while
//! still awaiting its result.

use tokio::sync::oneshot;

use crate::error::Canceled;
use crate::task::{CancelHandle, Task};

/// A started execution: cancel it, or await its outcome.
pub struct Fork<T, E> {
    cancel: CancelHandle,
    outcome: oneshot::Receiver<Result<T, E>>,
}

impl<T, E> Task<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    /// Starts one execution and returns its [`Fork`].
    ///
    /// # Example
    /// ```
    /// use lazytask::Task;
    ///
    /// #[tokio::main(flavor = "current_thread")]
    /// async fn main() {
    ///     let fork = Task::<u32, &str>::succeed(6).fork();
    ///     assert_eq!(fork.join().await, Ok(Ok(6)));
    /// }
    /// ```
    pub fn fork(&self) -> Fork<T, E> {
        let (tx, rx) = oneshot::channel();
        let cancel = self.start(move |outcome| {
            let _ = tx.send(outcome);
        });
        Fork {
            cancel,
            outcome: rx,
        }
    }
}

impl<T, E> Fork<T, E> {
    /// Requests cancellation of the execution. Idempotent; a no-op once the
    /// execution has settled.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// A standalone handle for cancelling from elsewhere.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Awaits the outcome.
    ///
    /// Returns `Err(Canceled)` if the execution was cancelled before it
    /// settled. Joining an execution that never settles and is never
    /// cancelled waits forever, like the execution itself.
    pub async fn join(self) -> Result<Result<T, E>, Canceled> {
        let Fork { cancel, outcome } = self;
        // the handle keeps the settlement path alive until we are done waiting
        let _keep = cancel;
        outcome.await.map_err(|_| Canceled)
    }
}
