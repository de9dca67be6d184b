//! # Bridging between tasks and native futures.
//!
//! Inbound, [`Task::from_future`] and [`Task::and_then_future`] adapt work
//! expressed as a [`Future`] into the task world: the future is spawned on
//! tokio and its output forwarded. A spawned future cannot be stopped by this
//! crate's cancel handle; cancellation only detaches delivery (the settler is
//! disarmed), and the future runs on in the background. That limitation is
//! part of the contract, not a defect: the external primitive is not assumed
//! cancellable.
//!
//! Outbound, [`Task::run`] and the [`IntoFuture`] impl turn one execution of
//! a task into a future for `async` call sites. The adapter is one-shot and
//! non-cancellable: there is no handle to reach once the task is a plain
//! future, and a task that never settles becomes a future that never
//! completes.

use std::future::{Future, IntoFuture};
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use tokio::sync::oneshot;

use crate::task::{CancelHandle, CancelSlot, Settler, Task};

impl<T, E> Task<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    /// Wraps a producer of futures as a leaf task.
    ///
    /// Each start calls `producer` once and spawns the returned future. The
    /// leaf's cancel handle is a no-op; see the module docs for the
    /// detach-not-abort semantics.
    ///
    /// # Example
    /// ```
    /// use lazytask::Task;
    ///
    /// #[tokio::main(flavor = "current_thread")]
    /// async fn main() {
    ///     let fetched: Task<u32, &str> = Task::from_future(|| async { Ok(7) });
    ///     assert_eq!(fetched.run().await, Ok(7));
    /// }
    /// ```
    pub fn from_future<F, Fut>(producer: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        Task::new(move |settler: Settler<T, E>| {
            let fut = producer();
            tokio::spawn(async move {
                settler.settle(fut.await);
            });
            CancelHandle::noop()
        })
    }

    /// Sequences a future on success; the future-returning sibling of
    /// [`and_then`](Task::and_then).
    ///
    /// Before the future is spawned, cancelling cancels the first stage;
    /// afterwards cancellation only detaches delivery.
    pub fn and_then_future<U, F, Fut>(self, f: F) -> Task<U, E>
    where
        U: Send + 'static,
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<U, E>> + Send + 'static,
    {
        let f = Arc::new(f);
        Task::new(move |settler: Settler<U, E>| {
            let f = Arc::clone(&f);
            let slot = CancelSlot::new();
            let stage = slot.clone();
            let token = slot.sequence();
            let first = self.start(move |outcome| match outcome {
                Ok(value) => {
                    if stage.is_cancelled() {
                        return;
                    }
                    let fut = f(value);
                    tokio::spawn(async move {
                        settler.settle(fut.await);
                    });
                    // the spawned stage cannot be stopped, only detached
                    stage.store(CancelHandle::noop());
                }
                Err(error) => {
                    settler.reject(error);
                }
            });
            slot.store_at(token, first);
            slot.to_handle()
        })
    }

    /// Starts one execution and awaits its outcome.
    ///
    /// A task that never settles (for example `race` over an empty list)
    /// yields a future that never completes.
    pub async fn run(&self) -> Result<T, E> {
        let (tx, rx) = oneshot::channel();
        let _execution = self.start(move |outcome| {
            let _ = tx.send(outcome);
        });
        match rx.await {
            Ok(outcome) => outcome,
            // the execution dropped its settler without firing; by contract
            // it will never settle, so neither does this future
            Err(_) => std::future::pending().await,
        }
    }
}

impl<T, E> IntoFuture for Task<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    type Output = Result<T, E>;
    type IntoFuture = BoxFuture<'static, Result<T, E>>;

    /// One-shot consumption: `task.await` starts the task and yields its
    /// outcome.
    fn into_future(self) -> Self::IntoFuture {
        async move { self.run().await }.boxed()
    }
}
