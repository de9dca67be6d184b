//! # Timer leaves.
//!
//! [`sleep`] is the canonical cancellable leaf: a spawned future races the
//! tokio timer against a [`CancellationToken`], and the task's cancel handle
//! cancels the token. Everything timer-flavored in the crate (the retry
//! loop's delay phase, [`Task::delayed`]) is built on it.
//!
//! Timer-backed tasks must be started from within a tokio runtime context.

use std::time::Duration;

use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::task::{CancelHandle, Settler, Task};

/// Task that resolves with `()` after `duration`.
///
/// Cancelling it mid-wait stops the timer; the execution then never settles.
///
/// # Example
/// ```
/// use std::time::Duration;
/// use lazytask::{sleep, Task};
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() {
///     let nap: Task<(), &str> = sleep(Duration::from_millis(5));
///     assert_eq!(nap.run().await, Ok(()));
/// }
/// ```
pub fn sleep<E>(duration: Duration) -> Task<(), E>
where
    E: Send + 'static,
{
    Task::new(move |settler: Settler<(), E>| {
        let stop = CancellationToken::new();
        let watch = stop.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = time::sleep(duration) => {
                    settler.resolve(());
                }
                _ = watch.cancelled() => {}
            }
        });
        CancelHandle::new(move || stop.cancel())
    })
}

impl<T, E> Task<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    /// Starts the receiver after a cancellable delay.
    pub fn delayed(self, duration: Duration) -> Task<T, E> {
        sleep(duration).and_then(move |_| self.clone())
    }
}
