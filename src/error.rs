//! Errors produced by the engine itself.
//!
//! The error type `E` in [`Task<T, E>`](crate::Task) is a free type parameter
//! owned by the caller; the engine imposes no hierarchy on it. The one error
//! the engine can produce on its own account is [`Canceled`], reported by
//! [`Fork::join`](crate::Fork::join) when the forked execution was cancelled
//! before it settled.

use thiserror::Error;

/// The forked execution was cancelled before producing an outcome.
///
/// # Example
/// ```
/// use lazytask::{Canceled, Task};
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() {
///     let never: Task<u32, &str> = Task::new(|_| lazytask::CancelHandle::noop());
///     let fork = never.fork();
///     fork.cancel();
///     assert_eq!(fork.join().await, Err(Canceled));
/// }
/// ```
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("execution was canceled before it settled")]
pub struct Canceled;
