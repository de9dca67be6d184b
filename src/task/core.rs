//! # The Task value and its execution contract.
//!
//! A [`Task`] is a pure description of a computation that settles exactly once
//! with `Ok(T)` or `Err(E)`. Building a task (directly or through combinators)
//! performs no work; work begins when [`start`](Task::start) is called, and
//! every start is an independent execution with its own settler and cancel
//! handle. The same task value can be started zero, one, or many times.
//!
//! ## Rules
//! - `start` never panics for outcome reasons; all outcomes, including
//!   failures, arrive through the settle callback.
//! - The returned [`CancelHandle`] disarms the settler before stopping the
//!   underlying execution, so after cancel no callback fires, even if a leaf
//!   ignores its cancel request and keeps running in the background.
//! - Cancel is idempotent and safe after settlement.

use std::sync::Arc;

use super::cancel::CancelHandle;
use super::settle::Settler;

type Computation<T, E> = dyn Fn(Settler<T, E>) -> CancelHandle + Send + Sync;

/// Lazy, reusable description of a computation with one success/failure
/// outcome.
///
/// Cloning is cheap and shares the description, never an execution.
///
/// # Example
/// ```
/// use std::sync::{Arc, Mutex};
/// use lazytask::Task;
///
/// let task: Task<u32, &str> = Task::succeed(20).map(|n| n + 1);
///
/// let seen = Arc::new(Mutex::new(None));
/// let sink = Arc::clone(&seen);
/// task.start(move |outcome| {
///     *sink.lock().unwrap() = Some(outcome);
/// });
/// assert_eq!(*seen.lock().unwrap(), Some(Ok(21)));
/// ```
#[must_use = "tasks are lazy and do nothing until started"]
pub struct Task<T, E> {
    run: Arc<Computation<T, E>>,
}

impl<T, E> Clone for Task<T, E> {
    fn clone(&self) -> Self {
        Self {
            run: Arc::clone(&self.run),
        }
    }
}

impl<T, E> Task<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    /// Builds a leaf task from a raw computation.
    ///
    /// The computation is invoked once per start with a fresh [`Settler`];
    /// it should begin work (synchronously or by scheduling asynchronous
    /// work) and return the handle that stops that work. Leaves with nothing
    /// to stop return [`CancelHandle::noop`].
    ///
    /// # Example
    /// ```
    /// use lazytask::{CancelHandle, Task};
    ///
    /// let parse: Task<u32, String> = Task::new(|settler| {
    ///     match "42".parse() {
    ///         Ok(n) => settler.resolve(n),
    ///         Err(e) => settler.reject(format!("{e}")),
    ///     };
    ///     CancelHandle::noop()
    /// });
    /// ```
    pub fn new<F>(computation: F) -> Self
    where
        F: Fn(Settler<T, E>) -> CancelHandle + Send + Sync + 'static,
    {
        Self {
            run: Arc::new(computation),
        }
    }

    /// Task that immediately resolves with a copy of `value` on every start.
    pub fn succeed(value: T) -> Self
    where
        T: Clone + Sync,
    {
        Self::new(move |settler| {
            settler.resolve(value.clone());
            CancelHandle::noop()
        })
    }

    /// Task that immediately resolves with a freshly minted value. Use this
    /// when the value type is not `Clone` or each start should observe a new
    /// value.
    pub fn succeed_with<F>(make: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self::new(move |settler| {
            settler.resolve(make());
            CancelHandle::noop()
        })
    }

    /// Task that immediately rejects with a copy of `error` on every start.
    pub fn fail(error: E) -> Self
    where
        E: Clone + Sync,
    {
        Self::new(move |settler| {
            settler.reject(error.clone());
            CancelHandle::noop()
        })
    }

    /// Task that immediately rejects with a freshly minted error.
    pub fn fail_with<F>(make: F) -> Self
    where
        F: Fn() -> E + Send + Sync + 'static,
    {
        Self::new(move |settler| {
            settler.reject(make());
            CancelHandle::noop()
        })
    }

    /// Begins one execution of the task.
    ///
    /// `on_settle` receives the outcome, at most once. Ownership of the
    /// returned [`CancelHandle`] transfers to the caller; dropping it does
    /// not cancel (an execution nobody holds a handle for simply runs to
    /// settlement).
    pub fn start<F>(&self, on_settle: F) -> CancelHandle
    where
        F: FnOnce(Result<T, E>) + Send + 'static,
    {
        let settler = Settler::new(Box::new(on_settle));
        let execution = (self.run)(settler.clone());
        CancelHandle::new(move || {
            settler.disarm();
            execution.cancel();
        })
    }
}
