//! # Settlement cell: the at-most-once resolve/reject pair.
//!
//! A started task reports its outcome through a [`Settler`]. The settler wraps
//! a single settle callback behind a shared cell; the first call to
//! [`resolve`](Settler::resolve) or [`reject`](Settler::reject) takes the
//! callback out and invokes it, every later call finds the cell empty and does
//! nothing. This is what makes "at most one of {resolve, reject}, at most
//! once" a structural property instead of a convention each leaf has to get
//! right.
//!
//! ## Rules
//! - First settlement wins; later settlements are silently dropped.
//! - The callback is invoked **outside** the cell lock, so a callback may
//!   itself settle, cancel, or start tasks without deadlocking.
//! - A disarmed settler (cell emptied without invoking) swallows every later
//!   settlement. Cancellation uses this to guarantee that no callback fires
//!   after cancel, even above a leaf that keeps running.

use std::fmt;
use std::sync::{Arc, Mutex};

type SettleFn<T, E> = Box<dyn FnOnce(Result<T, E>) + Send>;

/// Write-once outcome channel handed to a task's computation.
///
/// Cloning a settler shares the underlying cell: all clones race for the same
/// single settlement.
///
/// # Example
/// ```
/// use lazytask::{CancelHandle, Task};
///
/// let task: Task<u32, &str> = Task::new(|settler| {
///     settler.resolve(7);
///     settler.resolve(8); // dropped: the task already settled
///     CancelHandle::noop()
/// });
/// ```
pub struct Settler<T, E> {
    cell: Arc<Mutex<Option<SettleFn<T, E>>>>,
}

impl<T, E> Clone for Settler<T, E> {
    fn clone(&self) -> Self {
        Self {
            cell: Arc::clone(&self.cell),
        }
    }
}

impl<T, E> Settler<T, E> {
    pub(crate) fn new(on_settle: SettleFn<T, E>) -> Self {
        Self {
            cell: Arc::new(Mutex::new(Some(on_settle))),
        }
    }

    /// Settles with a success value. Returns `true` if this call performed
    /// the settlement, `false` if the task had already settled (or was
    /// disarmed).
    pub fn resolve(&self, value: T) -> bool {
        self.settle(Ok(value))
    }

    /// Settles with a failure. Same first-call-wins semantics as
    /// [`resolve`](Settler::resolve).
    pub fn reject(&self, error: E) -> bool {
        self.settle(Err(error))
    }

    /// Settles with an already-built outcome.
    pub fn settle(&self, outcome: Result<T, E>) -> bool {
        let callback = self.cell.lock().unwrap().take();
        match callback {
            Some(callback) => {
                callback(outcome);
                true
            }
            None => false,
        }
    }

    /// Returns `true` once the settler can no longer deliver an outcome,
    /// either because it settled or because it was disarmed.
    pub fn is_settled(&self) -> bool {
        self.cell.lock().unwrap().is_none()
    }

    /// Empties the cell without invoking the callback. Later settlements
    /// become no-ops.
    pub(crate) fn disarm(&self) {
        self.cell.lock().unwrap().take();
    }
}

impl<T, E> fmt::Debug for Settler<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settler")
            .field("settled", &self.is_settled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_settler(hits: &Arc<AtomicUsize>) -> Settler<u32, &'static str> {
        let hits = Arc::clone(hits);
        Settler::new(Box::new(move |_| {
            hits.fetch_add(1, Ordering::SeqCst);
        }))
    }

    #[test]
    fn first_settlement_wins() {
        let hits = Arc::new(AtomicUsize::new(0));
        let settler = counting_settler(&hits);

        assert!(settler.resolve(1));
        assert!(!settler.resolve(2));
        assert!(!settler.reject("late"));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn clones_share_the_cell() {
        let hits = Arc::new(AtomicUsize::new(0));
        let settler = counting_settler(&hits);
        let other = settler.clone();

        assert!(other.reject("boom"));
        assert!(settler.is_settled());
        assert!(!settler.resolve(3));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn disarm_swallows_later_settlements() {
        let hits = Arc::new(AtomicUsize::new(0));
        let settler = counting_settler(&hits);

        settler.disarm();
        assert!(settler.is_settled());
        assert!(!settler.resolve(1));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn callback_may_reenter_without_deadlock() {
        let settler: Settler<u32, &'static str> = Settler::new(Box::new(|_| {}));
        let inner = settler.clone();
        let outer: Settler<u32, &'static str> = Settler::new(Box::new(move |_| {
            // settling another cell from inside a settle callback must not block
            inner.resolve(9);
        }));
        assert!(outer.resolve(1));
        assert!(settler.is_settled());
    }
}
