//! # Cancellation handles and the live-handle slot.
//!
//! Every start returns a [`CancelHandle`]: an idempotent procedure that stops
//! the in-flight execution if it has not settled yet. For composed tasks the
//! handle must always aim at whichever stage is *currently* running, not the
//! stage that was running when the composition started. [`CancelSlot`] is that
//! indirection: a per-execution cell holding the current stage's handle, which
//! the composition machinery advances as control moves forward.
//!
//! ```text
//! start ──► stage 1 runs        slot: [cancel stage 1]
//!             │ settles Ok
//!             ▼
//!           stage 2 runs        slot: [cancel stage 2]
//!
//! cancel() at any moment cancels whatever the slot holds *now*.
//! ```
//!
//! ## Rules
//! - Cancelling twice, or after settlement, is a no-op and never panics.
//! - A handle stored into an already-cancelled slot is cancelled on arrival,
//!   so a stage that won a start/cancel race still gets stopped.
//! - Stores carry a sequence token: when a stage settles synchronously inside
//!   `start`, the continuation has already advanced the slot before `start`
//!   returns, and the caller's late store of the first stage's (spent) handle
//!   is recognized as stale and dropped.

use std::fmt;
use std::mem;
use std::sync::{Arc, Mutex};

type CancelFn = Box<dyn FnOnce() + Send>;

/// Idempotent cancellation procedure returned by every start.
///
/// Cloning shares the underlying one-shot action: whichever clone cancels
/// first runs it, the rest become no-ops.
#[derive(Clone)]
pub struct CancelHandle {
    action: Arc<Mutex<Option<CancelFn>>>,
}

impl CancelHandle {
    /// Wraps a cancellation procedure. The procedure runs at most once.
    pub fn new<F>(action: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            action: Arc::new(Mutex::new(Some(Box::new(action)))),
        }
    }

    /// A handle with nothing to stop. Used by leaves that settle immediately
    /// and by adapters over external work that cannot be stopped.
    pub fn noop() -> Self {
        Self {
            action: Arc::new(Mutex::new(None)),
        }
    }

    /// Requests cancellation. Safe to call any number of times, before or
    /// after the execution settles.
    pub fn cancel(&self) {
        let action = self.action.lock().unwrap().take();
        if let Some(action) = action {
            action();
        }
    }

    /// Returns `true` once the underlying action has run (or never existed).
    pub fn is_spent(&self) -> bool {
        self.action.lock().unwrap().is_none()
    }
}

impl Default for CancelHandle {
    fn default() -> Self {
        Self::noop()
    }
}

impl fmt::Debug for CancelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelHandle")
            .field("spent", &self.is_spent())
            .finish()
    }
}

struct SlotInner {
    cancelled: bool,
    seq: u64,
    current: CancelHandle,
}

/// Per-execution cell holding the cancel handle of the live stage.
#[derive(Clone)]
pub(crate) struct CancelSlot {
    inner: Arc<Mutex<SlotInner>>,
}

impl CancelSlot {
    pub(crate) fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(SlotInner {
                cancelled: false,
                seq: 0,
                current: CancelHandle::noop(),
            })),
        }
    }

    /// Current sequence token, to be passed back via
    /// [`store_at`](CancelSlot::store_at).
    pub(crate) fn sequence(&self) -> u64 {
        self.inner.lock().unwrap().seq
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.inner.lock().unwrap().cancelled
    }

    /// Advances to a later stage unconditionally.
    pub(crate) fn store(&self, handle: CancelHandle) {
        let rejected = {
            let mut inner = self.inner.lock().unwrap();
            inner.seq += 1;
            if inner.cancelled {
                Some(handle)
            } else {
                inner.current = handle;
                None
            }
        };
        if let Some(handle) = rejected {
            handle.cancel();
        }
    }

    /// Stores only if no stage has advanced the slot since `token` was read.
    /// A stale store means the stage settled synchronously and its
    /// continuation already moved on; the spent handle is dropped.
    pub(crate) fn store_at(&self, token: u64, handle: CancelHandle) {
        let rejected = {
            let mut inner = self.inner.lock().unwrap();
            if inner.cancelled {
                Some(handle)
            } else if inner.seq == token {
                inner.seq += 1;
                inner.current = handle;
                None
            } else {
                None
            }
        };
        if let Some(handle) = rejected {
            handle.cancel();
        }
    }

    /// Cancels whatever stage is live. Idempotent.
    pub(crate) fn cancel(&self) {
        let live = {
            let mut inner = self.inner.lock().unwrap();
            if inner.cancelled {
                return;
            }
            inner.cancelled = true;
            mem::take(&mut inner.current)
        };
        live.cancel();
    }

    /// A handle that cancels through the slot, reading the live stage at the
    /// moment cancellation is requested.
    pub(crate) fn to_handle(&self) -> CancelHandle {
        let slot = self.clone();
        CancelHandle::new(move || slot.cancel())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn probe(hits: &Arc<AtomicUsize>) -> CancelHandle {
        let hits = Arc::clone(hits);
        CancelHandle::new(move || {
            hits.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn cancel_is_idempotent() {
        let hits = Arc::new(AtomicUsize::new(0));
        let handle = probe(&hits);

        handle.cancel();
        handle.cancel();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(handle.is_spent());
    }

    #[test]
    fn clones_share_the_action() {
        let hits = Arc::new(AtomicUsize::new(0));
        let handle = probe(&hits);
        let other = handle.clone();

        other.cancel();
        handle.cancel();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn noop_is_callable() {
        let handle = CancelHandle::noop();
        handle.cancel();
        assert!(handle.is_spent());
    }

    #[test]
    fn slot_cancel_hits_the_live_stage() {
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));
        let slot = CancelSlot::new();

        slot.store(probe(&first));
        slot.store(probe(&second));
        slot.cancel();

        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn store_after_cancel_cancels_on_arrival() {
        let hits = Arc::new(AtomicUsize::new(0));
        let slot = CancelSlot::new();

        slot.cancel();
        assert!(slot.is_cancelled());
        slot.store(probe(&hits));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn stale_store_is_dropped() {
        let early = Arc::new(AtomicUsize::new(0));
        let late = Arc::new(AtomicUsize::new(0));
        let slot = CancelSlot::new();

        let token = slot.sequence();
        // a continuation advances the slot before the caller stores
        slot.store(probe(&late));
        slot.store_at(token, probe(&early));

        slot.cancel();
        assert_eq!(early.load(Ordering::SeqCst), 0);
        assert_eq!(late.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn slot_cancel_is_idempotent() {
        let hits = Arc::new(AtomicUsize::new(0));
        let slot = CancelSlot::new();
        slot.store(probe(&hits));

        let handle = slot.to_handle();
        handle.cancel();
        handle.cancel();
        slot.cancel();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
