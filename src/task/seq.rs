//! # Sequencing combinators.
//!
//! Each combinator wraps a task in a new one; none of them mutates the
//! receiver and none performs work before start. Pure transforms (`map`,
//! `map_err`, `inspect`, `inspect_err`) forward cancellation straight to the
//! underlying execution. The staged combinators (`and_then`, `or_else`,
//! `also`) keep a [`CancelSlot`] per execution so that cancelling the
//! composition always cancels whichever stage is live, including a second
//! stage that was only chosen after the first settled.
//!
//! ```text
//! first.and_then(f):
//!
//!   start ──► first runs                     cancel ──► first
//!               │ Ok(v)
//!               ▼
//!             f(v) starts                    cancel ──► f(v)
//!               │ outcome
//!               ▼
//!             composition settles            cancel ──► no-op
//!
//!   Err(e) from `first` short-circuits; f is never called.
//! ```
//!
//! User closures are treated as total functions. Fallibility is expressed by
//! returning a failing [`Task`] from `and_then`, not by panicking; a panic in
//! a closure propagates to the caller of the settle path that invoked it.

use std::sync::Arc;

use super::cancel::CancelSlot;
use super::settle::Settler;
use super::Task;

impl<T, E> Task<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    /// Transforms the success value; failures pass through untouched.
    ///
    /// # Example
    /// ```
    /// use std::sync::{Arc, Mutex};
    /// use lazytask::Task;
    ///
    /// let task: Task<u32, &str> = Task::succeed(21).map(|n| n * 2);
    /// let seen = Arc::new(Mutex::new(None));
    /// let sink = Arc::clone(&seen);
    /// task.start(move |o| *sink.lock().unwrap() = Some(o));
    /// assert_eq!(*seen.lock().unwrap(), Some(Ok(42)));
    /// ```
    pub fn map<U, F>(self, f: F) -> Task<U, E>
    where
        U: Send + 'static,
        F: Fn(T) -> U + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        Task::new(move |settler: Settler<U, E>| {
            let f = Arc::clone(&f);
            self.start(move |outcome| match outcome {
                Ok(value) => {
                    settler.resolve(f(value));
                }
                Err(error) => {
                    settler.reject(error);
                }
            })
        })
    }

    /// Transforms the error; successes pass through untouched.
    pub fn map_err<E2, F>(self, f: F) -> Task<T, E2>
    where
        E2: Send + 'static,
        F: Fn(E) -> E2 + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        Task::new(move |settler: Settler<T, E2>| {
            let f = Arc::clone(&f);
            self.start(move |outcome| match outcome {
                Ok(value) => {
                    settler.resolve(value);
                }
                Err(error) => {
                    settler.reject(f(error));
                }
            })
        })
    }

    /// Sequences a second task on success.
    ///
    /// On `Ok(v)`, `f(v)` builds the second task and it is started in place;
    /// its outcome becomes the composition's outcome. On `Err`, `f` is never
    /// called. Cancellation targets the first stage until the second starts,
    /// then the second; once cancelled, the second stage is never started.
    pub fn and_then<U, F>(self, f: F) -> Task<U, E>
    where
        U: Send + 'static,
        F: Fn(T) -> Task<U, E> + Send + Sync + 'static,
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
                    let second = f(value).start(move |o| {
                        settler.settle(o);
                    });
                    stage.store(second);
                }
                Err(error) => {
                    settler.reject(error);
                }
            });
            slot.store_at(token, first);
            slot.to_handle()
        })
    }

    /// Sequences a fallback task on failure; the dual of
    /// [`and_then`](Task::and_then).
    ///
    /// On `Err(e)`, `f(e)` builds the fallback and its outcome is forwarded;
    /// on `Ok`, `f` is never called. The error type may change. Same
    /// live-stage cancellation contract as `and_then`.
    pub fn or_else<E2, F>(self, f: F) -> Task<T, E2>
    where
        E2: Send + 'static,
        F: Fn(E) -> Task<T, E2> + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        Task::new(move |settler: Settler<T, E2>| {
            let f = Arc::clone(&f);
            let slot = CancelSlot::new();
            let stage = slot.clone();
            let token = slot.sequence();
            let first = self.start(move |outcome| match outcome {
                Ok(value) => {
                    settler.resolve(value);
                }
                Err(error) => {
                    if stage.is_cancelled() {
                        return;
                    }
                    let fallback = f(error).start(move |o| {
                        settler.settle(o);
                    });
                    stage.store(fallback);
                }
            });
            slot.store_at(token, first);
            slot.to_handle()
        })
    }

    /// Runs a side effect on the success value without altering it.
    ///
    /// The effect sees `&T`, so it cannot change what is forwarded. Failures
    /// skip the effect.
    pub fn inspect<F>(self, f: F) -> Task<T, E>
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        Task::new(move |settler: Settler<T, E>| {
            let f = Arc::clone(&f);
            self.start(move |outcome| {
                if let Ok(value) = &outcome {
                    f(value);
                }
                settler.settle(outcome);
            })
        })
    }

    /// Runs a side effect on the error without altering it. Successes skip
    /// the effect.
    pub fn inspect_err<F>(self, f: F) -> Task<T, E>
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        Task::new(move |settler: Settler<T, E>| {
            let f = Arc::clone(&f);
            self.start(move |outcome| {
                if let Err(error) = &outcome {
                    f(error);
                }
                settler.settle(outcome);
            })
        })
    }

    /// Extends the success value with one more field, tuple-style.
    ///
    /// `f` receives the value built so far and returns the task producing the
    /// next piece; on its success the composition resolves with the pair.
    /// Built from `and_then` + `map`, so it inherits their short-circuit and
    /// live-stage cancellation behavior: if `f`'s task fails, the composition
    /// fails and later `also` stages never run.
    ///
    /// # Example
    /// ```
    /// use std::sync::{Arc, Mutex};
    /// use lazytask::Task;
    ///
    /// let record: Task<((u32, u32), String), &str> = Task::succeed(42)
    ///     .also(|_| Task::succeed(8))
    ///     .also(|&(x, y)| Task::succeed((x + y).to_string()));
    ///
    /// let seen = Arc::new(Mutex::new(None));
    /// let sink = Arc::clone(&seen);
    /// record.start(move |o| *sink.lock().unwrap() = Some(o));
    /// assert_eq!(
    ///     *seen.lock().unwrap(),
    ///     Some(Ok(((42, 8), "50".to_string())))
    /// );
    /// ```
    pub fn also<U, F>(self, f: F) -> Task<(T, U), E>
    where
        T: Clone + Sync,
        U: Send + 'static,
        F: Fn(&T) -> Task<U, E> + Send + Sync + 'static,
    {
        self.and_then(move |value| {
            let extra = f(&value);
            extra.map(move |u| (value.clone(), u))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::CancelHandle;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    type Seen<T> = Arc<Mutex<Option<Result<T, &'static str>>>>;

    fn sink<T: Send + 'static>() -> (Seen<T>, impl FnOnce(Result<T, &'static str>) + Send + 'static)
    {
        let seen: Seen<T> = Arc::new(Mutex::new(None));
        let slot = Arc::clone(&seen);
        (seen, move |outcome| {
            *slot.lock().unwrap() = Some(outcome);
        })
    }

    /// Leaf that never settles and counts cancellation requests.
    fn cancel_probe(hits: &Arc<AtomicUsize>) -> Task<u32, &'static str> {
        let hits = Arc::clone(hits);
        Task::new(move |_settler| {
            let hits = Arc::clone(&hits);
            CancelHandle::new(move || {
                hits.fetch_add(1, Ordering::SeqCst);
            })
        })
    }

    #[test]
    fn map_transforms_success_only() {
        let (seen, on_settle) = sink();
        Task::<u32, &'static str>::succeed(3)
            .map(|n| n * 10)
            .start(on_settle);
        assert_eq!(*seen.lock().unwrap(), Some(Ok(30)));

        let called = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&called);
        let (seen, on_settle) = sink::<u32>();
        Task::<u32, &'static str>::fail("nope")
            .map(move |n| {
                flag.store(true, Ordering::SeqCst);
                n
            })
            .start(on_settle);
        assert_eq!(*seen.lock().unwrap(), Some(Err("nope")));
        assert!(!called.load(Ordering::SeqCst));
    }

    #[test]
    fn map_err_transforms_failure_only() {
        let (seen, on_settle) = sink::<u32>();
        Task::<u32, u32>::fail(4)
            .map_err(|_| "mapped")
            .start(on_settle);
        assert_eq!(*seen.lock().unwrap(), Some(Err("mapped")));
    }

    #[test]
    fn and_then_behaves_like_the_inner_task() {
        let (seen, on_settle) = sink();
        Task::<u32, &'static str>::succeed(2)
            .and_then(|n| Task::succeed(n + 1))
            .start(on_settle);
        assert_eq!(*seen.lock().unwrap(), Some(Ok(3)));
    }

    #[test]
    fn and_then_short_circuits_on_failure() {
        let called = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&called);
        let (seen, on_settle) = sink::<u32>();
        Task::<u32, &'static str>::fail("early")
            .and_then(move |n| {
                flag.store(true, Ordering::SeqCst);
                Task::succeed(n)
            })
            .start(on_settle);
        assert_eq!(*seen.lock().unwrap(), Some(Err("early")));
        assert!(!called.load(Ordering::SeqCst));
    }

    #[test]
    fn or_else_recovers_from_failure() {
        let (seen, on_settle) = sink();
        Task::<u32, &'static str>::fail("down")
            .or_else(|_| Task::<u32, &'static str>::succeed(9))
            .start(on_settle);
        assert_eq!(*seen.lock().unwrap(), Some(Ok(9)));
    }

    #[test]
    fn or_else_skips_on_success() {
        let called = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&called);
        let (seen, on_settle) = sink();
        Task::<u32, &'static str>::succeed(1)
            .or_else(move |e: &'static str| {
                flag.store(true, Ordering::SeqCst);
                Task::fail(e)
            })
            .start(on_settle);
        assert_eq!(*seen.lock().unwrap(), Some(Ok(1)));
        assert!(!called.load(Ordering::SeqCst));
    }

    #[test]
    fn cancel_hits_the_first_stage_while_it_runs() {
        let hits = Arc::new(AtomicUsize::new(0));
        let handle = cancel_probe(&hits)
            .and_then(Task::succeed)
            .start(|_| {});

        handle.cancel();
        handle.cancel();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn cancel_redirects_into_the_second_stage() {
        let hits = Arc::new(AtomicUsize::new(0));
        let probe = cancel_probe(&hits);
        let handle = Task::<u32, &'static str>::succeed(1)
            .and_then(move |_| probe.clone())
            .start(|_| {});

        // the first stage settled synchronously; the probe is now live
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        handle.cancel();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn cancel_redirects_into_the_fallback_stage() {
        let hits = Arc::new(AtomicUsize::new(0));
        let probe = cancel_probe(&hits);
        let handle = Task::<u32, &'static str>::fail("down")
            .or_else(move |_| probe.clone())
            .start(|_| {});

        handle.cancel();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn inspect_observes_without_altering() {
        let seen_value = Arc::new(AtomicUsize::new(0));
        let observer = Arc::clone(&seen_value);
        let (seen, on_settle) = sink();
        Task::<u32, &'static str>::succeed(5)
            .inspect(move |n| observer.store(*n as usize, Ordering::SeqCst))
            .start(on_settle);

        assert_eq!(*seen.lock().unwrap(), Some(Ok(5)));
        assert_eq!(seen_value.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn inspect_err_skips_success() {
        let called = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&called);
        let (seen, on_settle) = sink();
        Task::<u32, &'static str>::succeed(5)
            .inspect_err(move |_| flag.store(true, Ordering::SeqCst))
            .start(on_settle);

        assert_eq!(*seen.lock().unwrap(), Some(Ok(5)));
        assert!(!called.load(Ordering::SeqCst));
    }

    #[test]
    fn also_builds_the_record_field_by_field() {
        let (seen, on_settle) = sink();
        Task::<u32, &'static str>::succeed(42)
            .also(|_| Task::succeed(8))
            .also(|&(x, y)| Task::succeed((x + y).to_string()))
            .start(on_settle);

        assert_eq!(
            *seen.lock().unwrap(),
            Some(Ok(((42, 8), "50".to_string())))
        );
    }

    #[test]
    fn also_short_circuits_and_skips_later_stages() {
        let later_ran = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&later_ran);
        let (seen, on_settle) = sink::<((u32, u32), u32)>();
        Task::<u32, &'static str>::succeed(42)
            .also(|_| Task::<u32, &'static str>::fail("mid"))
            .also(move |_| {
                flag.store(true, Ordering::SeqCst);
                Task::succeed(0)
            })
            .start(on_settle);

        assert_eq!(*seen.lock().unwrap(), Some(Err("mid")));
        assert!(!later_ran.load(Ordering::SeqCst));
    }
}
