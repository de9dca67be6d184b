//! # Fail-fast concurrent join.
//!
//! [`join_all`] starts every task back-to-back in index order and resolves
//! with all their values, in index order, once the last one succeeds. The
//! first failure settles the join immediately and cancels every sibling whose
//! outcome has not been recorded yet.
//!
//! ```text
//!            ┌─► task 0 ─► Ok(v0) ─┐
//!   start ───┼─► task 1 ─► Ok(v1) ─┼─► all settled ─► Ok([v0, v1, v2])
//!            └─► task 2 ─► Ok(v2) ─┘
//!
//!            ┌─► task 0 ─► Ok(v0)
//!   start ───┼─► task 1 ─► Err(e) ──► cancel task 2 ─► Err(e)
//!            └─► task 2 ─► (outstanding)
//! ```
//!
//! ## Rules
//! - Empty input resolves immediately with an empty `Vec`; nothing starts.
//! - An entry is marked inert (settled, no-op handle) before any
//!   cross-cutting action, so a loser is never cancelled twice.
//! - Settlement is exactly-once even when several tasks fail together; only
//!   the first observed failure is reported.
//! - If the join settles while later siblings are still being started, each
//!   remaining sibling is still started and then cancelled as soon as its
//!   start returns.
//! - Cancelling the join cancels every outstanding entry.

use std::mem;
use std::sync::{Arc, Mutex};

use crate::task::{CancelHandle, Settler, Task};

struct JoinEntry<T> {
    settled: bool,
    value: Option<T>,
    cancel: CancelHandle,
}

struct JoinBoard<T> {
    entries: Vec<JoinEntry<T>>,
    pending: usize,
    done: bool,
}

enum JoinAction<T, E> {
    Ignore,
    Resolve(Vec<T>),
    Reject(E, Vec<CancelHandle>),
}

/// Joins every task in `tasks`, failing fast on the first failure.
///
/// # Example
/// ```
/// use std::sync::{Arc, Mutex};
/// use lazytask::{join_all, Task};
///
/// let joined: Task<Vec<u32>, &str> =
///     join_all([Task::succeed(1), Task::succeed(2), Task::succeed(3)]);
///
/// let seen = Arc::new(Mutex::new(None));
/// let sink = Arc::clone(&seen);
/// joined.start(move |o| *sink.lock().unwrap() = Some(o));
/// assert_eq!(*seen.lock().unwrap(), Some(Ok(vec![1, 2, 3])));
/// ```
pub fn join_all<T, E, I>(tasks: I) -> Task<Vec<T>, E>
where
    T: Send + 'static,
    E: Send + 'static,
    I: IntoIterator<Item = Task<T, E>>,
{
    let tasks: Vec<Task<T, E>> = tasks.into_iter().collect();
    Task::new(move |settler: Settler<Vec<T>, E>| {
        if tasks.is_empty() {
            settler.resolve(Vec::new());
            return CancelHandle::noop();
        }

        let board = Arc::new(Mutex::new(JoinBoard {
            entries: tasks
                .iter()
                .map(|_| JoinEntry {
                    settled: false,
                    value: None,
                    cancel: CancelHandle::noop(),
                })
                .collect(),
            pending: tasks.len(),
            done: false,
        }));

        for (index, task) in tasks.iter().enumerate() {
            let handle = {
                let board = Arc::clone(&board);
                let settler = settler.clone();
                task.start(move |outcome| record(index, outcome, &board, &settler))
            };
            let late = {
                let mut b = board.lock().unwrap();
                if b.done {
                    Some(handle)
                } else if b.entries[index].settled {
                    None
                } else {
                    b.entries[index].cancel = handle;
                    None
                }
            };
            if let Some(handle) = late {
                handle.cancel();
            }
        }

        let board = Arc::clone(&board);
        CancelHandle::new(move || {
            let outstanding: Vec<CancelHandle> = {
                let mut b = board.lock().unwrap();
                if b.done {
                    return;
                }
                b.done = true;
                b.entries
                    .iter_mut()
                    .filter(|e| !e.settled)
                    .map(|e| mem::take(&mut e.cancel))
                    .collect()
            };
            for handle in outstanding {
                handle.cancel();
            }
        })
    })
}

fn record<T, E>(
    index: usize,
    outcome: Result<T, E>,
    board: &Arc<Mutex<JoinBoard<T>>>,
    settler: &Settler<Vec<T>, E>,
) {
    let action = {
        let mut b = board.lock().unwrap();
        if b.entries[index].settled {
            JoinAction::Ignore
        } else {
            b.entries[index].settled = true;
            b.entries[index].cancel = CancelHandle::noop();
            if b.done {
                // late settlement of a sibling after fail-fast or cancel
                JoinAction::Ignore
            } else {
                match outcome {
                    Ok(value) => {
                        b.entries[index].value = Some(value);
                        b.pending -= 1;
                        if b.pending == 0 {
                            b.done = true;
                            // pending == 0 means every entry holds its value
                            let mut values = Vec::with_capacity(b.entries.len());
                            for entry in &mut b.entries {
                                if let Some(value) = entry.value.take() {
                                    values.push(value);
                                }
                            }
                            JoinAction::Resolve(values)
                        } else {
                            JoinAction::Ignore
                        }
                    }
                    Err(error) => {
                        b.done = true;
                        let outstanding = b
                            .entries
                            .iter_mut()
                            .filter(|e| !e.settled)
                            .map(|e| mem::take(&mut e.cancel))
                            .collect();
                        JoinAction::Reject(error, outstanding)
                    }
                }
            }
        }
    };

    match action {
        JoinAction::Ignore => {}
        JoinAction::Resolve(values) => {
            settler.resolve(values);
        }
        JoinAction::Reject(error, outstanding) => {
            for handle in outstanding {
                handle.cancel();
            }
            settler.reject(error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    type Seen<T> = Arc<Mutex<Option<Result<T, &'static str>>>>;

    fn sink<T: Send + 'static>() -> (Seen<T>, impl FnOnce(Result<T, &'static str>) + Send + 'static)
    {
        let seen: Seen<T> = Arc::new(Mutex::new(None));
        let slot = Arc::clone(&seen);
        (seen, move |outcome| {
            *slot.lock().unwrap() = Some(outcome);
        })
    }

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
    fn empty_join_resolves_immediately() {
        let (seen, on_settle) = sink();
        let tasks: Vec<Task<u32, &'static str>> = Vec::new();
        join_all(tasks).start(on_settle);
        assert_eq!(*seen.lock().unwrap(), Some(Ok(Vec::new())));
    }

    #[test]
    fn values_arrive_in_index_order() {
        let (seen, on_settle) = sink();
        join_all([
            Task::<u32, &'static str>::succeed(1),
            Task::succeed(2),
            Task::succeed(3),
        ])
        .start(on_settle);
        assert_eq!(*seen.lock().unwrap(), Some(Ok(vec![1, 2, 3])));
    }

    #[test]
    fn first_failure_wins_and_cancels_outstanding_siblings() {
        let hits = Arc::new(AtomicUsize::new(0));
        let (seen, on_settle) = sink::<Vec<u32>>();
        join_all([
            Task::<u32, &'static str>::succeed(1),
            Task::fail("E"),
            cancel_probe(&hits),
        ])
        .start(on_settle);

        assert_eq!(*seen.lock().unwrap(), Some(Err("E")));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn concurrent_failures_settle_exactly_once() {
        let deliveries = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&deliveries);
        let seen: Seen<Vec<u32>> = Arc::new(Mutex::new(None));
        let slot = Arc::clone(&seen);
        join_all([
            Task::<u32, &'static str>::fail("first"),
            Task::fail("second"),
        ])
        .start(move |outcome| {
            counter.fetch_add(1, Ordering::SeqCst);
            *slot.lock().unwrap() = Some(outcome);
        });

        assert_eq!(deliveries.load(Ordering::SeqCst), 1);
        assert_eq!(*seen.lock().unwrap(), Some(Err("first")));
    }

    #[test]
    fn cancelling_the_join_cancels_every_outstanding_entry() {
        let left = Arc::new(AtomicUsize::new(0));
        let right = Arc::new(AtomicUsize::new(0));
        let handle = join_all([cancel_probe(&left), cancel_probe(&right)]).start(|_| {});

        handle.cancel();
        handle.cancel();
        assert_eq!(left.load(Ordering::SeqCst), 1);
        assert_eq!(right.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn completion_order_does_not_affect_value_order() {
        let slow = Task::<u32, &'static str>::succeed(1).delayed(Duration::from_millis(40));
        let fast = Task::succeed(2).delayed(Duration::from_millis(5));
        let outcome = join_all([slow, fast]).run().await;
        assert_eq!(outcome, Ok(vec![1, 2]));
    }

    #[tokio::test]
    async fn async_failure_cancels_the_still_pending_sibling() {
        let hits = Arc::new(AtomicUsize::new(0));
        let probe = cancel_probe(&hits);
        let failing = Task::<u32, &'static str>::fail("late").delayed(Duration::from_millis(10));
        let outcome = join_all([probe, failing]).run().await;

        assert_eq!(outcome, Err("late"));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
