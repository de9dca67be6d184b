//! # First-settlement-wins multiplexer.
//!
//! [`race`] starts every task back-to-back in index order; the first
//! settlement of either polarity becomes the outcome, and every other
//! still-outstanding task is cancelled before that outcome is forwarded.
//!
//! ## Rules
//! - Empty input never settles; the returned handle is callable and does
//!   nothing. This is a documented edge case, not an error.
//! - Every task in the list is given a chance to start, even when an earlier
//!   one settles synchronously during the start loop; a sibling started after
//!   the race is already decided is cancelled as soon as its start returns.
//! - Once decided, later settlements from other entries are ignored, but
//!   their per-entry bookkeeping is still recorded so no handle is cancelled
//!   twice.
//! - Cancelling the race before any settlement cancels all outstanding
//!   entries.

use std::mem;
use std::sync::{Arc, Mutex};

use crate::task::{CancelHandle, Settler, Task};

struct RaceEntry {
    settled: bool,
    cancel: CancelHandle,
}

struct RaceBoard {
    entries: Vec<RaceEntry>,
    done: bool,
}

/// Races every task in `tasks`; the first settlement wins.
///
/// # Example
/// ```
/// use std::sync::{Arc, Mutex};
/// use lazytask::{race, Task};
///
/// let first: Task<u32, &str> = race([Task::succeed(1), Task::succeed(2)]);
///
/// let seen = Arc::new(Mutex::new(None));
/// let sink = Arc::clone(&seen);
/// first.start(move |o| *sink.lock().unwrap() = Some(o));
/// assert_eq!(*seen.lock().unwrap(), Some(Ok(1)));
/// ```
pub fn race<T, E, I>(tasks: I) -> Task<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
    I: IntoIterator<Item = Task<T, E>>,
{
    let tasks: Vec<Task<T, E>> = tasks.into_iter().collect();
    Task::new(move |settler: Settler<T, E>| {
        if tasks.is_empty() {
            // nothing can ever settle; the settler is dropped unfired
            return CancelHandle::noop();
        }

        let board = Arc::new(Mutex::new(RaceBoard {
            entries: tasks
                .iter()
                .map(|_| RaceEntry {
                    settled: false,
                    cancel: CancelHandle::noop(),
                })
                .collect(),
            done: false,
        }));

        for (index, task) in tasks.iter().enumerate() {
            let handle = {
                let board = Arc::clone(&board);
                let settler = settler.clone();
                task.start(move |outcome| decide(index, outcome, &board, &settler))
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

fn decide<T, E>(
    index: usize,
    outcome: Result<T, E>,
    board: &Arc<Mutex<RaceBoard>>,
    settler: &Settler<T, E>,
) {
    let losers = {
        let mut b = board.lock().unwrap();
        if b.entries[index].settled {
            return;
        }
        b.entries[index].settled = true;
        b.entries[index].cancel = CancelHandle::noop();
        if b.done {
            // a loser settled after the race was decided
            return;
        }
        b.done = true;
        b.entries
            .iter_mut()
            .filter(|e| !e.settled)
            .map(|e| mem::take(&mut e.cancel))
            .collect::<Vec<CancelHandle>>()
    };

    // losers are fully cancelled before the outcome is forwarded
    for handle in losers {
        handle.cancel();
    }
    settler.settle(outcome);
}
