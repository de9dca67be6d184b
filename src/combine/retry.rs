//! # Fixed-interval retry loop.
//!
//! [`retry_every`] keeps restarting a task until it succeeds: start it, and
//! on failure wait `every` and try again. There is no attempt bound; callers
//! who need one compose a counter into the wrapped task.
//!
//! ```text
//! loop {
//!   ├─► start task            slot: [cancel attempt]
//!   │     ├─ Ok(v)  ──► settle Ok(v), exit
//!   │     └─ Err(_) ──► start timer(every)
//!   │                       slot: [cancel timer]
//!   └─◄── timer fires, next attempt
//! }
//! ```
//!
//! ## Rules
//! - Cancellation is effective in every phase: it cancels the running attempt
//!   or the pending timer, whichever is live.
//! - Once cancelled, no further attempt starts and no late settlement from an
//!   in-flight attempt can settle the loop.
//! - The timer phase is the crate's own [`sleep`] leaf, so attempts and
//!   delays share one cancellation slot.

use std::time::Duration;

use crate::task::{CancelSlot, Settler, Task};
use crate::time::sleep;

/// Retries `task` until it succeeds, waiting `every` between attempts.
///
/// Timer-backed, so the resulting task must be started from within a tokio
/// runtime context.
pub fn retry_every<T, E>(every: Duration, task: Task<T, E>) -> Task<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    Task::new(move |settler: Settler<T, E>| {
        let slot = CancelSlot::new();
        attempt(task.clone(), every, settler, slot.clone());
        slot.to_handle()
    })
}

/// Runs one attempt, scheduling the next one on failure.
fn attempt<T, E>(task: Task<T, E>, every: Duration, settler: Settler<T, E>, slot: CancelSlot)
where
    T: Send + 'static,
    E: Send + 'static,
{
    if slot.is_cancelled() {
        return;
    }
    let token = slot.sequence();
    let next_task = task.clone();
    let next_settler = settler.clone();
    let next_slot = slot.clone();
    let handle = task.start(move |outcome| match outcome {
        Ok(value) => {
            next_settler.resolve(value);
        }
        Err(_error) => {
            if next_slot.is_cancelled() {
                return;
            }
            let tick = next_slot.sequence();
            let timer = {
                let slot = next_slot.clone();
                sleep::<E>(every).start(move |_| attempt(next_task, every, next_settler, slot))
            };
            next_slot.store_at(tick, timer);
        }
    });
    slot.store_at(token, handle);
}
