//! # lazytask
//!
//! **lazytask** is a small library of lazy, cancelable task combinators.
//!
//! A [`Task<T, E>`] is a pure description of a computation that, once
//! started, settles exactly once with `Ok(T)` or `Err(E)`. Unlike a future
//! that a runtime polls from the moment it is spawned, a task does nothing
//! until [`start`](Task::start) is called, the same task value can be started
//! any number of times, and every start hands back a [`CancelHandle`].
//!
//! ## Architecture
//! ```text
//!   leaf constructors                combinators                 call site
//!
//!   Task::new ───────┐
//!   Task::succeed ───┤     ┌─► map / and_then / or_else ─┐
//!   Task::fail ──────┼─────┤   map_err / inspect / also  ├──► start ─► CancelHandle
//!   Task::from_future┤     ├─► join_all / race           │    fork  ─► Fork
//!   sleep ───────────┘     └─► retry_every               │    run   ─► await
//!                                                        │
//!   cancellation always aims at whichever stage is live ◄┘
//! ```
//!
//! The one invariant everything hinges on: cancelling a composed task cancels
//! whichever sub-computation is *currently* running, not the one that was
//! running when the composition was built. Sequencing combinators keep a
//! per-execution slot holding the live stage's handle; coordination
//! combinators keep an indexed board of per-entry handles, marked inert the
//! moment an entry settles.
//!
//! ## Features
//! | Area              | Description                                             | Key items                                   |
//! |-------------------|---------------------------------------------------------|---------------------------------------------|
//! | **Core contract** | Lazy start, at-most-once settlement, idempotent cancel. | [`Task`], [`Settler`], [`CancelHandle`]     |
//! | **Sequencing**    | Success/failure pipelines with live-stage cancellation. | [`Task::and_then`], [`Task::or_else`]       |
//! | **Coordination**  | Fail-fast join and first-wins race over many tasks.     | [`join_all`], [`race`]                      |
//! | **Retry**         | Fixed-interval retry loop, cancellable in every phase.  | [`retry_every`]                             |
//! | **Bridging**      | Futures in, futures out, fork with join handle.         | [`Task::from_future`], [`Task::run`], [`Fork`] |
//! | **Timers**        | Cancellable sleep leaf and delayed start.               | [`sleep`], [`Task::delayed`]                |
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use lazytask::{race, Task};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let primary: Task<&str, &str> =
//!         Task::succeed("primary").delayed(Duration::from_millis(50));
//!     let mirror: Task<&str, &str> =
//!         Task::succeed("mirror").delayed(Duration::from_millis(5));
//!
//!     // first settlement wins, the loser is cancelled
//!     assert_eq!(race([primary, mirror]).await, Ok("mirror"));
//! }
//! ```
//!
//! ## Scheduling model
//! The crate decides *what* is cancelled and *which* outcome wins, never how
//! work is scheduled. Pure combinators run inline on whatever thread settles
//! the previous stage; only the timer leaves and future bridges touch the
//! tokio runtime. All per-composition bookkeeping is mutex-guarded, so
//! settlements may arrive from any runtime thread.

mod bridge;
mod combine;
mod error;
mod task;
mod time;

pub use bridge::Fork;
pub use combine::{join_all, race, retry_every};
pub use error::Canceled;
pub use task::{CancelHandle, Settler, Task};
pub use time::sleep;
