//! # Task core: the value, its execution contract, and sequencing.
//!
//! The pieces compose bottom-up: [`Settler`] enforces at-most-once
//! settlement, [`CancelHandle`] makes cancellation idempotent, [`Task`] ties
//! one computation to both, and the sequencing combinators (in `seq`) wire
//! cancellation through multi-stage compositions.

mod cancel;
mod core;
mod seq;
mod settle;

pub use cancel::CancelHandle;
pub(crate) use cancel::CancelSlot;
pub use core::Task;
pub use settle::Settler;
