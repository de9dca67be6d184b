//! # Bridges between the task world and native async.
//!
//! `future` adapts futures into tasks and tasks into futures; `fork` pairs a
//! started execution's cancel handle with an awaitable outcome.

mod fork;
mod future;

pub use fork::Fork;
