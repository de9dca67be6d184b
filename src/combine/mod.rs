//! # Coordination combinators: join, race, retry.
//!
//! These fork several executions (or repeated executions of one task) and
//! multiplex their outcomes into a single settlement, with the bookkeeping
//! needed to cancel every loser and never settle twice.

mod join;
mod race;
mod retry;

pub use join::join_all;
pub use race::race;
pub use retry::retry_every;
