//! # Demo: fastest_wins
//!
//! Races several delayed sources and cancels a race mid-flight.
//!
//! Shows how to:
//! - Start N tasks concurrently with [`race`]
//! - Observe that the losers never deliver
//! - Cancel an undecided race through its [`Fork`]
//!
//! ## Flow
//! ```text
//! race([edge(80ms), cache(15ms), origin(200ms)])
//!        │
//!        └─► cache settles first ─► edge and origin are cancelled
//!
//! race([edge(80ms), origin(200ms)])  then fork.cancel() at 10ms
//!        │
//!        └─► nobody settles; join reports Canceled
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example fastest_wins
//! ```

use std::time::Duration;

use lazytask::{race, Task};

fn source(name: &'static str, latency: Duration) -> Task<&'static str, &'static str> {
    Task::succeed(name)
        .delayed(latency)
        .inspect(move |_| println!("[race] {name} delivered"))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    println!("=== fastest_wins demo ===\n");

    // 1. Three mirrors, one winner; the slower two are cancelled
    let contenders = [
        source("edge", Duration::from_millis(80)),
        source("cache", Duration::from_millis(15)),
        source("origin", Duration::from_millis(200)),
    ];
    let winner = race(contenders).run().await;
    println!("[race] winner: {winner:?}");

    // give cancelled losers time to prove they stay silent
    tokio::time::sleep(Duration::from_millis(250)).await;

    // 2. Cancelling an undecided race stops every contender
    println!("\n[race] starting a race we will cancel...");
    let fork = race([
        source("edge", Duration::from_millis(80)),
        source("origin", Duration::from_millis(200)),
    ])
    .fork();

    tokio::time::sleep(Duration::from_millis(10)).await;
    fork.cancel();
    println!("[race] cancelled after 10ms, outcome: {:?}", fork.join().await);

    tokio::time::sleep(Duration::from_millis(250)).await;
    println!("\n=== demo completed ===");
    Ok(())
}
