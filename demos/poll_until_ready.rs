//! # Demo: poll_until_ready
//!
//! Polls a slow resource with [`retry_every`] until it reports ready, then
//! shows that cancelling mid-delay stops the loop for good.
//!
//! ## Flow
//! ```text
//! retry_every(100ms, check_deploy)
//!   ├─► attempt 1: pending ─► wait 100ms
//!   ├─► attempt 2: pending ─► wait 100ms
//!   └─► attempt 3: ready   ─► resolve
//!
//! retry_every(100ms, always_pending)  then cancel during the wait
//!   └─► no further attempt ever starts
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example poll_until_ready
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use lazytask::{retry_every, CancelHandle, Task};

/// Reports ready on the third poll.
fn check_deploy(polls: Arc<AtomicUsize>) -> Task<String, &'static str> {
    Task::new(move |settler| {
        let n = polls.fetch_add(1, Ordering::SeqCst) + 1;
        println!("[poll] attempt {n}");
        if n < 3 {
            settler.reject("still rolling out");
        } else {
            settler.resolve(format!("ready after {n} polls"));
        }
        CancelHandle::noop()
    })
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    println!("=== poll_until_ready demo ===\n");

    // 1. Retry until the resource is ready
    let polls = Arc::new(AtomicUsize::new(0));
    let status = retry_every(Duration::from_millis(100), check_deploy(polls)).run().await;
    println!("[poll] outcome: {status:?}\n");

    // 2. Cancel while the loop is idle between attempts
    let polls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&polls);
    let always_pending: Task<String, &'static str> = Task::new(move |settler| {
        counter.fetch_add(1, Ordering::SeqCst);
        settler.reject("never ready");
        CancelHandle::noop()
    });

    let fork = retry_every(Duration::from_millis(100), always_pending).fork();
    tokio::time::sleep(Duration::from_millis(30)).await;
    println!("[poll] cancelling while the loop waits...");
    fork.cancel();
    println!("[poll] outcome: {:?}", fork.join().await);

    tokio::time::sleep(Duration::from_millis(300)).await;
    let attempts = polls.load(Ordering::SeqCst);
    println!("[poll] attempts after cancel: {attempts} (no new attempts started)");

    println!("\n=== demo completed ===");
    Ok(())
}
