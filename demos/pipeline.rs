//! # Demo: pipeline
//!
//! Builds a result step by step with the sequencing combinators.
//!
//! Shows how to:
//! - Chain dependent steps with [`Task::and_then`]
//! - Accumulate independent fields with [`Task::also`]
//! - Recover from a failure with [`Task::or_else`]
//! - Observe values in flight with [`Task::inspect`]
//!
//! ## Flow
//! ```text
//! lookup user ──► also(load quota) ──► also(compose greeting)
//!      │
//!      └─ on failure: or_else(fallback to guest)
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example pipeline
//! ```

use lazytask::Task;

fn lookup_user(id: u32) -> Task<String, String> {
    Task::new(move |settler| {
        if id == 7 {
            settler.resolve("ada".to_string());
        } else {
            settler.reject(format!("no user with id {id}"));
        }
        lazytask::CancelHandle::noop()
    })
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    println!("=== pipeline demo ===\n");

    // 1. A record built field by field: (name, quota) plus a greeting
    let profile = lookup_user(7)
        .inspect(|name| println!("[pipeline] found user {name}"))
        .also(|_| Task::succeed(100u32))
        .also(|pair| Task::succeed(format!("hello {}, quota {}", pair.0, pair.1)));

    match profile.run().await {
        Ok(((name, quota), greeting)) => {
            println!("[pipeline] name={name} quota={quota}");
            println!("[pipeline] greeting: {greeting}");
        }
        Err(e) => println!("[pipeline] failed: {e}"),
    }

    // 2. A failing lookup short-circuits the rest of the chain
    let missing = lookup_user(999)
        .also(|_| Task::succeed(0u32))
        .inspect(|_| println!("[pipeline] this line never prints"));
    println!("\n[pipeline] missing user: {:?}", missing.run().await);

    // 3. or_else turns the failure into a guest session
    let guest = lookup_user(999).or_else(|e: String| {
        println!("[pipeline] lookup failed ({e}), falling back to guest");
        Task::<String, String>::succeed("guest".to_string())
    });
    println!("[pipeline] session user: {:?}", guest.run().await);

    println!("\n=== demo completed ===");
    Ok(())
}
