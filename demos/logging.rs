//! Example demonstrating logging capabilities
//!
//! Run with JSON logging (production):
//! ```bash
//! cargo run --example logging --features logging-json
//! ```
//!
//! Run with pretty logging (development):
//! ```bash
//! RUST_LOG=named_injector=trace cargo run --example logging --features logging-pretty
//! ```

use named_injector::{Container, Value, declare};

fn main() {
    // Initialize logging - uses JSON if logging-json feature enabled,
    // pretty if logging-pretty enabled, RUST_LOG wins when set
    named_injector::logging::init();

    println!("=== Named Injector Logging Demo ===\n");

    // Create container (logs: "Creating new DI container")
    let container = Container::new();

    // Register entries (logs: "Registering value", "Registering provider")
    container
        .value("url", String::from("postgres://localhost/mydb"))
        .constant("pool_size", 8u32)
        .factory("database", declare!["url", "pool_size" => fn |args| {
            println!("  [App] Database being created...");
            Ok(Value::new(format!(
                "{} ({} connections)",
                args.get::<String>(0)?,
                args.get::<u32>(1)?
            )))
        }]);

    // Queue a config (logged when the container boots)
    container.config(declare!["pool_size" => fn |args| {
        println!("  [App] Configuring with pool size {}", args.get::<u32>(0)?);
        Ok(Value::null())
    }]);

    // First resolution boots the container (logs: "Booting container",
    // "Resolving dependency", "Cache miss, running fallback factory")
    let database = container.get_as::<String>("database").unwrap();
    println!("  [App] Resolved: {database}");

    // Second resolution is served from the cache
    let _ = container.get("database").unwrap();

    // Missing dependency (logs the miss, returns the trace in the error)
    let missing = container.get("cache");
    if let Err(err) = missing {
        println!("\n  [App] Expected failure:\n{err}");
    }

    // Config after boot never runs (logs a warning)
    container.config(declare![=> fn |_| Ok(Value::null())]);

    println!("\n=== Demo Complete ===");
    println!("Check the log output above to see structured logging in action!");
    println!("\nTip: Use --features logging-json for production (JSON output)");
    println!("     Use --features logging-pretty for development (colorful output)");
}
