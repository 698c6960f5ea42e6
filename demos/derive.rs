//! Example demonstrating the #[derive(Construct)] macro
//!
//! Run with:
//!   cargo run --example derive --features derive

use named_injector::{Construct, Container, Terminal, declare};
use std::sync::Arc;

// Service whose constructor parameters come from its fields
#[derive(Construct)]
struct UserService {
    database: Arc<String>,
    #[inject(name = "cache.size")]
    cache_size: usize,
    // Not resolved, uses Default
    #[inject(default)]
    request_count: u64,
}

impl UserService {
    fn describe(&self) -> String {
        format!(
            "UserService connected to {} with cache size {} (requests: {})",
            self.database, self.cache_size, self.request_count
        )
    }
}

// Nested service depending on another service by name
#[derive(Construct)]
struct ApiController {
    users: Arc<UserService>,
    #[inject(name = "api.prefix")]
    prefix: String,
}

fn main() {
    println!("=== Named Injector Derive Macro Demo ===\n");

    println!("UserService parameters: {:?}", UserService::parameters());
    println!("ApiController parameters: {:?}\n", ApiController::parameters());

    let container = Container::new();
    container
        .value("database", String::from("postgres://localhost:5432/myapp"))
        .value("cache.size", 1024usize)
        .value("api.prefix", String::from("/api/v1"))
        .service("users", Terminal::constructor::<UserService>())
        .expect("UserService declares its parameters");
    container
        .service(
            "api",
            declare!["users", "api.prefix" => Terminal::constructor::<ApiController>()],
        )
        .expect("explicit dependency list");

    let users = container.get_as::<UserService>("users").expect("users");
    println!("{}", users.describe());

    let api = container.get_as::<ApiController>("api").expect("api");
    println!("ApiController at {} using: {}", api.prefix, api.users.describe());

    // The controller shares the cached UserService
    assert!(Arc::ptr_eq(&users, &api.users));

    // Missing dependencies surface with the resolution trace
    container
        .service("audit", declare!["audit.sink" => Terminal::constructor::<UserService>()])
        .expect("explicit dependency list");
    if let Err(err) = container.get("audit") {
        println!("\naudit failed as expected:\n{err}");
    }

    println!("\n=== Demo Complete ===");
}
