//! # Named Injector - Name-Keyed Dependency Injection for Rust
//!
//! A dependency injection container where every dependency is addressed by
//! a string name. Factories declare the names they depend on, the container
//! resolves them recursively, caches every result and reports ring
//! dependencies with a readable resolution trace.
//!
//! ## Features
//!
//! - 🏷️ **Name-keyed** - Any `Send + Sync + 'static` value can be registered under a name
//! - 🏭 **Factories, services, values, constants** - Several ways to describe an entry
//! - ♻️ **Memoized** - Each factory runs at most once per container
//! - 🔁 **Ring detection** - Self-referential resolution fails with a trace instead of recursing
//! - 🎨 **Decorators** - Wrap an existing entry, receiving it as `DecoratedInstance`
//! - ⚙️ **Configuration phase** - Adjust providers before the first instance is built
//! - 📦 **Import** - Copy the entries of another container, optionally under a prefix
//! - 📊 **Observable** - Optional tracing integration with JSON or pretty output
//!
//! ## Quick Start
//!
//! ```rust
//! use named_injector::{declare, Container, Value};
//!
//! let container = Container::new();
//!
//! container
//!     .value("url", String::from("postgres://localhost"))
//!     .factory("connection", declare!["url" => fn |args| {
//!         let url = args.get::<String>(0)?;
//!         Ok(Value::new(format!("connected to {url}")))
//!     }]);
//!
//! // Resolved once, then served from the cache
//! let first = container.get("connection").unwrap();
//! let second = container.get("connection").unwrap();
//! assert!(first.ptr_eq(&second));
//!
//! let connection = container.get_as::<String>("connection").unwrap();
//! assert_eq!(*connection, "connected to postgres://localhost");
//! ```
//!
//! ## Services
//!
//! Types implementing [`Construct`] are built by the container, their
//! parameter names doubling as dependency names.
//!
//! ```rust
//! use named_injector::{Arguments, Construct, Container, Result, Terminal};
//! use std::sync::Arc;
//!
//! struct UserService {
//!     database: Arc<String>,
//! }
//!
//! impl Construct for UserService {
//!     fn parameters() -> &'static [&'static str] {
//!         &["database"]
//!     }
//!
//!     fn construct(args: Arguments) -> Result<Self> {
//!         Ok(UserService { database: args.get(0)? })
//!     }
//! }
//!
//! let container = Container::new();
//! container.value("database", String::from("users.db"));
//! container
//!     .service("users", Terminal::constructor::<UserService>())
//!     .unwrap();
//!
//! let users = container.get_as::<UserService>("users").unwrap();
//! assert_eq!(*users.database, "users.db");
//! ```
//!
//! ## Configuration
//!
//! Configs run once, before the first resolution, and can depend on
//! constants and on `<name>Provider` entries.
//!
//! ```rust
//! use named_injector::{declare, Container, Value};
//!
//! let container = Container::new();
//! container
//!     .constant("debug", true)
//!     .config(declare!["debug" => fn |args| {
//!         assert!(*args.get::<bool>(0)?);
//!         Ok(Value::null())
//!     }]);
//!
//! container.boot().unwrap();
//! ```
//!
//! ## Importing
//!
//! ```rust
//! use named_injector::Container;
//!
//! let module = Container::new();
//! module.value("B", String::from("Bar"));
//!
//! let app = Container::new();
//! app.import(&module, Some("Sub")).unwrap();
//! app.import(&module, None).unwrap();
//!
//! assert_eq!(*app.get_as::<String>("Sub/B").unwrap(), "Bar");
//! assert_eq!(*app.get_as::<String>("B").unwrap(), "Bar");
//! ```
//!
//! ## Thread Safety
//!
//! Containers are `Send + Sync`. Resolutions of one container are
//! serialized by a reentrant lock, so a factory still runs at most once
//! even when several threads request the same name.

// Lets derive-generated `::named_injector` paths resolve inside this crate
extern crate self as named_injector;

mod container;
mod error;
mod factory;
mod injector;
mod introspect;
#[cfg(feature = "logging")]
pub mod logging;
mod provider;
mod storage;
mod trace;
mod value;

pub use container::*;
pub use error::*;
pub use factory::*;
pub use injector::*;
pub use introspect::*;
pub use provider::*;
pub use storage::*;
pub use trace::*;
pub use value::*;

#[cfg(feature = "derive")]
pub use named_injector_derive::Construct;

// Re-export tracing macros for convenience when logging feature is enabled
#[cfg(feature = "logging")]
pub use tracing::{debug, error, info, trace, warn};

// Re-export for convenience
pub use std::sync::Arc;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        declare, Arguments, Construct, Container, Declaration, DiError, FactoryProvider,
        Function, Injectable, Injector, Provider, ProviderRef, Result, Terminal, Value,
    };
    pub use std::sync::Arc;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_value_registration() {
        let container = Container::new();
        container.value("url", String::from("test"));

        let url = container.get_as::<String>("url").unwrap();
        assert_eq!(*url, "test");
    }

    #[test]
    fn test_multiple_resolve_same_instance() {
        static CALLS: AtomicU32 = AtomicU32::new(0);

        let container = Container::new();
        container.factory("db", declare![=> fn |_| {
            CALLS.fetch_add(1, Ordering::SeqCst);
            Ok(Value::new(String::from("db")))
        }]);

        let db1 = container.get_as::<String>("db").unwrap();
        let db2 = container.get_as::<String>("db").unwrap();

        // Same Arc instance
        assert!(Arc::ptr_eq(&db1, &db2));
        assert_eq!(CALLS.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_explicit_and_implicit_dependencies_agree() {
        let container = Container::new();
        container
            .value("a", String::from("V"))
            .factory("explicit", declare!["a" => fn |args| Ok(args.value(0)?.clone())])
            .factory(
                "implicit",
                Function::with_parameters(["a"], |args| Ok(args.value(0)?.clone())),
            );

        let explicit = container.get("explicit").unwrap();
        let implicit = container.get("implicit").unwrap();

        assert!(explicit.ptr_eq(&implicit));
    }

    #[test]
    fn test_cycle_detection() {
        let container = Container::new();
        container
            .factory("A", declare!["B" => fn |args| Ok(args.value(0)?.clone())])
            .factory("B", declare!["A" => fn |args| Ok(args.value(0)?.clone())]);

        assert!(matches!(
            container.get("A"),
            Err(DiError::RingDependency { .. })
        ));
    }

    #[test]
    fn test_not_found_error() {
        let container = Container::new();
        let result = container.get("UnknownKey");

        assert!(matches!(result, Err(DiError::DependencyNotFound { .. })));
    }

    #[test]
    fn test_trace_shows_resolution_stack() {
        let container = Container::new();
        container.factory("outer", declare!["inner" => fn |args| Ok(args.value(0)?.clone())]);

        let err = container.get("outer").unwrap_err();
        let trace = err.trace().unwrap();

        assert!(trace.starts_with("outer requested ("));
        assert!(trace.contains("\tDependencies: [inner]"));
        assert!(trace.contains("\tinner requested ("));
    }

    #[test]
    fn test_container_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}

        assert_send_sync::<Container>();
        assert_send_sync::<Injector>();
        assert_send_sync::<Value>();
    }
}
