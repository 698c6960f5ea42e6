//! Provider traits for dependency injection
//!
//! A provider is a one-method capability: it hands out the
//! [`Declaration`] used to build its entry. Providers live in the
//! container's provider store under `<name>Provider` and are what
//! configuration callbacks receive.

use crate::Declaration;
use std::any::Any;
use std::sync::Arc;

/// Marker trait for types that can be stored in a container.
///
/// This is automatically implemented for all types that are `Send + Sync + 'static`.
/// You never need to implement this manually.
pub trait Injectable: Send + Sync + 'static {}

// Blanket implementation - everything that's Send + Sync + 'static is Injectable
impl<T: Send + Sync + 'static> Injectable for T {}

/// Supplies the factory declaration for a named entry.
///
/// Implementations may hold options that configuration callbacks adjust
/// before the first instance is built.
///
/// # Examples
///
/// ```rust
/// use named_injector::{declare, Container, FactoryProvider, Declaration, ProviderRef, Value};
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicU32, Ordering};
///
/// #[derive(Default)]
/// struct MultiplierProvider {
///     factor: Arc<AtomicU32>,
/// }
///
/// impl FactoryProvider for MultiplierProvider {
///     fn factory(&self) -> Declaration {
///         let factor = self.factor.load(Ordering::SeqCst);
///         declare![=> fn move |_| Ok(Value::new(factor * 10))]
///     }
/// }
///
/// let container = Container::new();
/// container
///     .provider("multiplier", MultiplierProvider::default())
///     .config(declare!["multiplierProvider" => fn |args| {
///         let provider = args.get::<ProviderRef>(0)?;
///         if let Some(options) = provider.downcast_ref::<MultiplierProvider>() {
///             options.factor.store(10, Ordering::SeqCst);
///         }
///         Ok(Value::null())
///     }]);
///
/// assert_eq!(*container.get_as::<u32>("multiplier").unwrap(), 100);
/// ```
pub trait FactoryProvider: Send + Sync + 'static {
    /// The declaration used to build the entry
    fn factory(&self) -> Declaration;
}

/// Provider holding a fixed declaration.
#[derive(Debug, Clone)]
pub struct Provider {
    factory: Declaration,
}

impl Provider {
    /// Create from a declaration.
    #[inline]
    pub fn new(factory: impl Into<Declaration>) -> Self {
        Self {
            factory: factory.into(),
        }
    }
}

impl FactoryProvider for Provider {
    fn factory(&self) -> Declaration {
        self.factory.clone()
    }
}

/// Shared handle to a registered provider.
///
/// This is the value stored under `<name>Provider`. It keeps a
/// type-erased view of the same allocation so callers can get the
/// concrete provider back.
#[derive(Clone)]
pub struct ProviderRef {
    provider: Arc<dyn FactoryProvider>,
    any: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl ProviderRef {
    /// Wrap a provider.
    pub fn new<P: FactoryProvider>(provider: P) -> Self {
        let provider = Arc::new(provider);
        Self {
            any: Arc::clone(&provider) as Arc<dyn Any + Send + Sync>,
            provider,
            type_name: std::any::type_name::<P>(),
        }
    }

    /// The provider's current declaration.
    #[inline]
    pub fn factory(&self) -> Declaration {
        self.provider.factory()
    }

    /// Borrow the concrete provider.
    #[inline]
    pub fn downcast_ref<P: FactoryProvider>(&self) -> Option<&P> {
        self.any.downcast_ref::<P>()
    }

    /// Name of the concrete provider type.
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl std::fmt::Debug for ProviderRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRef")
            .field("type_name", &self.type_name)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{declare, Terminal};

    struct Named(&'static str);

    impl FactoryProvider for Named {
        fn factory(&self) -> Declaration {
            Declaration::new([self.0], Terminal::reference("identity"))
        }
    }

    #[test]
    fn test_provider_returns_its_declaration() {
        let provider = Provider::new(declare!["a" => fn |args| Ok(args.value(0)?.clone())]);
        match provider.factory() {
            Declaration::List(descriptor) => assert_eq!(descriptor.dependencies(), &["a"]),
            Declaration::Bare(_) => panic!("expected an explicit list"),
        }
    }

    #[test]
    fn test_provider_ref_downcast() {
        let handle = ProviderRef::new(Named("dep"));

        assert!(handle.downcast_ref::<Named>().is_some());
        assert!(handle.downcast_ref::<Provider>().is_none());
        assert!(handle.type_name().ends_with("Named"));
        assert_eq!(handle.downcast_ref::<Named>().unwrap().0, "dep");
    }
}
