//! Name-keyed dependency injection container
//!
//! A [`Container`] owns two injectors over two key stores. The provider
//! injector holds `<name>Provider` entries and constants; the instance
//! injector holds resolved instances and constants. A miss on the
//! instance side asks the provider side for `<name>Provider`, normalizes
//! its factory declaration and invokes it.
//!
//! Configuration callbacks registered with [`Container::config`] run
//! once, against the provider injector, before the first instance is
//! resolved.

use crate::injector::Gate;
use crate::{
    Arguments, Bindings, DeclaredParameters, Declaration, Descriptor, DiError, FactoryProvider,
    Function, Injectable, Injector, KeyStore, ParameterIntrospector, Provider, ProviderRef,
    Result, Tracer, Value,
};
use parking_lot::{Mutex, ReentrantMutex};
use std::sync::{Arc, Weak};

#[cfg(feature = "logging")]
use tracing::{debug, trace, warn};

/// Suffix of provider entries in the provider store
const PROVIDER_SUFFIX: &str = "Provider";

/// Local binding holding the original instance inside a decorator
pub const DECORATED_INSTANCE: &str = "DecoratedInstance";

/// Lifecycle of a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum State {
    /// Nothing resolved yet, configs pending
    #[default]
    Initial,
    /// Configuration callbacks are running
    Configuring,
    /// All configs ran
    Booted,
}

struct ContainerInner {
    providers: Injector,
    instances: Injector,
    configs: Mutex<Vec<Declaration>>,
    state: Mutex<State>,
    tracer: Tracer,
    gate: Gate,
    introspector: Arc<dyn ParameterIntrospector>,
}

/// Name-keyed dependency injection container.
///
/// Cloning is cheap and every clone refers to the same container.
///
/// # Examples
///
/// ```rust
/// use named_injector::{declare, Container, Value};
///
/// let container = Container::new();
/// container
///     .value("greeting", String::from("Hello"))
///     .factory("message", declare!["greeting" => fn |args| {
///         Ok(Value::new(format!("{} World", args.get::<String>(0)?)))
///     }]);
///
/// let message = container.get_as::<String>("message").unwrap();
/// assert_eq!(*message, "Hello World");
/// ```
#[derive(Clone)]
pub struct Container {
    inner: Arc<ContainerInner>,
}

impl Container {
    /// Create an empty container.
    ///
    /// Dependency lists may be omitted where parameter names were
    /// declared, see [`DeclaredParameters`].
    #[inline]
    pub fn new() -> Self {
        Self::build(KeyStore::new(), KeyStore::new(), Arc::new(DeclaredParameters))
    }

    /// Create an empty container using a custom parameter introspector.
    pub fn with_introspector(introspector: impl ParameterIntrospector + 'static) -> Self {
        Self::build(KeyStore::new(), KeyStore::new(), Arc::new(introspector))
    }

    /// Create a container seeded with the entries of `containers`.
    ///
    /// Entries are copied in order, later containers overwriting earlier
    /// ones. The sources are not booted and their configs are not carried
    /// over. The new container uses [`DeclaredParameters`], whatever
    /// introspector the sources were built with.
    pub fn merged(containers: &[Container]) -> Self {
        let mut providers = KeyStore::new();
        let mut instances = KeyStore::new();

        for container in containers {
            providers.merge(&container.inner.providers.snapshot(), None);
            instances.merge(&container.inner.instances.snapshot(), None);
        }

        Self::build(providers, instances, Arc::new(DeclaredParameters))
    }

    fn build(
        providers: KeyStore,
        instances: KeyStore,
        introspector: Arc<dyn ParameterIntrospector>,
    ) -> Self {
        #[cfg(feature = "logging")]
        debug!(
            target: "named_injector",
            providers = providers.len(),
            instances = instances.len(),
            "Creating new DI container"
        );

        let inner = Arc::new_cyclic(|this: &Weak<ContainerInner>| {
            let tracer = Tracer::new();
            let gate: Gate = Arc::new(ReentrantMutex::new(()));

            let providers = Injector::with_gate(
                providers,
                |injector: &Injector, name: &str| {
                    let name = name.strip_suffix(PROVIDER_SUFFIX).unwrap_or(name);

                    #[cfg(feature = "logging")]
                    debug!(
                        target: "named_injector",
                        name = name,
                        "No provider registered"
                    );

                    Err(DiError::not_found(name, injector.tracer()))
                },
                tracer.clone(),
                Arc::clone(&gate),
            );

            let instances = Injector::with_gate(
                instances,
                {
                    let providers = providers.clone();
                    let introspector = Arc::clone(&introspector);
                    move |injector: &Injector, name: &str| {
                        let handle = providers.get(&format!("{name}{PROVIDER_SUFFIX}"))?;
                        let provider = handle.downcast_ref::<ProviderRef>().ok_or_else(|| {
                            DiError::invalid_factory(
                                format!("{name}{PROVIDER_SUFFIX} ({})", handle.type_name()),
                                injector.tracer(),
                            )
                        })?;

                        #[cfg(feature = "logging")]
                        trace!(
                            target: "named_injector",
                            name = name,
                            provider = provider.type_name(),
                            "Building instance from provider"
                        );

                        let descriptor = introspector.normalize(provider.factory())?;
                        injector.invoke(&descriptor)
                    }
                },
                tracer.clone(),
                Arc::clone(&gate),
            );

            // Self-bindings hold weak handles so the stores never keep
            // their own container alive
            let container = Value::new(WeakContainer {
                inner: this.clone(),
            });
            let injector = Value::new(instances.downgrade());
            providers.set(
                "ContainerProvider",
                Value::new(ProviderRef::new(returning(container))),
            );
            providers.set(
                "InjectorProvider",
                Value::new(ProviderRef::new(returning(injector))),
            );

            ContainerInner {
                providers,
                instances,
                configs: Mutex::new(Vec::new()),
                state: Mutex::new(State::Initial),
                tracer,
                gate,
                introspector,
            }
        });

        Self { inner }
    }

    // =========================================================================
    // Registration Methods
    // =========================================================================

    /// Register a provider under `<name>Provider`.
    ///
    /// Configuration callbacks can depend on `<name>Provider` to adjust
    /// the provider before the first instance of `name` is built.
    pub fn provider<P: FactoryProvider>(&self, name: &str, provider: P) -> &Self {
        #[cfg(feature = "logging")]
        debug!(
            target: "named_injector",
            name = name,
            provider = std::any::type_name::<P>(),
            "Registering provider"
        );

        self.inner.providers.set(
            format!("{name}{PROVIDER_SUFFIX}"),
            Value::new(ProviderRef::new(provider)),
        );
        self
    }

    /// Register a factory.
    ///
    /// The declaration is normalized when `name` is first resolved, so a
    /// missing dependency list only fails at that point.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use named_injector::{declare, Container, Function, Value};
    ///
    /// let container = Container::new();
    /// container.value("aValue", String::from("Test"));
    ///
    /// // Explicit dependency list
    /// container.factory("explicit", declare!["aValue" => fn |args| Ok(args.value(0)?.clone())]);
    ///
    /// // Dependencies taken from the declared parameter names
    /// container.factory(
    ///     "implicit",
    ///     Function::with_parameters(["aValue"], |args| Ok(args.value(0)?.clone())),
    /// );
    ///
    /// assert_eq!(*container.get_as::<String>("explicit").unwrap(), "Test");
    /// assert_eq!(*container.get_as::<String>("implicit").unwrap(), "Test");
    /// ```
    #[inline]
    pub fn factory(&self, name: &str, factory: impl Into<Declaration>) -> &Self {
        self.provider(name, Provider::new(factory))
    }

    /// Register a service built from a constructible type.
    ///
    /// The declaration is normalized right away, so this fails if no
    /// dependency list can be found.
    ///
    /// # Errors
    ///
    /// Returns `DiError::InvalidArgument` if the declaration has no
    /// dependency list and none can be introspected.
    pub fn service(&self, name: &str, service: impl Into<Declaration>) -> Result<&Self> {
        let descriptor = self.inner.introspector.normalize(service.into())?;

        #[cfg(feature = "logging")]
        debug!(
            target: "named_injector",
            name = name,
            constructor = %descriptor.terminal(),
            dependencies = descriptor.dependencies().len(),
            "Registering service"
        );

        Ok(self.factory(
            name,
            Declaration::new(
                ["Injector"],
                Function::new(move |args| args.injector(0)?.instantiate(&descriptor)),
            ),
        ))
    }

    /// Register a fixed value.
    #[inline]
    pub fn value<T: Injectable>(&self, name: &str, value: T) -> &Self {
        self.set(name, Value::new(value))
    }

    /// Register an already wrapped value.
    pub fn set(&self, name: &str, value: Value) -> &Self {
        #[cfg(feature = "logging")]
        debug!(
            target: "named_injector",
            name = name,
            value_type = value.type_name(),
            "Registering value"
        );

        self.provider(name, returning(value))
    }

    /// Register a constant.
    ///
    /// Constants are written to both stores, so they are visible to
    /// configuration callbacks as well as to factories.
    pub fn constant<T: Injectable>(&self, name: &str, value: T) -> &Self {
        #[cfg(feature = "logging")]
        debug!(
            target: "named_injector",
            name = name,
            value_type = std::any::type_name::<T>(),
            "Registering constant"
        );

        let value = Value::new(value);
        self.inner.providers.set(name, value.clone());
        self.inner.instances.set(name, value);
        self
    }

    /// Decorate the factory registered under `name`.
    ///
    /// The decorator receives the original instance as the local
    /// dependency `DecoratedInstance`. Decorating a name whose instance
    /// was already resolved has no effect on that cached instance.
    ///
    /// # Errors
    ///
    /// Returns `DiError::DependencyNotFound` if nothing is registered under
    /// `name`, or `DiError::InvalidArgument` if either declaration cannot be
    /// normalized.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use named_injector::{declare, Container, Value};
    ///
    /// let container = Container::new();
    /// container.value("SomeValue", String::from("Hello"));
    /// container
    ///     .decorator("SomeValue", declare!["DecoratedInstance" => fn |args| {
    ///         Ok(Value::new(format!("{}World", args.get::<String>(0)?)))
    ///     }])
    ///     .unwrap();
    ///
    /// assert_eq!(*container.get_as::<String>("SomeValue").unwrap(), "HelloWorld");
    /// ```
    pub fn decorator(&self, name: &str, decorator: impl Into<Declaration>) -> Result<&Self> {
        let legacy = self
            .inner
            .providers
            .get(&format!("{name}{PROVIDER_SUFFIX}"))?;
        let legacy = legacy.downcast_ref::<ProviderRef>().ok_or_else(|| {
            DiError::invalid_factory(
                format!("{name}{PROVIDER_SUFFIX} ({})", legacy.type_name()),
                &self.inner.tracer,
            )
        })?;

        let original = self.inner.introspector.normalize(legacy.factory())?;
        let decorator = self.inner.introspector.normalize(decorator.into())?;

        #[cfg(feature = "logging")]
        debug!(
            target: "named_injector",
            name = name,
            decorator = %decorator.terminal(),
            "Registering decorator"
        );

        Ok(self.factory(
            name,
            Declaration::new(
                ["Injector"],
                Function::new(move |args| decorate(&args, &original, &decorator)),
            ),
        ))
    }

    /// Decorate using the declaration of a provider.
    ///
    /// # Errors
    ///
    /// See [`decorator`](Self::decorator).
    #[inline]
    pub fn decorator_provider<P: FactoryProvider>(&self, name: &str, provider: P) -> Result<&Self> {
        self.decorator(name, provider.factory())
    }

    /// Queue a configuration callback.
    ///
    /// Its dependencies are resolved through the provider injector, so it
    /// can reach `<name>Provider` entries and constants. Callbacks run in
    /// registration order on [`boot`](Self::boot).
    pub fn config(&self, config: impl Into<Declaration>) -> &Self {
        #[cfg(feature = "logging")]
        if self.state() == State::Booted {
            warn!(
                target: "named_injector",
                "Config registered after boot will not run"
            );
        }

        self.inner.configs.lock().push(config.into());
        self
    }

    /// Import every entry of `other`, optionally prefixing keys with `prefix/`.
    ///
    /// `other` is booted first. Existing keys are overwritten and the
    /// self-bindings of this container are kept.
    ///
    /// # Errors
    ///
    /// Returns the error of a failing configuration callback of `other`.
    pub fn import(&self, other: &Container, prefix: Option<&str>) -> Result<&Self> {
        other.boot()?;

        #[cfg(feature = "logging")]
        debug!(
            target: "named_injector",
            prefix = prefix.unwrap_or(""),
            "Importing container"
        );

        let providers = other.inner.providers.snapshot();
        let instances = other.inner.instances.snapshot();

        let _gate = self.inner.gate.lock();
        self.inner.providers.merge(&providers, prefix);
        self.inner.instances.merge(&instances, prefix);
        Ok(self)
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Run the pending configuration callbacks.
    ///
    /// Calling this again once booted, or from inside a running config,
    /// does nothing. If a callback fails the container returns to
    /// [`State::Initial`]; callbacks after the failing one stay queued.
    ///
    /// # Errors
    ///
    /// Returns the error of the first failing callback.
    pub fn boot(&self) -> Result<&Self> {
        let _gate = self.inner.gate.lock();

        {
            let mut state = self.inner.state.lock();
            if *state != State::Initial {
                return Ok(self);
            }
            *state = State::Configuring;
        }

        #[cfg(feature = "logging")]
        debug!(
            target: "named_injector",
            configs = self.inner.configs.lock().len(),
            "Booting container"
        );

        loop {
            let config = {
                let mut configs = self.inner.configs.lock();
                if configs.is_empty() {
                    break;
                }
                configs.remove(0)
            };

            let result = self
                .inner
                .introspector
                .normalize(config)
                .and_then(|descriptor| self.inner.providers.invoke(&descriptor));

            if let Err(err) = result {
                *self.inner.state.lock() = State::Initial;

                #[cfg(feature = "logging")]
                debug!(
                    target: "named_injector",
                    error = %err,
                    "Config failed, container left unbooted"
                );

                return Err(err);
            }
        }

        *self.inner.state.lock() = State::Booted;

        #[cfg(feature = "logging")]
        debug!(target: "named_injector", "Container booted");

        Ok(self)
    }

    /// Current lifecycle state.
    #[inline]
    pub fn state(&self) -> State {
        *self.inner.state.lock()
    }

    // =========================================================================
    // Resolution Methods
    // =========================================================================

    /// Resolve `name`, booting the container first if needed.
    ///
    /// `Container` and `Injector` resolve to a [`WeakContainer`] and a
    /// [`WeakInjector`](crate::WeakInjector), not to strong handles. Inside
    /// a factory, [`Arguments::container`] and [`Arguments::injector`]
    /// upgrade them.
    ///
    /// # Errors
    ///
    /// Returns `DiError::DependencyNotFound` if nothing is registered under
    /// `name` or one of its dependencies, `DiError::RingDependency` if the
    /// resolution re-enters itself, or whatever a factory returned.
    pub fn get(&self, name: &str) -> Result<Value> {
        let _gate = self.inner.gate.lock();

        if self.state() == State::Initial {
            self.boot()?;
        }

        #[cfg(feature = "logging")]
        trace!(
            target: "named_injector",
            name = name,
            cached = self.inner.instances.has(name),
            "Resolving dependency"
        );

        self.inner.instances.get(name)
    }

    /// Resolve `name` as a `T`.
    ///
    /// # Errors
    ///
    /// Same as [`get`](Self::get), plus `DiError::TypeMismatch` if the
    /// instance is not a `T`.
    pub fn get_as<T: Injectable>(&self, name: &str) -> Result<Arc<T>> {
        let value = self.get(name)?;
        value
            .downcast::<T>()
            .ok_or_else(|| DiError::type_mismatch::<T>(name, value.type_name()))
    }

    /// Resolve `name` if anything is registered under it.
    pub fn try_get(&self, name: &str) -> Result<Option<Value>> {
        if !self.contains(name) {
            return Ok(None);
        }
        self.get(name).map(Some)
    }

    /// Whether an instance or a provider exists for `name`.
    ///
    /// Never triggers resolution.
    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.inner.instances.has(name)
            || self
                .inner
                .providers
                .has(&format!("{name}{PROVIDER_SUFFIX}"))
    }

    /// Alias for [`contains`](Self::contains).
    #[inline]
    pub fn has(&self, name: &str) -> bool {
        self.contains(name)
    }

    /// Entries cannot be removed.
    ///
    /// # Errors
    ///
    /// Always returns `DiError::NotImplemented`.
    pub fn remove(&self, _name: &str) -> Result<()> {
        Err(DiError::NotImplemented { operation: "remove" })
    }

    /// The instance injector.
    #[inline]
    pub fn injector(&self) -> &Injector {
        &self.inner.instances
    }

    /// The trace log shared by both injectors.
    #[inline]
    pub fn tracer(&self) -> &Tracer {
        &self.inner.tracer
    }

    /// A handle that does not keep this container alive.
    #[inline]
    pub fn downgrade(&self) -> WeakContainer {
        WeakContainer {
            inner: Arc::downgrade(&self.inner),
        }
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("state", &self.state())
            .field("providers", &self.inner.providers)
            .field("instances", &self.inner.instances)
            .field("configs", &self.inner.configs.lock().len())
            .finish()
    }
}

/// Non-owning handle to a [`Container`].
///
/// This is what a container registers under `Container`; factories get a
/// strong handle back with [`Arguments::container`].
#[derive(Clone, Default)]
pub struct WeakContainer {
    inner: Weak<ContainerInner>,
}

impl WeakContainer {
    /// Upgrade to a strong handle if the container still exists.
    #[inline]
    pub fn upgrade(&self) -> Option<Container> {
        self.inner.upgrade().map(|inner| Container { inner })
    }
}

impl std::fmt::Debug for WeakContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeakContainer")
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}

/// Provider whose factory returns `value` with no dependencies.
fn returning(value: Value) -> Provider {
    Provider::new(Descriptor::new(Vec::<String>::new(), Function::returning(value)))
}

/// Build the original instance, then hand it to the decorator.
fn decorate(args: &Arguments, original: &Descriptor, decorator: &Descriptor) -> Result<Value> {
    let injector = args.injector(0)?;
    let instance = injector.invoke(original)?;

    let mut locals = Bindings::default();
    locals.insert(DECORATED_INSTANCE.to_owned(), instance);
    injector.invoke_with(decorator, &locals, Vec::new())
}
