//! Memoizing name-keyed resolver
//!
//! An [`Injector`] resolves names against its key store and falls back
//! to a factory function on a miss. Every result is cached, so a
//! factory runs at most once per name for the injector's lifetime.
//!
//! While a name is being resolved its slot holds [`Slot::Pending`].
//! Finding that marker again on the same resolution path means the
//! name depends on itself, which is reported as a ring dependency.

use crate::{
    Arguments, Bindings, Descriptor, DiError, KeyStore, MethodObject, Owner, Result, Terminal,
    Tracer, Value,
};
use parking_lot::{Mutex, MutexGuard, ReentrantMutex};
use std::sync::{Arc, Weak};

#[cfg(feature = "logging")]
use tracing::{debug, trace};

/// Fallback invoked on a cache miss
type FallbackFn = Box<dyn Fn(&Injector, &str) -> Result<Value> + Send + Sync>;

/// Reentrant lock serializing resolutions of one container
pub(crate) type Gate = Arc<ReentrantMutex<()>>;

/// A cache slot.
#[derive(Debug, Clone)]
pub enum Slot {
    /// The name is mid-resolution
    Pending,
    /// The resolved value
    Ready(Value),
}

impl Slot {
    /// The resolved value, if any.
    #[inline]
    pub fn ready(&self) -> Option<&Value> {
        match self {
            Slot::Ready(value) => Some(value),
            Slot::Pending => None,
        }
    }
}

/// Something a descriptor's terminal resolved to.
enum Callable {
    Function(crate::Function),
    Method(MethodObject, String),
}

impl Callable {
    fn call(&self, args: Arguments) -> Result<Value> {
        match self {
            Callable::Function(function) => function.call(args),
            Callable::Method(object, method) => object.call(method, args),
        }
    }
}

struct InjectorInner {
    store: Mutex<KeyStore<Slot>>,
    fallback: FallbackFn,
    tracer: Tracer,
    gate: Gate,
}

/// Memoizing resolver over a key store.
///
/// Cloning is cheap; clones share the same cache.
///
/// # Examples
///
/// ```rust
/// use named_injector::{DiError, Descriptor, Function, Injector, KeyStore, Tracer, Value};
///
/// let mut cache = KeyStore::new();
/// cache.set("key", Value::new(String::from("value")));
///
/// let injector = Injector::new(
///     cache,
///     |_, name| Err(DiError::not_found(name, "")),
///     Tracer::new(),
/// );
///
/// let shout = Descriptor::new(
///     ["key"],
///     Function::new(|args| Ok(Value::new(format!("{}!", args.get::<String>(0)?)))),
/// );
/// let out = injector.invoke(&shout).unwrap();
/// assert_eq!(out.downcast_ref::<String>().unwrap(), "value!");
/// assert!(injector.get("missing").is_err());
/// ```
#[derive(Clone)]
pub struct Injector {
    inner: Arc<InjectorInner>,
}

impl Injector {
    /// Create an injector over `cache` with its own resolution gate.
    pub fn new<F>(cache: KeyStore, fallback: F, tracer: Tracer) -> Self
    where
        F: Fn(&Injector, &str) -> Result<Value> + Send + Sync + 'static,
    {
        Self::with_gate(cache, fallback, tracer, Arc::new(ReentrantMutex::new(())))
    }

    /// Create an injector sharing `gate` with other injectors of the same container.
    pub(crate) fn with_gate<F>(cache: KeyStore, fallback: F, tracer: Tracer, gate: Gate) -> Self
    where
        F: Fn(&Injector, &str) -> Result<Value> + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(InjectorInner {
                store: Mutex::new(cache.map(Slot::Ready)),
                fallback: Box::new(fallback),
                tracer,
                gate,
            }),
        }
    }

    /// Whether the cache holds `name`. Never triggers resolution.
    #[inline]
    pub fn has(&self, name: &str) -> bool {
        self.inner.store.lock().has(name)
    }

    /// Resolve `name`, running the fallback on the first request only.
    pub fn get(&self, name: &str) -> Result<Value> {
        let _gate = self.inner.gate.lock();

        if !self.has(name) {
            self.inner.store.lock().set(name, Slot::Pending);
            self.inner.tracer.request(name);

            #[cfg(feature = "logging")]
            trace!(
                target: "named_injector",
                name = name,
                "Cache miss, running fallback factory"
            );

            let value = (self.inner.fallback)(self, name)?;
            self.inner.store.lock().set(name, Slot::Ready(value));
            self.inner.tracer.received();
        }

        let slot = self.inner.store.lock().get(name).cloned();
        match slot {
            Some(Slot::Ready(value)) => Ok(value),
            _ => {
                self.inner.tracer.note(format!("{name} is a ring dependency"));

                #[cfg(feature = "logging")]
                debug!(
                    target: "named_injector",
                    name = name,
                    "Ring dependency detected"
                );

                Err(DiError::ring(name, &self.inner.tracer))
            }
        }
    }

    /// Call the descriptor's terminal with its resolved dependencies.
    #[inline]
    pub fn invoke(&self, descriptor: &Descriptor) -> Result<Value> {
        self.invoke_with(descriptor, &Bindings::default(), Vec::new())
    }

    /// Like [`invoke`](Self::invoke), with local bindings consulted before
    /// the cache and leading arguments placed before the dependencies.
    pub fn invoke_with(
        &self,
        descriptor: &Descriptor,
        locals: &Bindings,
        leading: Vec<Value>,
    ) -> Result<Value> {
        let args = self.arguments(descriptor, locals, leading)?;

        match self.resolve_callable(descriptor.terminal())? {
            Some(callable) => callable.call(args),
            None => Err(DiError::invalid_factory(
                descriptor.terminal().to_string(),
                &self.inner.tracer,
            )),
        }
    }

    /// Build the descriptor's constructible terminal with its resolved dependencies.
    #[inline]
    pub fn instantiate(&self, descriptor: &Descriptor) -> Result<Value> {
        self.instantiate_with(descriptor, &Bindings::default(), Vec::new())
    }

    /// Like [`instantiate`](Self::instantiate), with local bindings and leading arguments.
    pub fn instantiate_with(
        &self,
        descriptor: &Descriptor,
        locals: &Bindings,
        leading: Vec<Value>,
    ) -> Result<Value> {
        let args = self.arguments(descriptor, locals, leading)?;

        match descriptor.terminal() {
            Terminal::Constructor(constructor) => constructor.construct(args),
            other => Err(DiError::instantiation(other.to_string(), &self.inner.tracer)),
        }
    }

    /// The shared trace log.
    #[inline]
    pub fn tracer(&self) -> &Tracer {
        &self.inner.tracer
    }

    /// A handle that does not keep this injector alive.
    #[inline]
    pub fn downgrade(&self) -> WeakInjector {
        WeakInjector {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Store a resolved value directly.
    #[inline]
    pub(crate) fn set(&self, name: impl Into<String>, value: Value) {
        self.inner.store.lock().set(name, Slot::Ready(value));
    }

    /// Lock the underlying store.
    #[inline]
    pub(crate) fn store(&self) -> MutexGuard<'_, KeyStore<Slot>> {
        self.inner.store.lock()
    }

    /// Copy of every resolved entry. Pending slots are left out.
    pub(crate) fn snapshot(&self) -> KeyStore {
        self.store()
            .iter()
            .filter_map(|(key, slot)| slot.ready().map(|value| (key.to_owned(), value.clone())))
            .collect()
    }

    /// Merge resolved entries into this store, see [`KeyStore::merge`].
    pub(crate) fn merge(&self, other: &KeyStore, prefix: Option<&str>) {
        self.store().merge(&other.clone().map(Slot::Ready), prefix);
    }

    /// Leading arguments followed by one value per dependency name.
    fn arguments(&self, descriptor: &Descriptor, locals: &Bindings, leading: Vec<Value>) -> Result<Arguments> {
        let dependencies = descriptor.dependencies();
        self.inner.tracer.depends_on(dependencies);

        let mut values = leading;
        values.reserve(dependencies.len());
        for name in dependencies {
            let value = match locals.get(name) {
                Some(local) => local.clone(),
                None => self.get(name)?,
            };
            values.push(value);
        }

        Ok(Arguments::new(values))
    }

    /// Turn a terminal into something callable, or `None` if it is not.
    fn resolve_callable(&self, terminal: &Terminal) -> Result<Option<Callable>> {
        let callable = match terminal {
            Terminal::Function(function) => Some(Callable::Function(function.clone())),
            Terminal::Method { owner, method } => {
                let object = match owner {
                    Owner::Object(object) => Some(object.clone()),
                    Owner::Name(name) => {
                        self.inner
                            .tracer
                            .note(format!("Trying to resolve '{name}::{method}' as factory"));
                        self.get(name)?.as_object().cloned()
                    }
                };
                object
                    .filter(|object| object.responds_to(method))
                    .map(|object| Callable::Method(object, method.clone()))
            }
            Terminal::Reference(name) => {
                self.inner
                    .tracer
                    .note(format!("Trying to resolve '{name}' as factory"));
                self.get(name)?.as_function().cloned().map(Callable::Function)
            }
            Terminal::Constructor(_) | Terminal::Name(_) => None,
        };

        Ok(callable)
    }
}

impl std::fmt::Debug for Injector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Injector")
            .field("cached", &self.inner.store.lock().len())
            .finish()
    }
}

/// Non-owning handle to an [`Injector`].
///
/// This is what a container registers under `Injector`, so the
/// container's own cache never keeps it alive.
#[derive(Clone)]
pub struct WeakInjector {
    inner: Weak<InjectorInner>,
}

impl WeakInjector {
    /// Upgrade to a strong handle if the injector still exists.
    #[inline]
    pub fn upgrade(&self) -> Option<Injector> {
        self.inner.upgrade().map(|inner| Injector { inner })
    }
}

impl std::fmt::Debug for WeakInjector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeakInjector")
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Construct, Function, Methods};
    use std::sync::atomic::{AtomicU32, Ordering};

    struct Foo {
        a: Arc<i32>,
        b: Arc<i32>,
        c: Arc<i32>,
    }

    impl Construct for Foo {
        fn parameters() -> &'static [&'static str] {
            &["A", "B", "C"]
        }

        fn construct(args: Arguments) -> Result<Self> {
            Ok(Foo {
                a: args.get(0)?,
                b: args.get(1)?,
                c: args.get(2)?,
            })
        }
    }

    struct Controller;

    impl Methods for Controller {
        fn responds_to(&self, method: &str) -> bool {
            method == "join"
        }

        fn call(&self, _method: &str, args: Arguments) -> Result<Value> {
            Ok(Value::new(format!(
                "{} {}",
                args.get::<String>(0)?,
                args.get::<String>(1)?
            )))
        }
    }

    fn cache_of(entries: &[(&str, i32)]) -> KeyStore {
        entries
            .iter()
            .map(|(key, value)| (key.to_string(), Value::new(*value)))
            .collect()
    }

    fn not_found(_: &Injector, name: &str) -> Result<Value> {
        Err(DiError::not_found(name, ""))
    }

    fn foo_of(value: &Value) -> (i32, i32, i32) {
        let foo = value.downcast_ref::<Foo>().unwrap();
        (*foo.a, *foo.b, *foo.c)
    }

    #[test]
    fn test_has() {
        let injector = Injector::new(cache_of(&[("key", 1)]), not_found, Tracer::new());

        assert!(injector.has("key"));
        assert!(!injector.has("unknownKey"));
    }

    #[test]
    fn test_get_memoizes_fallback() {
        static CALLS: AtomicU32 = AtomicU32::new(0);

        let injector = Injector::new(
            KeyStore::new(),
            |_, name| {
                CALLS.fetch_add(1, Ordering::SeqCst);
                Ok(Value::new(name.to_string()))
            },
            Tracer::new(),
        );

        let first = injector.get("x").unwrap();
        let second = injector.get("x").unwrap();

        assert_eq!(CALLS.load(Ordering::SeqCst), 1);
        assert!(first.ptr_eq(&second));
        assert!(injector.has("x"));
    }

    #[test]
    fn test_get_detects_ring() {
        let injector = Injector::new(
            KeyStore::new(),
            |injector, name| match name {
                "A" => injector.get("B"),
                _ => injector.get("A"),
            },
            Tracer::new(),
        );

        let err = injector.get("A").unwrap_err();
        assert!(matches!(err, DiError::RingDependency { ref name, .. } if name == "A"));
        assert!(err.to_string().contains("A requested ("));
    }

    #[test]
    fn test_failed_resolution_leaves_pending_slot() {
        let injector = Injector::new(KeyStore::new(), not_found, Tracer::new());

        assert!(matches!(
            injector.get("missing"),
            Err(DiError::DependencyNotFound { .. })
        ));
        assert!(injector.has("missing"));
        assert!(matches!(injector.store().get("missing"), Some(Slot::Pending)));
    }

    #[test]
    fn test_invoke() {
        let mut cache = KeyStore::new();
        cache.set("key", Value::new(String::from("value")));
        let injector = Injector::new(cache, not_found, Tracer::new());

        // Usual case
        let descriptor = Descriptor::new(["key"], Function::new(|args| Ok(args.value(0)?.clone())));
        let out = injector.invoke(&descriptor).unwrap();
        assert_eq!(out.downcast_ref::<String>().unwrap(), "value");

        // With local and leading arguments
        let mut locals = Bindings::default();
        locals.insert("local".into(), Value::new(String::from("value2")));
        let descriptor = Descriptor::new(
            ["key", "local"],
            Function::new(|args| {
                Ok(Value::new(format!(
                    "{}|{}|{}",
                    args.get::<String>(0)?,
                    args.get::<String>(1)?,
                    args.get::<String>(2)?
                )))
            }),
        );
        let out = injector
            .invoke_with(&descriptor, &locals, vec![Value::new(String::from("value3"))])
            .unwrap();
        assert_eq!(out.downcast_ref::<String>().unwrap(), "value3|value|value2");
    }

    #[test]
    fn test_instantiate() {
        let injector = Injector::new(cache_of(&[("A", 1), ("B", 2), ("C", 3)]), not_found, Tracer::new());
        let descriptor = Descriptor::new(["A", "B", "C"], Terminal::constructor::<Foo>());

        // Usual case
        assert_eq!(foo_of(&injector.instantiate(&descriptor).unwrap()), (1, 2, 3));

        // With local dependencies
        let mut locals = Bindings::default();
        locals.insert("B".into(), Value::new(4i32));
        let value = injector.instantiate_with(&descriptor, &locals, Vec::new()).unwrap();
        assert_eq!(foo_of(&value), (1, 4, 3));

        // With local and leading arguments
        let descriptor = Descriptor::new(["B", "C"], Terminal::constructor::<Foo>());
        let value = injector
            .instantiate_with(&descriptor, &locals, vec![Value::new(5i32)])
            .unwrap();
        assert_eq!(foo_of(&value), (5, 4, 3));
    }

    #[test]
    fn test_instantiate_with_unknown_constructor() {
        let injector = Injector::new(cache_of(&[("A", 1)]), not_found, Tracer::new());
        let descriptor = Descriptor::new(["A"], Terminal::named("UnknownClassName"));

        let err = injector.instantiate(&descriptor).unwrap_err();
        assert!(err.to_string().starts_with("Instantiation of UnknownClassName not possible."));
    }

    #[test]
    fn test_instantiate_with_function_terminal() {
        let injector = Injector::new(KeyStore::new(), not_found, Tracer::new());
        let descriptor = Descriptor::new(Vec::<String>::new(), Function::new(|_| Ok(Value::null())));

        assert!(matches!(
            injector.instantiate(&descriptor),
            Err(DiError::Instantiation { .. })
        ));
    }

    #[test]
    fn test_late_bound_terminals() {
        let mut cache = KeyStore::new();
        cache.set("Dep1", Value::new(String::from("A")));
        cache.set("Dep2", Value::new(String::from("B")));
        cache.set("Controller", Value::object(Controller));
        cache.set(
            "Swap",
            Value::function(Function::new(|args| {
                Ok(Value::new(format!(
                    "{} {}",
                    args.get::<String>(1)?,
                    args.get::<String>(0)?
                )))
            })),
        );
        cache.set("NotCallable", Value::new(String::from("no-callable")));
        let injector = Injector::new(cache, not_found, Tracer::new());

        let method = Descriptor::new(["Dep1", "Dep2"], Terminal::method("Controller", "join"));
        let out = injector.invoke(&method).unwrap();
        assert_eq!(out.downcast_ref::<String>().unwrap(), "A B");

        let reference = Descriptor::new(["Dep1", "Dep2"], Terminal::reference("Swap"));
        let out = injector.invoke(&reference).unwrap();
        assert_eq!(out.downcast_ref::<String>().unwrap(), "B A");

        let invalid = Descriptor::new(["Dep1"], Terminal::reference("NotCallable"));
        assert!(matches!(injector.invoke(&invalid), Err(DiError::InvalidFactory { .. })));

        let unknown = Descriptor::new(["Dep1"], Terminal::method("Controller", "missing"));
        assert!(matches!(injector.invoke(&unknown), Err(DiError::InvalidFactory { .. })));

        let constructor = Descriptor::new(["A"], Terminal::constructor::<Foo>());
        assert!(matches!(
            injector.invoke(&constructor),
            Err(DiError::DependencyNotFound { .. })
        ));
    }

    #[test]
    fn test_weak_handle() {
        let injector = Injector::new(KeyStore::new(), not_found, Tracer::new());
        let weak = injector.downgrade();

        assert!(weak.upgrade().is_some());
        drop(injector);
        assert!(weak.upgrade().is_none());
    }
}
