//! Type-erased values and positional arguments
//!
//! Every entry a container hands out is a [`Value`]: a shared,
//! type-erased `Arc` that remembers the name of the concrete type it
//! was built from. Factories receive their dependencies as
//! [`Arguments`] and read them back with typed accessors.

use crate::container::{Container, WeakContainer};
use crate::factory::{Function, MethodObject, Methods};
use crate::injector::{Injector, WeakInjector};
use crate::{DiError, Injectable, Result};
use std::any::Any;
use std::sync::Arc;

/// Local bindings consulted before the injector when resolving a
/// descriptor's dependency names.
pub type Bindings = ahash::AHashMap<String, Value>;

/// A shared, type-erased value.
///
/// Cloning a `Value` clones the `Arc`, so two clones always satisfy
/// [`Value::ptr_eq`].
///
/// # Examples
///
/// ```rust
/// use named_injector::Value;
///
/// let greeting = Value::new(String::from("Hello"));
/// assert_eq!(greeting.downcast_ref::<String>().map(String::as_str), Some("Hello"));
/// assert!(greeting.ptr_eq(&greeting.clone()));
/// assert!(greeting.downcast::<u32>().is_none());
/// ```
#[derive(Clone)]
pub struct Value {
    inner: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl Value {
    /// Wrap an owned value.
    #[inline]
    pub fn new<T: Injectable>(value: T) -> Self {
        Self::from_arc(Arc::new(value))
    }

    /// Wrap an existing `Arc` without re-allocating.
    #[inline]
    pub fn from_arc<T: Injectable>(value: Arc<T>) -> Self {
        Self {
            inner: value as Arc<dyn Any + Send + Sync>,
            type_name: std::any::type_name::<T>(),
        }
    }

    /// The unit value, used where a factory has nothing to return.
    #[inline]
    pub fn null() -> Self {
        Self::new(())
    }

    /// A value that is itself invocable.
    #[inline]
    pub fn function(function: Function) -> Self {
        Self::new(function)
    }

    /// A value whose methods can be addressed by name.
    #[inline]
    pub fn object<M: Methods + 'static>(object: M) -> Self {
        Self::new(MethodObject::new(object))
    }

    /// Whether this is the unit value.
    #[inline]
    pub fn is_null(&self) -> bool {
        self.is::<()>()
    }

    /// Whether the wrapped value is a `T`.
    #[inline]
    pub fn is<T: 'static>(&self) -> bool {
        self.inner.is::<T>()
    }

    /// Borrow the wrapped value as `T`.
    #[inline]
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    /// Get a typed `Arc` sharing ownership with this value.
    #[inline]
    pub fn downcast<T: Injectable>(&self) -> Option<Arc<T>> {
        Arc::clone(&self.inner).downcast::<T>().ok()
    }

    /// Whether both values point at the same allocation.
    #[inline]
    pub fn ptr_eq(&self, other: &Value) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Name of the concrete type this value was built from.
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// The function this value holds, if it is invocable.
    #[inline]
    pub fn as_function(&self) -> Option<&Function> {
        self.downcast_ref::<Function>()
    }

    /// The method object this value holds, if any.
    #[inline]
    pub fn as_object(&self) -> Option<&MethodObject> {
        self.downcast_ref::<MethodObject>()
    }
}

impl std::fmt::Debug for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Value")
            .field("type_name", &self.type_name)
            .finish()
    }
}

/// Positional arguments handed to a factory.
///
/// Leading arguments come first, followed by one value per dependency
/// name, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct Arguments {
    values: Vec<Value>,
}

impl Arguments {
    /// Create from already resolved values.
    #[inline]
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    /// Number of arguments.
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no arguments were supplied.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The raw value at `index`.
    pub fn value(&self, index: usize) -> Result<&Value> {
        self.values.get(index).ok_or(DiError::MissingArgument {
            index,
            len: self.values.len(),
        })
    }

    /// The argument at `index` as a shared `T`.
    pub fn get<T: Injectable>(&self, index: usize) -> Result<Arc<T>> {
        let value = self.value(index)?;
        value
            .downcast::<T>()
            .ok_or_else(|| DiError::type_mismatch::<T>(format!("argument #{index}"), value.type_name()))
    }

    /// The argument at `index`, cloned out of its `Arc`.
    pub fn cloned<T: Injectable + Clone>(&self, index: usize) -> Result<T> {
        self.get::<T>(index).map(|arc| (*arc).clone())
    }

    /// The self-registered container at `index`, upgraded to a strong handle.
    pub fn container(&self, index: usize) -> Result<Container> {
        self.get::<WeakContainer>(index)?
            .upgrade()
            .ok_or(DiError::ContainerDropped)
    }

    /// The self-registered injector at `index`, upgraded to a strong handle.
    pub fn injector(&self, index: usize) -> Result<Injector> {
        self.get::<WeakInjector>(index)?
            .upgrade()
            .ok_or(DiError::ContainerDropped)
    }

    /// Iterate over the raw values.
    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.values.iter()
    }

    /// Consume into the underlying vector.
    #[inline]
    pub fn into_vec(self) -> Vec<Value> {
        self.values
    }
}

impl From<Vec<Value>> for Arguments {
    fn from(values: Vec<Value>) -> Self {
        Self::new(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone)]
    struct Database {
        url: String,
    }

    #[test]
    fn test_value_downcast() {
        let value = Value::new(Database { url: "test".into() });

        assert!(value.is::<Database>());
        assert_eq!(value.downcast_ref::<Database>().unwrap().url, "test");
        assert!(value.downcast::<String>().is_none());
        assert!(value.type_name().ends_with("Database"));
    }

    #[test]
    fn test_value_identity() {
        let a = Value::new(Database { url: "a".into() });
        let b = a.clone();
        let c = Value::new(Database { url: "a".into() });

        assert!(a.ptr_eq(&b));
        assert!(!a.ptr_eq(&c));

        let arc_a = a.downcast::<Database>().unwrap();
        let arc_b = b.downcast::<Database>().unwrap();
        assert!(Arc::ptr_eq(&arc_a, &arc_b));
    }

    #[test]
    fn test_null_is_distinct_value() {
        let null = Value::null();
        assert!(null.is_null());
        assert!(!Value::new(0u8).is_null());
    }

    #[test]
    fn test_arguments_typed_access() {
        let args = Arguments::new(vec![Value::new(7u32), Value::new(String::from("x"))]);

        assert_eq!(args.len(), 2);
        assert_eq!(*args.get::<u32>(0).unwrap(), 7);
        assert_eq!(args.cloned::<String>(1).unwrap(), "x");

        assert!(matches!(args.get::<String>(0), Err(DiError::TypeMismatch { .. })));
        assert!(matches!(
            args.value(2),
            Err(DiError::MissingArgument { index: 2, len: 2 })
        ));
    }
}
