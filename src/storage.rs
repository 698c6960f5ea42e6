//! Key storage for the injectors
//!
//! Uses an insertion-ordered `IndexMap` hashed with `ahash`.

use crate::Value;
use ahash::RandomState;
use indexmap::IndexMap;

/// Keys that bind a container to itself.
///
/// They are never copied by [`KeyStore::merge`], so importing another
/// container cannot replace the importer's own bindings.
pub(crate) const SELF_BINDINGS: [&str; 4] =
    ["Container", "Injector", "ContainerProvider", "InjectorProvider"];

/// Insertion-ordered mapping from string key to value.
///
/// `get` returns `None` for a missing key, which stays distinguishable
/// from any stored value including [`Value::null`].
#[derive(Clone)]
pub struct KeyStore<V = Value> {
    entries: IndexMap<String, V, RandomState>,
}

impl<V> KeyStore<V> {
    /// Create an empty store.
    #[inline]
    pub fn new() -> Self {
        Self {
            entries: IndexMap::with_hasher(RandomState::new()),
        }
    }

    /// Insert or overwrite an entry.
    #[inline]
    pub fn set(&mut self, key: impl Into<String>, value: V) {
        self.entries.insert(key.into(), value);
    }

    /// Look up an entry.
    #[inline]
    pub fn get(&self, key: &str) -> Option<&V> {
        self.entries.get(key)
    }

    /// Check if a key exists
    #[inline]
    pub fn has(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Remove an entry, keeping the order of the others.
    #[inline]
    pub fn unset(&mut self, key: &str) -> Option<V> {
        self.entries.shift_remove(key)
    }

    /// Get number of entries
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys in insertion order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    /// Convert every value, keeping keys and order.
    pub fn map<W>(self, mut f: impl FnMut(V) -> W) -> KeyStore<W> {
        KeyStore {
            entries: self
                .entries
                .into_iter()
                .map(|(key, value)| (key, f(value)))
                .collect(),
        }
    }
}

impl<V: Clone> KeyStore<V> {
    /// Copy every entry of `other` into this store.
    ///
    /// With a prefix, each key is rewritten to `prefix/key`. The
    /// container self-bindings are always skipped. Existing keys are
    /// overwritten.
    pub fn merge(&mut self, other: &KeyStore<V>, prefix: Option<&str>) {
        for (key, value) in other.entries.iter() {
            if SELF_BINDINGS.contains(&key.as_str()) {
                continue;
            }

            let key = match prefix {
                Some(prefix) => format!("{prefix}/{key}"),
                None => key.clone(),
            };
            self.entries.insert(key, value.clone());
        }
    }
}

impl<V> Default for KeyStore<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> FromIterator<(String, V)> for KeyStore<V> {
    fn from_iter<I: IntoIterator<Item = (String, V)>>(iter: I) -> Self {
        let mut store = Self::new();
        store.entries.extend(iter);
        store
    }
}

impl<V> std::fmt::Debug for KeyStore<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyStore")
            .field("count", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_set_and_get() {
        let mut store = KeyStore::new();
        store.set("answer", Value::new(42u32));

        let value = store.get("answer").unwrap();
        assert_eq!(value.downcast_ref::<u32>(), Some(&42));
        assert!(store.get("missing").is_none());
    }

    #[test]
    fn test_store_null_is_present() {
        let mut store = KeyStore::new();
        store.set("nothing", Value::null());

        assert!(store.has("nothing"));
        assert!(store.get("nothing").unwrap().is_null());
    }

    #[test]
    fn test_store_overwrite_and_unset() {
        let mut store: KeyStore<u32> = KeyStore::new();
        store.set("a", 1);
        store.set("b", 2);
        store.set("a", 3);

        assert_eq!(store.get("a"), Some(&3));
        assert_eq!(store.keys().collect::<Vec<_>>(), ["a", "b"]);

        assert_eq!(store.unset("a"), Some(3));
        assert!(!store.has("a"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_merge_with_prefix() {
        let mut target: KeyStore<u32> = KeyStore::new();
        target.set("B", 1);

        let mut source: KeyStore<u32> = KeyStore::new();
        source.set("B", 2);
        source.set("C", 3);

        target.merge(&source, Some("Sub"));

        assert_eq!(target.get("B"), Some(&1));
        assert_eq!(target.get("Sub/B"), Some(&2));
        assert_eq!(target.get("Sub/C"), Some(&3));
    }

    #[test]
    fn test_merge_overwrites_and_skips_self_bindings() {
        let mut target: KeyStore<&str> = KeyStore::new();
        target.set("ContainerProvider", "mine");
        target.set("A", "old");

        let mut source: KeyStore<&str> = KeyStore::new();
        source.set("ContainerProvider", "theirs");
        source.set("InjectorProvider", "theirs");
        source.set("Container", "theirs");
        source.set("A", "new");

        target.merge(&source, None);

        assert_eq!(target.get("ContainerProvider"), Some(&"mine"));
        assert!(!target.has("InjectorProvider"));
        assert!(!target.has("Container"));
        assert_eq!(target.get("A"), Some(&"new"));

        target.merge(&source, Some("Sub"));
        assert!(!target.has("Sub/ContainerProvider"));
        assert_eq!(target.get("Sub/A"), Some(&"new"));
    }

    #[test]
    fn test_map_keeps_order() {
        let store: KeyStore<u32> = [("x".to_string(), 1), ("y".to_string(), 2)]
            .into_iter()
            .collect();
        let doubled = store.map(|v| v * 2);

        assert_eq!(doubled.iter().collect::<Vec<_>>(), [("x", &2), ("y", &4)]);
    }
}
