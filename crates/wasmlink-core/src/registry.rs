//! The import registry: named bindings keyed by `(namespace, name)`.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use wasmlink_common::ImportKey;

use crate::externs::Extern;

/// A mutable map of import bindings.
///
/// Registration is last-write-wins: registering under an occupied key
/// silently replaces the previous binding. Lookups borrow; resolution
/// clones the [`Extern`]s it selects, which shares their underlying state.
#[derive(Clone, Default)]
pub struct ImportRegistry {
    map: HashMap<ImportKey, Extern>,
}

impl ImportRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a binding, replacing any existing one under the same key.
    pub fn register(&mut self, key: ImportKey, value: impl Into<Extern>) {
        let value = value.into();
        debug!(%key, kind = ?value.kind(), "registering import binding");
        self.map.insert(key, value);
    }

    /// Register a binding under `(namespace, name)`.
    pub fn define(&mut self, namespace: &str, name: &str, value: impl Into<Extern>) {
        self.register(ImportKey::new(namespace, name), value);
    }

    /// Look up the binding for a key.
    pub fn lookup(&self, key: &ImportKey) -> Option<&Extern> {
        self.map.get(key)
    }

    /// Look up the binding for `(namespace, name)`.
    pub fn get(&self, namespace: &str, name: &str) -> Option<&Extern> {
        self.lookup(&ImportKey::new(namespace, name))
    }

    /// Copy every binding from `other` into this registry.
    ///
    /// Where both registries bind the same key, `other` wins.
    pub fn merge(&mut self, other: &ImportRegistry) {
        for (key, value) in &other.map {
            self.map.insert(key.clone(), value.clone());
        }
    }

    /// Register every `(name, binding)` pair under one namespace.
    pub fn register_namespace(
        &mut self,
        namespace: &str,
        contents: impl IntoIterator<Item = (String, Extern)>,
    ) {
        for (name, value) in contents {
            self.register(ImportKey::new(namespace, name), value);
        }
    }

    /// Whether any binding exists under `namespace`.
    pub fn contains_namespace(&self, namespace: &str) -> bool {
        self.map.keys().any(|key| key.namespace == namespace)
    }

    /// All bindings under `namespace`, sorted by name.
    ///
    /// Returns `None` when the namespace is empty.
    pub fn namespace(&self, namespace: &str) -> Option<Vec<(String, Extern)>> {
        let mut entries: Vec<(String, Extern)> = self
            .map
            .iter()
            .filter(|(key, _)| key.namespace == namespace)
            .map(|(key, value)| (key.name.clone(), value.clone()))
            .collect();
        if entries.is_empty() {
            return None;
        }
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        Some(entries)
    }

    /// Number of registered bindings.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Iterate over all bindings in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&ImportKey, &Extern)> {
        self.map.iter()
    }
}

impl std::fmt::Debug for ImportRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImportRegistry")
            .field("bindings", &self.map.len())
            .finish_non_exhaustive()
    }
}

impl Extend<(ImportKey, Extern)> for ImportRegistry {
    fn extend<T: IntoIterator<Item = (ImportKey, Extern)>>(&mut self, iter: T) {
        for (key, value) in iter {
            self.register(key, value);
        }
    }
}

impl FromIterator<(ImportKey, Extern)> for ImportRegistry {
    fn from_iter<T: IntoIterator<Item = (ImportKey, Extern)>>(iter: T) -> Self {
        let mut registry = Self::new();
        registry.extend(iter);
        registry
    }
}

/// A registry behind a lock, shared across threads.
///
/// Writers mutate in place; resolution works against a [`snapshot`] so a
/// concurrent registration can never produce a half-updated view.
///
/// [`snapshot`]: SharedRegistry::snapshot
#[derive(Clone, Default)]
pub struct SharedRegistry {
    inner: Arc<RwLock<ImportRegistry>>,
}

impl SharedRegistry {
    /// Create an empty shared registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing registry.
    pub fn from_registry(registry: ImportRegistry) -> Self {
        Self {
            inner: Arc::new(RwLock::new(registry)),
        }
    }

    /// Register a binding, replacing any existing one under the same key.
    pub fn register(&self, key: ImportKey, value: impl Into<Extern>) {
        self.inner.write().register(key, value);
    }

    /// Register a binding under `(namespace, name)`.
    pub fn define(&self, namespace: &str, name: &str, value: impl Into<Extern>) {
        self.inner.write().define(namespace, name, value);
    }

    /// Merge another registry in; `other` wins on conflicts.
    pub fn merge(&self, other: &ImportRegistry) {
        self.inner.write().merge(other);
    }

    /// Look up and clone the binding for a key.
    pub fn lookup(&self, key: &ImportKey) -> Option<Extern> {
        self.inner.read().lookup(key).cloned()
    }

    /// A point-in-time copy of the whole registry.
    pub fn snapshot(&self) -> ImportRegistry {
        self.inner.read().clone()
    }
}

impl std::fmt::Debug for SharedRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedRegistry")
            .field("bindings", &self.inner.read().len())
            .finish_non_exhaustive()
    }
}

/// Build an [`ImportRegistry`] from nested namespace blocks.
///
/// ```
/// use wasmlink_core::{imports, Function, Global, Value};
/// use wasmlink_common::FuncType;
///
/// let registry = imports! {
///     "env" => {
///         "abort" => Function::stub(FuncType::new([], [])),
///         "version" => Global::new(Value::I32(1)),
///     },
/// };
/// assert_eq!(registry.len(), 2);
/// ```
#[macro_export]
macro_rules! imports {
    ( $( $namespace:expr => { $( $name:expr => $value:expr ),* $(,)? } ),* $(,)? ) => {{
        let mut registry = $crate::ImportRegistry::new();
        $(
            $(
                registry.define($namespace, $name, $value);
            )*
        )*
        registry
    }};
}

/// Build the contents of one namespace as `Vec<(String, Extern)>`,
/// suitable for [`ImportRegistry::register_namespace`].
#[macro_export]
macro_rules! namespace {
    ( $( $name:expr => $value:expr ),* $(,)? ) => {
        vec![
            $( (::std::string::String::from($name), $crate::Extern::from($value)) ),*
        ]
    };
}
