//! A shared catalog of decoded modules keyed by caller-chosen ids.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use wasmlink_common::LinkError;

use crate::module::ModuleDescriptor;

/// A concurrent map from module id to [`ModuleDescriptor`].
///
/// Cloning the catalog shares the underlying map, so one catalog can be
/// handed to many workers. Descriptors themselves are immutable and cheap
/// to clone out.
#[derive(Clone, Default)]
pub struct ModuleCatalog {
    modules: Arc<DashMap<String, ModuleDescriptor>>,
}

impl ModuleCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode `bytes` and store the descriptor under `id`.
    ///
    /// Replaces any previous module with the same id.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::Decode`] when `bytes` is not a valid module.
    pub fn load(&self, id: impl Into<String>, bytes: &[u8]) -> Result<ModuleDescriptor, LinkError> {
        let id = id.into();
        let module = ModuleDescriptor::from_bytes(bytes)?;
        debug!(
            %id,
            hash = %module.content_hash(),
            imports = module.import_count(),
            exports = module.export_count(),
            "module loaded into catalog"
        );
        self.modules.insert(id, module.clone());
        Ok(module)
    }

    /// Store an already decoded descriptor under `id`.
    pub fn insert(&self, id: impl Into<String>, module: ModuleDescriptor) {
        self.modules.insert(id.into(), module);
    }

    /// Fetch the descriptor stored under `id`.
    pub fn get(&self, id: &str) -> Option<ModuleDescriptor> {
        self.modules.get(id).map(|entry| entry.value().clone())
    }

    /// Remove and return the descriptor stored under `id`.
    pub fn remove(&self, id: &str) -> Option<ModuleDescriptor> {
        self.modules.remove(id).map(|(_, module)| module)
    }

    /// All stored ids, sorted.
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.modules.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        ids
    }

    /// Number of stored modules.
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

impl std::fmt::Debug for ModuleCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleCatalog")
            .field("modules", &self.modules.len())
            .finish_non_exhaustive()
    }
}
