//! A fully linked module.

use wasmlink_common::{ExportDescriptor, ImportKey};

use crate::externs::Extern;
use crate::module::ModuleDescriptor;

/// The result of successfully resolving every import of a module.
///
/// An instance only exists complete: resolution either produces one with a
/// binding for every declared import, or fails without producing anything.
/// Bindings are held in the module's declaration order.
#[derive(Debug, Clone)]
pub struct Instance {
    module: ModuleDescriptor,
    imports: Vec<(ImportKey, Extern)>,
}

impl Instance {
    pub(crate) fn new(module: ModuleDescriptor, imports: Vec<(ImportKey, Extern)>) -> Self {
        Self { module, imports }
    }

    /// The descriptor this instance was linked from.
    pub fn module(&self) -> &ModuleDescriptor {
        &self.module
    }

    /// All resolved bindings, in import declaration order.
    pub fn import_table(&self) -> &[(ImportKey, Extern)] {
        &self.imports
    }

    /// The binding that satisfied the import `(namespace, name)`.
    pub fn get_import(&self, namespace: &str, name: &str) -> Option<&Extern> {
        self.imports
            .iter()
            .find(|(key, _)| key.namespace == namespace && key.name == name)
            .map(|(_, value)| value)
    }

    /// The module's exports, in declaration order.
    pub fn exports(&self) -> impl ExactSizeIterator<Item = &ExportDescriptor> {
        self.module.exports()
    }

    /// The export named `name`, if the module declares one.
    pub fn export(&self, name: &str) -> Option<&ExportDescriptor> {
        self.module.export(name)
    }
}
