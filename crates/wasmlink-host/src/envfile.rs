//! Environment file structures for wasmlink.
//!
//! An environment file is a TOML description of import bindings to make
//! available at link time: function signatures, memories, tables, and
//! globals. [`registry_from_env`] turns the description into a concrete
//! [`ImportRegistry`], with functions materialized as trapping stubs so
//! that link checking needs no executable host code.

use std::path::Path;

use serde::{Deserialize, Serialize};

use wasmlink_common::{
    FuncType, GlobalType, LinkError, MemoryType, Mutability, TableType, ValType,
};
use wasmlink_core::{Function, Global, ImportRegistry, Memory, Table, Value};

/// Top-level environment file structure.
///
/// # Example
///
/// ```toml
/// [[functions]]
/// namespace = "wasi"
/// name = "clock_time_get"
/// params = ["i32", "i64", "i32"]
/// results = ["i32"]
///
/// [[memories]]
/// namespace = "env"
/// name = "memory"
/// min = 1
/// max = 16
///
/// [[globals]]
/// namespace = "env"
/// name = "heap_base"
/// type = "i32"
/// mutable = false
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct EnvFile {
    /// Function bindings to stub out.
    #[serde(default)]
    pub functions: Vec<FunctionEntry>,

    /// Memory bindings to create.
    #[serde(default)]
    pub memories: Vec<MemoryEntry>,

    /// Table bindings to create.
    #[serde(default)]
    pub tables: Vec<TableEntry>,

    /// Global bindings to create.
    #[serde(default)]
    pub globals: Vec<GlobalEntry>,
}

impl EnvFile {
    /// Load an environment description from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::InvalidConfig`] if the file cannot be read or
    /// parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, LinkError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            LinkError::invalid_config(format!(
                "failed to read env file '{}': {e}",
                path.as_ref().display()
            ))
        })?;
        Self::from_toml(&content)
    }

    /// Parse an environment description from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::InvalidConfig`] if the string is not valid TOML.
    pub fn from_toml(content: &str) -> Result<Self, LinkError> {
        toml::from_str(content)
            .map_err(|e| LinkError::invalid_config(format!("failed to parse env file: {e}")))
    }
}

/// A function binding declared in an environment file.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FunctionEntry {
    /// Import namespace (e.g. `wasi`).
    pub namespace: String,

    /// Import name within the namespace.
    pub name: String,

    /// Parameter types, in order.
    #[serde(default)]
    pub params: Vec<ValType>,

    /// Result types, in order.
    #[serde(default)]
    pub results: Vec<ValType>,
}

/// A memory binding declared in an environment file.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MemoryEntry {
    /// Import namespace.
    pub namespace: String,

    /// Import name within the namespace.
    pub name: String,

    /// Minimum size in pages.
    pub min: u64,

    /// Optional maximum size in pages.
    pub max: Option<u64>,
}

/// A table binding declared in an environment file.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TableEntry {
    /// Import namespace.
    pub namespace: String,

    /// Import name within the namespace.
    pub name: String,

    /// Element type; must be a reference type.
    #[serde(default = "defaults::table_element")]
    pub element: ValType,

    /// Minimum size in elements.
    pub min: u64,

    /// Optional maximum size in elements.
    pub max: Option<u64>,
}

/// A global binding declared in an environment file.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GlobalEntry {
    /// Import namespace.
    pub namespace: String,

    /// Import name within the namespace.
    pub name: String,

    /// The global's value type.
    #[serde(rename = "type")]
    pub ty: ValType,

    /// Whether the global is mutable.
    #[serde(default)]
    pub mutable: bool,
}

/// Build a registry from an environment description.
///
/// Functions become trapping stubs with the declared signature; memories,
/// tables, and globals become real bindings sized at their declared
/// minimums, with globals holding the zero value of their type.
///
/// # Errors
///
/// Returns [`LinkError::InvalidConfig`] when a table entry declares a
/// non-reference element type.
pub fn registry_from_env(env: &EnvFile) -> Result<ImportRegistry, LinkError> {
    let mut registry = ImportRegistry::new();

    for entry in &env.functions {
        let ty = FuncType::new(entry.params.iter().copied(), entry.results.iter().copied());
        registry.define(&entry.namespace, &entry.name, Function::stub(ty));
    }

    for entry in &env.memories {
        registry.define(
            &entry.namespace,
            &entry.name,
            Memory::new(MemoryType::new(entry.min, entry.max)),
        );
    }

    for entry in &env.tables {
        if !entry.element.is_ref() {
            return Err(LinkError::invalid_config(format!(
                "table '{}::{}' has non-reference element type {}",
                entry.namespace, entry.name, entry.element
            )));
        }
        registry.define(
            &entry.namespace,
            &entry.name,
            Table::new(TableType::new(entry.element, entry.min, entry.max)),
        );
    }

    for entry in &env.globals {
        let value = Value::default_for(entry.ty);
        let global = if entry.mutable {
            Global::new_mut(value)
        } else {
            Global::new(value)
        };
        registry.define(&entry.namespace, &entry.name, global);
    }

    Ok(registry)
}

/// Default value functions for serde.
mod defaults {
    use wasmlink_common::ValType;

    pub const fn table_element() -> ValType {
        ValType::FuncRef
    }
}
