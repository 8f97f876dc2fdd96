//! Core import-resolution engine for wasmlink.
//!
//! This crate provides the linking step between a compiled WebAssembly
//! module and the bindings its embedder supplies:
//! - [`ModuleDescriptor`]: the static import/export surface of a module
//! - [`ImportRegistry`]: named [`Extern`] bindings accumulated by the embedder
//! - [`Resolver`]: matches declared imports against the registry and
//!   produces a fully linked [`Instance`]
//! - [`ModuleCatalog`]: a concurrent map of decoded descriptors
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                  ModuleDescriptor                       │
//! │  (Immutable, decoded once, shared across resolutions)   │
//! │  - Ordered import declarations                          │
//! │  - Ordered export declarations                          │
//! └─────────────────────────────────────────────────────────┘
//!                            │
//!                            ▼
//! ┌─────────────────────────────────────────────────────────┐
//! │           ImportRegistry  +  Resolver                   │
//! │  (Registry built incrementally, last write wins)        │
//! │  - Lookup by (namespace, name)                          │
//! │  - Structural type check per import                     │
//! └─────────────────────────────────────────────────────────┘
//!                            │
//!                            ▼
//! ┌─────────────────────────────────────────────────────────┐
//! │                      Instance                           │
//! │  (Resolved externs in declaration order)                │
//! │  - Shared ownership of bindings                         │
//! │  - Exported surface of the module                       │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! Resolution is atomic: either every import resolves and an instance is
//! produced, or no instance exists at all.

pub mod catalog;
mod decode;
pub mod externs;
pub mod instance;
pub mod module;
pub mod registry;
pub mod resolver;

pub use catalog::ModuleCatalog;
pub use externs::{Extern, Function, Global, Memory, Table, Value};
pub use instance::Instance;
pub use module::ModuleDescriptor;
pub use registry::{ImportRegistry, SharedRegistry};
pub use resolver::Resolver;
