//! Common types, errors, and configuration for wasmlink.
//!
//! This crate provides the shared vocabulary used across the wasmlink
//! workspace:
//! - The static type model for imports and exports ([`types`])
//! - Error types using `thiserror` for type-safe error handling ([`error`])
//! - Resolver configuration ([`config`])

pub mod config;
pub mod error;
pub mod types;

pub use config::{ErrorMode, ResolverConfig};
pub use error::{HostError, LinkError};
pub use types::{
    ExportDescriptor, ExternKind, ExternType, FuncType, GlobalType, ImportDescriptor, ImportKey,
    Limits, MemoryType, Mutability, TableType, ValType,
};
