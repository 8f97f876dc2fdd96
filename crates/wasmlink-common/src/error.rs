//! Error types for wasmlink.
//!
//! This module defines a hierarchy of error types using `thiserror`:
//! - [`LinkError`]: failures while decoding a module or resolving its imports
//! - [`HostError`]: failures raised by host-supplied bindings when used
//!
//! Resolution errors are always reported synchronously to the caller; a
//! partially linked instance is never observable.

use thiserror::Error;

use crate::types::{ExternType, ImportKey, ValType};

/// Errors from module decoding and import resolution.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LinkError {
    /// An import was declared by the module but has no binding in the
    /// registry.
    #[error("unresolved import `{key}`")]
    UnresolvedImport {
        /// The missing (namespace, name) pair.
        key: ImportKey,
    },

    /// A registered binding's type does not satisfy the declared import
    /// type.
    #[error("import type mismatch for `{key}`: expected {expected}, found {actual}")]
    ImportTypeMismatch {
        /// The import the binding was registered under.
        key: ImportKey,
        /// The type the module declared.
        expected: ExternType,
        /// The type of the supplied binding.
        actual: ExternType,
    },

    /// Several resolution errors, in declaration order.
    ///
    /// Only produced in collect-all mode, and only when more than one
    /// import fails; a single failure is reported bare.
    #[error("{} imports failed to resolve", errors.len())]
    Multiple {
        /// The individual failures, ordered by import declaration.
        errors: Vec<LinkError>,
    },

    /// The module binary could not be decoded into a descriptor.
    #[error("module decoding failed: {reason}")]
    Decode {
        /// Description of the decoding failure.
        reason: String,
    },

    /// Invalid configuration or environment description.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// Description of the configuration error.
        reason: String,
    },
}

impl LinkError {
    /// Create a new `UnresolvedImport` error.
    pub fn unresolved(key: ImportKey) -> Self {
        Self::UnresolvedImport { key }
    }

    /// Create a new `ImportTypeMismatch` error.
    pub fn mismatch(key: ImportKey, expected: ExternType, actual: ExternType) -> Self {
        Self::ImportTypeMismatch {
            key,
            expected,
            actual,
        }
    }

    /// Create a new `Decode` error.
    pub fn decode(reason: impl Into<String>) -> Self {
        Self::Decode {
            reason: reason.into(),
        }
    }

    /// Create a new `InvalidConfig` error.
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    /// Returns `true` if this error names a missing import.
    pub fn is_unresolved(&self) -> bool {
        matches!(self, Self::UnresolvedImport { .. })
    }

    /// Returns `true` if this error names a mis-typed import.
    pub fn is_mismatch(&self) -> bool {
        matches!(self, Self::ImportTypeMismatch { .. })
    }

    /// Flatten into the individual failures.
    ///
    /// `Multiple` yields its contents in order; any other error yields
    /// itself as a single element.
    pub fn into_errors(self) -> Vec<LinkError> {
        match self {
            Self::Multiple { errors } => errors,
            other => vec![other],
        }
    }
}

/// Errors raised by host-supplied bindings when used.
///
/// These are distinct from [`LinkError`]: resolution itself never calls a
/// host function, but the embedder may invoke resolved bindings afterwards.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HostError {
    /// The host function aborted execution.
    #[error("host function trapped: {message}")]
    Trap {
        /// Description of the trap.
        message: String,
    },

    /// A host function was called with the wrong number of arguments.
    #[error("host function called with {got} arguments, expected {expected}")]
    ArityMismatch {
        /// Number of parameters in the signature.
        expected: usize,
        /// Number of arguments supplied.
        got: usize,
    },

    /// A host function argument had the wrong type.
    #[error("argument {index} has type {got}, expected {expected}")]
    ArgumentType {
        /// Zero-based argument position.
        index: usize,
        /// The parameter type in the signature.
        expected: ValType,
        /// The type of the supplied value.
        got: ValType,
    },

    /// A write was attempted on an immutable global.
    #[error("cannot write to immutable global")]
    ImmutableGlobal,

    /// A global write would change the stored value's type.
    #[error("global value type {got} does not match {expected}")]
    GlobalTypeMismatch {
        /// The global's declared value type.
        expected: ValType,
        /// The type of the value being written.
        got: ValType,
    },

    /// A memory or table grow would exceed its declared maximum.
    #[error("{kind} grow past declared maximum {max}")]
    LimitExceeded {
        /// `"memory"` or `"table"`.
        kind: &'static str,
        /// The declared maximum.
        max: u64,
    },
}

impl HostError {
    /// Create a new `Trap` error.
    pub fn trap(message: impl Into<String>) -> Self {
        Self::Trap {
            message: message.into(),
        }
    }
}
