//! Configuration structures for wasmlink.
//!
//! This module defines the options that govern import resolution:
//! - [`ErrorMode`]: fail-fast or collect-all failure reporting
//! - [`ResolverConfig`]: the explicitly constructed, explicitly passed
//!   resolver configuration
//!
//! Configuration is always passed in by the embedder; there is no ambient
//! process-wide state, so independent embeddings in one process cannot
//! interfere with each other.

use serde::{Deserialize, Serialize};

/// How the resolver reports failures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorMode {
    /// Stop at the first unresolved or mismatched import, in declaration
    /// order.
    #[default]
    FailFast,

    /// Walk every declared import and report the full set of failures.
    CollectAll,
}

/// Resolver configuration.
///
/// Can be loaded from files (TOML, JSON) or built in code. Defaults match
/// the fail-fast behavior most embedders want.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Failure reporting mode.
    #[serde(default)]
    pub error_mode: ErrorMode,
}

impl ResolverConfig {
    /// Configuration that stops at the first failure.
    pub fn fail_fast() -> Self {
        Self {
            error_mode: ErrorMode::FailFast,
        }
    }

    /// Configuration that gathers every failure before reporting.
    pub fn collect_all() -> Self {
        Self {
            error_mode: ErrorMode::CollectAll,
        }
    }

    /// Returns `true` if every failure should be gathered.
    pub fn is_collect_all(&self) -> bool {
        self.error_mode == ErrorMode::CollectAll
    }
}
