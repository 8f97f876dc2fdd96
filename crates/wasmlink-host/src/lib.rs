//! Host-side import environments for wasmlink.
//!
//! This crate provides the bindings a host makes available to guest
//! modules at link time:
//!
//! - [`env`]: The standard `env` namespace (logging, abort)
//! - [`envfile`]: TOML environment files describing additional bindings

pub mod env;
pub mod envfile;

pub use env::{LogLevel, base_environment, level_from_i32, register_all};
pub use envfile::{EnvFile, registry_from_env};
