//! The standard host environment.
//!
//! Guest modules built against this runtime expect a small `env` namespace:
//! a logging function and an abort function. [`base_environment`] builds a
//! registry with both, and [`register_all`] adds them to an existing one.

use tracing::{debug, error, info, warn};

use wasmlink_common::{FuncType, HostError, ValType};
use wasmlink_core::{Function, ImportRegistry, Value};

/// Log levels accepted from guest code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Verbose diagnostics.
    Debug,
    /// Normal operation.
    Info,
    /// Something unexpected but recoverable.
    Warn,
    /// A failure.
    Error,
}

/// Convert a numeric log level to [`LogLevel`].
///
/// Guests pass levels as integers (0=debug, 1=info, 2=warn, 3=error);
/// unknown values default to Info.
pub fn level_from_i32(level: i32) -> LogLevel {
    match level {
        0 => LogLevel::Debug,
        2 => LogLevel::Warn,
        3 => LogLevel::Error,
        _ => LogLevel::Info, // 1 and unknown values default to Info
    }
}

/// A registry pre-populated with the standard `env` namespace.
pub fn base_environment() -> ImportRegistry {
    let mut registry = ImportRegistry::new();
    register_all(&mut registry);
    registry
}

/// Register every standard host function on `registry`.
///
/// Registers:
/// - `env::log(level: i32, ptr: i32, len: i32)`
/// - `env::abort(msg: i32, file: i32, line: i32, col: i32)`
/// - `env::clock_ms() -> i64`
pub fn register_all(registry: &mut ImportRegistry) {
    register_logging(registry);
    register_abort(registry);
    register_clock(registry);
}

/// Register `env::log(level: i32, ptr: i32, len: i32)`.
///
/// The guest passes a level and a (pointer, length) pair naming a UTF-8
/// message in its own memory. Without an attached guest memory the message
/// bytes are unreachable from the host, so the call records the level and
/// location and emits them via `tracing`.
pub fn register_logging(registry: &mut ImportRegistry) {
    let ty = FuncType::new([ValType::I32, ValType::I32, ValType::I32], []);
    registry.define(
        "env",
        "log",
        Function::new(ty, |args| {
            let (Value::I32(level), Value::I32(ptr), Value::I32(len)) =
                (args[0], args[1], args[2])
            else {
                return Err(HostError::trap("env::log called with invalid arguments"));
            };
            if ptr < 0 || len < 0 {
                warn!(ptr, len, "invalid pointer or length (negative value)");
                return Ok(Vec::new());
            }
            match level_from_i32(level) {
                LogLevel::Debug => debug!(guest_log = true, ptr, len, "guest log"),
                LogLevel::Info => info!(guest_log = true, ptr, len, "guest log"),
                LogLevel::Warn => warn!(guest_log = true, ptr, len, "guest log"),
                LogLevel::Error => error!(guest_log = true, ptr, len, "guest log"),
            }
            Ok(Vec::new())
        }),
    );
}

/// Register `env::abort(msg: i32, file: i32, line: i32, col: i32)`.
///
/// Matches the abort signature AssemblyScript-style toolchains emit; every
/// call traps.
pub fn register_abort(registry: &mut ImportRegistry) {
    let ty = FuncType::new(
        [ValType::I32, ValType::I32, ValType::I32, ValType::I32],
        [],
    );
    registry.define(
        "env",
        "abort",
        Function::new(ty, |_| Err(HostError::trap("guest called env::abort"))),
    );
}

/// Register `env::clock_ms() -> i64`, milliseconds since the Unix epoch.
pub fn register_clock(registry: &mut ImportRegistry) {
    let ty = FuncType::new([], [ValType::I64]);
    registry.define(
        "env",
        "clock_ms",
        Function::new(ty, |_| {
            let millis = std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
                .unwrap_or(0);
            Ok(vec![Value::I64(millis)])
        }),
    );
}
