//! Import resolution: binding a module's declared imports to a registry.

use tracing::{debug, instrument, warn};

use wasmlink_common::{LinkError, ResolverConfig};

use crate::instance::Instance;
use crate::module::ModuleDescriptor;
use crate::registry::{ImportRegistry, SharedRegistry};

/// Resolves module imports against a registry and produces instances.
///
/// Resolution is atomic: either every import finds a compatible binding
/// and an [`Instance`] is returned, or an error is returned and nothing is
/// produced. The configured [`ErrorMode`] decides whether the first
/// failure aborts the walk or every failure is gathered first; in both
/// modes errors surface in the module's import declaration order.
///
/// [`ErrorMode`]: wasmlink_common::ErrorMode
#[derive(Debug, Clone, Default)]
pub struct Resolver {
    config: ResolverConfig,
}

impl Resolver {
    /// Create a resolver with the default (fail-fast) configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a resolver with an explicit configuration.
    pub fn with_config(config: ResolverConfig) -> Self {
        Self { config }
    }

    /// The resolver's configuration.
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolve every import of `module` against `registry`.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::UnresolvedImport`] when a declared import has
    /// no binding, and [`LinkError::ImportTypeMismatch`] when a binding
    /// exists but its type does not satisfy the declaration. In
    /// collect-all mode, two or more failures come back wrapped in
    /// [`LinkError::Multiple`]; a single failure is returned bare.
    #[instrument(
        skip(self, module, registry),
        fields(module = %module.content_hash(), imports = module.import_count())
    )]
    pub fn instantiate(
        &self,
        module: &ModuleDescriptor,
        registry: &ImportRegistry,
    ) -> Result<Instance, LinkError> {
        let mut resolved = Vec::with_capacity(module.import_count());
        let mut errors = Vec::new();

        for import in module.imports() {
            let Some(binding) = registry.lookup(&import.key) else {
                warn!(key = %import.key, "unresolved import");
                let err = LinkError::unresolved(import.key.clone());
                if !self.config.is_collect_all() {
                    return Err(err);
                }
                errors.push(err);
                continue;
            };

            let actual = binding.ty();
            if !actual.satisfies(&import.ty) {
                warn!(key = %import.key, expected = %import.ty, %actual, "import type mismatch");
                let err = LinkError::mismatch(import.key.clone(), import.ty.clone(), actual);
                if !self.config.is_collect_all() {
                    return Err(err);
                }
                errors.push(err);
                continue;
            }

            resolved.push((import.key.clone(), binding.clone()));
        }

        match errors.len() {
            0 => {}
            1 => return Err(errors.remove(0)),
            _ => return Err(LinkError::Multiple { errors }),
        }

        debug!(imports = resolved.len(), "module linked");
        Ok(Instance::new(module.clone(), resolved))
    }

    /// Resolve against a point-in-time snapshot of a shared registry.
    ///
    /// A registration racing with this call lands entirely before or
    /// entirely after the snapshot; resolution never observes a partial
    /// update.
    pub fn instantiate_shared(
        &self,
        module: &ModuleDescriptor,
        registry: &SharedRegistry,
    ) -> Result<Instance, LinkError> {
        self.instantiate(module, &registry.snapshot())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::externs::{Function, Global, Memory, Table, Value};
    use crate::imports;
    use wasmlink_common::{
        ExternType, FuncType, ImportKey, MemoryType, TableType, ValType,
    };

    fn module(wat: &str) -> ModuleDescriptor {
        let bytes = wat::parse_str(wat).unwrap();
        ModuleDescriptor::from_bytes(&bytes).unwrap()
    }

    fn log_fn() -> Function {
        Function::stub(FuncType::new([ValType::I32], []))
    }

    const TWO_FUNC_IMPORTS: &str = r#"
        (module
            (import "env" "log" (func (param i32)))
            (import "env" "tick" (func (param i32)))
        )
    "#;

    #[test]
    fn test_zero_imports_always_link() {
        let module = module("(module)");
        let instance = Resolver::new()
            .instantiate(&module, &ImportRegistry::new())
            .unwrap();
        assert!(instance.import_table().is_empty());
    }

    #[test]
    fn test_resolves_in_declaration_order() {
        let module = module(TWO_FUNC_IMPORTS);
        let registry = imports! {
            "env" => {
                "tick" => log_fn(),
                "log" => log_fn(),
            },
        };

        let instance = Resolver::new().instantiate(&module, &registry).unwrap();
        let keys: Vec<String> = instance
            .import_table()
            .iter()
            .map(|(key, _)| key.to_string())
            .collect();
        assert_eq!(keys, vec!["env::log", "env::tick"]);
    }

    #[test]
    fn test_fail_fast_reports_first_missing() {
        let module = module(TWO_FUNC_IMPORTS);
        let registry = imports! {
            "env" => { "tick" => log_fn() },
        };

        let err = Resolver::new().instantiate(&module, &registry).unwrap_err();
        assert_eq!(err, LinkError::unresolved(ImportKey::new("env", "log")));
    }

    #[test]
    fn test_collect_all_reports_every_failure_in_order() {
        let module = module(
            r#"
            (module
                (import "env" "a" (func))
                (import "env" "b" (func (param i32)))
                (import "env" "c" (func))
            )
            "#,
        );
        // "b" present but with the wrong signature, "a" and "c" missing.
        let registry = imports! {
            "env" => { "b" => Function::stub(FuncType::new([ValType::I64], [])) },
        };

        let resolver = Resolver::with_config(ResolverConfig::collect_all());
        let err = resolver.instantiate(&module, &registry).unwrap_err();
        let errors = err.into_errors();
        assert_eq!(errors.len(), 3);
        assert_eq!(errors[0], LinkError::unresolved(ImportKey::new("env", "a")));
        assert!(errors[1].is_mismatch());
        assert_eq!(errors[2], LinkError::unresolved(ImportKey::new("env", "c")));
    }

    #[test]
    fn test_collect_all_single_failure_is_bare() {
        let module = module(r#"(module (import "env" "log" (func (param i32))))"#);
        let resolver = Resolver::with_config(ResolverConfig::collect_all());

        let err = resolver
            .instantiate(&module, &ImportRegistry::new())
            .unwrap_err();
        assert!(err.is_unresolved());
        assert!(!matches!(err, LinkError::Multiple { .. }));
    }

    #[test]
    fn test_function_signature_must_match_exactly() {
        let module = module(r#"(module (import "env" "f" (func (param i32) (result i32))))"#);
        let registry = imports! {
            "env" => {
                "f" => Function::stub(FuncType::new([ValType::I64], [ValType::I32]))
            },
        };

        let err = Resolver::new().instantiate(&module, &registry).unwrap_err();
        let LinkError::ImportTypeMismatch { key, expected, .. } = err else {
            panic!("expected a type mismatch, got {err:?}");
        };
        assert_eq!(key, ImportKey::new("env", "f"));
        assert_eq!(
            expected,
            ExternType::Function(FuncType::new([ValType::I32], [ValType::I32]))
        );
    }

    #[test]
    fn test_memory_limits_checked() {
        let module = module(r#"(module (import "env" "memory" (memory 2 10)))"#);

        // Smaller than the declared minimum.
        let too_small = imports! {
            "env" => { "memory" => Memory::new(MemoryType::new(1, Some(10))) },
        };
        assert!(Resolver::new().instantiate(&module, &too_small).is_err());

        // No maximum where the declaration requires one.
        let unbounded = imports! {
            "env" => { "memory" => Memory::new(MemoryType::new(2, None)) },
        };
        assert!(Resolver::new().instantiate(&module, &unbounded).is_err());

        // Equal bounds are acceptable.
        let exact = imports! {
            "env" => { "memory" => Memory::new(MemoryType::new(2, Some(10))) },
        };
        assert!(Resolver::new().instantiate(&module, &exact).is_ok());

        // Larger minimum, tighter maximum.
        let tighter = imports! {
            "env" => { "memory" => Memory::new(MemoryType::new(4, Some(8))) },
        };
        assert!(Resolver::new().instantiate(&module, &tighter).is_ok());
    }

    #[test]
    fn test_unbounded_declaration_accepts_any_maximum() {
        let module = module(r#"(module (import "env" "memory" (memory 1)))"#);
        let registry = imports! {
            "env" => { "memory" => Memory::new(MemoryType::new(1, Some(2))) },
        };
        assert!(Resolver::new().instantiate(&module, &registry).is_ok());
    }

    #[test]
    fn test_grown_memory_satisfies_larger_minimum() {
        // Declared minimum 4; supplied memory starts at 1 but grows to 4
        // before linking. Linking sees the current size.
        let module = module(r#"(module (import "env" "memory" (memory 4)))"#);
        let memory = Memory::new(MemoryType::new(1, None));
        memory.grow(3).unwrap();

        let registry = imports! { "env" => { "memory" => memory } };
        assert!(Resolver::new().instantiate(&module, &registry).is_ok());
    }

    #[test]
    fn test_table_element_type_must_match() {
        let module = module(r#"(module (import "env" "table" (table 1 funcref)))"#);
        let registry = imports! {
            "env" => {
                "table" => Table::new(TableType::new(ValType::ExternRef, 1, None))
            },
        };
        assert!(Resolver::new().instantiate(&module, &registry).is_err());
    }

    #[test]
    fn test_global_mutability_must_match() {
        let module = module(r#"(module (import "env" "counter" (global (mut i32))))"#);

        let immutable = imports! {
            "env" => { "counter" => Global::new(Value::I32(0)) },
        };
        let err = Resolver::new().instantiate(&module, &immutable).unwrap_err();
        assert!(err.is_mismatch());

        let mutable = imports! {
            "env" => { "counter" => Global::new_mut(Value::I32(0)) },
        };
        assert!(Resolver::new().instantiate(&module, &mutable).is_ok());
    }

    #[test]
    fn test_extern_kind_mismatch_is_a_type_error() {
        let module = module(r#"(module (import "env" "log" (func (param i32))))"#);
        let registry = imports! {
            "env" => { "log" => Global::new(Value::I32(0)) },
        };

        let err = Resolver::new().instantiate(&module, &registry).unwrap_err();
        assert!(err.is_mismatch());
    }

    #[test]
    fn test_last_registration_is_the_one_resolved() {
        let module = module(r#"(module (import "env" "counter" (global i32)))"#);

        let mut registry = ImportRegistry::new();
        registry.define("env", "counter", Global::new(Value::I32(1)));
        registry.define("env", "counter", Global::new(Value::I32(2)));

        let instance = Resolver::new().instantiate(&module, &registry).unwrap();
        let binding = instance.get_import("env", "counter").unwrap();
        assert_eq!(binding.global().unwrap().get(), Value::I32(2));
    }

    #[test]
    fn test_instance_shares_binding_state() {
        let module = module(r#"(module (import "env" "counter" (global (mut i32))))"#);
        let counter = Global::new_mut(Value::I32(0));
        let registry = imports! { "env" => { "counter" => counter.clone() } };

        let instance = Resolver::new().instantiate(&module, &registry).unwrap();
        counter.set(Value::I32(9)).unwrap();

        let binding = instance.get_import("env", "counter").unwrap();
        assert_eq!(binding.global().unwrap().get(), Value::I32(9));
    }

    #[test]
    fn test_instantiate_shared_uses_snapshot() {
        let module = module(r#"(module (import "env" "log" (func (param i32))))"#);
        let shared = SharedRegistry::new();
        shared.define("env", "log", log_fn());

        let instance = Resolver::new().instantiate_shared(&module, &shared).unwrap();
        assert_eq!(instance.import_table().len(), 1);
    }
}
