//! Binary decoding of import and export declarations.
//!
//! Walks the sections of a core module that contribute to its declaration
//! surface: types, imports, functions, tables, memories, globals, and
//! exports. Code and data sections are skipped entirely. The full index
//! spaces are tracked so that exports of imported entities type correctly.

use wasmparser::{CompositeInnerType, ExternalKind, Parser, Payload, RefType, TypeRef};

use wasmlink_common::{
    ExportDescriptor, ExternType, FuncType, GlobalType, ImportDescriptor, ImportKey, Limits,
    LinkError, MemoryType, Mutability, TableType, ValType,
};

/// Decode the import and export declarations of a core module.
pub(crate) fn decode_module(
    bytes: &[u8],
) -> Result<(Vec<ImportDescriptor>, Vec<ExportDescriptor>), LinkError> {
    let mut types: Vec<FuncType> = Vec::new();

    // Index spaces, imports first, then locally defined entities.
    let mut funcs: Vec<FuncType> = Vec::new();
    let mut tables: Vec<TableType> = Vec::new();
    let mut memories: Vec<MemoryType> = Vec::new();
    let mut globals: Vec<GlobalType> = Vec::new();

    let mut imports: Vec<ImportDescriptor> = Vec::new();
    let mut exports: Vec<ExportDescriptor> = Vec::new();

    for payload in Parser::new(0).parse_all(bytes) {
        match payload.map_err(reader_err)? {
            Payload::TypeSection(reader) => {
                for rec_group in reader {
                    for sub in rec_group.map_err(reader_err)?.into_types() {
                        match &sub.composite_type.inner {
                            CompositeInnerType::Func(f) => types.push(convert_func_type(f)?),
                            _ => {
                                return Err(LinkError::decode(
                                    "gc composite types are not supported",
                                ));
                            }
                        }
                    }
                }
            }
            Payload::ImportSection(reader) => {
                for import in reader {
                    let import = import.map_err(reader_err)?;
                    let key = ImportKey::new(import.module, import.name);
                    let ty = match import.ty {
                        TypeRef::Func(type_index) => {
                            let f = types.get(type_index as usize).ok_or_else(|| {
                                LinkError::decode(format!(
                                    "import `{key}` references unknown type index {type_index}"
                                ))
                            })?;
                            ExternType::Function(f.clone())
                        }
                        TypeRef::Table(t) => ExternType::Table(convert_table_type(&t)?),
                        TypeRef::Memory(m) => ExternType::Memory(convert_memory_type(&m)),
                        TypeRef::Global(g) => ExternType::Global(convert_global_type(&g)?),
                        _ => {
                            return Err(LinkError::decode(format!(
                                "import `{key}` uses an unsupported import category"
                            )));
                        }
                    };

                    // Imports occupy the front of their index spaces.
                    match &ty {
                        ExternType::Function(f) => funcs.push(f.clone()),
                        ExternType::Table(t) => tables.push(*t),
                        ExternType::Memory(m) => memories.push(*m),
                        ExternType::Global(g) => globals.push(*g),
                    }

                    imports.push(ImportDescriptor::new(key, ty));
                }
            }
            Payload::FunctionSection(reader) => {
                for type_index in reader {
                    let type_index = type_index.map_err(reader_err)?;
                    let f = types.get(type_index as usize).ok_or_else(|| {
                        LinkError::decode(format!(
                            "function references unknown type index {type_index}"
                        ))
                    })?;
                    funcs.push(f.clone());
                }
            }
            Payload::TableSection(reader) => {
                for table in reader {
                    tables.push(convert_table_type(&table.map_err(reader_err)?.ty)?);
                }
            }
            Payload::MemorySection(reader) => {
                for memory in reader {
                    memories.push(convert_memory_type(&memory.map_err(reader_err)?));
                }
            }
            Payload::GlobalSection(reader) => {
                for global in reader {
                    globals.push(convert_global_type(&global.map_err(reader_err)?.ty)?);
                }
            }
            Payload::ExportSection(reader) => {
                for export in reader {
                    let export = export.map_err(reader_err)?;
                    let index = export.index as usize;
                    let ty = match export.kind {
                        ExternalKind::Func => funcs
                            .get(index)
                            .cloned()
                            .map(ExternType::Function),
                        ExternalKind::Table => tables.get(index).copied().map(ExternType::Table),
                        ExternalKind::Memory => {
                            memories.get(index).copied().map(ExternType::Memory)
                        }
                        ExternalKind::Global => {
                            globals.get(index).copied().map(ExternType::Global)
                        }
                        _ => {
                            return Err(LinkError::decode(format!(
                                "export `{}` uses an unsupported export category",
                                export.name
                            )));
                        }
                    };
                    let ty = ty.ok_or_else(|| {
                        LinkError::decode(format!(
                            "export `{}` references unknown index {index}",
                            export.name
                        ))
                    })?;

                    exports.push(ExportDescriptor::new(export.name, ty));
                }
            }
            _ => {}
        }
    }

    Ok((imports, exports))
}

fn reader_err(err: wasmparser::BinaryReaderError) -> LinkError {
    LinkError::decode(err.to_string())
}

fn convert_func_type(ty: &wasmparser::FuncType) -> Result<FuncType, LinkError> {
    let params = ty
        .params()
        .iter()
        .map(convert_val_type)
        .collect::<Result<Vec<_>, _>>()?;
    let results = ty
        .results()
        .iter()
        .map(convert_val_type)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(FuncType::new(params, results))
}

fn convert_val_type(ty: &wasmparser::ValType) -> Result<ValType, LinkError> {
    match ty {
        wasmparser::ValType::I32 => Ok(ValType::I32),
        wasmparser::ValType::I64 => Ok(ValType::I64),
        wasmparser::ValType::F32 => Ok(ValType::F32),
        wasmparser::ValType::F64 => Ok(ValType::F64),
        wasmparser::ValType::V128 => Ok(ValType::V128),
        wasmparser::ValType::Ref(r) => convert_ref_type(*r),
    }
}

fn convert_ref_type(ty: RefType) -> Result<ValType, LinkError> {
    if ty == RefType::FUNCREF {
        Ok(ValType::FuncRef)
    } else if ty == RefType::EXTERNREF {
        Ok(ValType::ExternRef)
    } else {
        Err(LinkError::decode(format!(
            "unsupported reference type {ty:?}"
        )))
    }
}

fn convert_table_type(ty: &wasmparser::TableType) -> Result<TableType, LinkError> {
    Ok(TableType {
        element: convert_ref_type(ty.element_type)?,
        limits: Limits::new(ty.initial, ty.maximum),
    })
}

fn convert_memory_type(ty: &wasmparser::MemoryType) -> MemoryType {
    MemoryType {
        limits: Limits::new(ty.initial, ty.maximum),
    }
}

fn convert_global_type(ty: &wasmparser::GlobalType) -> Result<GlobalType, LinkError> {
    Ok(GlobalType {
        content: convert_val_type(&ty.content_type)?,
        mutability: if ty.mutable {
            Mutability::Var
        } else {
            Mutability::Const
        },
    })
}

#[cfg(test)]
mod tests {
    use crate::module::ModuleDescriptor;
    use wasmlink_common::{ExternType, FuncType, Limits, Mutability, ValType};

    fn decode(wat: &str) -> ModuleDescriptor {
        let bytes = wat::parse_str(wat).unwrap();
        ModuleDescriptor::from_bytes(&bytes).unwrap()
    }

    #[test]
    fn test_decode_imports_in_declaration_order() {
        let descriptor = decode(
            r#"
            (module
                (import "env" "log" (func (param i32 i32)))
                (import "env" "memory" (memory 1 10))
                (import "env" "table" (table 2 funcref))
                (import "env" "counter" (global (mut i32)))
            )
            "#,
        );

        let keys: Vec<String> = descriptor.imports().map(|i| i.key.to_string()).collect();
        assert_eq!(
            keys,
            vec!["env::log", "env::memory", "env::table", "env::counter"]
        );
    }

    #[test]
    fn test_decode_import_types() {
        let descriptor = decode(
            r#"
            (module
                (import "env" "add" (func (param i32 i64) (result f64)))
                (import "env" "memory" (memory 1 10))
                (import "env" "table" (table 2 8 externref))
                (import "env" "flag" (global i32))
            )
            "#,
        );

        let imports: Vec<_> = descriptor.imports().collect();

        let func = imports[0].ty.func().unwrap();
        assert_eq!(func, &FuncType::new([ValType::I32, ValType::I64], [ValType::F64]));

        let memory = imports[1].ty.memory().unwrap();
        assert_eq!(memory.limits, Limits::new(1, Some(10)));

        let table = imports[2].ty.table().unwrap();
        assert_eq!(table.element, ValType::ExternRef);
        assert_eq!(table.limits, Limits::new(2, Some(8)));

        let global = imports[3].ty.global().unwrap();
        assert_eq!(global.content, ValType::I32);
        assert_eq!(global.mutability, Mutability::Const);
    }

    #[test]
    fn test_decode_exports() {
        let descriptor = decode(
            r#"
            (module
                (memory (export "memory") 2)
                (func (export "run") (param i32) (result i32)
                    local.get 0)
                (global (export "version") i32 (i32.const 1))
            )
            "#,
        );

        let memory = descriptor.export("memory").unwrap();
        assert_eq!(memory.ty.memory().unwrap().limits, Limits::at_least(2));

        let run = descriptor.export("run").unwrap();
        assert_eq!(
            run.ty,
            ExternType::Function(FuncType::new([ValType::I32], [ValType::I32]))
        );

        let version = descriptor.export("version").unwrap();
        assert_eq!(version.ty.global().unwrap().content, ValType::I32);
    }

    #[test]
    fn test_decode_reexported_import_types_correctly() {
        // The exported function is the imported one; its type must come
        // from the import's slot in the function index space.
        let descriptor = decode(
            r#"
            (module
                (import "env" "log" (func (param i32)))
                (export "log" (func 0))
            )
            "#,
        );

        let log = descriptor.export("log").unwrap();
        assert_eq!(
            log.ty,
            ExternType::Function(FuncType::new([ValType::I32], []))
        );
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let result = ModuleDescriptor::from_bytes(b"\0asm\x01\0\0\0garbage!");
        assert!(result.is_err());
    }
}
