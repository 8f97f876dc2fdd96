//! Static type vocabulary for WebAssembly imports and exports.
//!
//! This module defines the closed set of types that participate in import
//! resolution:
//! - [`ImportKey`]: the (namespace, name) pair identifying one import
//! - [`ValType`], [`FuncType`], [`Limits`], [`GlobalType`], [`MemoryType`],
//!   [`TableType`]: the static shapes of the four import categories
//! - [`ExternType`]: the tagged union over those categories, with the
//!   compatibility rules used during linking
//!
//! All comparison sites match exhaustively over [`ExternType`], so adding a
//! new import category is a compile-time-checked change.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A (namespace, name) pair identifying one import.
///
/// Keys are unique within a module's import set. The `Display` form is
/// `namespace::name`, which is the spelling used in diagnostics.
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ImportKey {
    /// The module/namespace part of the import (e.g. `env`).
    pub namespace: String,

    /// The field name within the namespace (e.g. `log`).
    pub name: String,
}

impl ImportKey {
    /// Create a new key from a namespace and a name.
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for ImportKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.namespace, self.name)
    }
}

impl From<(&str, &str)> for ImportKey {
    fn from((namespace, name): (&str, &str)) -> Self {
        Self::new(namespace, name)
    }
}

/// A WebAssembly value type.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValType {
    /// 32-bit integer.
    I32,
    /// 64-bit integer.
    I64,
    /// 32-bit float.
    F32,
    /// 64-bit float.
    F64,
    /// 128-bit vector.
    V128,
    /// Nullable reference to a function.
    FuncRef,
    /// Nullable reference to a host object.
    ExternRef,
}

impl ValType {
    /// Returns `true` for the reference types usable as table elements.
    pub fn is_ref(self) -> bool {
        matches!(self, ValType::FuncRef | ValType::ExternRef)
    }
}

impl fmt::Display for ValType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValType::I32 => "i32",
            ValType::I64 => "i64",
            ValType::F32 => "f32",
            ValType::F64 => "f64",
            ValType::V128 => "v128",
            ValType::FuncRef => "funcref",
            ValType::ExternRef => "externref",
        };
        f.write_str(name)
    }
}

/// A function signature.
///
/// Signatures match exactly: parameter types in order, result types in
/// order, no implicit coercion.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct FuncType {
    params: Box<[ValType]>,
    results: Box<[ValType]>,
}

impl FuncType {
    /// Create a signature from parameter and result types.
    pub fn new(
        params: impl IntoIterator<Item = ValType>,
        results: impl IntoIterator<Item = ValType>,
    ) -> Self {
        Self {
            params: params.into_iter().collect(),
            results: results.into_iter().collect(),
        }
    }

    /// Parameter types, in declaration order.
    pub fn params(&self) -> &[ValType] {
        &self.params
    }

    /// Result types, in declaration order.
    pub fn results(&self) -> &[ValType] {
        &self.results
    }

    /// Whether this signature satisfies `declared`. Signatures have no
    /// subtyping here, so this is exact equality.
    pub fn matches(&self, declared: &FuncType) -> bool {
        self == declared
    }
}

impl fmt::Display for FuncType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, p) in self.params.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{p}")?;
        }
        f.write_str(") -> (")?;
        for (i, r) in self.results.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{r}")?;
        }
        f.write_str(")")
    }
}

/// A (minimum, optional maximum) pair constraining a memory or table's size.
///
/// Units are pages for memories and elements for tables; resolution only
/// compares like with like, so the unit never appears here.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct Limits {
    /// Minimum size.
    pub min: u64,

    /// Optional maximum size.
    pub max: Option<u64>,
}

impl Limits {
    /// Create limits from a minimum and an optional maximum.
    pub fn new(min: u64, max: Option<u64>) -> Self {
        Self { min, max }
    }

    /// Limits with a minimum and no maximum.
    pub fn at_least(min: u64) -> Self {
        Self { min, max: None }
    }

    /// Whether a binding with these limits satisfies an import declared with
    /// `declared` limits.
    ///
    /// The supplied minimum must be at least the declared minimum. If the
    /// declared limits carry a maximum, the supplied limits must also carry
    /// one, and it must not exceed the declared maximum.
    pub fn satisfies(&self, declared: &Limits) -> bool {
        if self.min < declared.min {
            return false;
        }
        match declared.max {
            Some(declared_max) => {
                matches!(self.max, Some(supplied_max) if supplied_max <= declared_max)
            }
            None => true,
        }
    }
}

impl fmt::Display for Limits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.max {
            Some(max) => write!(f, "{}..{}", self.min, max),
            None => write!(f, "{}..", self.min),
        }
    }
}

/// Whether a global may be written after initialization.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mutability {
    /// Immutable.
    Const,
    /// Mutable.
    Var,
}

/// The type of a global: a value type plus mutability.
///
/// Both parts must match exactly during resolution; an immutable import
/// cannot be satisfied by a mutable binding or vice versa.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub struct GlobalType {
    /// The type of the stored value.
    pub content: ValType,

    /// Whether the global is writable.
    pub mutability: Mutability,
}

impl GlobalType {
    /// Create a global type.
    pub fn new(content: ValType, mutability: Mutability) -> Self {
        Self {
            content,
            mutability,
        }
    }

    /// Returns `true` if the global is writable.
    pub fn is_mutable(&self) -> bool {
        self.mutability == Mutability::Var
    }
}

impl fmt::Display for GlobalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.mutability {
            Mutability::Const => write!(f, "{}", self.content),
            Mutability::Var => write!(f, "(mut {})", self.content),
        }
    }
}

/// The type of a linear memory: its size limits, in pages.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub struct MemoryType {
    /// Size limits in 64 KiB pages.
    pub limits: Limits,
}

impl MemoryType {
    /// Create a memory type from page limits.
    pub fn new(min: u64, max: Option<u64>) -> Self {
        Self {
            limits: Limits::new(min, max),
        }
    }
}

impl fmt::Display for MemoryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "memory {}", self.limits)
    }
}

/// The type of a table: a reference element type plus size limits.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub struct TableType {
    /// Element type; one of the reference types.
    pub element: ValType,

    /// Size limits in elements.
    pub limits: Limits,
}

impl TableType {
    /// Create a table type from an element type and limits.
    pub fn new(element: ValType, min: u64, max: Option<u64>) -> Self {
        Self {
            element,
            limits: Limits::new(min, max),
        }
    }
}

impl fmt::Display for TableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "table {} {}", self.element, self.limits)
    }
}

/// The category of an extern, for diagnostics.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum ExternKind {
    /// A function.
    Function,
    /// A linear memory.
    Memory,
    /// A table.
    Table,
    /// A global.
    Global,
}

impl fmt::Display for ExternKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExternKind::Function => "function",
            ExternKind::Memory => "memory",
            ExternKind::Table => "table",
            ExternKind::Global => "global",
        };
        f.write_str(name)
    }
}

/// The static type of an import or export: a closed sum over the four
/// import categories.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum ExternType {
    /// A function with its signature.
    Function(FuncType),
    /// A linear memory with its limits.
    Memory(MemoryType),
    /// A table with its element type and limits.
    Table(TableType),
    /// A global with its value type and mutability.
    Global(GlobalType),
}

impl ExternType {
    /// The category of this type.
    pub fn kind(&self) -> ExternKind {
        match self {
            ExternType::Function(_) => ExternKind::Function,
            ExternType::Memory(_) => ExternKind::Memory,
            ExternType::Table(_) => ExternKind::Table,
            ExternType::Global(_) => ExternKind::Global,
        }
    }

    /// Whether a binding of this type can satisfy an import declared as
    /// `declared`.
    ///
    /// - Functions: signatures equal exactly.
    /// - Memories: supplied limits satisfy the declared limits.
    /// - Tables: element types equal and supplied limits satisfy the
    ///   declared limits.
    /// - Globals: value type and mutability equal exactly.
    ///
    /// Different categories never satisfy each other.
    pub fn satisfies(&self, declared: &ExternType) -> bool {
        match (self, declared) {
            (ExternType::Function(supplied), ExternType::Function(declared)) => {
                supplied.matches(declared)
            }
            (ExternType::Memory(supplied), ExternType::Memory(declared)) => {
                supplied.limits.satisfies(&declared.limits)
            }
            (ExternType::Table(supplied), ExternType::Table(declared)) => {
                supplied.element == declared.element && supplied.limits.satisfies(&declared.limits)
            }
            (ExternType::Global(supplied), ExternType::Global(declared)) => supplied == declared,
            (
                ExternType::Function(_) | ExternType::Memory(_) | ExternType::Table(_)
                | ExternType::Global(_),
                _,
            ) => false,
        }
    }

    /// The function signature, if this is a function type.
    pub fn func(&self) -> Option<&FuncType> {
        match self {
            ExternType::Function(f) => Some(f),
            _ => None,
        }
    }

    /// The memory type, if this is a memory type.
    pub fn memory(&self) -> Option<&MemoryType> {
        match self {
            ExternType::Memory(m) => Some(m),
            _ => None,
        }
    }

    /// The table type, if this is a table type.
    pub fn table(&self) -> Option<&TableType> {
        match self {
            ExternType::Table(t) => Some(t),
            _ => None,
        }
    }

    /// The global type, if this is a global type.
    pub fn global(&self) -> Option<&GlobalType> {
        match self {
            ExternType::Global(g) => Some(g),
            _ => None,
        }
    }
}

impl fmt::Display for ExternType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExternType::Function(ty) => write!(f, "func {ty}"),
            ExternType::Memory(ty) => write!(f, "{ty}"),
            ExternType::Table(ty) => write!(f, "{ty}"),
            ExternType::Global(ty) => write!(f, "global {ty}"),
        }
    }
}

/// One import declared by a module: its key plus its expected type.
///
/// Immutable once the module is decoded.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct ImportDescriptor {
    /// The (namespace, name) pair the module imports under.
    pub key: ImportKey,

    /// The type the binding must satisfy.
    pub ty: ExternType,
}

impl ImportDescriptor {
    /// Create an import descriptor.
    pub fn new(key: ImportKey, ty: ExternType) -> Self {
        Self { key, ty }
    }
}

/// One export declared by a module: its name plus its type.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct ExportDescriptor {
    /// The exported name.
    pub name: String,

    /// The type of the exported entity.
    pub ty: ExternType,
}

impl ExportDescriptor {
    /// Create an export descriptor.
    pub fn new(name: impl Into<String>, ty: ExternType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_import_key_display() {
        let key = ImportKey::new("env", "log");
        assert_eq!(key.to_string(), "env::log");
    }

    #[test]
    fn test_func_type_exact_match() {
        let declared = FuncType::new([ValType::I32], [ValType::I32]);
        let same = FuncType::new([ValType::I32], [ValType::I32]);
        let wider = FuncType::new([ValType::I64], [ValType::I32]);

        assert!(same.matches(&declared));
        assert!(!wider.matches(&declared));
    }

    #[test]
    fn test_limits_satisfies() {
        let declared = Limits::new(1, Some(10));

        // 2 >= 1 and 5 <= 10
        assert!(Limits::new(2, Some(5)).satisfies(&declared));
        // 0 < 1
        assert!(!Limits::new(0, Some(5)).satisfies(&declared));
        // 20 > 10
        assert!(!Limits::new(2, Some(20)).satisfies(&declared));
        // declared max present, supplied max absent
        assert!(!Limits::new(2, None).satisfies(&declared));
    }

    #[test]
    fn test_limits_satisfies_unbounded_declared() {
        let declared = Limits::at_least(1);

        assert!(Limits::new(1, None).satisfies(&declared));
        assert!(Limits::new(5, Some(8)).satisfies(&declared));
        assert!(!Limits::new(0, None).satisfies(&declared));
    }

    #[test]
    fn test_global_mutability_exact() {
        let declared = ExternType::Global(GlobalType::new(ValType::I32, Mutability::Const));
        let mutable = ExternType::Global(GlobalType::new(ValType::I32, Mutability::Var));

        assert!(declared.clone().satisfies(&declared));
        assert!(!mutable.satisfies(&declared));
        assert!(!declared.satisfies(&mutable));
    }

    #[test]
    fn test_cross_kind_never_satisfies() {
        let func = ExternType::Function(FuncType::new([], []));
        let memory = ExternType::Memory(MemoryType::new(1, None));

        assert!(!func.satisfies(&memory));
        assert!(!memory.satisfies(&func));
    }

    #[test]
    fn test_table_element_must_match() {
        let declared = ExternType::Table(TableType::new(ValType::FuncRef, 0, None));
        let externref = ExternType::Table(TableType::new(ValType::ExternRef, 0, None));

        assert!(!externref.satisfies(&declared));
    }

    #[test]
    fn test_extern_type_display() {
        let func = ExternType::Function(FuncType::new([ValType::I32, ValType::I64], [ValType::F64]));
        assert_eq!(func.to_string(), "func (i32, i64) -> (f64)");

        let memory = ExternType::Memory(MemoryType::new(1, Some(10)));
        assert_eq!(memory.to_string(), "memory 1..10");

        let global = ExternType::Global(GlobalType::new(ValType::I32, Mutability::Var));
        assert_eq!(global.to_string(), "global (mut i32)");

        let table = ExternType::Table(TableType::new(ValType::FuncRef, 0, None));
        assert_eq!(table.to_string(), "table funcref 0..");
    }

    #[test]
    fn test_val_type_serde_lowercase() {
        let ty: ValType = serde_json::from_str("\"i32\"").unwrap();
        assert_eq!(ty, ValType::I32);
        assert_eq!(serde_json::to_string(&ValType::FuncRef).unwrap(), "\"funcref\"");
    }
}
