//! Concrete bindings supplied to satisfy imports.
//!
//! An [`Extern`] is a host- or guest-provided entity registered under a
//! (namespace, name) key: a [`Function`], [`Memory`], [`Table`], or
//! [`Global`]. Externs are reference-counted; cloning one shares the
//! underlying state, so a single binding can back any number of instances.
//!
//! Only an extern's type participates in resolution. The runtime state a
//! binding carries (a global's value, a memory's current size) has its own
//! thread-safety contract and is never mutated by resolution itself.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use wasmlink_common::{
    ExternKind, ExternType, FuncType, GlobalType, HostError, Limits, MemoryType, Mutability,
    TableType, ValType,
};

/// A runtime value crossing the host boundary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    /// 32-bit integer.
    I32(i32),
    /// 64-bit integer.
    I64(i64),
    /// 32-bit float.
    F32(f32),
    /// 64-bit float.
    F64(f64),
    /// 128-bit vector.
    V128(u128),
    /// Function reference; `None` is the null reference.
    FuncRef(Option<u32>),
    /// Host object reference; `None` is the null reference.
    ExternRef(Option<u32>),
}

impl Value {
    /// The type of this value.
    pub fn ty(&self) -> ValType {
        match self {
            Value::I32(_) => ValType::I32,
            Value::I64(_) => ValType::I64,
            Value::F32(_) => ValType::F32,
            Value::F64(_) => ValType::F64,
            Value::V128(_) => ValType::V128,
            Value::FuncRef(_) => ValType::FuncRef,
            Value::ExternRef(_) => ValType::ExternRef,
        }
    }

    /// The zero or null value of a type.
    pub fn default_for(ty: ValType) -> Value {
        match ty {
            ValType::I32 => Value::I32(0),
            ValType::I64 => Value::I64(0),
            ValType::F32 => Value::F32(0.0),
            ValType::F64 => Value::F64(0.0),
            ValType::V128 => Value::V128(0),
            ValType::FuncRef => Value::FuncRef(None),
            ValType::ExternRef => Value::ExternRef(None),
        }
    }
}

type HostFn = dyn Fn(&[Value]) -> Result<Vec<Value>, HostError> + Send + Sync;

/// A host function binding with its signature.
#[derive(Clone)]
pub struct Function {
    ty: FuncType,
    callable: Arc<HostFn>,
}

impl Function {
    /// Create a function from a signature and a callable.
    pub fn new(
        ty: FuncType,
        callable: impl Fn(&[Value]) -> Result<Vec<Value>, HostError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            ty,
            callable: Arc::new(callable),
        }
    }

    /// A placeholder function that traps when called.
    ///
    /// Useful for link checking, where only the signature matters.
    pub fn stub(ty: FuncType) -> Self {
        Self::new(ty, |_| {
            Err(HostError::trap("called an unlinked stub function"))
        })
    }

    /// The function's signature.
    pub fn ty(&self) -> &FuncType {
        &self.ty
    }

    /// Invoke the function, validating arity and argument types first.
    pub fn call(&self, args: &[Value]) -> Result<Vec<Value>, HostError> {
        let params = self.ty.params();
        if args.len() != params.len() {
            return Err(HostError::ArityMismatch {
                expected: params.len(),
                got: args.len(),
            });
        }
        for (index, (arg, expected)) in args.iter().zip(params).enumerate() {
            if arg.ty() != *expected {
                return Err(HostError::ArgumentType {
                    index,
                    expected: *expected,
                    got: arg.ty(),
                });
            }
        }
        (self.callable)(args)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("ty", &self.ty)
            .finish_non_exhaustive()
    }
}

/// A linear memory binding.
///
/// Carries its declared limits and a current size in pages; the size
/// starts at the declared minimum and participates in limit checks during
/// resolution.
#[derive(Debug, Clone)]
pub struct Memory {
    ty: MemoryType,
    pages: Arc<RwLock<u64>>,
}

impl Memory {
    /// Create a memory sized at its declared minimum.
    pub fn new(ty: MemoryType) -> Self {
        let pages = ty.limits.min;
        Self {
            ty,
            pages: Arc::new(RwLock::new(pages)),
        }
    }

    /// Current size in pages.
    pub fn size(&self) -> u64 {
        *self.pages.read()
    }

    /// Grow by `delta` pages, returning the previous size.
    pub fn grow(&self, delta: u64) -> Result<u64, HostError> {
        let mut pages = self.pages.write();
        let new_size = *pages + delta;
        if let Some(max) = self.ty.limits.max {
            if new_size > max {
                return Err(HostError::LimitExceeded {
                    kind: "memory",
                    max,
                });
            }
        }
        let previous = *pages;
        *pages = new_size;
        Ok(previous)
    }

    /// The current type: the live size as minimum, the declared maximum.
    ///
    /// Linking compares against the current size rather than the declared
    /// minimum, since the memory may have grown since creation.
    pub fn ty(&self) -> MemoryType {
        MemoryType {
            limits: Limits::new(self.size(), self.ty.limits.max),
        }
    }
}

/// A table binding.
#[derive(Debug, Clone)]
pub struct Table {
    ty: TableType,
    size: Arc<RwLock<u64>>,
}

impl Table {
    /// Create a table sized at its declared minimum.
    pub fn new(ty: TableType) -> Self {
        let size = ty.limits.min;
        Self {
            ty,
            size: Arc::new(RwLock::new(size)),
        }
    }

    /// Current size in elements.
    pub fn size(&self) -> u64 {
        *self.size.read()
    }

    /// Grow by `delta` elements, returning the previous size.
    pub fn grow(&self, delta: u64) -> Result<u64, HostError> {
        let mut size = self.size.write();
        let new_size = *size + delta;
        if let Some(max) = self.ty.limits.max {
            if new_size > max {
                return Err(HostError::LimitExceeded { kind: "table", max });
            }
        }
        let previous = *size;
        *size = new_size;
        Ok(previous)
    }

    /// The current type: the live size as minimum, the declared maximum.
    pub fn ty(&self) -> TableType {
        TableType {
            element: self.ty.element,
            limits: Limits::new(self.size(), self.ty.limits.max),
        }
    }
}

/// A global binding holding one value.
#[derive(Debug, Clone)]
pub struct Global {
    ty: GlobalType,
    value: Arc<RwLock<Value>>,
}

impl Global {
    /// Create an immutable global.
    pub fn new(value: Value) -> Self {
        Self::with_mutability(value, Mutability::Const)
    }

    /// Create a mutable global.
    pub fn new_mut(value: Value) -> Self {
        Self::with_mutability(value, Mutability::Var)
    }

    fn with_mutability(value: Value, mutability: Mutability) -> Self {
        Self {
            ty: GlobalType::new(value.ty(), mutability),
            value: Arc::new(RwLock::new(value)),
        }
    }

    /// The global's type.
    pub fn ty(&self) -> GlobalType {
        self.ty
    }

    /// Read the current value.
    pub fn get(&self) -> Value {
        *self.value.read()
    }

    /// Write a new value.
    ///
    /// # Errors
    ///
    /// Fails on immutable globals and on writes that would change the
    /// stored value's type.
    pub fn set(&self, value: Value) -> Result<(), HostError> {
        if !self.ty.is_mutable() {
            return Err(HostError::ImmutableGlobal);
        }
        if value.ty() != self.ty.content {
            return Err(HostError::GlobalTypeMismatch {
                expected: self.ty.content,
                got: value.ty(),
            });
        }
        *self.value.write() = value;
        Ok(())
    }
}

/// A concrete binding satisfying one import.
///
/// A closed sum over the four import categories; every comparison site
/// matches exhaustively.
#[derive(Debug, Clone)]
pub enum Extern {
    /// A function binding.
    Function(Function),
    /// A memory binding.
    Memory(Memory),
    /// A table binding.
    Table(Table),
    /// A global binding.
    Global(Global),
}

impl Extern {
    /// The runtime type of this binding.
    ///
    /// Memories and tables report their current size as the minimum.
    pub fn ty(&self) -> ExternType {
        match self {
            Extern::Function(f) => ExternType::Function(f.ty().clone()),
            Extern::Memory(m) => ExternType::Memory(m.ty()),
            Extern::Table(t) => ExternType::Table(t.ty()),
            Extern::Global(g) => ExternType::Global(g.ty()),
        }
    }

    /// The category of this binding.
    pub fn kind(&self) -> ExternKind {
        match self {
            Extern::Function(_) => ExternKind::Function,
            Extern::Memory(_) => ExternKind::Memory,
            Extern::Table(_) => ExternKind::Table,
            Extern::Global(_) => ExternKind::Global,
        }
    }

    /// The function binding, if this is a function.
    pub fn function(&self) -> Option<&Function> {
        match self {
            Extern::Function(f) => Some(f),
            _ => None,
        }
    }

    /// The memory binding, if this is a memory.
    pub fn memory(&self) -> Option<&Memory> {
        match self {
            Extern::Memory(m) => Some(m),
            _ => None,
        }
    }

    /// The table binding, if this is a table.
    pub fn table(&self) -> Option<&Table> {
        match self {
            Extern::Table(t) => Some(t),
            _ => None,
        }
    }

    /// The global binding, if this is a global.
    pub fn global(&self) -> Option<&Global> {
        match self {
            Extern::Global(g) => Some(g),
            _ => None,
        }
    }
}

impl From<Function> for Extern {
    fn from(f: Function) -> Self {
        Extern::Function(f)
    }
}

impl From<Memory> for Extern {
    fn from(m: Memory) -> Self {
        Extern::Memory(m)
    }
}

impl From<Table> for Extern {
    fn from(t: Table) -> Self {
        Extern::Table(t)
    }
}

impl From<Global> for Extern {
    fn from(g: Global) -> Self {
        Extern::Global(g)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_types() {
        assert_eq!(Value::I32(5).ty(), ValType::I32);
        assert_eq!(Value::FuncRef(None).ty(), ValType::FuncRef);
        assert_eq!(Value::default_for(ValType::F64), Value::F64(0.0));
        assert_eq!(Value::default_for(ValType::ExternRef), Value::ExternRef(None));
    }

    #[test]
    fn test_function_call() {
        let add = Function::new(
            FuncType::new([ValType::I32, ValType::I32], [ValType::I32]),
            |args| {
                let (Value::I32(a), Value::I32(b)) = (args[0], args[1]) else {
                    return Err(HostError::trap("bad arguments"));
                };
                Ok(vec![Value::I32(a + b)])
            },
        );

        let result = add.call(&[Value::I32(2), Value::I32(3)]).unwrap();
        assert_eq!(result, vec![Value::I32(5)]);
    }

    #[test]
    fn test_function_call_arity_checked() {
        let f = Function::stub(FuncType::new([ValType::I32], []));
        let err = f.call(&[]).unwrap_err();
        assert_eq!(err, HostError::ArityMismatch { expected: 1, got: 0 });
    }

    #[test]
    fn test_function_call_argument_types_checked() {
        let f = Function::stub(FuncType::new([ValType::I32], []));
        let err = f.call(&[Value::I64(1)]).unwrap_err();
        assert!(matches!(err, HostError::ArgumentType { index: 0, .. }));
    }

    #[test]
    fn test_stub_traps() {
        let f = Function::stub(FuncType::new([], []));
        let err = f.call(&[]).unwrap_err();
        assert!(matches!(err, HostError::Trap { .. }));
    }

    #[test]
    fn test_memory_grow_within_limits() {
        let memory = Memory::new(MemoryType::new(1, Some(4)));
        assert_eq!(memory.size(), 1);
        assert_eq!(memory.grow(2).unwrap(), 1);
        assert_eq!(memory.size(), 3);
    }

    #[test]
    fn test_memory_grow_past_maximum_fails() {
        let memory = Memory::new(MemoryType::new(1, Some(2)));
        assert!(memory.grow(5).is_err());
        assert_eq!(memory.size(), 1);
    }

    #[test]
    fn test_memory_current_type_tracks_growth() {
        let memory = Memory::new(MemoryType::new(1, Some(10)));
        memory.grow(3).unwrap();
        assert_eq!(memory.ty().limits, Limits::new(4, Some(10)));
    }

    #[test]
    fn test_table_grow() {
        let table = Table::new(TableType::new(ValType::FuncRef, 2, Some(3)));
        assert_eq!(table.grow(1).unwrap(), 2);
        assert!(table.grow(1).is_err());
    }

    #[test]
    fn test_global_set() {
        let counter = Global::new_mut(Value::I32(0));
        counter.set(Value::I32(7)).unwrap();
        assert_eq!(counter.get(), Value::I32(7));
    }

    #[test]
    fn test_global_set_immutable_fails() {
        let version = Global::new(Value::I32(1));
        assert_eq!(version.set(Value::I32(2)), Err(HostError::ImmutableGlobal));
    }

    #[test]
    fn test_global_set_wrong_type_fails() {
        let counter = Global::new_mut(Value::I32(0));
        let err = counter.set(Value::I64(1)).unwrap_err();
        assert!(matches!(err, HostError::GlobalTypeMismatch { .. }));
    }

    #[test]
    fn test_extern_shares_state_across_clones() {
        let counter = Global::new_mut(Value::I32(0));
        let binding = Extern::from(counter.clone());

        counter.set(Value::I32(41)).unwrap();
        assert_eq!(binding.global().unwrap().get(), Value::I32(41));
    }

    #[test]
    fn test_extern_ty() {
        let f = Extern::from(Function::stub(FuncType::new([ValType::I32], [])));
        assert_eq!(f.kind(), ExternKind::Function);
        assert_eq!(
            f.ty(),
            ExternType::Function(FuncType::new([ValType::I32], []))
        );
    }
}
