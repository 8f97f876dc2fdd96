//! Module descriptors: the static import/export surface of a module.
//!
//! A [`ModuleDescriptor`] is a read-only view over the import and export
//! declarations of a compiled WebAssembly module. It can be decoded from
//! the binary format with [`ModuleDescriptor::from_bytes`], or assembled
//! from already-typed metadata with [`ModuleDescriptor::from_parts`] when
//! decoding happens upstream.

use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::Arc;

use tracing::{debug, instrument};

use crate::decode;
use wasmlink_common::{ExportDescriptor, ImportDescriptor, LinkError};

/// The static declaration surface of a compiled module.
///
/// # Thread Safety
///
/// `ModuleDescriptor` is immutable and cheap to clone; the declaration
/// lists are shared between clones. It can be resolved concurrently from
/// multiple threads.
#[derive(Clone)]
pub struct ModuleDescriptor {
    inner: Arc<DescriptorInner>,
}

struct DescriptorInner {
    /// Imports in declaration order. Order matters for index-based access
    /// at execution time and for deterministic error reporting.
    imports: Vec<ImportDescriptor>,

    /// Exports in declaration order.
    exports: Vec<ExportDescriptor>,

    /// Hash of the module bytes (or of the declarations for `from_parts`).
    content_hash: String,
}

impl ModuleDescriptor {
    /// Decode a descriptor from a WebAssembly binary.
    ///
    /// Only the sections contributing to the import/export surface are
    /// examined; function bodies and data are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are not a core wasm module or use an
    /// unsupported import category.
    #[instrument(skip(bytes), fields(bytes_len = bytes.len()))]
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, LinkError> {
        validate_wasm_header(bytes)?;

        let (imports, exports) = decode::decode_module(bytes)?;
        let content_hash = compute_hash(bytes);

        debug!(
            content_hash = %content_hash,
            imports = imports.len(),
            exports = exports.len(),
            "module decoded"
        );

        Ok(Self::assemble(imports, exports, content_hash))
    }

    /// Build a descriptor from already-decoded metadata.
    ///
    /// This is the entry point for embedders whose decoding happens
    /// upstream; declaration order of both lists is preserved.
    pub fn from_parts(
        imports: Vec<ImportDescriptor>,
        exports: Vec<ExportDescriptor>,
    ) -> Self {
        let content_hash = hash_parts(&imports, &exports);
        Self::assemble(imports, exports, content_hash)
    }

    fn assemble(
        imports: Vec<ImportDescriptor>,
        exports: Vec<ExportDescriptor>,
        content_hash: String,
    ) -> Self {
        Self {
            inner: Arc::new(DescriptorInner {
                imports,
                exports,
                content_hash,
            }),
        }
    }

    /// The declared imports, in declaration order. Restartable and finite.
    pub fn imports(&self) -> impl ExactSizeIterator<Item = &ImportDescriptor> {
        self.inner.imports.iter()
    }

    /// The declared exports, in declaration order.
    pub fn exports(&self) -> impl ExactSizeIterator<Item = &ExportDescriptor> {
        self.inner.exports.iter()
    }

    /// Look up an export by name.
    pub fn export(&self, name: &str) -> Option<&ExportDescriptor> {
        self.inner.exports.iter().find(|e| e.name == name)
    }

    /// Number of declared imports.
    pub fn import_count(&self) -> usize {
        self.inner.imports.len()
    }

    /// Number of declared exports.
    pub fn export_count(&self) -> usize {
        self.inner.exports.len()
    }

    /// Hash of the module content, for caching and diagnostics.
    pub fn content_hash(&self) -> &str {
        &self.inner.content_hash
    }
}

impl std::fmt::Debug for ModuleDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleDescriptor")
            .field("content_hash", &self.inner.content_hash)
            .field("imports", &self.inner.imports.len())
            .field("exports", &self.inner.exports.len())
            .finish_non_exhaustive()
    }
}

/// Validate the WebAssembly header: magic number plus core module version.
fn validate_wasm_header(bytes: &[u8]) -> Result<(), LinkError> {
    if bytes.len() < 8 {
        return Err(LinkError::decode("invalid wasm: file too small"));
    }

    // Check magic number: \0asm
    if &bytes[0..4] != b"\0asm" {
        return Err(LinkError::decode("invalid wasm: bad magic number"));
    }

    // Core modules carry version 1; anything else is a component or a
    // future format this engine does not link.
    if bytes[4..8] != [0x01, 0x00, 0x00, 0x00] {
        return Err(LinkError::decode(
            "invalid wasm: not a core module (unsupported version field)",
        ));
    }

    Ok(())
}

/// Compute a hash of the given bytes.
fn compute_hash(bytes: &[u8]) -> String {
    let mut hasher = DefaultHasher::new();
    bytes.hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}

/// Hash the declaration lists for descriptors built without module bytes.
fn hash_parts(imports: &[ImportDescriptor], exports: &[ExportDescriptor]) -> String {
    let mut hasher = DefaultHasher::new();
    imports.hash(&mut hasher);
    exports.hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}
