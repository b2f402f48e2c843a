//! File-backed signature cache
//!
//! Composes the in-memory tier and the provenance tracker from
//! `sigil-core` with a persisted container: one blob per cache identifier
//! holding provenance metadata plus the serialized function and method
//! payloads. The container is loaded lazily on first access and written
//! back only on [`SignatureCache::flush`].
//!
//! Failure policy is fail-soft throughout: a missing or malformed container
//! starts empty, and a payload whose checksum or JSON does not verify is a
//! miss for that key alone. The service then re-introspects and the next
//! flush repairs the entry.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use sigil_core::cache::{method_key, CacheError, CacheStats, MemoryCache, ProvenanceTracker};
use sigil_core::reflect::ClosureId;
use sigil_core::signature::CallableSignature;
use sigil_core::SignatureCache;

use crate::blob::{BlobStore, DirBlobStore};

/// Identifier used by the convenience constructors.
pub const DEFAULT_IDENTIFIER: &str = "signatures";

/// One persisted signature with its integrity checksum.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredEntry {
    payload: String,
    checksum: String,
}

impl StoredEntry {
    fn encode(signature: &CallableSignature) -> Option<Self> {
        let payload = serde_json::to_string(signature).ok()?;
        let checksum = sha256_hex(payload.as_bytes());
        Some(Self { payload, checksum })
    }

    /// Decode after verifying the checksum; `None` for corrupted entries.
    fn decode_checked(&self) -> Option<CallableSignature> {
        if sha256_hex(self.payload.as_bytes()) != self.checksum {
            return None;
        }
        serde_json::from_str(&self.payload).ok()
    }
}

/// The persisted shape: provenance metadata plus serialized payloads.
/// Closures never appear here.
#[derive(Debug, Default, Serialize, Deserialize)]
struct Container {
    #[serde(default)]
    meta: ProvenanceTracker,
    #[serde(default)]
    functions: BTreeMap<String, StoredEntry>,
    #[serde(default)]
    methods: BTreeMap<String, StoredEntry>,
}

/// Durable, change-aware signature cache over a [`BlobStore`].
///
/// Function and method signatures round-trip through the container;
/// closures are cached in process memory only, since their identities do
/// not survive the process. A read-only cache serves hits as usual but
/// silently discards writes at flush time, acting as an immutable snapshot.
///
/// Concurrent processes sharing one blob are not synchronized: the last
/// flush wins.
pub struct FileCache {
    store: Box<dyn BlobStore>,
    identifier: String,
    readonly: bool,
    memory: MemoryCache,
    container: Container,
    loaded: bool,
    dirty: bool,
}

impl FileCache {
    /// Cache over an explicit blob store and identifier.
    pub fn new(store: Box<dyn BlobStore>, identifier: impl Into<String>) -> Self {
        Self {
            store,
            identifier: identifier.into(),
            readonly: false,
            memory: MemoryCache::new(),
            container: Container::default(),
            loaded: false,
            dirty: false,
        }
    }

    /// Read-only cache: lookups work, flush discards writes.
    pub fn read_only(store: Box<dyn BlobStore>, identifier: impl Into<String>) -> Self {
        let mut cache = Self::new(store, identifier);
        cache.readonly = true;
        cache
    }

    /// Cache persisted under `dir`, using the default identifier.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(
            Box::new(DirBlobStore::new(dir.as_ref())),
            DEFAULT_IDENTIFIER,
        )
    }

    /// Whether flush discards writes.
    pub fn is_read_only(&self) -> bool {
        self.readonly
    }

    /// The blob identifier this cache persists under.
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Statistics of the in-process memory tier.
    pub fn stats(&self) -> CacheStats {
        self.memory.stats()
    }

    fn ensure_loaded(&mut self) {
        if self.loaded {
            return;
        }
        self.loaded = true;

        let bytes = match self.store.load(&self.identifier) {
            Ok(Some(bytes)) => bytes,
            // No blob yet, or an unreadable one: start empty.
            Ok(None) | Err(_) => return,
        };
        if let Ok(container) = serde_json::from_slice(&bytes) {
            self.container = container;
        }
    }
}

impl SignatureCache for FileCache {
    fn function(&mut self, name: &str) -> Option<Arc<CallableSignature>> {
        self.ensure_loaded();
        if self.container.meta.function_is_stale(name) {
            return None;
        }
        let container = &self.container;
        self.memory.function_or_load(name, || {
            container
                .functions
                .get(name)
                .and_then(StoredEntry::decode_checked)
        })
    }

    fn store_function(&mut self, signature: CallableSignature, declaring_file: Option<&Path>) {
        self.ensure_loaded();
        if let Some(file) = declaring_file {
            self.container
                .meta
                .record_function(&signature.qualified_name, file);
        }
        if let Some(entry) = StoredEntry::encode(&signature) {
            self.container
                .functions
                .insert(signature.qualified_name.clone(), entry);
            self.dirty = true;
        }
        self.memory.store_function(signature, declaring_file);
    }

    fn method(&mut self, class: &str, method: &str) -> Option<Arc<CallableSignature>> {
        self.ensure_loaded();
        if self.container.meta.method_is_stale(class, method) {
            return None;
        }
        let container = &self.container;
        let key = method_key(class, method);
        self.memory.method_or_load(class, method, || {
            container
                .methods
                .get(&key)
                .and_then(StoredEntry::decode_checked)
        })
    }

    fn store_method(&mut self, signature: CallableSignature, declaring_file: Option<&Path>) {
        self.ensure_loaded();
        let class = signature.class_name.clone().unwrap_or_default();
        if let Some(file) = declaring_file {
            self.container
                .meta
                .record_method(&class, &signature.qualified_name, file);
        }
        if let Some(entry) = StoredEntry::encode(&signature) {
            self.container
                .methods
                .insert(method_key(&class, &signature.qualified_name), entry);
            self.dirty = true;
        }
        self.memory.store_method(signature, declaring_file);
    }

    fn closure(&mut self, id: ClosureId) -> Option<Arc<CallableSignature>> {
        // In-process only; nothing to load from the container.
        self.memory.closure(id)
    }

    fn store_closure(&mut self, id: ClosureId, signature: CallableSignature) {
        // Closure identities are not stable across processes, so the
        // container never sees them.
        self.memory.store_closure(id, signature);
    }

    fn flush(&mut self) -> Result<(), CacheError> {
        if self.readonly {
            // Immutable snapshot: buffered writes stay in memory only.
            return Ok(());
        }
        if !self.dirty && !self.container.meta.is_dirty() {
            return Ok(());
        }

        let bytes = serde_json::to_vec_pretty(&self.container)?;
        self.store.store(&self.identifier, &bytes)?;

        self.container.meta.mark_clean();
        self.dirty = false;
        Ok(())
    }
}

fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blob::MemoryBlobStore;
    use sigil_core::signature::SignatureKind;

    fn sig(name: &str) -> CallableSignature {
        CallableSignature {
            qualified_name: name.to_string(),
            class_name: None,
            kind: SignatureKind::Function,
            arguments: Vec::new(),
            return_value: None,
        }
    }

    #[test]
    fn flush_without_writes_stores_nothing() {
        let blobs = MemoryBlobStore::new();
        let mut cache = FileCache::new(Box::new(blobs.clone()), DEFAULT_IDENTIFIER);

        cache.flush().unwrap();
        assert!(!blobs.contains(DEFAULT_IDENTIFIER));
    }

    #[test]
    fn read_only_flush_discards_writes() {
        let blobs = MemoryBlobStore::new();
        let mut cache = FileCache::read_only(Box::new(blobs.clone()), DEFAULT_IDENTIFIER);
        assert!(cache.is_read_only());

        cache.store_closure(ClosureId(1), sig("{closure}"));
        cache.flush().unwrap();
        assert!(!blobs.contains(DEFAULT_IDENTIFIER));
    }

    #[test]
    fn corrupted_container_starts_empty() {
        let mut blobs = MemoryBlobStore::new();
        blobs.store(DEFAULT_IDENTIFIER, b"not json at all").unwrap();

        let mut cache = FileCache::new(Box::new(blobs), DEFAULT_IDENTIFIER);
        assert!(cache.function("anything").is_none());
    }

    #[test]
    fn closures_stay_in_process_memory() {
        let blobs = MemoryBlobStore::new();
        let mut cache = FileCache::new(Box::new(blobs.clone()), DEFAULT_IDENTIFIER);

        cache.store_closure(ClosureId(3), sig("{closure}"));
        assert!(cache.closure(ClosureId(3)).is_some());

        cache.flush().unwrap();
        // Nothing durable was produced by a closure-only store.
        assert!(!blobs.contains(DEFAULT_IDENTIFIER));
    }

    #[test]
    fn corrupted_entry_is_a_miss_for_that_key_only() {
        let dir = tempfile::TempDir::new().unwrap();
        let source = dir.path().join("lib.src");
        std::fs::write(&source, "function a() {} function b() {}").unwrap();

        let blobs = MemoryBlobStore::new();
        {
            let mut cache = FileCache::new(Box::new(blobs.clone()), DEFAULT_IDENTIFIER);
            cache.store_function(sig("a"), Some(&source));
            cache.store_function(sig("b"), Some(&source));
            cache.flush().unwrap();
        }

        // Tamper with one payload, keeping the container valid JSON.
        {
            let mut blobs = blobs.clone();
            let bytes = blobs.load(DEFAULT_IDENTIFIER).unwrap().unwrap();
            let mut container: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
            container["functions"]["a"]["payload"] =
                serde_json::Value::String("garbage".to_string());
            blobs
                .store(
                    DEFAULT_IDENTIFIER,
                    serde_json::to_string(&container).unwrap().as_bytes(),
                )
                .unwrap();
        }

        let mut cache = FileCache::new(Box::new(blobs), DEFAULT_IDENTIFIER);
        assert!(cache.function("a").is_none());
        assert!(cache.function("b").is_some());
    }
}
