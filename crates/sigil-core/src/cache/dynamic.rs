//! Change-aware in-memory cache

use std::path::Path;
use std::sync::Arc;

use super::{CacheError, CacheStats, MemoryCache, ProvenanceTracker, SignatureCache};
use crate::reflect::ClosureId;
use crate::signature::CallableSignature;

/// [`MemoryCache`] paired with a [`ProvenanceTracker`].
///
/// The staleness check runs BEFORE the memory lookup: a key whose declaring
/// file changed (or that never had provenance recorded) reports a miss even
/// if a value is still resident, so the caller re-introspects and re-stores,
/// refreshing the stale entry in place. Closures carry no provenance and
/// bypass the check.
#[derive(Debug, Default)]
pub struct DynamicMemoryCache {
    memory: MemoryCache,
    provenance: ProvenanceTracker,
}

impl DynamicMemoryCache {
    /// Create an empty change-aware cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Statistics of the underlying memory tier.
    pub fn stats(&self) -> CacheStats {
        self.memory.stats()
    }

    /// The staleness side of the tier, for inspection.
    pub fn provenance(&self) -> &ProvenanceTracker {
        &self.provenance
    }
}

impl SignatureCache for DynamicMemoryCache {
    fn function(&mut self, name: &str) -> Option<Arc<CallableSignature>> {
        if self.provenance.function_is_stale(name) {
            return None;
        }
        self.memory.function(name)
    }

    fn store_function(&mut self, signature: CallableSignature, declaring_file: Option<&Path>) {
        if let Some(file) = declaring_file {
            self.provenance
                .record_function(&signature.qualified_name, file);
        }
        self.memory.store_function(signature, declaring_file);
    }

    fn method(&mut self, class: &str, method: &str) -> Option<Arc<CallableSignature>> {
        if self.provenance.method_is_stale(class, method) {
            return None;
        }
        self.memory.method(class, method)
    }

    fn store_method(&mut self, signature: CallableSignature, declaring_file: Option<&Path>) {
        if let Some(file) = declaring_file {
            self.provenance.record_method(
                signature.class_name.as_deref().unwrap_or_default(),
                &signature.qualified_name,
                file,
            );
        }
        self.memory.store_method(signature, declaring_file);
    }

    fn closure(&mut self, id: ClosureId) -> Option<Arc<CallableSignature>> {
        self.memory.closure(id)
    }

    fn store_closure(&mut self, id: ClosureId, signature: CallableSignature) {
        self.memory.store_closure(id, signature);
    }

    fn flush(&mut self) -> Result<(), CacheError> {
        // Nothing durable behind this tier.
        self.provenance.mark_clean();
        self.memory.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::SignatureKind;
    use std::fs;
    use std::thread::sleep;
    use std::time::Duration;
    use tempfile::TempDir;

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
    fn hit_while_the_declaring_file_is_unchanged() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("lib.src");
        fs::write(&path, "function f() {}").unwrap();

        let mut cache = DynamicMemoryCache::new();
        cache.store_function(sig("f"), Some(&path));

        let first = cache.function("f").unwrap();
        let second = cache.function("f").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn changed_file_turns_a_resident_entry_into_a_miss() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("lib.src");
        fs::write(&path, "function f() {}").unwrap();

        let mut cache = DynamicMemoryCache::new();
        cache.store_function(sig("f"), Some(&path));
        assert!(cache.function("f").is_some());

        sleep(Duration::from_millis(20));
        fs::write(&path, "function f(x) {}").unwrap();

        assert!(cache.function("f").is_none());
    }

    #[test]
    fn restore_refreshes_a_stale_entry() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("lib.src");
        fs::write(&path, "function f() {}").unwrap();

        let mut cache = DynamicMemoryCache::new();
        cache.store_function(sig("f"), Some(&path));

        sleep(Duration::from_millis(20));
        fs::write(&path, "function f(x) {}").unwrap();
        assert!(cache.function("f").is_none());

        cache.store_function(sig("f"), Some(&path));
        assert!(cache.function("f").is_some());
    }

    #[test]
    fn entries_without_provenance_always_miss() {
        let mut cache = DynamicMemoryCache::new();
        cache.store_function(sig("f"), None);
        assert!(cache.function("f").is_none());
    }

    #[test]
    fn methods_track_their_own_namespace() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("class.src");
        fs::write(&path, "class A { run() {} }").unwrap();

        let mut cache = DynamicMemoryCache::new();
        let mut method = sig("run");
        method.class_name = Some("A".to_string());
        method.kind = SignatureKind::Method;
        cache.store_method(method, Some(&path));

        assert!(cache.method("A", "run").is_some());
        assert!(cache.method("B", "run").is_none());

        sleep(Duration::from_millis(20));
        fs::write(&path, "class A { run(x) {} }").unwrap();
        assert!(cache.method("A", "run").is_none());
    }

    #[test]
    fn closures_bypass_the_staleness_check() {
        let mut cache = DynamicMemoryCache::new();
        cache.store_closure(ClosureId(1), sig("{closure}"));
        assert!(cache.closure(ClosureId(1)).is_some());
    }
}
