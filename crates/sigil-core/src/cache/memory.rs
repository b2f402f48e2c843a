//! In-memory signature cache

use std::path::Path;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use super::{method_key, CacheError, SignatureCache};
use crate::reflect::ClosureId;
use crate::signature::CallableSignature;

/// A settled lookup: `None` remembers "looked up and absent" so the loader
/// is not consulted again for the same key.
type Slot = Option<Arc<CallableSignature>>;

/// Cache hit/miss statistics.
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheStats {
    /// Number of resident signatures.
    pub entries: usize,
    /// Lookups answered with a signature.
    pub hits: usize,
    /// Lookups answered with a miss.
    pub misses: usize,
}

impl CacheStats {
    /// Hit ratio in `0.0..=1.0`; zero when nothing was looked up yet.
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Pure in-memory tier: three lazily-populated maps (functions, methods,
/// closures) with positive and negative caching.
///
/// On the first lookup of a key the tier consults a loader supplied by the
/// composing tier and settles the result, absent or not, so the loader runs
/// at most once per key per process lifetime. The bare tier's loader yields
/// nothing. Stores overwrite unconditionally.
#[derive(Debug, Default)]
pub struct MemoryCache {
    functions: FxHashMap<String, Slot>,
    methods: FxHashMap<String, Slot>,
    closures: FxHashMap<ClosureId, Slot>,
    hits: usize,
    misses: usize,
}

impl MemoryCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Function lookup with a backing loader for the first miss.
    pub fn function_or_load<F>(&mut self, name: &str, load: F) -> Option<Arc<CallableSignature>>
    where
        F: FnOnce() -> Option<CallableSignature>,
    {
        if !self.functions.contains_key(name) {
            let slot = load().map(Arc::new);
            self.functions.insert(name.to_string(), slot);
        }
        let found = self.functions[name].clone();
        self.settle(found)
    }

    /// Method lookup with a backing loader for the first miss.
    pub fn method_or_load<F>(
        &mut self,
        class: &str,
        method: &str,
        load: F,
    ) -> Option<Arc<CallableSignature>>
    where
        F: FnOnce() -> Option<CallableSignature>,
    {
        let key = method_key(class, method);
        if !self.methods.contains_key(&key) {
            let slot = load().map(Arc::new);
            self.methods.insert(key.clone(), slot);
        }
        let found = self.methods[&key].clone();
        self.settle(found)
    }

    /// Closure lookup with a backing loader for the first miss.
    pub fn closure_or_load<F>(&mut self, id: ClosureId, load: F) -> Option<Arc<CallableSignature>>
    where
        F: FnOnce() -> Option<CallableSignature>,
    {
        if !self.closures.contains_key(&id) {
            let slot = load().map(Arc::new);
            self.closures.insert(id, slot);
        }
        let found = self.closures[&id].clone();
        self.settle(found)
    }

    fn settle(&mut self, found: Option<Arc<CallableSignature>>) -> Option<Arc<CallableSignature>> {
        if found.is_some() {
            self.hits += 1;
        } else {
            self.misses += 1;
        }
        found
    }

    /// Drop all entries and reset statistics.
    pub fn clear(&mut self) {
        self.functions.clear();
        self.methods.clear();
        self.closures.clear();
        self.hits = 0;
        self.misses = 0;
    }

    /// Current statistics.
    pub fn stats(&self) -> CacheStats {
        let resident = |map: &FxHashMap<String, Slot>| map.values().filter(|s| s.is_some()).count();
        CacheStats {
            entries: resident(&self.functions)
                + resident(&self.methods)
                + self.closures.values().filter(|s| s.is_some()).count(),
            hits: self.hits,
            misses: self.misses,
        }
    }
}

impl SignatureCache for MemoryCache {
    fn function(&mut self, name: &str) -> Option<Arc<CallableSignature>> {
        self.function_or_load(name, || None)
    }

    fn store_function(&mut self, signature: CallableSignature, _declaring_file: Option<&Path>) {
        self.functions
            .insert(signature.qualified_name.clone(), Some(Arc::new(signature)));
    }

    fn method(&mut self, class: &str, method: &str) -> Option<Arc<CallableSignature>> {
        self.method_or_load(class, method, || None)
    }

    fn store_method(&mut self, signature: CallableSignature, _declaring_file: Option<&Path>) {
        let key = method_key(
            signature.class_name.as_deref().unwrap_or_default(),
            &signature.qualified_name,
        );
        self.methods.insert(key, Some(Arc::new(signature)));
    }

    fn closure(&mut self, id: ClosureId) -> Option<Arc<CallableSignature>> {
        self.closure_or_load(id, || None)
    }

    fn store_closure(&mut self, id: ClosureId, signature: CallableSignature) {
        self.closures.insert(id, Some(Arc::new(signature)));
    }

    fn flush(&mut self) -> Result<(), CacheError> {
        Ok(())
    }
}
