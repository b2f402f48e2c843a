//! Signature cache tiers
//!
//! Every tier implements [`SignatureCache`]: keyed get/store per callable
//! kind plus an explicit [`SignatureCache::flush`] as the only persistence
//! boundary. Tiers compose capabilities instead of subclassing:
//! [`MemoryCache`] is the positive-and-negative in-memory store,
//! [`ProvenanceTracker`] is the staleness policy over declaring-file
//! modification times, and [`DynamicMemoryCache`] pairs the two. The
//! durable tier lives in `sigil-store` and composes the same pieces.

mod dynamic;
mod memory;
mod provenance;

pub use dynamic::DynamicMemoryCache;
pub use memory::{CacheStats, MemoryCache};
pub use provenance::{Provenance, ProvenanceTracker};

use std::path::Path;
use std::sync::Arc;

use thiserror::Error;

use crate::reflect::ClosureId;
use crate::signature::CallableSignature;

/// Errors surfaced by [`SignatureCache::flush`] on durable tiers.
///
/// Lookups never fail: staleness and corrupt payloads collapse into cache
/// misses.
#[derive(Debug, Error)]
pub enum CacheError {
    /// IO failure of the backing store.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization failure of the persisted container.
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Composite key for method entries.
pub fn method_key(class: &str, method: &str) -> String {
    format!("{class}::{method}")
}

/// Contract every cache tier implements.
///
/// Gets answer `None` on a miss and never fail; a tier may also answer
/// `None` for a resident entry it judges stale. Stores overwrite
/// unconditionally. `declaring_file` is the provenance handle: the source
/// file whose modification time at store-time decides later staleness
/// (tiers without staleness tracking ignore it).
pub trait SignatureCache {
    /// Cached signature for a free function, or `None`.
    fn function(&mut self, name: &str) -> Option<Arc<CallableSignature>>;

    /// Record a free-function signature.
    fn store_function(&mut self, signature: CallableSignature, declaring_file: Option<&Path>);

    /// Cached signature for a class method, or `None`.
    fn method(&mut self, class: &str, method: &str) -> Option<Arc<CallableSignature>>;

    /// Record a method signature, keyed by the signature's own class and
    /// qualified name.
    fn store_method(&mut self, signature: CallableSignature, declaring_file: Option<&Path>);

    /// Cached signature for a closure instance, or `None`.
    fn closure(&mut self, id: ClosureId) -> Option<Arc<CallableSignature>>;

    /// Record a closure signature under its per-process identity.
    fn store_closure(&mut self, id: ClosureId, signature: CallableSignature);

    /// Commit buffered writes to the tier's backing medium. A no-op for
    /// pure in-memory tiers.
    fn flush(&mut self) -> Result<(), CacheError>;
}
