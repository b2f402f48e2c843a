//! Sigil: callable signature introspection with tiered caching
//!
//! This crate provides:
//! - A normalized model of callable signatures (functions, class methods,
//!   closures, implicit constructors)
//! - Contracts for host-supplied reflection and callable classification
//! - In-memory and change-aware signature cache tiers
//! - A signature service orchestrating cache lookups and reflection
//!
//! Durable, file-backed caching lives in the companion `sigil-store` crate.
//!
//! # Example
//!
//! ```no_run
//! use sigil_core::{Reflector, SignatureService};
//!
//! fn resolve(reflector: impl Reflector) {
//!     let mut service = SignatureService::new(reflector);
//!     let sig = service.function_signature("strlen").unwrap();
//!     assert_eq!(sig.qualified_name, "strlen");
//! }
//! ```

pub mod cache;
pub mod classify;
pub mod reflect;
pub mod service;
pub mod signature;

pub use cache::{
    method_key, CacheError, CacheStats, DynamicMemoryCache, MemoryCache, Provenance,
    ProvenanceTracker, SignatureCache,
};
pub use classify::{CallableKind, CallableRef, Classifier, RefClassifier};
pub use reflect::{ClosureId, RawCallable, RawParam, ReflectError, Reflector};
pub use service::{SignatureError, SignatureService};
pub use signature::{
    ArgumentDescriptor, CallableSignature, ReturnDescriptor, SignatureKind, CONSTRUCTOR,
};
