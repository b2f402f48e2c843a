//! Signature service
//!
//! The orchestrator: resolves callable references to signatures, consulting
//! the cache tier first and invoking the host reflector only on a miss. The
//! service owns nothing but the tier and the reflector; signatures belong
//! to the tier that stored them.

use std::sync::Arc;

use thiserror::Error;

use crate::cache::{method_key, MemoryCache, SignatureCache};
use crate::classify::{CallableKind, Classifier};
use crate::reflect::{ClosureId, ReflectError, Reflector};
use crate::signature::{CallableSignature, CONSTRUCTOR};

/// Failure of a resolve call. Staleness and persistence problems are never
/// surfaced here; they show up only as re-introspection cost.
#[derive(Debug, Error)]
pub enum SignatureError {
    /// The requested callable does not exist at introspection time.
    #[error("no callable named `{name}` could be resolved")]
    NotFound {
        /// The requested qualified name (`name` or `Class::method`).
        name: String,
    },
}

/// Resolves callable references to cached signatures.
///
/// The default tier is a bare [`MemoryCache`]: no persistence, no staleness
/// tracking. Hand in a change-aware or durable tier for more. There is no
/// process-wide instance; callers hold their own.
pub struct SignatureService<R: Reflector> {
    reflector: R,
    cache: Box<dyn SignatureCache>,
}

impl<R: Reflector> SignatureService<R> {
    /// Service over a bare in-memory tier.
    pub fn new(reflector: R) -> Self {
        Self::with_cache(reflector, Box::new(MemoryCache::new()))
    }

    /// Service over an explicit cache tier.
    pub fn with_cache(reflector: R, cache: Box<dyn SignatureCache>) -> Self {
        Self { reflector, cache }
    }

    /// The active cache tier, e.g. for flushing.
    pub fn cache_mut(&mut self) -> &mut dyn SignatureCache {
        self.cache.as_mut()
    }

    /// Swap the cache tier.
    pub fn set_cache(&mut self, cache: Box<dyn SignatureCache>) {
        self.cache = cache;
    }

    /// Resolve a free function by name.
    pub fn function_signature(
        &mut self,
        name: &str,
    ) -> Result<Arc<CallableSignature>, SignatureError> {
        if let Some(sig) = self.cache.function(name) {
            return Ok(sig);
        }

        let raw = self
            .reflector
            .reflect_function(name)
            .map_err(|_| SignatureError::NotFound {
                name: name.to_string(),
            })?;
        let file = raw.declaring_file.clone();
        let sig = CallableSignature::function(raw);
        self.cache.store_function(sig.clone(), file.as_deref());

        // The tier is authoritative: re-read so it may answer a different
        // but structurally equal instance.
        Ok(self.cache.function(name).unwrap_or_else(|| Arc::new(sig)))
    }

    /// Resolve a class method.
    ///
    /// Querying the constructor of a class that declares none yields the
    /// void-constructor signature instead of failing.
    pub fn method_signature(
        &mut self,
        class: &str,
        method: &str,
    ) -> Result<Arc<CallableSignature>, SignatureError> {
        if let Some(sig) = self.cache.method(class, method) {
            return Ok(sig);
        }

        let raw = match self.reflector.reflect_method(class, method) {
            Ok(raw) => raw,
            Err(ReflectError::NoConstructor { class: owner, file }) if method == CONSTRUCTOR => {
                let sig = CallableSignature::void_constructor(&owner);
                self.cache.store_method(sig.clone(), file.as_deref());
                return Ok(self
                    .cache
                    .method(&owner, CONSTRUCTOR)
                    .unwrap_or_else(|| Arc::new(sig)));
            }
            Err(_) => {
                return Err(SignatureError::NotFound {
                    name: method_key(class, method),
                })
            }
        };

        let file = raw.declaring_file.clone();
        let sig = CallableSignature::method(raw, class);
        self.cache.store_method(sig.clone(), file.as_deref());

        Ok(self
            .cache
            .method(class, method)
            .unwrap_or_else(|| Arc::new(sig)))
    }

    /// Resolve a closure by its per-process identity.
    pub fn closure_signature(
        &mut self,
        id: ClosureId,
    ) -> Result<Arc<CallableSignature>, SignatureError> {
        if let Some(sig) = self.cache.closure(id) {
            return Ok(sig);
        }

        let raw = self
            .reflector
            .reflect_closure(id)
            .map_err(|_| SignatureError::NotFound {
                name: id.to_string(),
            })?;
        let sig = CallableSignature::closure(raw);
        self.cache.store_closure(id, sig.clone());

        Ok(self.cache.closure(id).unwrap_or_else(|| Arc::new(sig)))
    }

    /// Resolve anything callable-like, classifying `value` first.
    ///
    /// Answers `Ok(None)` when no callable shape matches.
    pub fn signature_of<C: Classifier>(
        &mut self,
        classifier: &C,
        value: &C::Value,
    ) -> Result<Option<Arc<CallableSignature>>, SignatureError> {
        match classifier.classify(value) {
            Some(CallableKind::Function(name)) => self.function_signature(&name).map(Some),
            Some(CallableKind::ClassMethod(class, method)) => {
                self.method_signature(&class, &method).map(Some)
            }
            Some(CallableKind::Callable(id)) => self.closure_signature(id).map(Some),
            None => Ok(None),
        }
    }
}
