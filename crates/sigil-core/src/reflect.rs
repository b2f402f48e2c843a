//! Host reflection contract
//!
//! Extracting parameter and return metadata from a live callable is
//! irreducibly host-specific, so it lives behind the [`Reflector`] trait.
//! The host hands back plain fact tuples ([`RawCallable`], [`RawParam`]);
//! the signature model normalizes them.

use std::path::PathBuf;

use thiserror::Error;

/// Stable identity of one closure instance within one process.
///
/// Minted by the host when it classifies a callable value. Identities are
/// not reproducible across processes, so closure signatures are never
/// durably persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClosureId(pub u64);

impl std::fmt::Display for ClosureId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "closure#{}", self.0)
    }
}

/// Raw facts about one declared parameter, as reported by the host.
#[derive(Debug, Clone)]
pub struct RawParam {
    /// Parameter name.
    pub name: String,
    /// Declared type name, if any.
    pub declared_type: Option<String>,
    /// Whether the parameter has a default or is a variadic tail.
    pub is_optional: bool,
    /// Whether the declared type accepts the host's null value.
    pub allows_null: bool,
    /// Declared default value, if one could be read.
    pub default_value: Option<serde_json::Value>,
}

/// Raw facts about one callable, as reported by the host.
#[derive(Debug, Clone)]
pub struct RawCallable {
    /// Callable name (bare function name, method name, or the host's
    /// placeholder name for closures).
    pub name: String,
    /// Parameters in declaration order.
    pub params: Vec<RawParam>,
    /// Declared return type name, if any.
    pub return_type: Option<String>,
    /// Whether the declared return type accepts the host's null value.
    pub return_allows_null: bool,
    /// Source file declaring the callable. Closures may lack one.
    pub declaring_file: Option<PathBuf>,
}

/// Failures of the host reflection capability.
#[derive(Debug, Error)]
pub enum ReflectError {
    /// The name did not resolve to a callable.
    #[error("callable not found: {name}")]
    NotFound {
        /// The requested qualified name.
        name: String,
    },

    /// The class exists but declares no constructor. Callers substitute a
    /// void-constructor signature; `file` is the class's declaring source
    /// file, used for provenance.
    #[error("class {class} declares no constructor")]
    NoConstructor {
        /// The queried class.
        class: String,
        /// Declaring file of the class, when known.
        file: Option<PathBuf>,
    },
}

/// Host capability yielding raw signature facts for callables.
///
/// Reflection is assumed deterministic for a given process state: a lookup
/// either succeeds or fails the same way until the underlying source
/// changes.
pub trait Reflector {
    /// Reflect a free function by name.
    fn reflect_function(&self, name: &str) -> Result<RawCallable, ReflectError>;

    /// Reflect a class method.
    ///
    /// Must fail with [`ReflectError::NoConstructor`] when the class exists
    /// but declares no constructor and the constructor was queried.
    fn reflect_method(&self, class: &str, method: &str) -> Result<RawCallable, ReflectError>;

    /// Reflect a closure by its per-process identity.
    fn reflect_closure(&self, id: ClosureId) -> Result<RawCallable, ReflectError>;
}
