//! Callable signature model
//!
//! Immutable value objects describing the parameter and return contracts of
//! functions, class methods, closures, and implicit constructors. Signatures
//! are built once from raw reflection facts and owned by whichever cache
//! tier stores them; equality is structural.

mod descriptor;

pub use descriptor::{ArgumentDescriptor, ReturnDescriptor};

use std::ops::Index;

use serde::{Deserialize, Serialize};

use crate::reflect::RawCallable;

/// Qualified name given to constructors, explicit and implicit.
pub const CONSTRUCTOR: &str = "constructor";

/// Which flavor of callable a signature describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignatureKind {
    /// A free function.
    Function,
    /// A class method (including explicit constructors).
    Method,
    /// A closure or other anonymous callable.
    Closure,
    /// A class with no declared constructor; the default one is used.
    VoidConstructor,
}

/// Normalized description of a callable's parameters and return contract.
///
/// Arguments keep declaration order and are addressable both by position
/// (`sig[0]`, [`CallableSignature::argument`]) and by name
/// ([`CallableSignature::argument_named`]); names are unique within one
/// signature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallableSignature {
    /// Bare name for functions and closures; method name for methods.
    pub qualified_name: String,
    /// Owning class, present for methods and constructors.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub class_name: Option<String>,
    /// Callable flavor.
    pub kind: SignatureKind,
    /// Parameters in declaration order.
    pub arguments: Vec<ArgumentDescriptor>,
    /// Return contract, or `None` when the callable declared none.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub return_value: Option<ReturnDescriptor>,
}

impl CallableSignature {
    /// Build a free-function signature from raw reflection facts.
    pub fn function(raw: RawCallable) -> Self {
        Self::from_raw(raw, SignatureKind::Function, None)
    }

    /// Build a method signature from raw reflection facts.
    pub fn method(raw: RawCallable, class: impl Into<String>) -> Self {
        Self::from_raw(raw, SignatureKind::Method, Some(class.into()))
    }

    /// Build a closure signature from raw reflection facts.
    pub fn closure(raw: RawCallable) -> Self {
        Self::from_raw(raw, SignatureKind::Closure, None)
    }

    /// Signature of a class that declares no constructor: no arguments, no
    /// return contract, qualified name fixed to [`CONSTRUCTOR`].
    pub fn void_constructor(class: impl Into<String>) -> Self {
        Self {
            qualified_name: CONSTRUCTOR.to_string(),
            class_name: Some(class.into()),
            kind: SignatureKind::VoidConstructor,
            arguments: Vec::new(),
            return_value: None,
        }
    }

    fn from_raw(raw: RawCallable, kind: SignatureKind, class_name: Option<String>) -> Self {
        let RawCallable {
            name,
            params,
            return_type,
            return_allows_null,
            ..
        } = raw;

        let arguments = params
            .into_iter()
            .map(ArgumentDescriptor::from_raw)
            .collect();
        let return_value = return_type.map(|ty| ReturnDescriptor::typed(ty, return_allows_null));

        Self {
            qualified_name: name,
            class_name,
            kind,
            arguments,
            return_value,
        }
    }

    /// Number of declared parameters.
    pub fn arity(&self) -> usize {
        self.arguments.len()
    }

    /// Argument by position, `None` when out of range.
    pub fn argument(&self, index: usize) -> Option<&ArgumentDescriptor> {
        self.arguments.get(index)
    }

    /// Argument by declared name.
    pub fn argument_named(&self, name: &str) -> Option<&ArgumentDescriptor> {
        self.arguments.iter().find(|arg| arg.name == name)
    }

    /// Whether this signature describes a method or constructor.
    pub fn is_method(&self) -> bool {
        self.class_name.is_some()
    }

    /// Whether this signature stands in for an undeclared constructor.
    pub fn is_void_constructor(&self) -> bool {
        self.kind == SignatureKind::VoidConstructor
    }
}

impl Index<usize> for CallableSignature {
    type Output = ArgumentDescriptor;

    fn index(&self, index: usize) -> &ArgumentDescriptor {
        &self.arguments[index]
    }
}

impl<'a> IntoIterator for &'a CallableSignature {
    type Item = &'a ArgumentDescriptor;
    type IntoIter = std::slice::Iter<'a, ArgumentDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.arguments.iter()
    }
}
