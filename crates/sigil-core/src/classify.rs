//! Callable-shape classification
//!
//! Host values that "look callable" come in several shapes: a string naming
//! a function, a `Class::method` string, a class-plus-method pair, or an
//! opaque callable value. Classification happens once at the service
//! boundary and produces a [`CallableKind`]; the rest of the core never
//! inspects host values.

use crate::reflect::ClosureId;

/// The classified shape of a callable-like value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallableKind {
    /// A bare function name.
    Function(String),
    /// A class and method name.
    ClassMethod(String, String),
    /// An opaque callable value, identified by its per-process id.
    Callable(ClosureId),
}

/// Host capability mapping arbitrary values to [`CallableKind`].
///
/// Implementations that can consult the host runtime may go further than
/// shape matching, e.g. mapping a bare class name to
/// `ClassMethod(class, CONSTRUCTOR)` when the name resolves to a class.
pub trait Classifier {
    /// The host value type this classifier understands.
    type Value;

    /// Classify `value`, or `None` when no callable shape matches.
    fn classify(&self, value: &Self::Value) -> Option<CallableKind>;
}

/// Host-neutral callable reference shapes covered by [`RefClassifier`].
#[derive(Debug, Clone, PartialEq)]
pub enum CallableRef {
    /// A textual reference: `"funcName"` or `"Class::method"`.
    Name(String),
    /// An explicit class and method pair.
    ClassPair(String, String),
    /// A callable value the host has already assigned an identity.
    Value(ClosureId),
}

impl CallableRef {
    /// Convenience for textual references.
    pub fn name(text: impl Into<String>) -> Self {
        CallableRef::Name(text.into())
    }

    /// Convenience for class-plus-method pairs.
    pub fn pair(class: impl Into<String>, method: impl Into<String>) -> Self {
        CallableRef::ClassPair(class.into(), method.into())
    }
}

/// Shape-only classifier over [`CallableRef`] values.
///
/// Textual references containing `::` split into class and method; any
/// other non-empty text is taken as a function name. Being host-blind, it
/// cannot tell a misspelled function from a real one; resolution reports
/// that as not-found downstream.
#[derive(Debug, Default, Clone, Copy)]
pub struct RefClassifier;

impl Classifier for RefClassifier {
    type Value = CallableRef;

    fn classify(&self, value: &CallableRef) -> Option<CallableKind> {
        match value {
            CallableRef::Name(text) => match text.split_once("::") {
                // Exactly one separator: anything else is not a method
                // reference.
                Some((class, method))
                    if !class.is_empty() && !method.is_empty() && !method.contains("::") =>
                {
                    Some(CallableKind::ClassMethod(
                        class.to_string(),
                        method.to_string(),
                    ))
                }
                Some(_) => None,
                None if text.is_empty() => None,
                None => Some(CallableKind::Function(text.clone())),
            },
            CallableRef::ClassPair(class, method) => Some(CallableKind::ClassMethod(
                class.clone(),
                method.clone(),
            )),
            CallableRef::Value(id) => Some(CallableKind::Callable(*id)),
        }
    }
}
