//! Error types shared by the engine, the registry and the attribute layer.
//!
//! `evaluate` never surfaces any of these: it answers pass/fail. `Mismatch`
//! is what `diagnose`/`explain` hand back when a caller wants to know which
//! check tripped first.
use std::fmt;
use serde_json::Value;

// ------------------------------ Value kinds ------------------------------- //

/// Coarse description of a JSON value, cheap enough to carry in a mismatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Null,
    Bool,
    Number,
    String,
    Array(usize),
    Object,
}

impl Kind {
    pub fn of(v: &Value) -> Self {
        match v {
            Value::Null => Kind::Null,
            Value::Bool(_) => Kind::Bool,
            Value::Number(_) => Kind::Number,
            Value::String(_) => Kind::String,
            Value::Array(xs) => Kind::Array(xs.len()),
            Value::Object(_) => Kind::Object,
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Kind::Null => f.write_str("null"),
            Kind::Bool => f.write_str("bool"),
            Kind::Number => f.write_str("number"),
            Kind::String => f.write_str("string"),
            Kind::Array(1) => f.write_str("array of 1 element"),
            Kind::Array(n) => write!(f, "array of {n} elements"),
            Kind::Object => f.write_str("object"),
        }
    }
}

// ------------------------------- Mismatch --------------------------------- //

/// First failing check of a validation pass. Indices are positions inside
/// the candidate container.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Mismatch {
    /// Not list-like, or wrong arity/parity for the shape.
    #[error("expected {expected}, found {found}")]
    Shape { expected: &'static str, found: Kind },
    #[error("key at index {index} is not a string")]
    KeyType { index: usize },
    #[error("value at index {index} does not satisfy the element type")]
    ValueType { index: usize },
    /// An element of an `OrderedPairList` is not a valid pair.
    #[error("element {index}: {inner}")]
    Element { index: usize, inner: Box<Mismatch> },
    /// A plain (non-shape) validator rejected the value.
    #[error("unexpected {found}")]
    Type { found: Kind },
}

impl Mismatch {
    pub(crate) fn shape(expected: &'static str, v: &Value) -> Self {
        Mismatch::Shape { expected, found: Kind::of(v) }
    }
}

// ------------------------------- Registry --------------------------------- //

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("`{name}` is already registered with a different definition")]
    DuplicateNameConflict { name: String },
    #[error("unknown type `{name}`")]
    UnknownBaseType { name: String },
    #[error("`{name}` is not a parameterizable shape")]
    NotParameterizable { name: String },
}

// ------------------------------ Attributes -------------------------------- //

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AttributeError {
    #[error("attribute `{attribute}` is required")]
    Missing { attribute: String },
    #[error("attribute `{attribute}` does not pass the type constraint for {expected}: {reason}")]
    Invalid {
        attribute: String,
        expected: String,
        reason: Mismatch,
    },
    #[error("unknown attribute `{attribute}`")]
    Unknown { attribute: String },
    #[error("expected an object to construct from, found {found}")]
    NotAnObject { found: Kind },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn kind_describes_arrays_with_length() {
        assert_eq!(Kind::of(&json!([1, 2, 3])), Kind::Array(3));
        assert_eq!(Kind::of(&json!([1])).to_string(), "array of 1 element");
        assert_eq!(Kind::of(&json!("x")).to_string(), "string");
    }

    #[test]
    fn nested_element_mismatch_reads_outside_in() {
        let m = Mismatch::Element {
            index: 1,
            inner: Box::new(Mismatch::ValueType { index: 1 }),
        };
        assert_eq!(m.to_string(), "element 1: value at index 1 does not satisfy the element type");
    }

    #[test]
    fn inner_mismatch_is_printed_once() {
        let m = Mismatch::Element {
            index: 0,
            inner: Box::new(Mismatch::KeyType { index: 0 }),
        };
        assert!(std::error::Error::source(&m).is_none());
        let err = AttributeError::Invalid {
            attribute: "pair".into(),
            expected: "KeyWith[Str]".into(),
            reason: m,
        };
        assert!(std::error::Error::source(&err).is_none());
        let alternate = format!("{:#}", anyhow::Error::new(err));
        assert_eq!(alternate.matches("is not a string").count(), 1);
    }
}
