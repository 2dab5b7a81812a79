//! Base type validators and the trait every validator implements.
use std::fmt;
use std::sync::Arc;
use serde_json::Value;

use crate::error::{Kind, Mismatch};

/// A named predicate over JSON values.
///
/// Implementations are shared across threads behind [`Validator`], so
/// `check` must not mutate anything.
pub trait TypeValidator: fmt::Debug + Send + Sync {
    /// Display name, e.g. `Str` or `KeyWith[Int]`.
    fn name(&self) -> String;

    fn check(&self, v: &Value) -> bool;

    /// Like `check`, but reports the first failing sub-check.
    fn explain(&self, v: &Value) -> Result<(), Mismatch> {
        if self.check(v) { Ok(()) } else { Err(Mismatch::Type { found: Kind::of(v) }) }
    }

    /// `Some` for the built-in validators; lets the registry treat two
    /// separately allocated copies of the same builtin as one definition.
    fn builtin(&self) -> Option<Base> { None }
}

pub type Validator = Arc<dyn TypeValidator>;

/// Two validators are the same definition if they share an allocation or
/// are the same builtin.
pub fn same_validator(a: &Validator, b: &Validator) -> bool {
    Arc::ptr_eq(a, b) || matches!((a.builtin(), b.builtin()), (Some(x), Some(y)) if x == y)
}

// ------------------------------- Builtins --------------------------------- //

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Base {
    Any,
    Null,
    Bool,
    /// Integral numbers only; `1.0` is a `Num`, not an `Int`.
    Int,
    Num,
    Str,
    /// Arrays and objects.
    Ref,
    /// The list-like container every shape refines.
    ArrayRef,
}

impl Base {
    pub const ALL: [Base; 8] = [
        Base::Any,
        Base::Null,
        Base::Bool,
        Base::Int,
        Base::Num,
        Base::Str,
        Base::Ref,
        Base::ArrayRef,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Base::Any => "Any",
            Base::Null => "Null",
            Base::Bool => "Bool",
            Base::Int => "Int",
            Base::Num => "Num",
            Base::Str => "Str",
            Base::Ref => "Ref",
            Base::ArrayRef => "ArrayRef",
        }
    }

    pub fn validator(self) -> Validator { Arc::new(self) }
}

impl TypeValidator for Base {
    fn name(&self) -> String { self.as_str().to_string() }

    fn check(&self, v: &Value) -> bool {
        match self {
            Base::Any => true,
            Base::Null => v.is_null(),
            Base::Bool => v.is_boolean(),
            Base::Int => v.is_i64() || v.is_u64(),
            Base::Num => v.is_number(),
            Base::Str => v.is_string(),
            Base::Ref => v.is_array() || v.is_object(),
            Base::ArrayRef => v.is_array(),
        }
    }

    fn builtin(&self) -> Option<Base> { Some(*self) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case(Base::Str, json!("a"), true)]
    #[case(Base::Str, json!(1), false)]
    #[case(Base::Int, json!(-3), true)]
    #[case(Base::Int, json!(u64::MAX), true)]
    #[case(Base::Int, json!(1.5), false)]
    #[case(Base::Num, json!(1.5), true)]
    #[case(Base::Null, json!(null), true)]
    #[case(Base::Bool, json!(false), true)]
    #[case(Base::Ref, json!({}), true)]
    #[case(Base::Ref, json!([]), true)]
    #[case(Base::ArrayRef, json!({}), false)]
    #[case(Base::ArrayRef, json!("Hello"), false)]
    #[case(Base::Any, json!(null), true)]
    fn builtins_classify(#[case] base: Base, #[case] v: Value, #[case] expected: bool) {
        assert_eq!(base.check(&v), expected);
    }

    #[test]
    fn separately_allocated_builtins_are_the_same_definition() {
        assert!(same_validator(&Base::Str.validator(), &Base::Str.validator()));
        assert!(!same_validator(&Base::Str.validator(), &Base::Int.validator()));
    }

    #[test]
    fn default_explain_reports_found_kind() {
        assert_eq!(Base::Str.explain(&json!([])), Err(Mismatch::Type { found: Kind::Array(0) }));
        assert_eq!(Base::Str.explain(&json!("ok")), Ok(()));
    }
}
