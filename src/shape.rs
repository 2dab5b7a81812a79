//! Parameterizable shape validators.
//!
//! A shape is a structure-only rule over list-like values that can be
//! specialized with an element validator. Specializing runs the shape's
//! generator exactly once and yields a [`ParameterizedValidator`] whose
//! evaluation checks structure and per-element typing together.
//!
//! Shapes in this crate:
//! - `KeyWith[X]`: a single `[key, value]` pair.
//! - `FlatMap[X]`: `[k0, v0, k1, v1, ...]`, even length.
//! - `OrderedPairList[X]`: `[[k0, v0], [k1, v1], ...]`.
//!
//! Keys are always checked against `Str`; values against `X`. Every
//! evaluation is fail-fast and walks the container in order.
pub mod pair;
pub mod flat_map;
pub mod pair_list;

use std::fmt;
use std::sync::Arc;
use serde_json::Value;

use crate::error::Mismatch;
use crate::types::{same_validator, Base, TypeValidator, Validator};

pub use flat_map::is_flat_map;
pub use pair::is_pair;
pub use pair_list::is_ordered_pair_list;

/// Validator every key position must satisfy.
pub(crate) const KEY: Base = Base::Str;

// ------------------------------ Signatures -------------------------------- //

/// Specialized check produced by a generator.
pub type Evaluate = Arc<dyn Fn(&Value) -> Result<(), Mismatch> + Send + Sync>;
/// Structure-only predicate over any value.
pub type Constraint = fn(&Value) -> bool;
/// Same predicate as `Constraint`, for a candidate already known to be list-like.
pub type Optimized = fn(&[Value]) -> bool;
pub type Generator = fn(Validator) -> Evaluate;

// ----------------------------- ShapeValidator ----------------------------- //

/// One named, parameterizable rule. Built once, then shared read-only.
#[derive(Clone)]
pub struct ShapeValidator {
    name: &'static str,
    parent: Validator,
    constraint: Constraint,
    optimized: Optimized,
    generator: Generator,
}

impl ShapeValidator {
    pub fn new(
        name: &'static str,
        parent: Validator,
        constraint: Constraint,
        optimized: Optimized,
        generator: Generator,
    ) -> Self {
        Self { name, parent, constraint, optimized, generator }
    }

    pub fn name(&self) -> &'static str { self.name }

    pub fn parent(&self) -> &Validator { &self.parent }

    /// Structure-only check: the parent type, then the shape's own constraint.
    pub fn base(&self, v: &Value) -> bool {
        if !self.parent.check(v) {
            return false;
        }
        match v {
            Value::Array(xs) => (self.optimized)(xs),
            _ => (self.constraint)(v),
        }
    }

    /// Bind an element validator, producing the fully specialized check.
    pub fn parameterize(&self, element: Validator) -> ParameterizedValidator {
        let evaluate = (self.generator)(element.clone());
        ParameterizedValidator { shape: self.name, element, evaluate }
    }

    /// Whether `other` would behave exactly like `self`. Used by the registry
    /// to make re-registration idempotent.
    pub fn same_definition(&self, other: &ShapeValidator) -> bool {
        self.name == other.name
            && same_validator(&self.parent, &other.parent)
            && std::ptr::fn_addr_eq(self.constraint, other.constraint)
            && std::ptr::fn_addr_eq(self.optimized, other.optimized)
            && std::ptr::fn_addr_eq(self.generator, other.generator)
    }
}

impl fmt::Debug for ShapeValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShapeValidator")
            .field("name", &self.name)
            .field("parent", &self.parent.name())
            .finish_non_exhaustive()
    }
}

/// Unparameterized use of a shape name checks structure only.
impl TypeValidator for ShapeValidator {
    fn name(&self) -> String { self.name.to_string() }

    fn check(&self, v: &Value) -> bool { self.base(v) }

    fn explain(&self, v: &Value) -> Result<(), Mismatch> {
        if self.base(v) {
            Ok(())
        } else {
            Err(Mismatch::shape(self.name, v))
        }
    }
}

// ------------------------- ParameterizedValidator ------------------------- //

/// A shape bound to one element validator.
#[derive(Clone)]
pub struct ParameterizedValidator {
    shape: &'static str,
    element: Validator,
    evaluate: Evaluate,
}

impl ParameterizedValidator {
    pub fn shape(&self) -> &'static str { self.shape }

    pub fn element(&self) -> &Validator { &self.element }

    pub fn evaluate(&self, v: &Value) -> bool { (self.evaluate)(v).is_ok() }

    /// The first failing check, in the same order `evaluate` runs them.
    pub fn diagnose(&self, v: &Value) -> Result<(), Mismatch> { (self.evaluate)(v) }
}

impl fmt::Debug for ParameterizedValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ParameterizedValidator").field(&TypeValidator::name(self)).finish()
    }
}

impl TypeValidator for ParameterizedValidator {
    fn name(&self) -> String { format!("{}[{}]", self.shape, self.element.name()) }

    fn check(&self, v: &Value) -> bool { self.evaluate(v) }

    fn explain(&self, v: &Value) -> Result<(), Mismatch> { self.diagnose(v) }
}

// ------------------------------ Composition ------------------------------- //

/// Anonymous `KeyWith[element]`, never registered under a global name.
pub fn pair_of(element: Validator) -> ParameterizedValidator {
    pair::definition().parameterize(element)
}

/// The three shape definitions, in registration order.
pub fn definitions() -> [ShapeValidator; 3] {
    [pair::definition(), flat_map::definition(), pair_list::definition()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parameterized_names_nest() {
        let inner = Arc::new(pair_of(Base::Int.validator()));
        let outer = flat_map::definition().parameterize(inner);
        assert_eq!(TypeValidator::name(&outer), "FlatMap[KeyWith[Int]]");
        assert!(outer.evaluate(&json!(["a", ["b", 1]])));
        assert!(!outer.evaluate(&json!(["a", ["b", "1"]])));
    }

    #[test]
    fn evaluate_is_stable_across_calls() {
        let v = pair_of(Base::Str.validator());
        let candidate = json!(["a", "b"]);
        let first = v.evaluate(&candidate);
        for _ in 0..4 {
            assert_eq!(v.evaluate(&candidate), first);
        }
    }

    #[test]
    fn evaluate_agrees_with_diagnose() {
        let v = pair_list::definition().parameterize(Base::Int.validator());
        for c in [json!([]), json!([["a", 1]]), json!([["a", "x"]]), json!("nope"), json!([1, 2])] {
            assert_eq!(v.evaluate(&c), v.diagnose(&c).is_ok(), "{c}");
        }
    }

    fn even(xs: &[Value]) -> bool { xs.len() % 2 == 0 }

    fn accept_all(_: Validator) -> Evaluate { Arc::new(|_: &Value| -> Result<(), Mismatch> { Ok(()) }) }

    #[test]
    fn same_definition_requires_same_functions() {
        assert!(pair::definition().same_definition(&pair::definition()));
        let odd = ShapeValidator::new(
            pair::NAME,
            Base::ArrayRef.validator(),
            flat_map::is_flat_map,
            even,
            accept_all,
        );
        assert!(!pair::definition().same_definition(&odd));
    }

    #[test]
    fn unparameterized_shape_checks_structure_only() {
        let shape = pair::definition();
        assert!(TypeValidator::check(&shape, &json!([1, 2])));
        assert_eq!(
            TypeValidator::explain(&shape, &json!("Hello")),
            Err(Mismatch::Shape { expected: "KeyWith", found: crate::error::Kind::String })
        );
    }
}
