//! `OrderedPairList[X]`: a list whose every element is a `KeyWith[X]` pair.
//!
//! Same meaning as "list of `KeyWith[X]`", but the inner pair validator is
//! resolved once per parameterization instead of once per candidate.
use std::sync::Arc;
use serde_json::Value;

use super::{pair_of, Evaluate, ShapeValidator};
use crate::error::Mismatch;
use crate::types::{Base, Validator};

pub const NAME: &str = "OrderedPairList";

const EXPECTED: &str = "a list of [key, value] pairs";

/// Any list-like value; the pair shape of elements is only enforced once
/// parameterized.
pub fn is_ordered_pair_list(v: &Value) -> bool { v.is_array() }

fn any_len(_: &[Value]) -> bool { true }

pub fn definition() -> ShapeValidator {
    ShapeValidator::new(NAME, Base::ArrayRef.validator(), is_ordered_pair_list, any_len, generate)
}

fn generate(element: Validator) -> Evaluate {
    let pair = pair_of(element);
    Arc::new(move |v: &Value| -> Result<(), Mismatch> {
        let xs = v.as_array().ok_or_else(|| Mismatch::shape(EXPECTED, v))?;
        for (index, x) in xs.iter().enumerate() {
            pair.diagnose(x)
                .map_err(|inner| Mismatch::Element { index, inner: Box::new(inner) })?;
        }
        Ok(())
    })
}
