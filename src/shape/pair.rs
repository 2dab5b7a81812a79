//! `KeyWith[X]`: exactly one `[key, value]` pair.
use std::sync::Arc;
use serde_json::Value;

use super::{Evaluate, ShapeValidator, KEY};
use crate::error::Mismatch;
use crate::types::{Base, TypeValidator, Validator};

pub const NAME: &str = "KeyWith";

const EXPECTED: &str = "a [key, value] pair";

pub fn is_pair(v: &Value) -> bool {
    v.as_array().is_some_and(|xs| has_pair_len(xs))
}

fn has_pair_len(xs: &[Value]) -> bool { xs.len() == 2 }

pub fn definition() -> ShapeValidator {
    ShapeValidator::new(NAME, Base::ArrayRef.validator(), is_pair, has_pair_len, generate)
}

fn generate(element: Validator) -> Evaluate {
    Arc::new(move |v: &Value| check_pair(v, element.as_ref()))
}

pub(crate) fn check_pair(v: &Value, element: &dyn TypeValidator) -> Result<(), Mismatch> {
    match v.as_array() {
        Some(xs) if has_pair_len(xs) => check_entry(&xs[0], &xs[1], 0, element),
        _ => Err(Mismatch::shape(EXPECTED, v)),
    }
}

/// One key/value entry whose key sits at `index`. The key is checked first;
/// a bad key short-circuits before the value is looked at.
pub(crate) fn check_entry(
    key: &Value,
    value: &Value,
    index: usize,
    element: &dyn TypeValidator,
) -> Result<(), Mismatch> {
    if !KEY.check(key) {
        return Err(Mismatch::KeyType { index });
    }
    if !element.check(value) {
        return Err(Mismatch::ValueType { index: index + 1 });
    }
    Ok(())
}
