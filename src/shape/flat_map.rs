//! `FlatMap[X]`: keys and values interleaved in one list, `[k0, v0, k1, v1, ...]`.
use std::sync::Arc;
use serde_json::Value;

use super::{pair, Evaluate, ShapeValidator};
use crate::error::Mismatch;
use crate::types::{Base, TypeValidator, Validator};

pub const NAME: &str = "FlatMap";

const EXPECTED: &str = "an even-length key/value list";

/// The empty list is a valid (empty) map.
pub fn is_flat_map(v: &Value) -> bool {
    v.as_array().is_some_and(|xs| has_even_len(xs))
}

fn has_even_len(xs: &[Value]) -> bool { xs.len() % 2 == 0 }

pub fn definition() -> ShapeValidator {
    ShapeValidator::new(NAME, Base::ArrayRef.validator(), is_flat_map, has_even_len, generate)
}

fn generate(element: Validator) -> Evaluate {
    Arc::new(move |v: &Value| check_flat_map(v, element.as_ref()))
}

fn check_flat_map(v: &Value, element: &dyn TypeValidator) -> Result<(), Mismatch> {
    // parity is re-checked here so the specialized check stands on its own
    let xs = match v.as_array() {
        Some(xs) if has_even_len(xs) => xs,
        _ => return Err(Mismatch::shape(EXPECTED, v)),
    };
    for (i, kv) in xs.chunks_exact(2).enumerate() {
        pair::check_entry(&kv[0], &kv[1], i * 2, element)?;
    }
    Ok(())
}
