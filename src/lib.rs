//! Shape validators for key/value data carried in JSON lists.
//!
//! Ordered headers, repeated-key parameters and similar payloads are often
//! sent as lists rather than objects so that order and duplicate keys
//! survive. This crate validates those lists the way a map-typed field
//! would be validated: keys are strings, values match an element type, and
//! the container has the expected structure.
//!
//! ```
//! use kv_shapes::{registry, types::Base};
//! use serde_json::json;
//!
//! let reg = registry::global().unwrap();
//! let headers = reg.parameterize("OrderedPairList", Base::Str.validator()).unwrap();
//! assert!(headers.evaluate(&json!([["Accept", "*/*"], ["Accept", "text/html"]])));
//! assert!(!headers.evaluate(&json!(["Accept", "*/*"])));
//! ```
pub mod error;
pub mod types;
pub mod shape;
pub mod registry;
pub mod type_expr;
pub mod attr;
pub mod path_de;

pub use error::{AttributeError, Kind, Mismatch, RegistryError};
pub use registry::{global, type_storage, TypeRegistry};
pub use shape::{ParameterizedValidator, ShapeValidator};
pub use type_expr::TypeExpr;
pub use types::{Base, TypeValidator, Validator};
