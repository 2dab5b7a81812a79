//! Declarative type expressions.
//!
//! A type is named either by a bare string (`"Str"`, `"FlatMap"`) or by a
//! shape applied to an element type:
//!
//! ```json
//! {"shape": "OrderedPairList", "of": {"shape": "KeyWith", "of": "Int"}}
//! ```
//!
//! Resolution goes through a [`TypeRegistry`], so parameterizations are
//! memoized the same way as direct `parameterize` calls.
use std::fmt;
use serde::Deserialize;

use crate::error::RegistryError;
use crate::path_de::{from_str_with_path, PathError};
use crate::registry::TypeRegistry;
use crate::types::Validator;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum TypeExpr {
    Name(String),
    Shape { shape: String, of: Box<TypeExpr> },
}

impl TypeExpr {
    pub fn name(name: impl Into<String>) -> Self { TypeExpr::Name(name.into()) }

    pub fn shape(shape: impl Into<String>, of: TypeExpr) -> Self {
        TypeExpr::Shape { shape: shape.into(), of: Box::new(of) }
    }

    /// Command-line form: a JSON type expression, or a bare name.
    pub fn parse_arg(src: &str) -> Result<Self, PathError> {
        let src = src.trim();
        if src.starts_with('{') || src.starts_with('"') {
            from_str_with_path(src)
        } else {
            Ok(TypeExpr::Name(src.to_string()))
        }
    }

    pub fn resolve(&self, registry: &TypeRegistry) -> Result<Validator, RegistryError> {
        match self {
            TypeExpr::Name(name) => registry.lookup(name),
            TypeExpr::Shape { shape, of } => {
                let element = of.resolve(registry)?;
                let specialized: Validator = registry.parameterize(shape, element)?;
                Ok(specialized)
            }
        }
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeExpr::Name(name) => f.write_str(name),
            TypeExpr::Shape { shape, of } => write!(f, "{shape}[{of}]"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TypeValidator;
    use serde_json::json;

    fn registry() -> TypeRegistry { TypeRegistry::with_defaults().unwrap() }

    #[test]
    fn parses_bare_names_and_json() {
        assert_eq!(TypeExpr::parse_arg(" Str ").unwrap(), TypeExpr::name("Str"));
        assert_eq!(TypeExpr::parse_arg("\"Int\"").unwrap(), TypeExpr::name("Int"));
        assert_eq!(
            TypeExpr::parse_arg(r#"{"shape": "FlatMap", "of": "Int"}"#).unwrap(),
            TypeExpr::shape("FlatMap", TypeExpr::name("Int"))
        );
    }

    #[test]
    fn parse_errors_carry_the_path() {
        let err = TypeExpr::parse_arg(r#"{"shape": "FlatMap", "of": 3}"#).unwrap_err();
        assert!(err.to_string().starts_with("at JSON path"), "{err}");
    }

    #[test]
    fn display_uses_bracket_notation() {
        let expr = TypeExpr::shape("OrderedPairList", TypeExpr::shape("KeyWith", TypeExpr::name("Int")));
        assert_eq!(expr.to_string(), "OrderedPairList[KeyWith[Int]]");
    }

    #[test]
    fn resolves_nested_shapes() {
        let reg = registry();
        let expr = TypeExpr::shape("FlatMap", TypeExpr::shape("KeyWith", TypeExpr::name("Int")));
        let v = expr.resolve(&reg).unwrap();
        assert_eq!(v.name(), expr.to_string());
        assert!(v.check(&json!(["outer", ["inner", 1]])));
        assert!(!v.check(&json!(["outer", ["inner", "1"]])));
    }

    #[test]
    fn unknown_names_do_not_resolve() {
        let reg = registry();
        let expr = TypeExpr::shape("HashOf", TypeExpr::name("Str"));
        assert_eq!(
            expr.resolve(&reg).unwrap_err(),
            RegistryError::UnknownBaseType { name: "HashOf".into() }
        );
        let expr = TypeExpr::shape("KeyWith", TypeExpr::name("Strr"));
        assert_eq!(
            expr.resolve(&reg).unwrap_err(),
            RegistryError::UnknownBaseType { name: "Strr".into() }
        );
    }
}
