//! Typed attributes on JSON records.
//!
//! A [`Schema`] is an ordered list of attributes, each with a validator and
//! a required flag. Constructing a [`Record`] from an object checks every
//! declared attribute and turns a failed validation into an
//! [`AttributeError`] naming the attribute and the type it was declared
//! with.
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{AttributeError, Kind, RegistryError};
use crate::path_de::{from_slice_with_path, PathError};
use crate::registry::TypeRegistry;
use crate::type_expr::TypeExpr;
use crate::types::{TypeValidator, Validator};

// -------------------------------- Schema ---------------------------------- //

#[derive(Debug, Clone)]
pub struct Attribute {
    name: String,
    ty: Validator,
    required: bool,
}

impl Attribute {
    pub fn required(name: impl Into<String>, ty: Validator) -> Self {
        Self { name: name.into(), ty, required: true }
    }

    pub fn optional(name: impl Into<String>, ty: Validator) -> Self {
        Self { name: name.into(), ty, required: false }
    }

    pub fn name(&self) -> &str { &self.name }

    pub fn ty(&self) -> &Validator { &self.ty }

    pub fn is_required(&self) -> bool { self.required }

    /// Check a value about to be stored in this attribute.
    pub fn assert_valid(&self, v: &Value) -> Result<(), AttributeError> {
        self.ty.explain(v).map_err(|reason| AttributeError::Invalid {
            attribute: self.name.clone(),
            expected: self.ty.name(),
            reason,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct Schema {
    attributes: Vec<Attribute>,
}

impl Schema {
    pub fn new() -> Self { Self::default() }

    pub fn with(mut self, attribute: Attribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    pub fn attributes(&self) -> &[Attribute] { &self.attributes }

    pub fn from_decl(decl: &SchemaDecl, registry: &TypeRegistry) -> Result<Self, RegistryError> {
        let mut schema = Self::new();
        for a in &decl.attributes {
            let ty = a.ty.resolve(registry)?;
            schema.attributes.push(Attribute { name: a.name.clone(), ty, required: a.required });
        }
        Ok(schema)
    }

    /// Parse a JSON schema declaration and resolve its types.
    pub fn load(bytes: &[u8], registry: &TypeRegistry) -> Result<Self, SchemaLoadError> {
        let decl: SchemaDecl = from_slice_with_path(bytes)?;
        Ok(Self::from_decl(&decl, registry)?)
    }

    /// Build a record, failing on the first attribute that is missing,
    /// mistyped or undeclared. Declared attributes are checked in order.
    pub fn construct(&self, input: &Map<String, Value>) -> Result<Record, AttributeError> {
        let mut values = IndexMap::with_capacity(self.attributes.len());
        for attr in &self.attributes {
            match input.get(&attr.name) {
                Some(v) => {
                    attr.assert_valid(v)?;
                    values.insert(attr.name.clone(), v.clone());
                }
                None if attr.required => {
                    return Err(AttributeError::Missing { attribute: attr.name.clone() });
                }
                None => {}
            }
        }
        if let Some(extra) = input.keys().find(|k| !values.contains_key(k.as_str())) {
            return Err(AttributeError::Unknown { attribute: extra.clone() });
        }
        Ok(Record { values })
    }

    pub fn construct_value(&self, input: &Value) -> Result<Record, AttributeError> {
        match input {
            Value::Object(map) => self.construct(map),
            other => Err(AttributeError::NotAnObject { found: Kind::of(other) }),
        }
    }
}

// ----------------------------- Declarations ------------------------------- //

/// On-disk form of a schema:
///
/// ```json
/// {"attributes": [{"name": "header", "type": {"shape": "KeyWith", "of": "Str"}, "required": true}]}
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaDecl {
    pub attributes: Vec<AttributeDecl>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AttributeDecl {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeExpr,
    #[serde(default)]
    pub required: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum SchemaLoadError {
    #[error(transparent)]
    Parse(#[from] PathError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

// -------------------------------- Record ---------------------------------- //

/// Attribute values that passed validation, in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    values: IndexMap<String, Value>,
}

impl Record {
    pub fn get(&self, name: &str) -> Option<&Value> { self.values.get(name) }

    pub fn len(&self) -> usize { self.values.len() }

    pub fn is_empty(&self) -> bool { self.values.is_empty() }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}
