//! Name → validator registry.
//!
//! Holds the base validators and the shape definitions under their
//! canonical names, and memoizes parameterizations so that asking for
//! `FlatMap` over the same element validator twice hands back the same
//! `Arc`. The process-wide instance is built once behind [`global`].
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use indexmap::IndexMap;
use once_cell::sync::OnceCell;

use crate::error::RegistryError;
use crate::shape::{self, ParameterizedValidator, ShapeValidator};
use crate::types::{same_validator, Base, TypeValidator, Validator};

#[derive(Debug, Clone)]
pub enum Entry {
    Base(Validator),
    Shape(Arc<ShapeValidator>),
}

/// Memo key for a parameterization: shape name plus element identity.
/// Builtins are keyed by value so fresh copies still hit the cache.
/// Other elements are keyed by address, and only when the registry itself
/// owns that `Arc` (a registered entry or a memoized parameterization), so
/// the address stays valid for as long as the memo does.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum ElementKey {
    Builtin(Base),
    Ptr(usize),
}

type Memo = HashMap<(&'static str, ElementKey), Arc<ParameterizedValidator>>;

fn addr<T: ?Sized>(v: &Arc<T>) -> usize { Arc::as_ptr(v) as *const () as usize }

#[derive(Debug, Default)]
pub struct TypeRegistry {
    entries: IndexMap<String, Entry>,
    /// short name → canonical name, shapes only
    shape_names: IndexMap<String, String>,
    memo: RwLock<Memo>,
}

// ------------------------------ Construction ------------------------------ //

impl TypeRegistry {
    pub fn new() -> Self { Self::default() }

    /// Builtins plus the three shapes.
    pub fn with_defaults() -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        for base in Base::ALL {
            registry.register_base(base.as_str(), base.validator())?;
        }
        register_shapes(&mut registry)?;
        Ok(registry)
    }

    /// Re-registering the same builtin (or the same `Arc`) is a no-op.
    pub fn register_base(&mut self, name: &str, validator: Validator) -> Result<(), RegistryError> {
        match self.entries.get(name) {
            Some(Entry::Base(existing)) if same_validator(existing, &validator) => {
                tracing::trace!(name, "base validator already registered");
                Ok(())
            }
            Some(_) => Err(RegistryError::DuplicateNameConflict { name: name.to_string() }),
            None => {
                tracing::debug!(name, "registered base validator");
                self.entries.insert(name.to_string(), Entry::Base(validator));
                Ok(())
            }
        }
    }

    /// Register a shape under its own name. The parent must already be
    /// registered as the same base validator; re-registering an identical
    /// definition is a no-op.
    pub fn register_shape(&mut self, def: ShapeValidator) -> Result<(), RegistryError> {
        if self.admit_shape(&def)? {
            self.insert_shape(def);
        } else {
            tracing::trace!(name = def.name(), "shape already registered");
        }
        Ok(())
    }

    /// `Ok(true)` when `def` is new, `Ok(false)` when an identical definition
    /// is already registered. Never mutates.
    fn admit_shape(&self, def: &ShapeValidator) -> Result<bool, RegistryError> {
        let name = def.name();
        match self.entries.get(&def.parent().name()) {
            Some(Entry::Base(existing)) if same_validator(existing, def.parent()) => {}
            _ => return Err(RegistryError::UnknownBaseType { name: def.parent().name() }),
        }
        match self.entries.get(name) {
            Some(Entry::Shape(existing)) if existing.same_definition(def) => Ok(false),
            Some(_) => Err(RegistryError::DuplicateNameConflict { name: name.to_string() }),
            None => Ok(true),
        }
    }

    fn insert_shape(&mut self, def: ShapeValidator) {
        let name = def.name();
        tracing::debug!(name, parent = %def.parent().name(), "registered shape");
        self.entries.insert(name.to_string(), Entry::Shape(Arc::new(def)));
        self.shape_names.insert(name.to_string(), name.to_string());
    }
}

/// Register `KeyWith`, `FlatMap` and `OrderedPairList`, marking them
/// parameterizable. Needs `ArrayRef` to be registered already.
///
/// All three are checked before any is inserted: on error the registry is
/// left as it was.
pub fn register_shapes(registry: &mut TypeRegistry) -> Result<(), RegistryError> {
    let mut fresh = Vec::new();
    for def in shape::definitions() {
        if registry.admit_shape(&def)? {
            fresh.push(def);
        }
    }
    for def in fresh {
        registry.insert_shape(def);
    }
    Ok(())
}

// -------------------------------- Lookup ---------------------------------- //

impl TypeRegistry {
    pub fn get(&self, name: &str) -> Option<&Entry> { self.entries.get(name) }

    pub fn contains(&self, name: &str) -> bool { self.entries.contains_key(name) }

    /// Validator for a bare name. A shape name on its own checks structure only.
    pub fn lookup(&self, name: &str) -> Result<Validator, RegistryError> {
        match self.entries.get(name) {
            Some(Entry::Base(v)) => Ok(v.clone()),
            Some(Entry::Shape(s)) => Ok(s.clone() as Validator),
            None => Err(RegistryError::UnknownBaseType { name: name.to_string() }),
        }
    }

    pub fn shape(&self, name: &str) -> Result<Arc<ShapeValidator>, RegistryError> {
        match self.entries.get(name) {
            Some(Entry::Shape(s)) => Ok(s.clone()),
            Some(Entry::Base(_)) => Err(RegistryError::NotParameterizable { name: name.to_string() }),
            None => Err(RegistryError::UnknownBaseType { name: name.to_string() }),
        }
    }

    /// `Shape[element]`, memoized by (shape, element identity).
    ///
    /// Builtin elements and elements the registry handed out (registered
    /// entries, earlier parameterizations) are cached. Any other element is
    /// built fresh on every call and not retained.
    pub fn parameterize(
        &self,
        shape_name: &str,
        element: Validator,
    ) -> Result<Arc<ParameterizedValidator>, RegistryError> {
        let shape = self.shape(shape_name)?;

        let memo = self.memo.read().unwrap_or_else(PoisonError::into_inner);
        let Some(element_key) = self.element_key(&memo, &element) else {
            drop(memo);
            tracing::trace!(shape = shape.name(), "foreign element, not cached");
            return Ok(Arc::new(shape.parameterize(element)));
        };
        let key = (shape.name(), element_key);
        if let Some(hit) = memo.get(&key) {
            tracing::trace!(shape = shape.name(), "parameterization cache hit");
            return Ok(hit.clone());
        }
        drop(memo);

        let built = Arc::new(shape.parameterize(element));
        let mut memo = self.memo.write().unwrap_or_else(PoisonError::into_inner);
        // another thread may have built the same one in the meantime; keep the first
        let kept = memo.entry(key).or_insert(built).clone();
        tracing::trace!(shape = shape.name(), cached = memo.len(), "parameterization cache miss");
        Ok(kept)
    }

    /// `None` when `v` is neither a builtin nor owned by this registry.
    fn element_key(&self, memo: &Memo, v: &Validator) -> Option<ElementKey> {
        if let Some(b) = v.builtin() {
            return Some(ElementKey::Builtin(b));
        }
        let ptr = addr(v);
        let registered = self.entries.values().any(|e| match e {
            Entry::Base(b) => addr(b) == ptr,
            Entry::Shape(s) => addr(s) == ptr,
        });
        let memoized = || memo.values().any(|p| addr(p) == ptr);
        (registered || memoized()).then_some(ElementKey::Ptr(ptr))
    }

    #[cfg(test)]
    fn memo_len(&self) -> usize {
        self.memo.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Shape short names mapped to canonical names, in registration order.
    pub fn list_names(&self) -> IndexMap<String, String> { self.shape_names.clone() }

    pub fn base_names(&self) -> Vec<&str> {
        self.entries.iter()
            .filter(|(_, e)| matches!(e, Entry::Base(_)))
            .map(|(k, _)| k.as_str())
            .collect()
    }
}

// -------------------------------- Global ---------------------------------- //

static GLOBAL: OnceCell<TypeRegistry> = OnceCell::new();

/// The process-wide registry, populated on first use. Concurrent first
/// callers block until one of them has finished initializing it.
pub fn global() -> Result<&'static TypeRegistry, RegistryError> {
    GLOBAL.get_or_try_init(TypeRegistry::with_defaults)
}

/// Names this crate provides, for import/export tooling.
pub fn type_storage() -> IndexMap<&'static str, &'static str> {
    [shape::pair::NAME, shape::flat_map::NAME, shape::pair_list::NAME]
        .into_iter()
        .map(|n| (n, n))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::pair;
    use serde_json::{json, Value};

    fn registry() -> TypeRegistry { TypeRegistry::with_defaults().unwrap() }

    fn reject(_: &Value) -> bool { false }

    fn reject_slice(_: &[Value]) -> bool { false }

    fn accept_all(_: Validator) -> crate::shape::Evaluate {
        Arc::new(|_: &Value| -> Result<(), crate::error::Mismatch> { Ok(()) })
    }

    #[test]
    fn type_storage_lists_the_three_shapes() {
        let names = type_storage();
        assert_eq!(names.len(), 3);
        assert_eq!(names["KeyWith"], "KeyWith");
        assert_eq!(names["FlatMap"], "FlatMap");
        assert_eq!(names["OrderedPairList"], "OrderedPairList");
    }

    #[test]
    fn list_names_covers_type_storage() {
        let reg = registry();
        let listed = reg.list_names();
        for (short, canonical) in type_storage() {
            assert_eq!(listed.get(short).map(String::as_str), Some(canonical));
        }
    }

    #[test]
    fn identical_reregistration_is_a_noop() {
        let mut reg = registry();
        register_shapes(&mut reg).unwrap();
        reg.register_base("Str", Base::Str.validator()).unwrap();
        assert_eq!(reg.list_names().len(), 3);
    }

    #[test]
    fn different_definition_under_same_name_conflicts() {
        let mut reg = registry();
        let other = ShapeValidator::new(
            pair::NAME,
            Base::ArrayRef.validator(),
            reject,
            reject_slice,
            accept_all,
        );
        assert_eq!(
            reg.register_shape(other),
            Err(RegistryError::DuplicateNameConflict { name: "KeyWith".into() })
        );
        // the first registration is untouched
        let pair = reg.parameterize("KeyWith", Base::Str.validator()).unwrap();
        assert!(pair.evaluate(&json!(["a", "b"])));
    }

    #[test]
    fn base_name_conflicts_with_shape() {
        let mut reg = registry();
        assert_eq!(
            reg.register_base("FlatMap", Base::Any.validator()),
            Err(RegistryError::DuplicateNameConflict { name: "FlatMap".into() })
        );
    }

    #[test]
    fn shape_needs_registered_parent() {
        let mut reg = TypeRegistry::new();
        assert_eq!(
            register_shapes(&mut reg),
            Err(RegistryError::UnknownBaseType { name: "ArrayRef".into() })
        );
        assert!(reg.list_names().is_empty());
    }

    #[test]
    fn failed_batch_registers_nothing() {
        let mut reg = TypeRegistry::new();
        reg.register_base("ArrayRef", Base::ArrayRef.validator()).unwrap();
        reg.register_base("FlatMap", Base::Any.validator()).unwrap();
        assert_eq!(
            register_shapes(&mut reg),
            Err(RegistryError::DuplicateNameConflict { name: "FlatMap".into() })
        );
        assert!(reg.list_names().is_empty());
        assert!(!reg.contains("KeyWith"));
        assert!(!reg.contains("OrderedPairList"));
    }

    #[test]
    fn parent_must_be_the_same_validator() {
        let mut reg = TypeRegistry::new();
        reg.register_base("ArrayRef", Base::Any.validator()).unwrap();
        assert_eq!(
            register_shapes(&mut reg),
            Err(RegistryError::UnknownBaseType { name: "ArrayRef".into() })
        );
        assert!(reg.list_names().is_empty());
    }

    #[test]
    fn parameterize_rejects_unknown_and_base_names() {
        let reg = registry();
        assert_eq!(
            reg.parameterize("HashRef", Base::Str.validator()).unwrap_err(),
            RegistryError::UnknownBaseType { name: "HashRef".into() }
        );
        assert_eq!(
            reg.parameterize("Str", Base::Str.validator()).unwrap_err(),
            RegistryError::NotParameterizable { name: "Str".into() }
        );
    }

    #[test]
    fn parameterizations_are_memoized() {
        let reg = registry();
        let a = reg.parameterize("FlatMap", Base::Int.validator()).unwrap();
        let b = reg.parameterize("FlatMap", reg.lookup("Int").unwrap()).unwrap();
        assert!(Arc::ptr_eq(&a, &b));

        let c = reg.parameterize("OrderedPairList", Base::Int.validator()).unwrap();
        assert_eq!(c.name(), "OrderedPairList[Int]");

        let nested_a = reg.parameterize("FlatMap", a.clone()).unwrap();
        let nested_b = reg.parameterize("FlatMap", a).unwrap();
        assert!(Arc::ptr_eq(&nested_a, &nested_b));
    }

    #[test]
    fn foreign_elements_are_not_cached() {
        let reg = registry();
        for _ in 0..1000 {
            let element: Validator = Arc::new(crate::shape::pair_of(Base::Int.validator()));
            let v = reg.parameterize("FlatMap", element).unwrap();
            assert!(v.evaluate(&json!(["a", ["b", 1]])));
        }
        assert_eq!(reg.memo_len(), 0);

        let registered = reg.lookup("KeyWith").unwrap();
        let a = reg.parameterize("FlatMap", registered.clone()).unwrap();
        let b = reg.parameterize("FlatMap", registered).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(reg.memo_len(), 1);
    }

    #[test]
    fn bare_shape_name_checks_structure() {
        let reg = registry();
        let flat = reg.lookup("FlatMap").unwrap();
        assert!(flat.check(&json!([1, 2])));
        assert!(!flat.check(&json!([1])));
    }

    #[test]
    fn global_registry_is_shared() {
        let a = global().unwrap();
        let b = global().unwrap();
        assert!(std::ptr::eq(a, b));
        assert!(a.contains("OrderedPairList"));
        assert_eq!(a.base_names(), Base::ALL.map(Base::as_str).to_vec());
    }

    #[test]
    fn concurrent_evaluation_on_one_validator() {
        let v = global().unwrap().parameterize("OrderedPairList", Base::Str.validator()).unwrap();
        std::thread::scope(|s| {
            for i in 0..4 {
                let v = &v;
                s.spawn(move || {
                    let good = json!([["k", format!("v{i}")]]);
                    let bad = json!([["k", i]]);
                    assert!(v.evaluate(&good));
                    assert!(!v.evaluate(&bad));
                });
            }
        });
    }
}
