//! Materialized values.

use std::fmt;
use std::sync::Arc;

use apollo_compiler::Name;
use indexmap::IndexMap;
use parking_lot::RwLock;

use crate::schema::TypeRef;

/// A shared handle to a materialized object.
///
/// Clones point at the same object; two handles are equal when they do. Every response object
/// with a given identity materializes to the same [`Entity`], so graphs may contain cycles.
#[derive(Clone)]
pub struct Entity(Arc<EntityData>);

struct EntityData {
    ty: TypeRef,
    fields: RwLock<IndexMap<Name, Value>>,
}

impl Entity {
    pub(crate) fn new(ty: TypeRef) -> Self {
        Self(Arc::new(EntityData {
            ty,
            fields: RwLock::new(IndexMap::new()),
        }))
    }

    /// The concrete type of the object.
    pub fn type_name(&self) -> &Name {
        self.0.ty.name()
    }

    pub(crate) fn type_ref(&self) -> &TypeRef {
        &self.0.ty
    }

    /// The value of a populated field.
    pub fn get(&self, field: &str) -> Option<Value> {
        self.0.fields.read().get(field).cloned()
    }

    /// Like [`get`](Self::get), ignoring ASCII case when there is no exact match.
    pub fn get_ignore_case(&self, field: &str) -> Option<Value> {
        let fields = self.0.fields.read();
        fields
            .get(field)
            .or_else(|| {
                fields
                    .iter()
                    .find(|(name, _)| name.eq_ignore_ascii_case(field))
                    .map(|(_, value)| value)
            })
            .cloned()
    }

    /// Names of the populated fields, in population order.
    pub fn field_names(&self) -> Vec<Name> {
        self.0.fields.read().keys().cloned().collect()
    }

    /// Replaces the value of a field.
    pub(crate) fn set(&self, field: Name, value: Value) {
        self.0.fields.write().insert(field, value);
    }

    pub fn ptr_eq(&self, other: &Entity) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for Entity {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Entity {}

impl fmt::Debug for Entity {
    // Field values are not printed: they may lead back to this entity.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("type", &self.type_name().as_str())
            .field("fields", &self.field_names())
            .finish()
    }
}

/// A materialized value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    /// A scalar or enum value, as received.
    Leaf(serde_json::Value),
    Object(Entity),
    List(Vec<Value>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_entity(&self) -> Option<&Entity> {
        match self {
            Value::Object(entity) => Some(entity),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(values) => Some(values),
            _ => None,
        }
    }

    pub fn as_leaf(&self) -> Option<&serde_json::Value> {
        match self {
            Value::Leaf(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        self.as_leaf().and_then(serde_json::Value::as_str)
    }
}
