//! Name mapping between domain types and the schema, and argument sources for filters.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::error::BindError;

/// A member of a domain type, as referenced by a query expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Member {
    declaring_type: String,
    name: String,
}

impl Member {
    pub fn new(declaring_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            declaring_type: declaring_type.into(),
            name: name.into(),
        }
    }

    pub fn declaring_type(&self) -> &str {
        &self.declaring_type
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.declaring_type, self.name)
    }
}

/// Maps a domain type name to a graph type name.
pub trait TypeNameMapper: Send + Sync {
    fn type_name(&self, domain_type: &str) -> String;
}

/// Maps a domain member to a field name. Field lookups ignore case.
pub trait MemberNameMapper: Send + Sync {
    fn field_name(&self, member: &Member) -> String;
}

/// Uses domain names unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityNameMapper;

impl TypeNameMapper for IdentityNameMapper {
    fn type_name(&self, domain_type: &str) -> String {
        domain_type.to_string()
    }
}

impl MemberNameMapper for IdentityNameMapper {
    fn field_name(&self, member: &Member) -> String {
        member.name.clone()
    }
}

/// Explicit name overrides, falling back to the domain name.
///
/// ```
/// use apollo_query_builder::MappedNames;
///
/// let names = MappedNames::default()
///     .with_type("Schema", "DrawSchema")
///     .with_field("Schema", "entries", "items");
/// # let _ = names;
/// ```
#[derive(Debug, Clone, Default)]
pub struct MappedNames {
    types: HashMap<String, String>,
    fields: HashMap<(String, String), String>,
}

impl MappedNames {
    pub fn with_type(mut self, domain_type: impl Into<String>, type_name: impl Into<String>) -> Self {
        self.types.insert(domain_type.into(), type_name.into());
        self
    }

    pub fn with_field(
        mut self,
        declaring_type: impl Into<String>,
        member: impl Into<String>,
        field_name: impl Into<String>,
    ) -> Self {
        self.fields
            .insert((declaring_type.into(), member.into()), field_name.into());
        self
    }
}

impl TypeNameMapper for MappedNames {
    fn type_name(&self, domain_type: &str) -> String {
        self.types
            .get(domain_type)
            .cloned()
            .unwrap_or_else(|| domain_type.to_string())
    }
}

impl MemberNameMapper for MappedNames {
    fn field_name(&self, member: &Member) -> String {
        self.fields
            .get(&(member.declaring_type.clone(), member.name.clone()))
            .cloned()
            .unwrap_or_else(|| member.name.clone())
    }
}

/// Read access to the members of an argument source.
pub trait MemberAccessor: Send + Sync {
    /// Names of the readable members.
    fn fields(&self) -> Vec<String>;

    /// Value of a member, `None` when there is no such member.
    fn value(&self, name: &str) -> Option<serde_json::Value>;
}

impl MemberAccessor for serde_json::Map<String, serde_json::Value> {
    fn fields(&self) -> Vec<String> {
        self.keys().cloned().collect()
    }

    fn value(&self, name: &str) -> Option<serde_json::Value> {
        self.get(name).cloned()
    }
}

/// The object a filter reads its arguments from.
///
/// Clones share identity: every argument read from the same source (or one of its clones)
/// binds to the same query variable, while two separately built sources with equal contents
/// get distinct variables.
#[derive(Clone)]
pub struct ArgumentSource(Arc<dyn MemberAccessor>);

impl ArgumentSource {
    pub fn new(accessor: impl MemberAccessor + 'static) -> Self {
        Self(Arc::new(accessor))
    }

    /// Builds a source from any value serializing to a JSON object.
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> Result<Self, BindError> {
        match serde_json::to_value(value) {
            Ok(serde_json::Value::Object(map)) => Ok(Self::new(map)),
            Ok(other) => Err(BindError::InvalidArgumentSource(format!(
                "found {}",
                json_kind(&other)
            ))),
            Err(err) => Err(BindError::InvalidArgumentSource(err.to_string())),
        }
    }

    pub(crate) fn identity(&self) -> usize {
        Arc::as_ptr(&self.0) as *const () as usize
    }

    pub(crate) fn same_as(&self, other: &ArgumentSource) -> bool {
        self.identity() == other.identity()
    }

    pub fn fields(&self) -> Vec<String> {
        self.0.fields()
    }

    pub fn value(&self, name: &str) -> Option<serde_json::Value> {
        self.0.value(name)
    }
}

impl From<serde_json::Map<String, serde_json::Value>> for ArgumentSource {
    fn from(map: serde_json::Map<String, serde_json::Value>) -> Self {
        Self::new(map)
    }
}

impl fmt::Debug for ArgumentSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArgumentSource")
            .field("fields", &self.fields())
            .finish()
    }
}

pub(crate) fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
