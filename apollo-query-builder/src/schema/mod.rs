//! The graph schema the compiler resolves names against.
//!
//! Type definitions live in an arena owned by [`GraphSchema`]; every reference between types
//! is a [`TypeRef`] into that arena, so cyclic schemas (an object whose field returns its own
//! type, interfaces listing their implementers) need no shared ownership. Two references are
//! the same type exactly when they point at the same slot.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::OnceLock;

use apollo_compiler::Name;
use indexmap::IndexMap;
use indexmap::IndexSet;

use crate::error::SchemaError;

pub(crate) mod builder;
mod introspection;
mod sdl;

pub use introspection::INTROSPECTION_QUERY;

/// Index of a type definition in its [`GraphSchema`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub(crate) usize);

/// A named reference to a type definition.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeRef {
    pub(crate) id: TypeId,
    pub(crate) name: Name,
}

impl TypeRef {
    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &Name {
        &self.name
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// The type of a field, argument or query node.
///
/// Named variants say which kind of definition they point at, wrappers nest.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GraphType {
    Scalar(TypeRef),
    Object(TypeRef),
    Interface(TypeRef),
    Union(TypeRef),
    Enum(TypeRef),
    InputObject(TypeRef),
    List(Box<GraphType>),
    NonNull(Box<GraphType>),
}

impl GraphType {
    /// Strips every `List` and `NonNull` wrapper.
    pub fn terminal(&self) -> &GraphType {
        match self {
            GraphType::List(inner) | GraphType::NonNull(inner) => inner.terminal(),
            _ => self,
        }
    }

    /// The definition this type ultimately refers to.
    pub fn type_ref(&self) -> &TypeRef {
        match self {
            GraphType::Scalar(ty)
            | GraphType::Object(ty)
            | GraphType::Interface(ty)
            | GraphType::Union(ty)
            | GraphType::Enum(ty)
            | GraphType::InputObject(ty) => ty,
            GraphType::List(inner) | GraphType::NonNull(inner) => inner.type_ref(),
        }
    }

    /// Name of the definition this type ultimately refers to.
    pub fn name(&self) -> &Name {
        &self.type_ref().name
    }

    /// Scalars and enums: values without a selection set.
    pub fn is_leaf(&self) -> bool {
        matches!(self.terminal(), GraphType::Scalar(_) | GraphType::Enum(_))
    }

    /// Objects, interfaces and unions: types that need a selection set.
    pub fn is_composite(&self) -> bool {
        matches!(
            self.terminal(),
            GraphType::Object(_) | GraphType::Interface(_) | GraphType::Union(_)
        )
    }

    /// Interfaces and unions.
    pub fn is_abstract(&self) -> bool {
        matches!(
            self.terminal(),
            GraphType::Interface(_) | GraphType::Union(_)
        )
    }

    pub fn is_list(&self) -> bool {
        match self {
            GraphType::List(_) => true,
            GraphType::NonNull(inner) => inner.is_list(),
            _ => false,
        }
    }
}

impl fmt::Display for GraphType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphType::List(inner) => write!(f, "[{inner}]"),
            GraphType::NonNull(inner) => write!(f, "{inner}!"),
            named => write!(f, "{}", named.name()),
        }
    }
}

/// A field of an object or interface type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: Name,
    pub ty: GraphType,
    pub arguments: IndexMap<Name, Argument>,
}

/// An argument of a field, or a field of an input object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Argument {
    pub name: Name,
    pub ty: GraphType,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScalarType {
    pub name: Name,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectType {
    pub name: Name,
    pub fields: IndexMap<Name, Field>,
    pub implements_interfaces: IndexSet<TypeRef>,
    /// Every union listing this type as a member, in schema order.
    pub unions: IndexSet<TypeRef>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceType {
    pub name: Name,
    pub fields: IndexMap<Name, Field>,
    pub implements_interfaces: IndexSet<TypeRef>,
    /// Every object type declaring this interface, in schema order.
    pub possible_types: IndexSet<TypeRef>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnionType {
    pub name: Name,
    pub members: IndexSet<TypeRef>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumType {
    pub name: Name,
    pub values: IndexSet<Name>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputObjectType {
    pub name: Name,
    pub fields: IndexMap<Name, Argument>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeDefinition {
    Scalar(ScalarType),
    Object(ObjectType),
    Interface(InterfaceType),
    Union(UnionType),
    Enum(EnumType),
    InputObject(InputObjectType),
}

impl TypeDefinition {
    pub fn name(&self) -> &Name {
        match self {
            TypeDefinition::Scalar(ty) => &ty.name,
            TypeDefinition::Object(ty) => &ty.name,
            TypeDefinition::Interface(ty) => &ty.name,
            TypeDefinition::Union(ty) => &ty.name,
            TypeDefinition::Enum(ty) => &ty.name,
            TypeDefinition::InputObject(ty) => &ty.name,
        }
    }

    /// Fields of objects and interfaces.
    pub fn fields(&self) -> Option<&IndexMap<Name, Field>> {
        match self {
            TypeDefinition::Object(ty) => Some(&ty.fields),
            TypeDefinition::Interface(ty) => Some(&ty.fields),
            _ => None,
        }
    }

    /// Object types an abstract type can resolve to.
    pub fn possible_types(&self) -> Option<&IndexSet<TypeRef>> {
        match self {
            TypeDefinition::Interface(ty) => Some(&ty.possible_types),
            TypeDefinition::Union(ty) => Some(&ty.members),
            _ => None,
        }
    }

    /// Interfaces implemented by an object or interface type.
    pub fn interfaces(&self) -> Option<&IndexSet<TypeRef>> {
        match self {
            TypeDefinition::Object(ty) => Some(&ty.implements_interfaces),
            TypeDefinition::Interface(ty) => Some(&ty.implements_interfaces),
            _ => None,
        }
    }
}

/// A validated, immutable graph schema.
#[derive(Debug, Clone)]
pub struct GraphSchema {
    types: Vec<TypeDefinition>,
    by_name: HashMap<Name, TypeId>,
    query_type: TypeRef,
}

impl GraphSchema {
    pub fn types(&self) -> impl Iterator<Item = &TypeDefinition> {
        self.types.iter()
    }

    pub fn type_ref(&self, name: &str) -> Option<TypeRef> {
        let id = *self.by_name.get(name)?;
        Some(TypeRef {
            id,
            name: self.types[id.0].name().clone(),
        })
    }

    pub fn type_by_name(&self, name: &str) -> Option<&TypeDefinition> {
        self.by_name.get(name).map(|id| &self.types[id.0])
    }

    /// The definition behind `ty`, which must come from this schema.
    pub fn definition(&self, ty: &TypeRef) -> &TypeDefinition {
        &self.types[ty.id.0]
    }

    /// The unwrapped [`GraphType`] of a named definition.
    pub fn graph_type(&self, name: &str) -> Option<GraphType> {
        self.type_ref(name).map(|ty| self.named_type(ty))
    }

    pub(crate) fn named_type(&self, ty: TypeRef) -> GraphType {
        match self.definition(&ty) {
            TypeDefinition::Scalar(_) => GraphType::Scalar(ty),
            TypeDefinition::Object(_) => GraphType::Object(ty),
            TypeDefinition::Interface(_) => GraphType::Interface(ty),
            TypeDefinition::Union(_) => GraphType::Union(ty),
            TypeDefinition::Enum(_) => GraphType::Enum(ty),
            TypeDefinition::InputObject(_) => GraphType::InputObject(ty),
        }
    }

    pub fn query_type(&self) -> &TypeRef {
        &self.query_type
    }

    pub fn fields(&self, ty: &TypeRef) -> Option<&IndexMap<Name, Field>> {
        self.definition(ty).fields()
    }

    pub fn field(&self, ty: &TypeRef, name: &str) -> Option<&Field> {
        self.fields(ty)?.get(name)
    }

    /// Looks a field up by exact name first, then ignoring ASCII case.
    pub fn find_field_ignore_case(&self, ty: &TypeRef, name: &str) -> Option<&Field> {
        let fields = self.fields(ty)?;
        fields.get(name).or_else(|| {
            fields
                .values()
                .find(|field| field.name.eq_ignore_ascii_case(name))
        })
    }

    /// Object types `ty` can resolve to. Empty for concrete types.
    pub fn possible_types(&self, ty: &TypeRef) -> impl Iterator<Item = &TypeRef> {
        self.definition(ty).possible_types().into_iter().flatten()
    }

    /// Interfaces implemented by `ty`. Empty for non-object types.
    pub fn interfaces(&self, ty: &TypeRef) -> impl Iterator<Item = &TypeRef> {
        self.definition(ty).interfaces().into_iter().flatten()
    }

    /// Unions containing `ty`. Empty for non-object types.
    pub fn unions(&self, ty: &TypeRef) -> impl Iterator<Item = &TypeRef> {
        match self.definition(ty) {
            TypeDefinition::Object(object) => Some(&object.unions),
            _ => None,
        }
        .into_iter()
        .flatten()
    }

    /// Whether a value of type `candidate` can appear where `abstract_type` is expected.
    ///
    /// An interface is a possible type of another interface (or union) when every one of its
    /// implementers is.
    pub fn is_possible_type(&self, abstract_type: &TypeRef, candidate: &TypeRef) -> bool {
        let Some(possible_types) = self.definition(abstract_type).possible_types() else {
            return false;
        };
        match self.definition(candidate) {
            TypeDefinition::Object(_) => possible_types.contains(candidate),
            TypeDefinition::Interface(interface) => {
                interface
                    .implements_interfaces
                    .contains(abstract_type)
                    || (!interface.possible_types.is_empty()
                        && interface
                            .possible_types
                            .iter()
                            .all(|object| possible_types.contains(object)))
            }
            _ => false,
        }
    }

    /// Whether `ty` is `expected` or one of its possible types.
    pub fn is_subtype(&self, expected: &TypeRef, ty: &TypeRef) -> bool {
        expected == ty || self.is_possible_type(expected, ty)
    }

    /// The scalar whose fields identify entities, if the schema defines it.
    pub fn identity_scalar(&self, name: &str) -> Option<TypeRef> {
        self.type_ref(name)
            .filter(|ty| matches!(self.definition(ty), TypeDefinition::Scalar(_)))
    }
}

/// Supplies the schema a query context works against.
pub trait SchemaSource: Send + Sync {
    fn schema(&self) -> Result<Arc<GraphSchema>, SchemaError>;
}

impl SchemaSource for Arc<GraphSchema> {
    fn schema(&self) -> Result<Arc<GraphSchema>, SchemaError> {
        Ok(self.clone())
    }
}

/// A schema described in SDL, parsed on first use.
#[derive(Debug)]
pub struct SdlSchemaSource {
    sdl: String,
    schema: OnceLock<Arc<GraphSchema>>,
}

impl SdlSchemaSource {
    pub fn new(sdl: impl Into<String>) -> Self {
        Self {
            sdl: sdl.into(),
            schema: OnceLock::new(),
        }
    }
}

impl SchemaSource for SdlSchemaSource {
    fn schema(&self) -> Result<Arc<GraphSchema>, SchemaError> {
        if let Some(schema) = self.schema.get() {
            return Ok(schema.clone());
        }
        let schema = Arc::new(GraphSchema::parse_sdl(&self.sdl)?);
        Ok(self.schema.get_or_init(|| schema).clone())
    }
}

/// A schema described by the result of [`INTROSPECTION_QUERY`], built on first use.
#[derive(Debug)]
pub struct IntrospectionSchemaSource {
    result: serde_json::Value,
    schema: OnceLock<Arc<GraphSchema>>,
}

impl IntrospectionSchemaSource {
    pub fn new(result: serde_json::Value) -> Self {
        Self {
            result,
            schema: OnceLock::new(),
        }
    }
}

impl SchemaSource for IntrospectionSchemaSource {
    fn schema(&self) -> Result<Arc<GraphSchema>, SchemaError> {
        if let Some(schema) = self.schema.get() {
            return Ok(schema.clone());
        }
        let schema = Arc::new(GraphSchema::from_introspection(&self.result)?);
        Ok(self.schema.get_or_init(|| schema).clone())
    }
}
