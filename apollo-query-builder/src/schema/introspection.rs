use apollo_compiler::Name;
use serde::Deserialize;

use super::GraphSchema;
use super::builder::SchemaBuilder;
use super::builder::TypeKind;
use super::builder::TypeReference;
use crate::error::SchemaError;

/// The query whose result [`GraphSchema::from_introspection`] reads.
pub const INTROSPECTION_QUERY: &str = include_str!("introspection.graphql");

#[derive(Debug, Deserialize)]
struct Response {
    data: Option<Introspection>,
    #[serde(rename = "__schema")]
    schema: Option<SchemaDefinition>,
}

#[derive(Debug, Deserialize)]
struct Introspection {
    #[serde(rename = "__schema")]
    schema: SchemaDefinition,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SchemaDefinition {
    query_type: Option<NamedType>,
    types: Vec<FullType>,
}

#[derive(Debug, Deserialize)]
struct NamedType {
    name: String,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
enum Kind {
    Scalar,
    Object,
    Interface,
    Union,
    Enum,
    InputObject,
    List,
    NonNull,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FullType {
    kind: Kind,
    name: String,
    #[serde(default)]
    fields: Option<Vec<FieldDefinition>>,
    #[serde(default)]
    input_fields: Option<Vec<InputValue>>,
    #[serde(default)]
    interfaces: Option<Vec<TypeRefJson>>,
    #[serde(default)]
    enum_values: Option<Vec<NamedType>>,
    #[serde(default)]
    possible_types: Option<Vec<TypeRefJson>>,
}

#[derive(Debug, Deserialize)]
struct FieldDefinition {
    name: String,
    #[serde(default)]
    args: Vec<InputValue>,
    #[serde(rename = "type")]
    ty: TypeRefJson,
}

#[derive(Debug, Deserialize)]
struct InputValue {
    name: String,
    #[serde(rename = "type")]
    ty: TypeRefJson,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TypeRefJson {
    kind: Kind,
    name: Option<String>,
    of_type: Option<Box<TypeRefJson>>,
}

impl TypeRefJson {
    fn reference(&self) -> Result<TypeReference, SchemaError> {
        match self.kind {
            Kind::List => Ok(TypeReference::List(Box::new(self.inner()?.reference()?))),
            Kind::NonNull => Ok(TypeReference::NonNull(Box::new(self.inner()?.reference()?))),
            _ => match &self.name {
                Some(name) => Ok(TypeReference::Named(name_of(name)?)),
                None => Err(SchemaError::Introspection(format!(
                    "{:?} type reference without a name",
                    self.kind
                ))),
            },
        }
    }

    fn inner(&self) -> Result<&TypeRefJson, SchemaError> {
        self.of_type.as_deref().ok_or_else(|| {
            SchemaError::Introspection(format!("{:?} type reference without ofType", self.kind))
        })
    }

    fn name(&self) -> Result<Name, SchemaError> {
        match &self.name {
            Some(name) => name_of(name),
            None => Err(SchemaError::Introspection(
                "named type reference without a name".to_string(),
            )),
        }
    }
}

fn name_of(name: &str) -> Result<Name, SchemaError> {
    Name::new(name).map_err(|_| SchemaError::InvalidName(name.to_string()))
}

impl GraphSchema {
    /// Builds a schema from the result of [`INTROSPECTION_QUERY`].
    ///
    /// Accepts either the whole response (`{ "data": { "__schema": .. } }`) or its `data`.
    #[tracing::instrument(skip_all, level = "trace")]
    pub fn from_introspection(result: &serde_json::Value) -> Result<Self, SchemaError> {
        let response = Response::deserialize(result)
            .map_err(|err| SchemaError::Introspection(err.to_string()))?;
        let definition = match (response.data, response.schema) {
            (Some(data), _) => data.schema,
            (None, Some(schema)) => schema,
            (None, None) => {
                return Err(SchemaError::Introspection(
                    "missing __schema".to_string(),
                ));
            }
        };

        let mut builder = SchemaBuilder::default();
        for full_type in &definition.types {
            if full_type.name.starts_with("__") {
                continue;
            }
            let kind = match full_type.kind {
                Kind::Scalar => TypeKind::Scalar,
                Kind::Object => TypeKind::Object,
                Kind::Interface => TypeKind::Interface,
                Kind::Union => TypeKind::Union,
                Kind::Enum => TypeKind::Enum,
                Kind::InputObject => TypeKind::InputObject,
                Kind::List | Kind::NonNull => {
                    return Err(SchemaError::Introspection(format!(
                        "'{}' is declared as a wrapping type",
                        full_type.name
                    )));
                }
            };
            let pending = builder.add_type(kind, name_of(&full_type.name)?)?;
            for field in full_type.fields.iter().flatten() {
                let arguments = field
                    .args
                    .iter()
                    .map(|arg| Ok((name_of(&arg.name)?, arg.ty.reference()?)))
                    .collect::<Result<_, SchemaError>>()?;
                pending.field(name_of(&field.name)?, field.ty.reference()?, arguments);
            }
            for field in full_type.input_fields.iter().flatten() {
                pending.field(name_of(&field.name)?, field.ty.reference()?, Vec::new());
            }
            for interface in full_type.interfaces.iter().flatten() {
                pending.implements(interface.name()?);
            }
            for value in full_type.enum_values.iter().flatten() {
                pending.value(name_of(&value.name)?);
            }
            // Interface implementers come from the objects' own `interfaces`.
            if kind == TypeKind::Union {
                for member in full_type.possible_types.iter().flatten() {
                    pending.member(member.name()?);
                }
            }
        }
        if let Some(query) = &definition.query_type {
            builder.query_type(name_of(&query.name)?);
        }
        builder.build()
    }
}
