//! Turns JSON results into identity-preserving object graphs.

use std::collections::HashMap;
use std::sync::Arc;

use apollo_compiler::Name;

use crate::configuration::Configuration;
use crate::error::MaterializeError;
use crate::mapping::json_kind;
use crate::query::TYPENAME;
use crate::schema::GraphSchema;
use crate::schema::GraphType;
use crate::schema::TypeDefinition;
use crate::schema::TypeId;
use crate::schema::TypeRef;

pub(crate) mod cache;
pub(crate) mod entity;

use cache::EntityCache;
use entity::Entity;
use entity::Value;

/// Materializes results of one schema into entities, sharing identity through an
/// [`EntityCache`].
#[derive(Debug, Clone)]
pub struct Materializer {
    schema: Arc<GraphSchema>,
    configuration: Configuration,
    cache: Arc<EntityCache>,
    /// Concrete types to build for abstract types met without a discriminator.
    factories: HashMap<TypeId, TypeRef>,
}

impl Materializer {
    pub fn new(schema: Arc<GraphSchema>, configuration: Configuration) -> Self {
        Self::with_cache(schema, configuration, Arc::new(EntityCache::new()))
    }

    pub fn with_cache(
        schema: Arc<GraphSchema>,
        configuration: Configuration,
        cache: Arc<EntityCache>,
    ) -> Self {
        Self {
            schema,
            configuration,
            cache,
            factories: HashMap::new(),
        }
    }

    /// Builds `concrete_type` objects where `abstract_type` is expected and the response does
    /// not say which type it sent.
    pub fn construct_with(
        mut self,
        abstract_type: &str,
        concrete_type: &str,
    ) -> Result<Self, MaterializeError> {
        let unknown = |name: &str| MaterializeError::UnknownDiscriminator(name.to_string());
        let abstract_ref = self
            .schema
            .type_ref(abstract_type)
            .ok_or_else(|| unknown(abstract_type))?;
        let concrete_ref = self
            .schema
            .type_ref(concrete_type)
            .ok_or_else(|| unknown(concrete_type))?;
        let is_object = matches!(
            self.schema.definition(&concrete_ref),
            TypeDefinition::Object(_)
        );
        if !is_object || !self.schema.is_possible_type(&abstract_ref, &concrete_ref) {
            return Err(MaterializeError::NotAPossibleType {
                type_name: concrete_type.to_string(),
                expected: abstract_type.to_string(),
            });
        }
        self.factories.insert(abstract_ref.id(), concrete_ref);
        Ok(self)
    }

    pub fn cache(&self) -> &Arc<EntityCache> {
        &self.cache
    }

    pub(crate) fn set_cache(&mut self, cache: Arc<EntityCache>) {
        self.cache = cache;
    }

    pub(crate) fn set_configuration(&mut self, configuration: Configuration) {
        self.configuration = configuration;
    }

    pub fn schema(&self) -> &Arc<GraphSchema> {
        &self.schema
    }

    /// Materializes `json` as a value of type `expected`.
    ///
    /// Either the whole value materializes or an error is returned. Entities registered before
    /// the error stay in the cache.
    #[tracing::instrument(skip_all, level = "trace")]
    pub fn materialize(
        &self,
        json: &serde_json::Value,
        expected: &GraphType,
    ) -> Result<Value, MaterializeError> {
        self.materialize_value(json, expected, 0)
    }

    fn materialize_value(
        &self,
        json: &serde_json::Value,
        expected: &GraphType,
        depth: usize,
    ) -> Result<Value, MaterializeError> {
        if depth > self.configuration.recursion_limit {
            return Err(MaterializeError::RecursionLimitExceeded(
                self.configuration.recursion_limit,
            ));
        }
        match (expected, json) {
            (GraphType::NonNull(inner), json) => {
                if json.is_null() {
                    return Err(invalid(expected, json));
                }
                self.materialize_value(json, inner, depth)
            }
            (_, serde_json::Value::Null) => Ok(Value::Null),
            (GraphType::List(inner), serde_json::Value::Array(items)) => items
                .iter()
                .map(|item| self.materialize_value(item, inner, depth + 1))
                .collect::<Result<_, _>>()
                .map(Value::List),
            (GraphType::List(_), _) => Err(invalid(expected, json)),
            (GraphType::Scalar(_), json) => Ok(Value::Leaf(json.clone())),
            (GraphType::Enum(ty), serde_json::Value::String(value)) => {
                let known = match self.schema.definition(ty) {
                    TypeDefinition::Enum(definition) => definition.values.contains(value.as_str()),
                    _ => false,
                };
                if known {
                    Ok(Value::Leaf(json.clone()))
                } else {
                    Err(invalid(expected, json))
                }
            }
            (GraphType::Enum(_), _) => Err(invalid(expected, json)),
            (
                GraphType::Object(ty) | GraphType::Interface(ty) | GraphType::Union(ty),
                serde_json::Value::Object(object),
            ) => self
                .materialize_object(object, ty, depth)
                .map(Value::Object),
            (GraphType::Object(_) | GraphType::Interface(_) | GraphType::Union(_), _) => {
                Err(invalid(expected, json))
            }
            (GraphType::InputObject(ty), _) => {
                Err(MaterializeError::NotAnOutputType(ty.name().to_string()))
            }
        }
    }

    fn materialize_object(
        &self,
        object: &serde_json::Map<String, serde_json::Value>,
        expected: &TypeRef,
        depth: usize,
    ) -> Result<Entity, MaterializeError> {
        let discriminated = self.discriminate(object, expected)?;
        let ty = discriminated.clone().unwrap_or_else(|| expected.clone());
        let id = self.identity(object, &ty)?;

        if let Some(id) = &id {
            // The same identity may already be registered under the expected type with another
            // concrete type.
            let conflicting = (discriminated.is_some() && ty != *expected)
                .then(|| self.cache.get(expected, id))
                .flatten()
                .filter(|existing| existing.type_ref() != &ty);
            if let Some(existing) = conflicting {
                return Err(type_mismatch(id, &existing, &ty));
            }
            if let Some(existing) = self.cache.get(&ty, id) {
                tracing::trace!(type_name = %ty.name(), %id, "entity cache hit");
                self.populate(&existing, object, id, depth)?;
                return Ok(existing);
            }
            tracing::trace!(type_name = %ty.name(), %id, "entity cache miss");
        }

        let concrete = match self.schema.definition(&ty) {
            TypeDefinition::Object(_) => ty.clone(),
            _ => self
                .factories
                .get(&ty.id())
                .cloned()
                .ok_or_else(|| MaterializeError::CannotConstructAbstractType(ty.name().to_string()))?,
        };
        let entity = Entity::new(concrete);
        let entity = match &id {
            // Registered before its fields: nested references to it resolve to this entity.
            Some(id) => self.register(entity, &ty, id)?,
            None => entity,
        };
        self.populate(&entity, object, id.as_deref().unwrap_or_default(), depth)?;
        Ok(entity)
    }

    /// The concrete type named by the discriminator, if the object carries one.
    fn discriminate(
        &self,
        object: &serde_json::Map<String, serde_json::Value>,
        expected: &TypeRef,
    ) -> Result<Option<TypeRef>, MaterializeError> {
        let Some(typename) = object.get(TYPENAME) else {
            return Ok(None);
        };
        let Some(name) = typename.as_str() else {
            return Err(MaterializeError::InvalidValue {
                expected: "String".to_string(),
                found: json_kind(typename).to_string(),
            });
        };
        let ty = self
            .schema
            .type_ref(name)
            .ok_or_else(|| MaterializeError::UnknownDiscriminator(name.to_string()))?;
        if !self.schema.is_subtype(expected, &ty) {
            return Err(MaterializeError::NotAPossibleType {
                type_name: name.to_string(),
                expected: expected.name().to_string(),
            });
        }
        Ok(Some(ty))
    }

    /// The value of the single identity field present in `object`.
    fn identity(
        &self,
        object: &serde_json::Map<String, serde_json::Value>,
        ty: &TypeRef,
    ) -> Result<Option<String>, MaterializeError> {
        let Some(fields) = self.schema.fields(ty) else {
            return Ok(None);
        };
        let identity_scalar = self.configuration.identity_scalar.as_str();
        let identity_fields: Vec<(&String, &serde_json::Value)> = object
            .iter()
            .filter(|(key, _)| {
                // A list of identities never identifies its container.
                fields.get(key.as_str()).is_some_and(|field| {
                    !field.ty.is_list()
                        && matches!(field.ty.terminal(), GraphType::Scalar(scalar) if scalar.name() == identity_scalar)
                })
            })
            .collect();
        match identity_fields.as_slice() {
            [] => Ok(None),
            [(_, value)] => match value {
                serde_json::Value::Null => Ok(None),
                serde_json::Value::String(id) => Ok(Some(id.clone())),
                serde_json::Value::Number(id) => Ok(Some(id.to_string())),
                other => Err(MaterializeError::InvalidValue {
                    expected: identity_scalar.to_string(),
                    found: json_kind(other).to_string(),
                }),
            },
            several => Err(MaterializeError::AmbiguousIdentity {
                type_name: ty.name().to_string(),
                fields: several
                    .iter()
                    .map(|(key, _)| key.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
            }),
        }
    }

    /// Registers `entity` under `ty`, its concrete type and every interface it implements,
    /// returning the entity already registered if another materialization won the race.
    fn register(&self, entity: Entity, ty: &TypeRef, id: &str) -> Result<Entity, MaterializeError> {
        let concrete = entity.type_ref().clone();
        let entity = self.cache.get_or_insert(&concrete, id, entity);
        let aliases = std::iter::once(ty)
            .filter(|ty| **ty != concrete)
            .chain(self.schema.interfaces(&concrete));
        for alias in aliases {
            let registered = self.cache.get_or_insert(alias, id, entity.clone());
            if !registered.ptr_eq(&entity) {
                return Err(MaterializeError::DuplicateEntity {
                    type_name: alias.name().to_string(),
                    id: id.to_string(),
                });
            }
        }
        Ok(entity)
    }

    fn populate(
        &self,
        entity: &Entity,
        object: &serde_json::Map<String, serde_json::Value>,
        id: &str,
        depth: usize,
    ) -> Result<(), MaterializeError> {
        let found = object
            .get(TYPENAME)
            .and_then(serde_json::Value::as_str)
            .filter(|name| *name != entity.type_name().as_str());
        if let Some(found) = found {
            return Err(MaterializeError::TypeMismatch {
                id: id.to_string(),
                existing: entity.type_name().to_string(),
                found: found.to_string(),
            });
        }
        let Some(fields) = self.schema.fields(entity.type_ref()) else {
            return Ok(());
        };
        for (key, json) in object {
            if key == TYPENAME {
                continue;
            }
            let Some(field) = fields.get(key.as_str()) else {
                tracing::trace!(type_name = %entity.type_name(), member = %key, "skipping unknown member");
                continue;
            };
            // Computed before taking the entity's lock: the value may refer back to it.
            let value = self.materialize_value(json, &field.ty, depth + 1)?;
            entity.set(Name::clone(&field.name), value);
        }
        Ok(())
    }
}

fn invalid(expected: &GraphType, json: &serde_json::Value) -> MaterializeError {
    MaterializeError::InvalidValue {
        expected: expected.to_string(),
        found: json_kind(json).to_string(),
    }
}

fn type_mismatch(id: &str, existing: &Entity, found: &TypeRef) -> MaterializeError {
    MaterializeError::TypeMismatch {
        id: id.to_string(),
        existing: existing.type_name().to_string(),
        found: found.name().to_string(),
    }
}
