use apollo_compiler::Name;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use super::entity::Entity;
use crate::error::MaterializeError;
use crate::schema::TypeRef;

/// Live entities keyed by type name and identity.
///
/// Share one cache (behind an `Arc`) between materializations to keep identity across queries.
/// Keys are type names, so materializers sharing a cache must agree on what each name means.
#[derive(Debug, Default)]
pub struct EntityCache {
    entities: DashMap<Name, DashMap<String, Entity>>,
}

impl EntityCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, ty: &TypeRef, id: &str) -> Option<Entity> {
        let by_id = self.entities.get(ty.name())?;
        let entity = by_id.get(id)?.value().clone();
        Some(entity)
    }

    /// Registers `entity`, failing when the key already holds one.
    pub fn insert(&self, ty: &TypeRef, id: &str, entity: Entity) -> Result<(), MaterializeError> {
        let by_id = self.entities.entry(ty.name().clone()).or_default();
        match by_id.entry(id.to_string()) {
            Entry::Occupied(_) => Err(MaterializeError::DuplicateEntity {
                type_name: ty.name().to_string(),
                id: id.to_string(),
            }),
            Entry::Vacant(entry) => {
                entry.insert(entity);
                Ok(())
            }
        }
    }

    /// Registers `entity` unless the key already holds one, and returns the registered entity.
    pub fn get_or_insert(&self, ty: &TypeRef, id: &str, entity: Entity) -> Entity {
        let by_id = self.entities.entry(ty.name().clone()).or_default();
        let registered = by_id.entry(id.to_string()).or_insert(entity);
        registered.value().clone()
    }

    /// Number of registrations, counting an entity once per type it is registered under.
    pub fn len(&self) -> usize {
        self.entities.iter().map(|by_id| by_id.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entities.clear();
    }
}
