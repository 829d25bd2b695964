use std::collections::BTreeMap;
use std::slice;

use rand::RngCore;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, error};

use fixtura_core::{
    Domain, Entity, EntityDefinition, EntityType, ForeignKeyDefinition, ForeignKeyId, Gateway,
    GatewayError,
};

use crate::builder::random_entity;
use crate::errors::GenerationError;
use crate::generators::ValueGenerator;
use crate::hooks::FixtureHooks;

/// Resolution state of one foreign key.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Resolution has started but not finished; breaks reference cycles.
    InProgress,
    /// No entity could be supplied, e.g. a read-only referenced type.
    Unresolved,
    Resolved(Entity),
}

/// Foreign key → resolved reference entity map for one test run.
#[derive(Debug, Clone, Default)]
pub struct ResolvedForeignKeys {
    entries: BTreeMap<ForeignKeyId, Resolution>,
}

impl ResolvedForeignKeys {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &ForeignKeyId) -> Option<&Resolution> {
        self.entries.get(id)
    }

    /// The resolved entity, if resolution produced one.
    pub fn entity(&self, id: &ForeignKeyId) -> Option<&Entity> {
        match self.entries.get(id) {
            Some(Resolution::Resolved(entity)) => Some(entity),
            _ => None,
        }
    }

    pub fn contains(&self, id: &ForeignKeyId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn insert(&mut self, id: ForeignKeyId, resolution: Resolution) -> Option<Resolution> {
        self.entries.insert(id, resolution)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ForeignKeyId, &Resolution)> {
        self.entries.iter()
    }

    /// Drops the entries owned by `entity_type` so its direct references are
    /// resolved again. Deeper references are kept.
    pub fn refresh_for(&mut self, entity_type: &EntityType) {
        self.entries.retain(|id, _| &id.entity_type != entity_type);
    }
}

/// Outcome of [`insert_or_select`].
#[derive(Debug, Clone, PartialEq)]
pub enum Persisted {
    Inserted(Entity),
    /// A row with the entity's key already existed.
    Existing(Entity),
}

impl Persisted {
    pub fn entity(&self) -> &Entity {
        match self {
            Persisted::Inserted(entity) | Persisted::Existing(entity) => entity,
        }
    }

    pub fn into_entity(self) -> Entity {
        match self {
            Persisted::Inserted(entity) | Persisted::Existing(entity) => entity,
        }
    }

    pub fn was_inserted(&self) -> bool {
        matches!(self, Persisted::Inserted(_))
    }
}

/// Returns the stored row for `entity`, inserting it first unless a row
/// with its (populated) key already exists.
pub fn insert_or_select<G>(entity: &Entity, gateway: &mut G) -> Result<Persisted, GenerationError>
where
    G: Gateway + ?Sized,
{
    let key = entity.key();
    if key.is_populated() {
        let existing = gateway
            .select_many(slice::from_ref(&key))
            .map_err(|source| persistence_error(entity, source))?;
        if let Some(existing) = existing.into_iter().next() {
            debug!(key = %key, "reference already stored");
            return Ok(Persisted::Existing(existing));
        }
    }

    gateway
        .insert_and_return(entity)
        .map(Persisted::Inserted)
        .map_err(|source| persistence_error(entity, source))
}

fn persistence_error(entity: &Entity, source: GatewayError) -> GenerationError {
    error!(entity = %entity, error = %source, "persisting entity failed");
    GenerationError::Persistence {
        entity: entity.to_string(),
        source,
    }
}

/// Supplies and persists every entity referenced, directly or transitively,
/// by an entity type.
pub struct DependencyResolver<'a, R = ChaCha8Rng> {
    domain: &'a Domain,
    generator: &'a mut ValueGenerator<R>,
    hooks: &'a mut dyn FixtureHooks,
    inserted: usize,
}

impl<'a, R: RngCore> DependencyResolver<'a, R> {
    pub fn new(
        domain: &'a Domain,
        generator: &'a mut ValueGenerator<R>,
        hooks: &'a mut dyn FixtureHooks,
    ) -> Self {
        Self {
            domain,
            generator,
            hooks,
            inserted: 0,
        }
    }

    /// Number of reference rows inserted so far.
    pub fn inserted(&self) -> usize {
        self.inserted
    }

    /// Resolves the foreign keys of `entity_type` into `resolved`.
    ///
    /// Foreign keys already present in the map, in any state, are skipped.
    /// References to other types are resolved before self-references.
    pub fn resolve(
        &mut self,
        entity_type: &EntityType,
        resolved: &mut ResolvedForeignKeys,
        gateway: &mut dyn Gateway,
    ) -> Result<(), GenerationError> {
        let domain = self.domain;
        let definition = domain.definition(entity_type)?;
        let (others, self_references): (Vec<_>, Vec<_>) = definition
            .foreign_keys
            .iter()
            .partition(|fk| !fk.is_self_reference(entity_type));

        for fk in others.into_iter().chain(self_references) {
            let id = fk.id(entity_type);
            if resolved.contains(&id) {
                continue;
            }
            let referenced = domain.definition(&fk.referenced_type).map_err(|err| {
                GenerationError::DependencyResolution {
                    foreign_key: id.clone(),
                    message: err.to_string(),
                }
            })?;

            if !fk.is_self_reference(entity_type) {
                resolved.insert(id.clone(), Resolution::InProgress);
                debug!(foreign_key = %id, referenced = %fk.referenced_type, "resolving references");
                self.resolve(&fk.referenced_type, resolved, gateway)?;
            }

            let resolution = match self.candidate(&id, fk, referenced, resolved)? {
                Some(candidate) => Resolution::Resolved(self.persist(&id, &candidate, gateway)?),
                None => {
                    debug!(foreign_key = %id, "no reference entity available");
                    Resolution::Unresolved
                }
            };
            resolved.insert(id, resolution);
        }

        Ok(())
    }

    fn candidate(
        &mut self,
        id: &ForeignKeyId,
        fk: &ForeignKeyDefinition,
        referenced: &EntityDefinition,
        resolved: &ResolvedForeignKeys,
    ) -> Result<Option<Entity>, GenerationError> {
        if let Some(entity) = self.hooks.reference_entity(fk, referenced, resolved) {
            if entity.entity_type() != &referenced.entity_type {
                return Err(GenerationError::DependencyResolution {
                    foreign_key: id.clone(),
                    message: format!(
                        "supplied entity has type {}, expected {}",
                        entity.entity_type(),
                        referenced.entity_type
                    ),
                });
            }
            return Ok(Some(entity));
        }
        if referenced.read_only {
            return Ok(None);
        }
        random_entity(self.generator, referenced, resolved).map(Some)
    }

    fn persist(
        &mut self,
        id: &ForeignKeyId,
        candidate: &Entity,
        gateway: &mut dyn Gateway,
    ) -> Result<Entity, GenerationError> {
        let persisted = insert_or_select(candidate, gateway)?;
        if persisted.was_inserted() {
            self.inserted += 1;
        }
        let entity = persisted.into_entity();
        if !entity.key().is_populated() {
            return Err(GenerationError::DependencyResolution {
                foreign_key: id.clone(),
                message: format!("stored reference has no key: {entity}"),
            });
        }
        debug!(foreign_key = %id, key = %entity.key(), "reference resolved");
        Ok(entity)
    }
}
