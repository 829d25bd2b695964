//! In-memory reference implementation of the persistence gateway.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::debug;
use uuid::Uuid;

use fixtura_core::{
    AttributeDefinition, ConnectionProvider, Domain, Entity, EntityDefinition, EntityType, Gateway,
    GatewayError, Key, Value, ValueKind,
};

type Tables = BTreeMap<EntityType, Vec<Entity>>;

#[derive(Debug, Default)]
struct Store {
    tables: Tables,
    /// Last generated key per entity type. Not rolled back.
    sequences: BTreeMap<EntityType, i64>,
    /// Rows inserted per entity type since creation. Not rolled back.
    inserts: BTreeMap<EntityType, usize>,
}

impl Store {
    fn rows(&self, entity_type: &EntityType) -> &[Entity] {
        self.tables
            .get(entity_type)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    fn find(&self, key: &Key) -> Option<&Entity> {
        self.rows(&key.entity_type)
            .iter()
            .find(|row| row.key() == *key)
    }

    fn next_sequence(&mut self, entity_type: &EntityType) -> i64 {
        let next = self.sequences.entry(entity_type.clone()).or_insert(0);
        *next += 1;
        *next
    }

    /// First row holding a reference to `key`, if any.
    fn referencing(&self, key: &Key) -> Option<&Entity> {
        self.tables.values().flatten().find(|row| {
            row.values().any(|(_, value)| match value {
                Value::Entity(referenced) => referenced.key() == *key,
                _ => false,
            })
        })
    }
}

/// Shared in-memory store. Cloning shares the underlying rows.
#[derive(Debug, Clone)]
pub struct MemoryDatabase {
    domain: Arc<Domain>,
    store: Arc<Mutex<Store>>,
}

impl MemoryDatabase {
    pub fn new(domain: Domain) -> Self {
        Self {
            domain: Arc::new(domain),
            store: Arc::new(Mutex::new(Store::default())),
        }
    }

    pub fn domain(&self) -> &Domain {
        &self.domain
    }

    /// Stores a row directly, bypassing transactions and the read-only
    /// check. Used to seed reference data.
    pub fn preload(&self, entity: &Entity) -> Result<Entity, GatewayError> {
        let definition = definition(&self.domain, entity.entity_type())?;
        let mut store = lock(&self.store);
        store_row(&mut store, definition, entity)
    }

    pub fn row_count(&self, entity_type: &EntityType) -> usize {
        lock(&self.store).rows(entity_type).len()
    }

    pub fn total_rows(&self) -> usize {
        lock(&self.store).tables.values().map(Vec::len).sum()
    }

    /// Rows inserted into `entity_type`, rolled back ones included.
    pub fn insert_count(&self, entity_type: &EntityType) -> usize {
        lock(&self.store)
            .inserts
            .get(entity_type)
            .copied()
            .unwrap_or(0)
    }
}

impl ConnectionProvider for MemoryDatabase {
    type Gateway = MemoryGateway;

    fn connect(&mut self) -> Result<MemoryGateway, GatewayError> {
        Ok(MemoryGateway {
            domain: Arc::clone(&self.domain),
            store: Arc::clone(&self.store),
            snapshot: None,
            closed: false,
        })
    }
}

/// Gateway connection to a [`MemoryDatabase`].
///
/// Writes apply to the shared store immediately; a transaction keeps a
/// snapshot of the rows and rollback restores it.
#[derive(Debug)]
pub struct MemoryGateway {
    domain: Arc<Domain>,
    store: Arc<Mutex<Store>>,
    snapshot: Option<Tables>,
    closed: bool,
}

impl MemoryGateway {
    fn ensure_open(&self) -> Result<(), GatewayError> {
        if self.closed {
            Err(GatewayError::Closed)
        } else {
            Ok(())
        }
    }

    fn writable_definition(&self, entity_type: &EntityType) -> Result<&EntityDefinition, GatewayError> {
        let definition = definition(&self.domain, entity_type)?;
        if definition.read_only {
            return Err(GatewayError::Persistence(format!(
                "entity type {entity_type} is read-only"
            )));
        }
        Ok(definition)
    }
}

impl Gateway for MemoryGateway {
    fn begin_transaction(&mut self) -> Result<(), GatewayError> {
        self.ensure_open()?;
        if self.snapshot.is_some() {
            return Err(GatewayError::Transaction(
                "transaction already open".to_string(),
            ));
        }
        self.snapshot = Some(lock(&self.store).tables.clone());
        Ok(())
    }

    fn rollback_transaction(&mut self) -> Result<(), GatewayError> {
        self.ensure_open()?;
        let snapshot = self
            .snapshot
            .take()
            .ok_or_else(|| GatewayError::Transaction("no open transaction".to_string()))?;
        lock(&self.store).tables = snapshot;
        debug!("transaction rolled back");
        Ok(())
    }

    fn is_transaction_open(&self) -> bool {
        self.snapshot.is_some()
    }

    fn close(&mut self) -> Result<(), GatewayError> {
        if self.closed {
            return Ok(());
        }
        if self.snapshot.is_some() {
            self.rollback_transaction()?;
        }
        self.closed = true;
        Ok(())
    }

    fn insert(&mut self, entity: &Entity) -> Result<Key, GatewayError> {
        self.ensure_open()?;
        let definition = self.writable_definition(entity.entity_type())?;
        let mut store = lock(&self.store);
        store_row(&mut store, definition, entity).map(|row| row.key())
    }

    fn select_by_key(&mut self, key: &Key) -> Result<Entity, GatewayError> {
        self.ensure_open()?;
        lock(&self.store)
            .find(key)
            .cloned()
            .ok_or_else(|| GatewayError::NotFound(key.clone()))
    }

    fn select_many(&mut self, keys: &[Key]) -> Result<Vec<Entity>, GatewayError> {
        self.ensure_open()?;
        let store = lock(&self.store);
        Ok(keys.iter().filter_map(|key| store.find(key).cloned()).collect())
    }

    fn select_bounded(
        &mut self,
        entity_type: &EntityType,
        limit: usize,
    ) -> Result<Vec<Entity>, GatewayError> {
        self.ensure_open()?;
        definition(&self.domain, entity_type)?;
        Ok(lock(&self.store)
            .rows(entity_type)
            .iter()
            .take(limit)
            .cloned()
            .collect())
    }

    fn update(&mut self, entity: &Entity) -> Result<Entity, GatewayError> {
        self.ensure_open()?;
        let definition = self.writable_definition(entity.entity_type())?;
        let key = entity.key();
        let mut store = lock(&self.store);
        check_references(&store, definition, entity)?;

        let rows = store
            .tables
            .get_mut(entity.entity_type())
            .ok_or_else(|| GatewayError::NotFound(key.clone()))?;
        let row = rows
            .iter_mut()
            .find(|row| row.key() == key)
            .ok_or_else(|| GatewayError::NotFound(key.clone()))?;
        for (name, value) in entity.values() {
            row.put(name.clone(), value.clone());
        }
        row.mark_persisted();
        debug!(key = %key, "row updated");
        Ok(row.clone())
    }

    fn delete(&mut self, keys: &[Key]) -> Result<usize, GatewayError> {
        self.ensure_open()?;
        let mut store = lock(&self.store);
        let mut deleted = 0;
        for key in keys {
            self.writable_definition(&key.entity_type)?;
            if let Some(row) = store.referencing(key) {
                return Err(GatewayError::Persistence(format!(
                    "{key} is referenced by {}",
                    row.key()
                )));
            }
            if let Some(rows) = store.tables.get_mut(&key.entity_type) {
                let before = rows.len();
                rows.retain(|row| row.key() != *key);
                deleted += before - rows.len();
            }
        }
        Ok(deleted)
    }
}

fn lock(store: &Mutex<Store>) -> MutexGuard<'_, Store> {
    store.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn definition<'a>(
    domain: &'a Domain,
    entity_type: &EntityType,
) -> Result<&'a EntityDefinition, GatewayError> {
    domain
        .definition(entity_type)
        .map_err(|err| GatewayError::Persistence(err.to_string()))
}

fn sequence_exhausted(
    definition: &EntityDefinition,
    column: &AttributeDefinition,
    next: i64,
) -> GatewayError {
    GatewayError::Persistence(format!(
        "key sequence of {}.{} exhausted at {next}",
        definition.entity_type, column.name
    ))
}

/// Assigns generated keys, runs the integrity checks and stores the row.
fn store_row(
    store: &mut Store,
    definition: &EntityDefinition,
    entity: &Entity,
) -> Result<Entity, GatewayError> {
    let entity_type = &definition.entity_type;
    let mut row = entity.clone();

    if definition.primary_key.generated {
        for column in definition.primary_key_columns() {
            if row.get(&column.name).is_some_and(|value| !value.is_null()) {
                continue;
            }
            let value = match &column.kind {
                ValueKind::Short => {
                    let next = store.next_sequence(entity_type);
                    let value = i16::try_from(next)
                        .map_err(|_| sequence_exhausted(definition, column, next))?;
                    Value::Short(value)
                }
                ValueKind::Integer => {
                    let next = store.next_sequence(entity_type);
                    let value = i32::try_from(next)
                        .map_err(|_| sequence_exhausted(definition, column, next))?;
                    Value::Integer(value)
                }
                ValueKind::Long => Value::Long(store.next_sequence(entity_type)),
                ValueKind::String => Value::Text(Uuid::new_v4().to_string()),
                other => {
                    return Err(GatewayError::Persistence(format!(
                        "cannot generate {other} key for {entity_type}.{}",
                        column.name
                    )));
                }
            };
            row.put(column.name.clone(), value);
        }
    }

    let key = row.key();
    if !key.is_populated() {
        return Err(GatewayError::Persistence(format!(
            "incomplete primary key {key}"
        )));
    }
    if store.find(&key).is_some() {
        return Err(GatewayError::Persistence(format!("duplicate key {key}")));
    }
    check_references(store, definition, &row)?;

    row.mark_persisted();
    store
        .tables
        .entry(entity_type.clone())
        .or_default()
        .push(row.clone());
    *store.inserts.entry(entity_type.clone()).or_insert(0) += 1;
    debug!(key = %key, "row inserted");
    Ok(row)
}

/// Every non-null foreign key must reference a stored row.
fn check_references(
    store: &Store,
    definition: &EntityDefinition,
    entity: &Entity,
) -> Result<(), GatewayError> {
    for fk in &definition.foreign_keys {
        match entity.get(fk.name()) {
            None | Some(Value::Null) => {}
            Some(Value::Entity(referenced)) => {
                let key = referenced.key();
                if referenced.entity_type() != &fk.referenced_type || store.find(&key).is_none() {
                    return Err(GatewayError::Persistence(format!(
                        "foreign key {}.{} references missing row {key}",
                        definition.entity_type,
                        fk.name()
                    )));
                }
            }
            Some(other) => {
                return Err(GatewayError::Persistence(format!(
                    "foreign key {}.{} holds non-entity value {other}",
                    definition.entity_type,
                    fk.name()
                )));
            }
        }
    }
    Ok(())
}
