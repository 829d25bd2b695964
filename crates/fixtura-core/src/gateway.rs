use thiserror::Error;

use crate::entity::{Entity, Key};
use crate::schema::EntityType;

/// Errors raised by a persistence gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// No row exists for the key.
    #[error("record not found: {0}")]
    NotFound(Key),
    /// Backing store failure.
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("transaction error: {0}")]
    Transaction(String),
    #[error("connection closed")]
    Closed,
}

impl GatewayError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, GatewayError::NotFound(_))
    }
}

/// Transactional CRUD contract of the backing store.
///
/// Every entity returned by a gateway carries its persisted snapshot
/// (see [`Entity::mark_persisted`]).
pub trait Gateway {
    fn begin_transaction(&mut self) -> Result<(), GatewayError>;
    fn rollback_transaction(&mut self) -> Result<(), GatewayError>;
    fn is_transaction_open(&self) -> bool;
    fn close(&mut self) -> Result<(), GatewayError>;

    fn insert(&mut self, entity: &Entity) -> Result<Key, GatewayError>;

    fn insert_and_return(&mut self, entity: &Entity) -> Result<Entity, GatewayError> {
        let key = self.insert(entity)?;
        self.select_by_key(&key)
    }

    /// Fails with [`GatewayError::NotFound`] when no row matches.
    fn select_by_key(&mut self, key: &Key) -> Result<Entity, GatewayError>;
    fn select_many(&mut self, keys: &[Key]) -> Result<Vec<Entity>, GatewayError>;
    fn select_bounded(
        &mut self,
        entity_type: &EntityType,
        limit: usize,
    ) -> Result<Vec<Entity>, GatewayError>;
    fn update(&mut self, entity: &Entity) -> Result<Entity, GatewayError>;
    /// Returns the number of deleted rows.
    fn delete(&mut self, keys: &[Key]) -> Result<usize, GatewayError>;
}

/// Opens gateway connections.
pub trait ConnectionProvider {
    type Gateway: Gateway;

    fn connect(&mut self) -> Result<Self::Gateway, GatewayError>;
}
