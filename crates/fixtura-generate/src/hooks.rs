use fixtura_core::{Entity, EntityDefinition, ForeignKeyDefinition, Gateway, GatewayError};

use crate::foreign::ResolvedForeignKeys;

/// Customisation points of a fixture run.
///
/// Every method has a default; returning `None` from an entity hook means
/// "use a randomly generated entity".
pub trait FixtureHooks {
    /// Runs inside the transaction before any entity is resolved.
    fn set_up(&mut self, _gateway: &mut dyn Gateway) -> Result<(), GatewayError> {
        Ok(())
    }

    /// Runs inside the transaction after the lifecycle, before rollback.
    fn tear_down(&mut self, _gateway: &mut dyn Gateway) -> Result<(), GatewayError> {
        Ok(())
    }

    /// Supplies the entity referenced through `foreign_key`.
    ///
    /// Consulted before the read-only check, so read-only reference data can
    /// be provided here.
    fn reference_entity(
        &mut self,
        _foreign_key: &ForeignKeyDefinition,
        _referenced: &EntityDefinition,
        _resolved: &ResolvedForeignKeys,
    ) -> Option<Entity> {
        None
    }

    /// Supplies the entity under test.
    fn test_entity(
        &mut self,
        _definition: &EntityDefinition,
        _resolved: &ResolvedForeignKeys,
    ) -> Option<Entity> {
        None
    }

    /// Modifies `entity` for the update pass. Returns `false` to fall back
    /// to randomizing the updatable columns.
    fn modify_entity(
        &mut self,
        _entity: &mut Entity,
        _definition: &EntityDefinition,
        _resolved: &ResolvedForeignKeys,
    ) -> bool {
        false
    }
}

/// Hooks that change nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultHooks;

impl FixtureHooks for DefaultHooks {}
