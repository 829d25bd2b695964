use rand::RngCore;
use tracing::warn;

use fixtura_core::{
    Attribute, AttributeDefinition, Entity, EntityDefinition, ForeignKeyDefinition, Value,
};

use crate::errors::GenerationError;
use crate::foreign::ResolvedForeignKeys;
use crate::generators::{Generated, ValueGenerator};

/// Selects the columns an entity builder fills in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnFilter {
    /// Columns written on insert. Store-generated key columns are excluded.
    Insertable,
    /// Non-key columns written on update.
    Updatable,
}

impl ColumnFilter {
    pub fn accepts(self, definition: &EntityDefinition, column: &AttributeDefinition) -> bool {
        match self {
            ColumnFilter::Insertable => {
                column.insertable && !(definition.primary_key.generated && column.primary_key)
            }
            ColumnFilter::Updatable => column.updatable && !column.primary_key,
        }
    }

    pub fn accepts_foreign_key(self, foreign_key: &ForeignKeyDefinition) -> bool {
        match self {
            ColumnFilter::Insertable => foreign_key.attribute.insertable,
            ColumnFilter::Updatable => foreign_key.attribute.updatable,
        }
    }
}

/// Builds a new entity of `definition` from `value_source`.
pub fn build_entity<F>(
    definition: &EntityDefinition,
    filter: ColumnFilter,
    value_source: F,
) -> Result<Entity, GenerationError>
where
    F: FnMut(Attribute<'_>) -> Result<Generated, GenerationError>,
{
    let mut entity = Entity::new(definition);
    populate_entity(&mut entity, definition, filter, value_source)?;
    Ok(entity)
}

/// Applies values from `value_source` onto `entity`.
///
/// Filtered columns always receive a value, `Value::Null` when the source
/// produced none. Foreign keys are only set when the source yields a value.
pub fn populate_entity<F>(
    entity: &mut Entity,
    definition: &EntityDefinition,
    filter: ColumnFilter,
    mut value_source: F,
) -> Result<(), GenerationError>
where
    F: FnMut(Attribute<'_>) -> Result<Generated, GenerationError>,
{
    for column in &definition.columns {
        if !filter.accepts(definition, column) {
            continue;
        }
        let generated = value_source(Attribute::Column(column))?;
        if let Generated::Unsupported(kind) = &generated {
            warn!(
                entity_type = %definition.entity_type,
                attribute = %column.name,
                kind = %kind,
                "unsupported value kind, storing null"
            );
        }
        entity.put(
            column.name.clone(),
            generated.into_value().unwrap_or(Value::Null),
        );
    }

    for fk in &definition.foreign_keys {
        if !filter.accepts_foreign_key(fk) {
            continue;
        }
        if let Some(value) = value_source(Attribute::ForeignKey(fk))?.into_value() {
            entity.put(fk.name(), value);
        }
    }

    Ok(())
}

/// Random entity with every insertable column generated.
pub fn random_entity<R: RngCore>(
    generator: &mut ValueGenerator<R>,
    definition: &EntityDefinition,
    resolved: &ResolvedForeignKeys,
) -> Result<Entity, GenerationError> {
    build_entity(definition, ColumnFilter::Insertable, |attribute| {
        generator.generate(&definition.entity_type, attribute, resolved)
    })
}

/// Regenerates every updatable column of `entity`.
pub fn randomize<R: RngCore>(
    generator: &mut ValueGenerator<R>,
    entity: &mut Entity,
    definition: &EntityDefinition,
    resolved: &ResolvedForeignKeys,
) -> Result<(), GenerationError> {
    populate_entity(entity, definition, ColumnFilter::Updatable, |attribute| {
        generator.generate(&definition.entity_type, attribute, resolved)
    })
}
