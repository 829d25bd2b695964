pub mod primitives;

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::error;

use fixtura_core::{Attribute, AttributeDefinition, EntityType, ForeignKeyDefinition, Value, ValueKind};

use crate::errors::GenerationError;
use crate::foreign::{Resolution, ResolvedForeignKeys};
use crate::settings::GeneratorSettings;

/// Outcome of generating a value for one attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum Generated {
    Value(Value),
    /// No value: a lazy blob, or a foreign key without a resolved entity.
    Unset,
    /// The generator has no rule for this value kind.
    Unsupported(ValueKind),
}

impl Generated {
    pub fn into_value(self) -> Option<Value> {
        match self {
            Generated::Value(value) => Some(value),
            Generated::Unset | Generated::Unsupported(_) => None,
        }
    }

    pub fn is_unsupported(&self) -> bool {
        matches!(self, Generated::Unsupported(_))
    }
}

/// Constraint-respecting random value synthesis backed by an explicit,
/// seedable random source.
#[derive(Debug, Clone)]
pub struct ValueGenerator<R = ChaCha8Rng> {
    settings: GeneratorSettings,
    rng: R,
}

impl ValueGenerator<ChaCha8Rng> {
    pub fn seeded(settings: GeneratorSettings, seed: u64) -> Self {
        Self::new(settings, ChaCha8Rng::seed_from_u64(seed))
    }
}

impl<R: RngCore> ValueGenerator<R> {
    pub fn new(settings: GeneratorSettings, rng: R) -> Self {
        Self { settings, rng }
    }

    pub fn settings(&self) -> &GeneratorSettings {
        &self.settings
    }

    /// Generates a value for `attribute` of `entity_type`.
    ///
    /// Foreign keys are looked up in `resolved` and never generated.
    /// Item-constrained attributes take precedence over their value kind.
    pub fn generate(
        &mut self,
        entity_type: &EntityType,
        attribute: Attribute<'_>,
        resolved: &ResolvedForeignKeys,
    ) -> Result<Generated, GenerationError> {
        let result = match attribute {
            Attribute::ForeignKey(fk) => Ok(reference_value(entity_type, fk, resolved)),
            Attribute::Column(column) if column.is_item_constrained() => self.pick_item(column),
            Attribute::Column(column) => self.generate_kind(column),
        };

        result.map_err(|message| {
            error!(
                entity_type = %entity_type,
                attribute = attribute.name(),
                error = %message,
                "value generation failed"
            );
            GenerationError::Attribute {
                entity_type: entity_type.clone(),
                attribute: attribute.name().to_string(),
                message,
            }
        })
    }

    fn pick_item(&mut self, column: &AttributeDefinition) -> Result<Generated, String> {
        primitives::pick(&column.items, &mut self.rng)
            .cloned()
            .map(Generated::Value)
            .ok_or_else(|| "no items to pick from".to_string())
    }

    fn generate_kind(&mut self, column: &AttributeDefinition) -> Result<Generated, String> {
        let rng: &mut dyn RngCore = &mut self.rng;
        let value = match &column.kind {
            ValueKind::Boolean => Value::Boolean(primitives::random_bool(rng)),
            ValueKind::Character => Value::Character(primitives::random_char(rng)),
            ValueKind::Date => Value::Date(primitives::current_date()),
            ValueKind::DateTime => Value::DateTime(primitives::current_date_time()),
            ValueKind::OffsetDateTime => {
                Value::OffsetDateTime(primitives::current_offset_date_time())
            }
            ValueKind::Time => Value::Time(primitives::current_time()),
            ValueKind::Double => {
                let bounds = self.settings.numeric_bounds(column);
                primitives::random_double(bounds, rng)
                    .map(Value::Double)
                    .ok_or_else(|| empty_range(bounds))?
            }
            ValueKind::Decimal => {
                let bounds = self.settings.numeric_bounds(column);
                primitives::random_decimal(bounds, rng)
                    .map(Value::Decimal)
                    .ok_or_else(|| empty_range(bounds))?
            }
            ValueKind::Integer => {
                let bounds = self.settings.numeric_bounds(column);
                let value = primitives::random_integer(
                    bounds,
                    i64::from(i32::MIN),
                    i64::from(i32::MAX),
                    rng,
                )
                .ok_or_else(|| empty_range(bounds))?;
                Value::Integer(value as i32)
            }
            ValueKind::Long => {
                let bounds = self.settings.numeric_bounds(column);
                primitives::random_integer(bounds, i64::MIN, i64::MAX, rng)
                    .map(Value::Long)
                    .ok_or_else(|| empty_range(bounds))?
            }
            ValueKind::Short => {
                let bounds = self.settings.numeric_bounds(column);
                let value = primitives::random_integer(
                    bounds,
                    i64::from(i16::MIN),
                    i64::from(i16::MAX),
                    rng,
                )
                .ok_or_else(|| empty_range(bounds))?;
                Value::Short(value as i16)
            }
            ValueKind::String => {
                let length = self.settings.string_length(column);
                Value::Text(primitives::random_string(length, rng))
            }
            ValueKind::ByteArray => {
                if !column.eagerly_loaded {
                    return Ok(Generated::Unset);
                }
                Value::Bytes(primitives::random_blob(self.settings.blob_size, rng))
            }
            ValueKind::Enum(constants) => primitives::pick(constants, rng)
                .cloned()
                .map(Value::Enum)
                .ok_or_else(|| "enum declares no constants".to_string())?,
            ValueKind::Entity | ValueKind::Other(_) => {
                return Ok(Generated::Unsupported(column.kind.clone()));
            }
        };

        Ok(Generated::Value(value))
    }
}

fn reference_value(
    entity_type: &EntityType,
    fk: &ForeignKeyDefinition,
    resolved: &ResolvedForeignKeys,
) -> Generated {
    match resolved.get(&fk.id(entity_type)) {
        Some(Resolution::Resolved(entity)) => Generated::Value(Value::Entity(Box::new(entity.clone()))),
        Some(Resolution::InProgress | Resolution::Unresolved) | None => Generated::Unset,
    }
}

fn empty_range(bounds: crate::settings::NumericBounds) -> String {
    format!(
        "no value within effective range [{}, {}]",
        bounds.min, bounds.max
    )
}
