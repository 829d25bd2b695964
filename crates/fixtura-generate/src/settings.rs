use serde::{Deserialize, Serialize};

use fixtura_core::AttributeDefinition;

/// Lower fence applied to every numeric attribute.
pub const GLOBAL_MIN: f64 = -10000.0;
/// Upper fence applied to every numeric attribute.
pub const GLOBAL_MAX: f64 = 10000.0;
pub const DEFAULT_STRING_LENGTH: usize = 10;
pub const DEFAULT_BLOB_SIZE: usize = 1024;

/// Tunables of the value generator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GeneratorSettings {
    pub global_min: f64,
    pub global_max: f64,
    /// Length of strings whose attribute declares no maximum length.
    pub default_string_length: usize,
    /// Size in bytes of eagerly loaded blob payloads.
    pub blob_size: usize,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            global_min: GLOBAL_MIN,
            global_max: GLOBAL_MAX,
            default_string_length: DEFAULT_STRING_LENGTH,
            blob_size: DEFAULT_BLOB_SIZE,
        }
    }
}

impl GeneratorSettings {
    /// Declared bounds clamped to the global fences.
    pub fn numeric_bounds(&self, attribute: &AttributeDefinition) -> NumericBounds {
        let min = attribute
            .minimum_value
            .unwrap_or(self.global_min)
            .max(self.global_min);
        let max = attribute
            .maximum_value
            .unwrap_or(self.global_max)
            .min(self.global_max);
        NumericBounds { min, max }
    }

    pub fn string_length(&self, attribute: &AttributeDefinition) -> usize {
        match attribute.maximum_length {
            Some(length) if length >= 0 => length as usize,
            _ => self.default_string_length,
        }
    }
}

/// Effective inclusive range for a numeric attribute.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumericBounds {
    pub min: f64,
    pub max: f64,
}

impl NumericBounds {
    pub fn is_empty(&self) -> bool {
        !(self.min <= self.max)
    }

    /// Both ends and the span between them are finite.
    pub fn is_finite(&self) -> bool {
        (self.max - self.min).is_finite()
    }

    pub fn contains(&self, value: f64) -> bool {
        self.min <= value && value <= self.max
    }

    /// Integral sub-range, also clamped to the representable range of the
    /// target type. `None` when no integer lies within the bounds.
    pub fn integral(&self, type_min: i64, type_max: i64) -> Option<(i64, i64)> {
        let min = self.min.ceil().max(type_min as f64);
        let max = self.max.floor().min(type_max as f64);
        if min <= max {
            Some((min as i64, max as i64))
        } else {
            None
        }
    }
}
