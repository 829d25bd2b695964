use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::schema::{EntityDefinition, EntityType};
use crate::types::Value;

/// Mutable attribute → value container for one entity instance.
///
/// Equality compares the entity type and attribute values only; the
/// persisted snapshot used by [`Entity::modified`] is not part of it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    entity_type: EntityType,
    primary_key: Vec<String>,
    values: BTreeMap<String, Value>,
    #[serde(skip)]
    persisted: BTreeMap<String, Value>,
}

impl Entity {
    pub fn new(definition: &EntityDefinition) -> Self {
        Self {
            entity_type: definition.entity_type.clone(),
            primary_key: definition.primary_key_names(),
            values: BTreeMap::new(),
            persisted: BTreeMap::new(),
        }
    }

    pub fn entity_type(&self) -> &EntityType {
        &self.entity_type
    }

    /// Sets a value, returning the previous one.
    pub fn put(&mut self, attribute: impl Into<String>, value: Value) -> Option<Value> {
        self.values.insert(attribute.into(), value)
    }

    pub fn get(&self, attribute: &str) -> Option<&Value> {
        self.values.get(attribute)
    }

    pub fn remove(&mut self, attribute: &str) -> Option<Value> {
        self.values.remove(attribute)
    }

    /// Whether the attribute holds a value, null included.
    pub fn contains(&self, attribute: &str) -> bool {
        self.values.contains_key(attribute)
    }

    pub fn values(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }

    pub fn key(&self) -> Key {
        let values = self
            .primary_key
            .iter()
            .map(|name| {
                (
                    name.clone(),
                    self.values.get(name).cloned().unwrap_or(Value::Null),
                )
            })
            .collect();
        Key {
            entity_type: self.entity_type.clone(),
            values,
        }
    }

    /// Whether any attribute differs from the last persisted snapshot.
    pub fn modified(&self) -> bool {
        self.values != self.persisted
    }

    /// Attributes whose value differs from the last persisted snapshot.
    pub fn modified_attributes(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .values
            .iter()
            .filter(|(name, value)| self.persisted.get(*name) != Some(*value))
            .map(|(name, _)| name.as_str())
            .collect();
        names.extend(
            self.persisted
                .keys()
                .filter(|name| !self.values.contains_key(*name))
                .map(String::as_str),
        );
        names
    }

    /// Records the current values as the persisted snapshot.
    pub fn mark_persisted(&mut self) {
        self.persisted = self.values.clone();
    }
}

impl PartialEq for Entity {
    fn eq(&self, other: &Self) -> bool {
        self.entity_type == other.entity_type && self.values == other.values
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {{", self.entity_type)?;
        for (index, (name, value)) in self.values.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name}: {value}")?;
        }
        f.write_str("}")
    }
}

/// Primary key view of an entity.
#[derive(Debug, Clone, PartialEq)]
pub struct Key {
    pub entity_type: EntityType,
    pub values: Vec<(String, Value)>,
}

impl Key {
    /// True when the entity type has key columns and every one holds a value.
    pub fn is_populated(&self) -> bool {
        !self.values.is_empty() && self.values.iter().all(|(_, value)| !value.is_null())
    }

    pub fn get(&self, attribute: &str) -> Option<&Value> {
        self.values
            .iter()
            .find(|(name, _)| name == attribute)
            .map(|(_, value)| value)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[", self.entity_type)?;
        for (index, (name, value)) in self.values.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name}={value}")?;
        }
        f.write_str("]")
    }
}
