use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::{Value, ValueKind};

/// Identifier naming a domain entity kind.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityType(String);

impl EntityType {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityType {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Metadata describing one attribute: its value kind and constraints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AttributeDefinition {
    pub name: String,
    pub kind: ValueKind,
    #[serde(default)]
    pub minimum_value: Option<f64>,
    #[serde(default)]
    pub maximum_value: Option<f64>,
    /// Maximum length for string attributes; negative means unbounded.
    #[serde(default)]
    pub maximum_length: Option<i32>,
    /// Legal values for an item-constrained attribute.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<Value>,
    #[serde(default = "default_true")]
    pub insertable: bool,
    #[serde(default = "default_true")]
    pub updatable: bool,
    #[serde(default)]
    pub primary_key: bool,
    #[serde(default = "default_true")]
    pub nullable: bool,
    /// Byte-array content is loaded with the row rather than on demand.
    #[serde(default)]
    pub eagerly_loaded: bool,
}

fn default_true() -> bool {
    true
}

impl AttributeDefinition {
    pub fn new(name: impl Into<String>, kind: ValueKind) -> Self {
        Self {
            name: name.into(),
            kind,
            minimum_value: None,
            maximum_value: None,
            maximum_length: None,
            items: Vec::new(),
            insertable: true,
            updatable: true,
            primary_key: false,
            nullable: true,
            eagerly_loaded: false,
        }
    }

    /// Marks the attribute as a (non-updatable, non-null) primary key column.
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.updatable = false;
        self.nullable = false;
        self
    }

    pub fn with_bounds(mut self, minimum: Option<f64>, maximum: Option<f64>) -> Self {
        self.minimum_value = minimum;
        self.maximum_value = maximum;
        self
    }

    pub fn with_maximum_length(mut self, length: i32) -> Self {
        self.maximum_length = Some(length);
        self
    }

    pub fn with_items(mut self, items: Vec<Value>) -> Self {
        self.items = items;
        self
    }

    pub fn eagerly_loaded(mut self) -> Self {
        self.eagerly_loaded = true;
        self
    }

    pub fn read_only(mut self) -> Self {
        self.insertable = false;
        self.updatable = false;
        self
    }

    pub fn not_updatable(mut self) -> Self {
        self.updatable = false;
        self
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn is_item_constrained(&self) -> bool {
        !self.items.is_empty()
    }
}

/// A foreign-key attribute referencing another (or the same) entity type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ForeignKeyDefinition {
    pub attribute: AttributeDefinition,
    pub referenced_type: EntityType,
}

impl ForeignKeyDefinition {
    pub fn new(name: impl Into<String>, referenced_type: impl Into<EntityType>) -> Self {
        Self {
            attribute: AttributeDefinition::new(name, ValueKind::Entity),
            referenced_type: referenced_type.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.attribute.name
    }

    pub fn not_null(mut self) -> Self {
        self.attribute.nullable = false;
        self
    }

    pub fn not_updatable(mut self) -> Self {
        self.attribute.updatable = false;
        self
    }

    pub fn is_self_reference(&self, owner: &EntityType) -> bool {
        &self.referenced_type == owner
    }

    pub fn id(&self, owner: &EntityType) -> ForeignKeyId {
        ForeignKeyId::new(owner.clone(), self.name())
    }
}

/// Identity of a foreign key: the owning entity type and the attribute name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ForeignKeyId {
    pub entity_type: EntityType,
    pub attribute: String,
}

impl ForeignKeyId {
    pub fn new(entity_type: EntityType, attribute: impl Into<String>) -> Self {
        Self {
            entity_type,
            attribute: attribute.into(),
        }
    }
}

impl fmt::Display for ForeignKeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.entity_type, self.attribute)
    }
}

/// Either kind of attribute an entity carries.
#[derive(Debug, Clone, Copy)]
pub enum Attribute<'a> {
    Column(&'a AttributeDefinition),
    ForeignKey(&'a ForeignKeyDefinition),
}

impl<'a> Attribute<'a> {
    pub fn name(&self) -> &'a str {
        match self {
            Attribute::Column(column) => &column.name,
            Attribute::ForeignKey(fk) => fk.name(),
        }
    }

    pub fn definition(&self) -> &'a AttributeDefinition {
        match self {
            Attribute::Column(column) => column,
            Attribute::ForeignKey(fk) => &fk.attribute,
        }
    }
}

/// Primary key descriptor.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PrimaryKey {
    /// Key values are assigned by the store on insert.
    #[serde(default)]
    pub generated: bool,
}

/// Definition of one entity type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityDefinition {
    pub entity_type: EntityType,
    #[serde(default)]
    pub caption: Option<String>,
    pub columns: Vec<AttributeDefinition>,
    #[serde(default)]
    pub foreign_keys: Vec<ForeignKeyDefinition>,
    #[serde(default)]
    pub primary_key: PrimaryKey,
    #[serde(default)]
    pub read_only: bool,
}

impl EntityDefinition {
    pub fn new(entity_type: impl Into<EntityType>) -> Self {
        Self {
            entity_type: entity_type.into(),
            caption: None,
            columns: Vec::new(),
            foreign_keys: Vec::new(),
            primary_key: PrimaryKey::default(),
            read_only: false,
        }
    }

    pub fn column(mut self, column: AttributeDefinition) -> Self {
        self.columns.push(column);
        self
    }

    pub fn foreign_key(mut self, foreign_key: ForeignKeyDefinition) -> Self {
        self.foreign_keys.push(foreign_key);
        self
    }

    pub fn key_generated(mut self) -> Self {
        self.primary_key.generated = true;
        self
    }

    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    pub fn find_column(&self, name: &str) -> Option<&AttributeDefinition> {
        self.columns.iter().find(|column| column.name == name)
    }

    pub fn find_foreign_key(&self, name: &str) -> Option<&ForeignKeyDefinition> {
        self.foreign_keys.iter().find(|fk| fk.name() == name)
    }

    pub fn attribute(&self, name: &str) -> Result<Attribute<'_>> {
        if let Some(column) = self.find_column(name) {
            return Ok(Attribute::Column(column));
        }
        self.find_foreign_key(name)
            .map(Attribute::ForeignKey)
            .ok_or_else(|| Error::UnknownAttribute {
                entity_type: self.entity_type.clone(),
                attribute: name.to_string(),
            })
    }

    pub fn primary_key_columns(&self) -> impl Iterator<Item = &AttributeDefinition> {
        self.columns.iter().filter(|column| column.primary_key)
    }

    pub fn primary_key_names(&self) -> Vec<String> {
        self.primary_key_columns()
            .map(|column| column.name.clone())
            .collect()
    }
}

/// A named set of entity definitions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Domain {
    pub name: String,
    pub entities: Vec<EntityDefinition>,
}

impl Domain {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entities: Vec::new(),
        }
    }

    pub fn entity(mut self, definition: EntityDefinition) -> Self {
        self.entities.push(definition);
        self
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn definition(&self, entity_type: &EntityType) -> Result<&EntityDefinition> {
        self.entities
            .iter()
            .find(|definition| &definition.entity_type == entity_type)
            .ok_or_else(|| Error::UnknownEntityType(entity_type.clone()))
    }

    /// Entity types in declaration order.
    pub fn entity_types(&self) -> impl Iterator<Item = &EntityType> {
        self.entities.iter().map(|definition| &definition.entity_type)
    }
}
