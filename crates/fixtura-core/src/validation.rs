use std::collections::BTreeSet;

use crate::error::{Error, Result};
use crate::schema::{AttributeDefinition, Domain, EntityDefinition, EntityType};
use crate::types::ValueKind;

/// Validate internal consistency of a domain.
///
/// This checks:
/// - duplicate entity types and attribute names
/// - foreign keys reference known entity types
/// - writable entity types declare a primary key
/// - numeric bounds, enum constants and items match their attribute
pub fn validate_domain(domain: &Domain) -> Result<()> {
    let mut types = BTreeSet::new();
    for definition in &domain.entities {
        if !types.insert(definition.entity_type.clone()) {
            return Err(Error::InvalidDomain(format!(
                "duplicate entity type: {}",
                definition.entity_type
            )));
        }
    }

    for definition in &domain.entities {
        validate_entity(definition, &types)?;
    }

    Ok(())
}

fn validate_entity(definition: &EntityDefinition, types: &BTreeSet<EntityType>) -> Result<()> {
    let entity_type = &definition.entity_type;
    let mut names = BTreeSet::new();

    let attributes = definition
        .columns
        .iter()
        .chain(definition.foreign_keys.iter().map(|fk| &fk.attribute));
    for attribute in attributes {
        if !names.insert(attribute.name.as_str()) {
            return Err(Error::InvalidDomain(format!(
                "duplicate attribute name: {}.{}",
                entity_type, attribute.name
            )));
        }
        validate_attribute(definition, attribute)?;
    }

    for fk in &definition.foreign_keys {
        if !types.contains(&fk.referenced_type) {
            return Err(Error::InvalidDomain(format!(
                "referenced entity type not found: {}.{} -> {}",
                entity_type,
                fk.name(),
                fk.referenced_type
            )));
        }
        if fk.attribute.kind != ValueKind::Entity {
            return Err(Error::InvalidDomain(format!(
                "foreign key must have entity kind: {}.{}",
                entity_type,
                fk.name()
            )));
        }
    }

    if !definition.read_only && definition.primary_key_columns().next().is_none() {
        return Err(Error::InvalidDomain(format!(
            "primary key not defined: {entity_type}"
        )));
    }

    Ok(())
}

fn validate_attribute(definition: &EntityDefinition, attribute: &AttributeDefinition) -> Result<()> {
    let path = format!("{}.{}", definition.entity_type, attribute.name);

    if let (Some(min), Some(max)) = (attribute.minimum_value, attribute.maximum_value)
        && min > max
    {
        return Err(Error::InvalidDomain(format!(
            "minimum value exceeds maximum value: {path}"
        )));
    }

    if (attribute.minimum_value.is_some() || attribute.maximum_value.is_some())
        && !attribute.kind.is_numeric()
    {
        return Err(Error::InvalidDomain(format!(
            "numeric bounds on non-numeric attribute: {path}"
        )));
    }

    if let ValueKind::Enum(constants) = &attribute.kind
        && constants.is_empty()
    {
        return Err(Error::InvalidDomain(format!(
            "enum attribute without constants: {path}"
        )));
    }

    for item in &attribute.items {
        if !item.matches_kind(&attribute.kind) {
            return Err(Error::InvalidDomain(format!(
                "item {item} does not match kind {}: {path}",
                attribute.kind
            )));
        }
    }

    Ok(())
}
