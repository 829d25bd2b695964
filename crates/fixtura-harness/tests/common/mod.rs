#![allow(dead_code)]

use fixtura_core::{
    AttributeDefinition, Domain, EntityDefinition, EntityType, ForeignKeyDefinition, Value,
    ValueKind,
};

/// A small music store domain covering self references, mutual foreign
/// keys, read-only reference data, decimals and blobs.
pub fn music_domain() -> Domain {
    Domain::new("music")
        .entity(
            EntityDefinition::new("Artist")
                .key_generated()
                .column(AttributeDefinition::new("artistid", ValueKind::Long).primary_key())
                .column(AttributeDefinition::new("name", ValueKind::String).with_maximum_length(40))
                .column(AttributeDefinition::new("active", ValueKind::Boolean)),
        )
        .entity(
            EntityDefinition::new("Genre")
                .column(
                    AttributeDefinition::new("genreid", ValueKind::Integer)
                        .primary_key()
                        .with_bounds(Some(1.0), Some(1000.0)),
                )
                .column(AttributeDefinition::new("name", ValueKind::String)),
        )
        .entity(
            EntityDefinition::new("Album")
                .key_generated()
                .column(AttributeDefinition::new("albumid", ValueKind::Long).primary_key())
                .column(AttributeDefinition::new("title", ValueKind::String).with_maximum_length(60))
                .column(
                    AttributeDefinition::new("price", ValueKind::Decimal)
                        .with_bounds(Some(0.0), Some(100.0)),
                )
                .column(AttributeDefinition::new("cover", ValueKind::ByteArray).eagerly_loaded())
                .column(AttributeDefinition::new("booklet", ValueKind::ByteArray))
                .column(
                    AttributeDefinition::new("format", ValueKind::String).with_items(vec![
                        Value::Text("LP".to_string()),
                        Value::Text("CD".to_string()),
                    ]),
                )
                .column(AttributeDefinition::new("released", ValueKind::Date))
                .foreign_key(ForeignKeyDefinition::new("artist", "Artist").not_null()),
        )
        .entity(
            EntityDefinition::new("Track")
                .key_generated()
                .column(AttributeDefinition::new("trackid", ValueKind::Long).primary_key())
                .column(AttributeDefinition::new("name", ValueKind::String))
                .column(
                    AttributeDefinition::new("milliseconds", ValueKind::Integer)
                        .with_bounds(Some(1000.0), Some(600_000.0)),
                )
                .column(
                    AttributeDefinition::new("rating", ValueKind::Short)
                        .with_bounds(Some(0.0), Some(5.0)),
                )
                .foreign_key(ForeignKeyDefinition::new("album", "Album"))
                .foreign_key(ForeignKeyDefinition::new("genre", "Genre")),
        )
        .entity(
            EntityDefinition::new("MediaType")
                .read_only()
                .column(AttributeDefinition::new("mediatypeid", ValueKind::Integer).primary_key())
                .column(AttributeDefinition::new(
                    "kind",
                    ValueKind::Enum(vec!["audio".to_string(), "video".to_string()]),
                )),
        )
        .entity(
            EntityDefinition::new("Customer")
                .read_only()
                .column(AttributeDefinition::new("customerid", ValueKind::Long).primary_key())
                .column(AttributeDefinition::new("name", ValueKind::String)),
        )
        .entity(
            EntityDefinition::new("Order")
                .key_generated()
                .column(AttributeDefinition::new("orderid", ValueKind::Long).primary_key())
                .column(
                    AttributeDefinition::new("total", ValueKind::Double)
                        .with_bounds(Some(0.0), Some(500.0)),
                )
                .foreign_key(ForeignKeyDefinition::new("customer", "Customer")),
        )
        .entity(
            EntityDefinition::new("Item")
                .key_generated()
                .column(AttributeDefinition::new("itemid", ValueKind::Long).primary_key())
                .column(AttributeDefinition::new("label", ValueKind::String))
                .foreign_key(ForeignKeyDefinition::new("parent", "Item")),
        )
        .entity(
            EntityDefinition::new("Employee")
                .key_generated()
                .column(AttributeDefinition::new("employeeid", ValueKind::Long).primary_key())
                .column(AttributeDefinition::new("name", ValueKind::String))
                .foreign_key(ForeignKeyDefinition::new("department", "Department")),
        )
        .entity(
            EntityDefinition::new("Department")
                .key_generated()
                .column(AttributeDefinition::new("departmentid", ValueKind::Long).primary_key())
                .column(AttributeDefinition::new("name", ValueKind::String))
                .foreign_key(ForeignKeyDefinition::new("manager", "Employee")),
        )
}

pub fn entity_type(name: &str) -> EntityType {
    EntityType::new(name)
}

pub fn definition<'a>(domain: &'a Domain, name: &str) -> &'a EntityDefinition {
    domain
        .definition(&EntityType::new(name))
        .expect("entity type defined")
}
