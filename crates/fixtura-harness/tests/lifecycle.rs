mod common;

use fixtura_core::{
    AttributeDefinition, ConnectionProvider, Domain, Entity, EntityDefinition, EntityType,
    ForeignKeyDefinition, Gateway, GatewayError, Key, Value, ValueKind,
};
use fixtura_generate::{FixtureHooks, GenerationError, ResolvedForeignKeys};
use fixtura_harness::{
    ConfigError, EntityTestUnit, LifecycleError, LifecycleStage, MemoryDatabase, MemoryGateway,
    TestUnitConfig, TypeOutcome,
};

use common::{definition, entity_type, music_domain};

fn config(seed: u64) -> TestUnitConfig {
    TestUnitConfig {
        seed: Some(seed),
        ..TestUnitConfig::default()
    }
}

fn unit(database: &MemoryDatabase) -> EntityTestUnit<MemoryDatabase> {
    EntityTestUnit::with_config(
        database.domain().clone(),
        database.clone(),
        fixtura_generate::DefaultHooks,
        config(2024),
    )
    .expect("valid domain")
}

#[test]
fn album_lifecycle_passes_and_leaves_store_empty() {
    let database = MemoryDatabase::new(music_domain());
    let mut unit = unit(&database);

    let report = unit.test(&entity_type("Album")).expect("album lifecycle");

    assert_eq!(report.seed, 2024);
    assert_eq!(report.stages.first(), Some(&LifecycleStage::Start));
    assert_eq!(report.stages.last(), Some(&LifecycleStage::End));
    assert!(report.reached(LifecycleStage::Inserted));
    assert!(report.reached(LifecycleStage::UpdateVerified));
    assert!(report.reached(LifecycleStage::DeleteVerified));
    assert_eq!(report.references_inserted, 2);
    assert_eq!(database.total_rows(), 0);
    assert_eq!(database.insert_count(&entity_type("Album")), 1);
}

#[test]
fn self_referencing_type_passes() {
    let database = MemoryDatabase::new(music_domain());
    let mut unit = unit(&database);

    let report = unit.test(&entity_type("Item")).expect("item lifecycle");

    // One parent for the insert and a fresh one for the update.
    assert_eq!(report.references_inserted, 2);
    assert_eq!(database.insert_count(&entity_type("Item")), 3);
    assert_eq!(database.total_rows(), 0);
}

#[test]
fn read_only_type_only_runs_the_bounded_select() {
    let database = MemoryDatabase::new(music_domain());
    let mut unit = unit(&database);

    let report = unit.test(&entity_type("MediaType")).expect("media type lifecycle");

    assert!(report.read_only);
    assert_eq!(
        report.stages,
        vec![
            LifecycleStage::Start,
            LifecycleStage::DependenciesResolved,
            LifecycleStage::SelectVerified,
            LifecycleStage::End,
        ]
    );
    assert_eq!(database.insert_count(&entity_type("MediaType")), 0);
}

#[test]
fn whole_domain_passes_despite_mutual_references() {
    let database = MemoryDatabase::new(music_domain());
    let mut unit = unit(&database);

    let suite = unit.test_all();

    let failures: Vec<_> = suite.failures().collect();
    assert!(failures.is_empty(), "failures: {failures:?}");
    assert_eq!(suite.passed(), 10);
    assert_eq!(suite.seed, 2024);
    assert_eq!(database.total_rows(), 0);

    let json = suite.to_json().expect("serialize report");
    assert!(json.contains(&suite.run_id.to_string()));
    assert!(json.contains("\"status\": \"passed\""));
}

#[test]
fn acyclic_domain_is_tested_referenced_types_first() {
    let domain = Domain::new("shop")
        .entity(
            EntityDefinition::new("Invoice")
                .key_generated()
                .column(AttributeDefinition::new("invoiceid", ValueKind::Long).primary_key())
                .foreign_key(ForeignKeyDefinition::new("customer", "Client")),
        )
        .entity(
            EntityDefinition::new("Client")
                .key_generated()
                .column(AttributeDefinition::new("clientid", ValueKind::Long).primary_key())
                .column(AttributeDefinition::new("name", ValueKind::String)),
        );
    let database = MemoryDatabase::new(domain.clone());
    let mut unit = EntityTestUnit::new(domain, database).expect("valid domain");

    let suite = unit.test_all();
    let order: Vec<_> = suite
        .outcomes
        .iter()
        .map(|outcome| outcome.entity_type().name().to_string())
        .collect();
    assert_eq!(order, vec!["Client", "Invoice"]);
    assert!(suite.is_success());
}

#[derive(Default)]
struct ShopHooks {
    customer: Option<Entity>,
    set_up: usize,
    tear_down: usize,
    modified: usize,
}

impl FixtureHooks for ShopHooks {
    fn set_up(&mut self, _gateway: &mut dyn Gateway) -> Result<(), GatewayError> {
        self.set_up += 1;
        Ok(())
    }

    fn tear_down(&mut self, _gateway: &mut dyn Gateway) -> Result<(), GatewayError> {
        self.tear_down += 1;
        Ok(())
    }

    fn reference_entity(
        &mut self,
        _foreign_key: &ForeignKeyDefinition,
        referenced: &EntityDefinition,
        _resolved: &ResolvedForeignKeys,
    ) -> Option<Entity> {
        if referenced.entity_type.name() == "Customer" {
            self.customer.clone()
        } else {
            None
        }
    }

    fn modify_entity(
        &mut self,
        entity: &mut Entity,
        definition: &EntityDefinition,
        _resolved: &ResolvedForeignKeys,
    ) -> bool {
        if definition.entity_type.name() != "Order" {
            return false;
        }
        entity.put("total", Value::Double(-1.5));
        self.modified += 1;
        true
    }
}

#[test]
fn hooks_supply_read_only_references_and_modifications() {
    let domain = music_domain();
    let database = MemoryDatabase::new(domain.clone());

    let mut customer = Entity::new(definition(&domain, "Customer"));
    customer.put("customerid", Value::Long(17));
    customer.put("name", Value::Text("Mirah".to_string()));
    let customer = database.preload(&customer).expect("preload customer");

    let mut unit = unit(&database).with_hooks(ShopHooks {
        customer: Some(customer.clone()),
        ..ShopHooks::default()
    });
    let report = unit.test(&entity_type("Order")).expect("order lifecycle");

    assert!(report.reached(LifecycleStage::Updated));
    assert_eq!(report.references_inserted, 0);
    assert_eq!(unit.hooks().set_up, 1);
    assert_eq!(unit.hooks().tear_down, 1);
    assert_eq!(unit.hooks().modified, 1);
    assert_eq!(database.row_count(&entity_type("Customer")), 1);
    assert_eq!(database.row_count(&entity_type("Order")), 0);
    assert_eq!(database.insert_count(&entity_type("Customer")), 1);
}

struct WrongSubject(Entity);

impl FixtureHooks for WrongSubject {
    fn test_entity(
        &mut self,
        _definition: &EntityDefinition,
        _resolved: &ResolvedForeignKeys,
    ) -> Option<Entity> {
        Some(self.0.clone())
    }
}

#[test]
fn failed_check_aborts_and_rolls_back() {
    let domain = music_domain();
    let database = MemoryDatabase::new(domain.clone());
    let genre = Entity::new(definition(&domain, "Genre"));
    let mut unit = unit(&database).with_hooks(WrongSubject(genre));

    let err = unit.test(&entity_type("Album")).unwrap_err();

    match err {
        LifecycleError::Assertion { entity_type, .. } => assert_eq!(entity_type.name(), "Album"),
        other => panic!("unexpected error {other}"),
    }
    assert_eq!(database.insert_count(&entity_type("Artist")), 1);
    assert_eq!(database.total_rows(), 0);
}

#[test]
fn generation_failure_propagates_with_attribute_identity() {
    let domain = Domain::new("sensors")
        .entity(
            EntityDefinition::new("Station")
                .key_generated()
                .column(AttributeDefinition::new("stationid", ValueKind::Long).primary_key()),
        )
        .entity(
            EntityDefinition::new("Reading")
                .key_generated()
                .column(AttributeDefinition::new("readingid", ValueKind::Long).primary_key())
                .column(
                    AttributeDefinition::new("level", ValueKind::Integer)
                        .with_bounds(Some(20_000.0), Some(30_000.0)),
                )
                .foreign_key(ForeignKeyDefinition::new("station", "Station")),
        );
    let database = MemoryDatabase::new(domain.clone());
    let mut unit = EntityTestUnit::new(domain, database.clone()).expect("valid domain");

    let err = unit.test(&entity_type("Reading")).unwrap_err();

    match err {
        LifecycleError::Generation(GenerationError::Attribute { attribute, .. }) => {
            assert_eq!(attribute, "level");
        }
        other => panic!("unexpected error {other}"),
    }
    assert_eq!(database.insert_count(&entity_type("Station")), 1);
    assert_eq!(database.total_rows(), 0);

    let suite = unit.test_all();
    assert_eq!(suite.passed(), 1);
    assert_eq!(suite.failed(), 1);
    assert!(matches!(
        suite.outcomes.last(),
        Some(TypeOutcome::Failed { .. })
    ));
}

#[test]
fn unknown_entity_type_is_a_domain_error() {
    let database = MemoryDatabase::new(music_domain());
    let mut unit = unit(&database);
    let err = unit.test(&entity_type("Invoice")).unwrap_err();
    assert!(matches!(err, LifecycleError::Domain(_)));
}

#[test]
fn invalid_domain_is_rejected_up_front() {
    let domain = Domain::new("broken").entity(
        EntityDefinition::new("Note").column(AttributeDefinition::new("text", ValueKind::String)),
    );
    let database = MemoryDatabase::new(domain.clone());
    assert!(matches!(
        EntityTestUnit::new(domain, database),
        Err(LifecycleError::Domain(_))
    ));
}

#[test]
fn non_finite_generator_fence_is_rejected_up_front() {
    let database = MemoryDatabase::new(music_domain());
    let mut config = config(1);
    config.generator.global_min = f64::NEG_INFINITY;

    let result = EntityTestUnit::with_config(
        database.domain().clone(),
        database,
        fixtura_generate::DefaultHooks,
        config,
    );
    assert!(matches!(
        result,
        Err(LifecycleError::Config(ConfigError::Invalid(_)))
    ));
}

struct Untouched;

impl FixtureHooks for Untouched {
    fn modify_entity(
        &mut self,
        _entity: &mut Entity,
        _definition: &EntityDefinition,
        _resolved: &ResolvedForeignKeys,
    ) -> bool {
        true
    }
}

#[test]
fn unmodified_entity_skips_the_update() {
    let database = MemoryDatabase::new(music_domain());
    let mut unit = unit(&database).with_hooks(Untouched);

    let report = unit.test(&entity_type("Artist")).expect("artist lifecycle");

    assert!(report.update_skipped());
    assert!(!report.reached(LifecycleStage::Updated));
    assert_eq!(
        report.stages,
        vec![
            LifecycleStage::Start,
            LifecycleStage::DependenciesResolved,
            LifecycleStage::Inserted,
            LifecycleStage::SelectVerified,
            LifecycleStage::UpdateSkipped,
            LifecycleStage::SelectVerified,
            LifecycleStage::DeleteVerified,
            LifecycleStage::End,
        ]
    );
    assert_eq!(database.total_rows(), 0);
}

/// Misbehaviour injected into a [`MemoryGateway`].
#[derive(Debug, Clone, Copy, PartialEq)]
enum Fault {
    /// Update keeps the stored references.
    StaleReferences,
    /// Update keeps the stored value of one column.
    StaleColumn(&'static str),
    /// Update fails outright.
    FailedUpdate,
    /// Delete reports success but keeps the rows.
    KeptRows,
}

struct FaultyDatabase {
    database: MemoryDatabase,
    fault: Fault,
}

impl ConnectionProvider for FaultyDatabase {
    type Gateway = FaultyGateway;

    fn connect(&mut self) -> Result<FaultyGateway, GatewayError> {
        Ok(FaultyGateway {
            inner: self.database.connect()?,
            fault: self.fault,
        })
    }
}

struct FaultyGateway {
    inner: MemoryGateway,
    fault: Fault,
}

impl Gateway for FaultyGateway {
    fn begin_transaction(&mut self) -> Result<(), GatewayError> {
        self.inner.begin_transaction()
    }

    fn rollback_transaction(&mut self) -> Result<(), GatewayError> {
        self.inner.rollback_transaction()
    }

    fn is_transaction_open(&self) -> bool {
        self.inner.is_transaction_open()
    }

    fn close(&mut self) -> Result<(), GatewayError> {
        self.inner.close()
    }

    fn insert(&mut self, entity: &Entity) -> Result<Key, GatewayError> {
        self.inner.insert(entity)
    }

    fn select_by_key(&mut self, key: &Key) -> Result<Entity, GatewayError> {
        self.inner.select_by_key(key)
    }

    fn select_many(&mut self, keys: &[Key]) -> Result<Vec<Entity>, GatewayError> {
        self.inner.select_many(keys)
    }

    fn select_bounded(
        &mut self,
        entity_type: &EntityType,
        limit: usize,
    ) -> Result<Vec<Entity>, GatewayError> {
        self.inner.select_bounded(entity_type, limit)
    }

    fn update(&mut self, entity: &Entity) -> Result<Entity, GatewayError> {
        let mut entity = entity.clone();
        match self.fault {
            Fault::FailedUpdate => {
                return Err(GatewayError::Persistence("disk full".to_string()));
            }
            Fault::StaleReferences | Fault::StaleColumn(_) => {
                let stored = self.inner.select_by_key(&entity.key())?;
                for (name, value) in stored.values() {
                    let stale = match self.fault {
                        Fault::StaleColumn(column) => name == column,
                        _ => matches!(value, Value::Entity(_)),
                    };
                    if stale {
                        entity.put(name.clone(), value.clone());
                    }
                }
            }
            Fault::KeptRows => {}
        }
        self.inner.update(&entity)
    }

    fn delete(&mut self, keys: &[Key]) -> Result<usize, GatewayError> {
        if self.fault == Fault::KeptRows {
            return Ok(keys.len());
        }
        self.inner.delete(keys)
    }
}

fn faulty_test(name: &str, fault: Fault) -> (LifecycleError, MemoryDatabase) {
    let database = MemoryDatabase::new(music_domain());
    let provider = FaultyDatabase {
        database: database.clone(),
        fault,
    };
    let mut unit = EntityTestUnit::with_config(
        database.domain().clone(),
        provider,
        fixtura_generate::DefaultHooks,
        config(2024),
    )
    .expect("valid domain");
    let err = unit.test(&entity_type(name)).unwrap_err();
    (err, database)
}

fn assertion_message(err: LifecycleError) -> String {
    match err {
        LifecycleError::Assertion { message, .. } => message,
        other => panic!("unexpected error {other}"),
    }
}

#[test]
fn lost_reference_update_is_detected() {
    let (err, database) = faulty_test("Album", Fault::StaleReferences);

    let message = assertion_message(err);
    assert!(
        message.starts_with("reference artist should be equal after update"),
        "{message}"
    );
    assert_eq!(database.insert_count(&entity_type("Artist")), 2);
    assert_eq!(database.total_rows(), 0);
}

#[test]
fn lost_column_update_is_detected() {
    let (err, database) = faulty_test("Album", Fault::StaleColumn("title"));

    let message = assertion_message(err);
    assert!(
        message.starts_with("values of title should be equal after update"),
        "{message}"
    );
    assert_eq!(database.total_rows(), 0);
}

#[test]
fn row_surviving_delete_is_detected() {
    let (err, database) = faulty_test("Artist", Fault::KeptRows);

    let message = assertion_message(err);
    assert!(message.ends_with("still selectable after delete"), "{message}");
    assert_eq!(database.total_rows(), 0);
}

#[test]
fn gateway_failure_names_the_offending_entity() {
    let (err, database) = faulty_test("Artist", Fault::FailedUpdate);

    let rendered = err.to_string();
    match err {
        LifecycleError::Persistence { entity, source } => {
            assert!(entity.starts_with("Artist {"), "{entity}");
            assert!(entity.contains("artistid: "), "{entity}");
            assert!(matches!(source, GatewayError::Persistence(_)));
            assert!(rendered.starts_with("persistence error: disk full ["), "{rendered}");
            assert!(rendered.ends_with(&format!("[{entity}]")), "{rendered}");
        }
        other => panic!("unexpected error {other}"),
    }
    assert_eq!(database.total_rows(), 0);
}
