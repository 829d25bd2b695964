use std::time::Instant;

use rust_decimal::Decimal;
use tracing::{debug, error, info, warn};

use fixtura_core::{
    ConnectionProvider, Domain, Entity, EntityDefinition, EntityType, Gateway, Key, Value,
    build_fk_graph_report, validate_domain,
};
use fixtura_generate::{
    ColumnFilter, DefaultHooks, DependencyResolver, FixtureHooks, ResolvedForeignKeys,
    ValueGenerator, random_entity, randomize,
};

use crate::config::TestUnitConfig;
use crate::errors::LifecycleError;
use crate::model::{LifecycleReport, LifecycleStage, SuiteReport, TypeOutcome};
use crate::transaction::TransactionScope;

/// Runs the insert/select/update/delete lifecycle test of entity types
/// against a gateway, inside a transaction that is always rolled back.
pub struct EntityTestUnit<P, H = DefaultHooks> {
    domain: Domain,
    provider: P,
    hooks: H,
    config: TestUnitConfig,
    seed: u64,
    generator: ValueGenerator,
}

impl<P: ConnectionProvider> EntityTestUnit<P, DefaultHooks> {
    pub fn new(domain: Domain, provider: P) -> Result<Self, LifecycleError> {
        Self::with_config(domain, provider, DefaultHooks, TestUnitConfig::default())
    }
}

impl<P: ConnectionProvider, H: FixtureHooks> EntityTestUnit<P, H> {
    /// Validates the domain and seeds the generator. A random seed is drawn
    /// and logged when the config carries none.
    pub fn with_config(
        domain: Domain,
        provider: P,
        hooks: H,
        config: TestUnitConfig,
    ) -> Result<Self, LifecycleError> {
        validate_domain(&domain)?;
        config.validate()?;

        let seed = config.seed.unwrap_or_else(rand::random::<u64>);
        info!(
            domain = %domain.name,
            seed,
            configured = config.seed.is_some(),
            "entity test unit seeded"
        );
        let generator = ValueGenerator::seeded(config.generator.clone(), seed);

        Ok(Self {
            domain,
            provider,
            hooks,
            config,
            seed,
            generator,
        })
    }

    pub fn with_hooks<H2: FixtureHooks>(self, hooks: H2) -> EntityTestUnit<P, H2> {
        EntityTestUnit {
            domain: self.domain,
            provider: self.provider,
            hooks,
            config: self.config,
            seed: self.seed,
            generator: self.generator,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn domain(&self) -> &Domain {
        &self.domain
    }

    pub fn config(&self) -> &TestUnitConfig {
        &self.config
    }

    pub fn hooks(&self) -> &H {
        &self.hooks
    }

    pub fn hooks_mut(&mut self) -> &mut H {
        &mut self.hooks
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Runs the full lifecycle test for `entity_type`.
    ///
    /// The first failed check or gateway error aborts the test. The
    /// transaction is rolled back and the connection closed on every path.
    pub fn test(&mut self, entity_type: &EntityType) -> Result<LifecycleReport, LifecycleError> {
        let start = Instant::now();
        let definition = self.domain.definition(entity_type)?.clone();
        let mut report = LifecycleReport::new(entity_type.clone(), self.seed, definition.read_only);
        info!(
            entity_type = %entity_type,
            seed = self.seed,
            read_only = definition.read_only,
            "lifecycle test started"
        );

        let gateway = self
            .provider
            .connect()
            .map_err(|source| LifecycleError::persistence(entity_type, source))?;
        let mut scope = TransactionScope::begin(gateway)
            .map_err(|source| LifecycleError::persistence(entity_type, source))?;

        let outcome = self.run_lifecycle(&definition, &mut *scope, &mut report);
        if let Err(err) = self.hooks.tear_down(&mut *scope) {
            warn!(entity_type = %entity_type, error = %err, "tear down failed");
        }
        drop(scope);

        report.duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        match outcome {
            Ok(()) => {
                report.record(LifecycleStage::End);
                info!(
                    entity_type = %entity_type,
                    stages = report.stages.len(),
                    references_inserted = report.references_inserted,
                    duration_ms = report.duration_ms,
                    "lifecycle test passed"
                );
                Ok(report)
            }
            Err(err) => {
                error!(
                    entity_type = %entity_type,
                    seed = self.seed,
                    error = %err,
                    duration_ms = report.duration_ms,
                    "lifecycle test failed"
                );
                Err(err)
            }
        }
    }

    /// Tests every entity type, referenced types first, collecting the
    /// outcome of each instead of stopping at the first failure.
    pub fn test_all(&mut self) -> SuiteReport {
        let graph = build_fk_graph_report(&self.domain);
        let order = match graph.topo_order {
            Some(order) => order,
            None => {
                warn!(
                    domain = %self.domain.name,
                    cycle = ?graph.cycle,
                    "foreign keys form a cycle, testing in declaration order"
                );
                self.domain.entity_types().cloned().collect()
            }
        };

        let mut suite = SuiteReport::new(self.domain.name.clone(), self.seed);
        for entity_type in order {
            let outcome = match self.test(&entity_type) {
                Ok(report) => TypeOutcome::Passed { report },
                Err(err) => TypeOutcome::Failed {
                    entity_type,
                    message: err.to_string(),
                },
            };
            suite.outcomes.push(outcome);
        }

        info!(
            run_id = %suite.run_id,
            passed = suite.passed(),
            failed = suite.failed(),
            "entity test suite finished"
        );
        suite
    }

    fn run_lifecycle(
        &mut self,
        definition: &EntityDefinition,
        gateway: &mut dyn Gateway,
        report: &mut LifecycleReport,
    ) -> Result<(), LifecycleError> {
        let entity_type = &definition.entity_type;
        self.hooks
            .set_up(gateway)
            .map_err(|source| LifecycleError::persistence(entity_type, source))?;

        let mut resolved = ResolvedForeignKeys::new();
        report.references_inserted += self.resolve(entity_type, &mut resolved, gateway)?;
        report.record(LifecycleStage::DependenciesResolved);

        let subject = if definition.read_only {
            None
        } else {
            let inserted = self.test_insert(definition, &resolved, gateway)?;
            report.record(LifecycleStage::Inserted);
            report.record(LifecycleStage::SelectVerified);

            resolved.refresh_for(entity_type);
            report.references_inserted += self.resolve(entity_type, &mut resolved, gateway)?;
            Some(self.test_update(definition, inserted, &resolved, gateway, report)?)
        };

        self.test_select(entity_type, subject.as_ref(), gateway)?;
        report.record(LifecycleStage::SelectVerified);

        if let Some(subject) = subject {
            test_delete(&subject, gateway)?;
            report.record(LifecycleStage::DeleteVerified);
        }
        Ok(())
    }

    /// Returns the number of reference rows inserted.
    fn resolve(
        &mut self,
        entity_type: &EntityType,
        resolved: &mut ResolvedForeignKeys,
        gateway: &mut dyn Gateway,
    ) -> Result<usize, LifecycleError> {
        let mut resolver = DependencyResolver::new(&self.domain, &mut self.generator, &mut self.hooks);
        resolver.resolve(entity_type, resolved, gateway)?;
        debug!(
            entity_type = %entity_type,
            resolved = resolved.len(),
            inserted = resolver.inserted(),
            "dependencies resolved"
        );
        Ok(resolver.inserted())
    }

    fn test_insert(
        &mut self,
        definition: &EntityDefinition,
        resolved: &ResolvedForeignKeys,
        gateway: &mut dyn Gateway,
    ) -> Result<Entity, LifecycleError> {
        let entity_type = &definition.entity_type;
        let entity = match self.hooks.test_entity(definition, resolved) {
            Some(entity) if entity.entity_type() != entity_type => {
                return Err(LifecycleError::assertion(
                    entity_type,
                    format!("test entity has type {}", entity.entity_type()),
                ));
            }
            Some(entity) => entity,
            None => random_entity(&mut self.generator, definition, resolved)?,
        };

        let key = gateway
            .insert(&entity)
            .map_err(|source| LifecycleError::persistence(&entity, source))?;
        if !key.is_populated() {
            return Err(LifecycleError::assertion(
                entity_type,
                format!("insert returned an incomplete key {key}"),
            ));
        }

        let inserted = gateway.select_by_key(&key).map_err(|source| {
            if source.is_not_found() {
                LifecycleError::assertion(entity_type, format!("{key} not returned by select after insert"))
            } else {
                LifecycleError::persistence(&key, source)
            }
        })?;
        if inserted.key() != key {
            return Err(LifecycleError::assertion(
                entity_type,
                format!("select for {key} returned {}", inserted.key()),
            ));
        }
        debug!(entity_type = %entity_type, key = %key, "entity inserted");
        Ok(inserted)
    }

    /// Returns the entity the remaining checks run against.
    fn test_update(
        &mut self,
        definition: &EntityDefinition,
        mut entity: Entity,
        resolved: &ResolvedForeignKeys,
        gateway: &mut dyn Gateway,
        report: &mut LifecycleReport,
    ) -> Result<Entity, LifecycleError> {
        let entity_type = &definition.entity_type;
        if !self.hooks.modify_entity(&mut entity, definition, resolved) {
            randomize(&mut self.generator, &mut entity, definition, resolved)?;
        }
        if !entity.modified() {
            debug!(entity_type = %entity_type, "entity not modified, update skipped");
            report.record(LifecycleStage::UpdateSkipped);
            return Ok(entity);
        }

        let updated = gateway
            .update(&entity)
            .map_err(|source| LifecycleError::persistence(&entity, source))?;
        report.record(LifecycleStage::Updated);

        if updated.key() != entity.key() {
            return Err(LifecycleError::assertion(
                entity_type,
                format!("update changed key {} to {}", entity.key(), updated.key()),
            ));
        }
        for column in &definition.columns {
            if !ColumnFilter::Updatable.accepts(definition, column) {
                continue;
            }
            let before = entity.get(&column.name);
            let after = updated.get(&column.name);
            if !values_match(before, after) {
                return Err(LifecycleError::assertion(
                    entity_type,
                    format!(
                        "values of {} should be equal after update [{}, {}]",
                        column.name,
                        display(before),
                        display(after)
                    ),
                ));
            }
        }
        for fk in &definition.foreign_keys {
            if !ColumnFilter::Updatable.accepts_foreign_key(fk) {
                continue;
            }
            let before = reference_key(entity.get(fk.name()));
            let after = reference_key(updated.get(fk.name()));
            if before != after {
                return Err(LifecycleError::assertion(
                    entity_type,
                    format!(
                        "reference {} should be equal after update [{}, {}]",
                        fk.name(),
                        display_key(before.as_ref()),
                        display_key(after.as_ref())
                    ),
                ));
            }
        }
        report.record(LifecycleStage::UpdateVerified);
        Ok(updated)
    }

    fn test_select(
        &mut self,
        entity_type: &EntityType,
        subject: Option<&Entity>,
        gateway: &mut dyn Gateway,
    ) -> Result<(), LifecycleError> {
        match subject {
            Some(subject) => {
                let key = subject.key();
                let selected = gateway
                    .select_by_key(&key)
                    .map_err(|source| LifecycleError::persistence(&key, source))?;
                if &selected != subject {
                    return Err(LifecycleError::assertion(
                        entity_type,
                        format!("selected {selected} differs from {subject}"),
                    ));
                }
            }
            None => {
                let rows = gateway
                    .select_bounded(entity_type, self.config.select_fetch_count)
                    .map_err(|source| LifecycleError::persistence(entity_type, source))?;
                debug!(entity_type = %entity_type, rows = rows.len(), "bounded select");
            }
        }
        Ok(())
    }
}

fn test_delete(subject: &Entity, gateway: &mut dyn Gateway) -> Result<(), LifecycleError> {
    let entity_type = subject.entity_type();
    let key = subject.key();
    let deleted = gateway
        .delete(std::slice::from_ref(&key))
        .map_err(|source| LifecycleError::persistence(&key, source))?;
    if deleted != 1 {
        return Err(LifecycleError::assertion(
            entity_type,
            format!("expected one deleted row for {key}, got {deleted}"),
        ));
    }

    match gateway.select_by_key(&key) {
        Err(err) if err.is_not_found() => Ok(()),
        Err(source) => Err(LifecycleError::persistence(&key, source)),
        Ok(_) => Err(LifecycleError::assertion(
            entity_type,
            format!("{key} still selectable after delete"),
        )),
    }
}

/// Decimals compare by numeric value, ignoring scale.
fn values_match(before: Option<&Value>, after: Option<&Value>) -> bool {
    let before = before.unwrap_or(&Value::Null);
    let after = after.unwrap_or(&Value::Null);
    match (before, after) {
        (Value::Decimal(left), Value::Decimal(right)) => decimal_eq(*left, *right),
        (Value::Bytes(left), Value::Bytes(right)) => left == right,
        _ => before == after,
    }
}

fn decimal_eq(left: Decimal, right: Decimal) -> bool {
    left.normalize() == right.normalize()
}

fn display(value: Option<&Value>) -> String {
    value.map_or_else(|| "null".to_string(), Value::to_string)
}

/// Key of the referenced entity; absent and null references have none.
fn reference_key(value: Option<&Value>) -> Option<Key> {
    match value {
        Some(Value::Entity(referenced)) => Some(referenced.key()),
        _ => None,
    }
}

fn display_key(key: Option<&Key>) -> String {
    key.map_or_else(|| "null".to_string(), Key::to_string)
}
