use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use fixtura_core::EntityType;

/// Milestones of one entity lifecycle test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleStage {
    Start,
    DependenciesResolved,
    Inserted,
    SelectVerified,
    Updated,
    UpdateSkipped,
    UpdateVerified,
    DeleteVerified,
    End,
}

/// Outcome of a passing lifecycle test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LifecycleReport {
    pub entity_type: EntityType,
    pub seed: u64,
    pub read_only: bool,
    /// Stages reached, in order.
    pub stages: Vec<LifecycleStage>,
    /// Reference rows inserted while resolving dependencies.
    pub references_inserted: usize,
    pub duration_ms: u64,
}

impl LifecycleReport {
    pub fn new(entity_type: EntityType, seed: u64, read_only: bool) -> Self {
        Self {
            entity_type,
            seed,
            read_only,
            stages: vec![LifecycleStage::Start],
            references_inserted: 0,
            duration_ms: 0,
        }
    }

    pub fn record(&mut self, stage: LifecycleStage) {
        self.stages.push(stage);
    }

    pub fn reached(&self, stage: LifecycleStage) -> bool {
        self.stages.contains(&stage)
    }

    pub fn update_skipped(&self) -> bool {
        self.reached(LifecycleStage::UpdateSkipped)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TypeOutcome {
    Passed { report: LifecycleReport },
    Failed { entity_type: EntityType, message: String },
}

impl TypeOutcome {
    pub fn entity_type(&self) -> &EntityType {
        match self {
            TypeOutcome::Passed { report } => &report.entity_type,
            TypeOutcome::Failed { entity_type, .. } => entity_type,
        }
    }

    pub fn is_passed(&self) -> bool {
        matches!(self, TypeOutcome::Passed { .. })
    }
}

/// Results of testing every entity type of a domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuiteReport {
    pub run_id: Uuid,
    pub domain: String,
    pub seed: u64,
    pub started_at: DateTime<Utc>,
    pub outcomes: Vec<TypeOutcome>,
}

impl SuiteReport {
    pub fn new(domain: impl Into<String>, seed: u64) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            domain: domain.into(),
            seed,
            started_at: Utc::now(),
            outcomes: Vec::new(),
        }
    }

    pub fn passed(&self) -> usize {
        self.outcomes.iter().filter(|outcome| outcome.is_passed()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.passed()
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    pub fn failures(&self) -> impl Iterator<Item = (&EntityType, &str)> {
        self.outcomes.iter().filter_map(|outcome| match outcome {
            TypeOutcome::Failed {
                entity_type,
                message,
            } => Some((entity_type, message.as_str())),
            TypeOutcome::Passed { .. } => None,
        })
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
