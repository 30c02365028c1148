//! Batch execution of validation cases.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use guardrule_core::dependency::Collaborators;
use guardrule_core::registry::{FactoryRegistry, ValidatorRegistry};
use guardrule_core::types::Record;
use guardrule_core::validator::RuleViolation;
use guardrule_store::MemoryStore;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One validation to run: a registry name, its options and the input.
#[derive(Debug, Clone, Deserialize)]
pub struct Case {
    pub name: String,
    pub validator: String,
    #[serde(default)]
    pub options: serde_json::Map<String, Value>,
    #[serde(default)]
    pub value: Value,
    #[serde(default)]
    pub record: Record,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CaseStatus {
    Passed,
    Failed { violations: Vec<RuleViolation> },
    Errored { error: String },
}

/// Result line printed for each case.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaseReport {
    pub name: String,
    #[serde(flatten)]
    pub status: CaseStatus,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub cases: usize,
    pub passed: usize,
    pub failed: usize,
    pub errored: usize,
}

pub fn load_cases(path: &Path) -> anyhow::Result<Vec<Case>> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read case file {}", path.display()))?;
    serde_json::from_str(&json)
        .with_context(|| format!("Invalid case file {}", path.display()))
}

/// Registry with the built-in validators, backed by `store` when given.
pub fn build_registry(store: Option<MemoryStore>) -> Arc<FactoryRegistry> {
    let mut collaborators = Collaborators::new();
    if let Some(store) = store {
        collaborators.callbacks = store.callbacks();
        collaborators = collaborators.with_store(Arc::new(store));
    }
    FactoryRegistry::with_builtins(collaborators, |_| {})
}

pub fn run_case(registry: &dyn ValidatorRegistry, case: &Case) -> CaseReport {
    let outcome = registry
        .resolve(&case.validator, &case.options)
        .and_then(|validator| validator.validate(&case.value, &case.record));

    let status = match outcome {
        Ok(result) if result.is_valid => CaseStatus::Passed,
        Ok(result) => CaseStatus::Failed {
            violations: result.violations,
        },
        Err(err) => {
            tracing::warn!(case = %case.name, error = %err, "Case errored");
            CaseStatus::Errored {
                error: err.to_string(),
            }
        }
    };

    CaseReport {
        name: case.name.clone(),
        status,
    }
}

pub fn run_cases(registry: &dyn ValidatorRegistry, cases: &[Case]) -> (Vec<CaseReport>, RunSummary) {
    let mut summary = RunSummary::default();
    let reports: Vec<CaseReport> = cases
        .iter()
        .map(|case| {
            let report = run_case(registry, case);
            summary.cases += 1;
            match report.status {
                CaseStatus::Passed => summary.passed += 1,
                CaseStatus::Failed { .. } => summary.failed += 1,
                CaseStatus::Errored { .. } => summary.errored += 1,
            }
            report
        })
        .collect();
    (reports, summary)
}
