//! Run orchestration
//!
//! Loads a directory, runs one family of checks and collects the outcome as a
//! [`RunReport`] for the output formatters.

use crate::cli::filters::{select_contracts, select_schemas};
use contract_lock::check::schema::{check_example_round_trip, check_schema_compatibility};
use contract_lock::{
    check_consistency, check_error_consistency, check_pairing, check_references, load_contracts, load_schemas,
    CompatibilityConfig, Contract, Error, LoadFailure, LoaderConfig, Problem, SchemaFile,
};
use serde::Serialize;
use std::path::Path;
use tracing::info;

/// Findings for one checked subject (a contract, a schema, or a pair)
#[derive(Debug, Clone, Serialize)]
pub struct SubjectReport {
    pub subject: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
    pub problems: Vec<Problem>,
}

impl SubjectReport {
    fn passed(&self) -> bool {
        self.problems.is_empty()
    }
}

/// A file excluded from the run
#[derive(Debug, Clone, Serialize)]
pub struct FailureEntry {
    pub path: String,
    pub error: String,
}

impl From<LoadFailure> for FailureEntry {
    fn from(failure: LoadFailure) -> Self {
        FailureEntry {
            path: failure.path.display().to_string(),
            error: failure.error.to_string(),
        }
    }
}

/// Outcome of one run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub check: &'static str,
    pub subjects: Vec<SubjectReport>,
    pub failures: Vec<FailureEntry>,
    /// Set when the compatibility check aborted on a contradiction
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hard_incompatibility: Option<String>,
}

impl RunReport {
    fn new(check: &'static str, failures: Vec<LoadFailure>) -> Self {
        RunReport {
            check,
            subjects: Vec::new(),
            failures: failures.into_iter().map(FailureEntry::from).collect(),
            hard_incompatibility: None,
        }
    }

    pub fn problem_count(&self) -> usize {
        self.subjects.iter().map(|s| s.problems.len()).sum()
    }

    pub fn passed_count(&self) -> usize {
        self.subjects.iter().filter(|s| s.passed()).count()
    }

    /// A run fails on any problem, any excluded file, or a hard incompatibility
    pub fn is_failure(&self) -> bool {
        self.problem_count() > 0 || !self.failures.is_empty() || self.hard_incompatibility.is_some()
    }
}

/// Consistency check over every contract in `dir` (optionally one module)
pub fn run_consistency(dir: &Path, loader: &LoaderConfig, module: Option<&str>) -> contract_lock::Result<RunReport> {
    let loaded = load_contracts(dir, loader)?;
    let contracts = match module {
        Some(module) => select_contracts(&loaded.items, module),
        None => loaded.items.clone(),
    };

    let mut report = RunReport::new("consistency", loaded.failures);
    for contract in &contracts {
        report.subjects.push(SubjectReport {
            subject: format!("{} ({})", contract.name, contract.path),
            fingerprint: Some(contract.fingerprint.clone()),
            problems: check_consistency(contract),
        });
    }
    info!(contracts = contracts.len(), problems = report.problem_count(), "consistency run complete");
    Ok(report)
}

/// Producer/consumer compatibility between two modules of `dir`
pub fn run_compatibility(
    dir: &Path,
    loader: &LoaderConfig,
    compat: &CompatibilityConfig,
    producer: &str,
    consumer: &str,
) -> contract_lock::Result<RunReport> {
    let loaded = load_contracts(dir, loader)?;
    let producers = select_contracts(&loaded.items, producer);
    let consumers = select_contracts(&loaded.items, consumer);
    info!(producers = producers.len(), consumers = consumers.len(), "checking compatibility");

    let mut report = RunReport::new("compatibility", loaded.failures);
    let subject = format!("{} -> {}", module_label(producer, &producers), module_label(consumer, &consumers));
    // Workspace problems are kept even when the pairing aborts
    let mut problems = check_references(producers.iter().chain(&consumers));
    problems.extend(check_error_consistency(producers.iter().chain(&consumers)));
    match check_pairing(&producers, &consumers, compat) {
        Ok(()) => {}
        Err(err @ Error::HardIncompatibility { .. }) => report.hard_incompatibility = Some(err.to_string()),
        Err(err) => return Err(err),
    }
    report.subjects.push(SubjectReport { subject, fingerprint: None, problems });
    Ok(report)
}

fn module_label(module: &str, contracts: &[Contract]) -> String {
    let names: Vec<&str> = contracts.iter().map(|c| c.name.as_str()).collect();
    if names.is_empty() {
        module.to_string()
    } else {
        format!("{} [{}]", module, names.join(", "))
    }
}

/// Schema self-consistency for every schema in `dir`, then cross-schema
/// comparison: producer against consumer schemas when both modules are
/// given, every unordered pair otherwise
pub fn run_schemas(
    dir: &Path,
    loader: &LoaderConfig,
    producer: Option<&str>,
    consumer: Option<&str>,
) -> contract_lock::Result<RunReport> {
    let loaded = load_schemas(dir, loader)?;
    let schemas = loaded.items.clone();
    let mut report = RunReport::new("schemas", loaded.failures);

    for schema in &schemas {
        report.subjects.push(SubjectReport {
            subject: schema.path.display().to_string(),
            fingerprint: None,
            problems: check_example_round_trip(&schema.schema),
        });
    }

    let pairs: Vec<(&SchemaFile, &SchemaFile)> = match (producer, consumer) {
        (Some(producer), Some(consumer)) => {
            let producers = select_schemas(&schemas, producer);
            let consumers = select_schemas(&schemas, consumer);
            producers
                .into_iter()
                .flat_map(|p| consumers.iter().copied().filter(move |c| c.path != p.path).map(move |c| (p, c)))
                .collect()
        }
        _ => schemas
            .iter()
            .enumerate()
            .flat_map(|(i, a)| schemas[i + 1..].iter().map(move |b| (a, b)))
            .collect(),
    };

    for (a, b) in pairs {
        report.subjects.push(SubjectReport {
            subject: format!("{} <-> {}", a.path.display(), b.path.display()),
            fingerprint: None,
            problems: check_schema_compatibility(&a.schema, &b.schema),
        });
    }
    info!(schemas = schemas.len(), problems = report.problem_count(), "schema run complete");
    Ok(report)
}
