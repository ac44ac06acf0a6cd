//! Module selection
//!
//! A module is named by a substring of the file path (`converter`,
//! `database-loader`); matching ignores case.

use contract_lock::{Contract, SchemaFile};
use std::path::Path;

/// Contracts whose source path mentions `module`
pub fn select_contracts(contracts: &[Contract], module: &str) -> Vec<Contract> {
    contracts
        .iter()
        .filter(|c| matches_module(Path::new(&c.path), module))
        .cloned()
        .collect()
}

/// Schemas whose path mentions `module`
pub fn select_schemas<'a>(schemas: &'a [SchemaFile], module: &str) -> Vec<&'a SchemaFile> {
    schemas.iter().filter(|s| matches_module(&s.path, module)).collect()
}

/// Check if a file path matches a module name
fn matches_module(path: &Path, module: &str) -> bool {
    path.to_string_lossy().to_lowercase().contains(&module.to_lowercase())
}
