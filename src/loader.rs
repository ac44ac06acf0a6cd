//! Directory discovery and loading
//!
//! Walks a single directory level for contract documents and schema files.
//! A failure in one file is logged and recorded; it never aborts the walk.

use crate::check::schema::load_valid_schema;
use crate::config::LoaderConfig;
use crate::error::{Error, Result};
use crate::parser::contracts::Contract;
use crate::parser::document::DocumentParser;
use serde_json::Value;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

/// A file that could not be loaded
#[derive(Debug)]
pub struct LoadFailure {
    pub path: PathBuf,
    pub error: Error,
}

/// Loaded items plus the files that failed
#[derive(Debug)]
pub struct Loaded<T> {
    pub items: Vec<T>,
    pub failures: Vec<LoadFailure>,
}

impl<T> Default for Loaded<T> {
    fn default() -> Self {
        Loaded {
            items: Vec::new(),
            failures: Vec::new(),
        }
    }
}

/// A schema document and where it came from
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaFile {
    pub path: PathBuf,
    pub schema: Value,
}

/// Contract documents directly inside `dir`, sorted by file name
///
/// The index file is skipped by exact name; subdirectories are not entered.
pub fn discover_documents(dir: &Path, config: &LoaderConfig) -> Result<Vec<PathBuf>> {
    let files = discover(dir, &config.document_extension)?;
    Ok(files
        .into_iter()
        .filter(|path| path.file_name().and_then(|n| n.to_str()) != Some(config.index_file.as_str()))
        .collect())
}

/// Schema files directly inside `dir`, sorted by file name
pub fn discover_schemas(dir: &Path, config: &LoaderConfig) -> Result<Vec<PathBuf>> {
    discover(dir, &config.schema_extension)
}

fn discover(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(Error::NotFound { path: dir.to_path_buf() });
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "skipping unreadable directory entry");
                continue;
            }
        };
        if entry.file_type().is_file() && entry.path().extension().and_then(|e| e.to_str()) == Some(extension) {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// Parse every contract document in `dir`
pub fn load_contracts(dir: &Path, config: &LoaderConfig) -> Result<Loaded<Contract>> {
    let paths = discover_documents(dir, config)?;
    let loaded = load_contract_files(&paths)?;
    info!(
        dir = %dir.display(),
        contracts = loaded.items.len(),
        failures = loaded.failures.len(),
        "loaded contract workspace"
    );
    Ok(loaded)
}

/// Parse the given documents; a path listed twice is loaded once
pub fn load_contract_files(paths: &[PathBuf]) -> Result<Loaded<Contract>> {
    let parser = DocumentParser::new()?;
    let mut seen = HashSet::new();
    let mut loaded = Loaded::default();

    for path in paths {
        if !seen.insert(path.clone()) {
            warn!(path = %path.display(), "duplicate contract path, keeping the first");
            continue;
        }
        match parser.parse_file(path) {
            Ok(contract) => loaded.items.push(contract),
            Err(error) => {
                warn!(path = %path.display(), error = %error, "skipping contract document");
                loaded.failures.push(LoadFailure { path: path.clone(), error });
            }
        }
    }
    Ok(loaded)
}

/// Load and meta-validate every schema in `dir`
pub fn load_schemas(dir: &Path, config: &LoaderConfig) -> Result<Loaded<SchemaFile>> {
    let mut loaded = Loaded::default();
    for path in discover_schemas(dir, config)? {
        match load_valid_schema(&path) {
            Ok(schema) => loaded.items.push(SchemaFile { path, schema }),
            Err(error) => {
                warn!(path = %path.display(), error = %error, "skipping schema");
                loaded.failures.push(LoadFailure { path, error });
            }
        }
    }
    info!(
        dir = %dir.display(),
        schemas = loaded.items.len(),
        failures = loaded.failures.len(),
        "loaded schemas"
    );
    Ok(loaded)
}
