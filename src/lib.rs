//! # contract-lock
//!
//! Contract Lock: design-by-contract extraction and compatibility verification
//! for markdown interface contracts.
//!
//! This crate provides:
//! - A document parser turning markdown contract documents into a [`Contract`]
//!   model (methods, pre/postconditions, invariants, signatures)
//! - Consistency checks over a single contract
//! - Producer/consumer compatibility checks across contracts
//! - JSON-schema meta validation, example generation and cross-schema comparison
//! - CLI tool (`contract-lock`) wiring the above over a directory
//!
//! ## Usage
//!
//! ```no_run
//! use contract_lock::{check_compatibility, check_consistency, load_contracts, LoaderConfig};
//! use std::path::Path;
//!
//! # fn main() -> contract_lock::Result<()> {
//! let workspace = load_contracts(Path::new("contracts"), &LoaderConfig::default())?;
//! for contract in &workspace.items {
//!     for problem in check_consistency(contract) {
//!         println!("{problem}");
//!     }
//! }
//! let problems = check_compatibility(&workspace.items[..1], &workspace.items[1..])?;
//! # let _ = problems;
//! # Ok(())
//! # }
//! ```
//!
//! Contradiction detection and type compatibility are heuristics over the
//! text of conditions and type names. They miss contradictions that need
//! arithmetic or transitive reasoning, and never execute or type-check code.

pub mod analysis;
pub mod check;
pub mod config;
pub mod error;
pub mod loader;
pub mod parser;
pub mod report;

pub use analysis::{are_compatible, find_contradictions, find_contradictions_between, ContradictionReport};
pub use check::{
    check_compatibility, check_compatibility_with, check_consistency, check_error_consistency,
    check_example_round_trip, check_pairing, check_references, check_schema_compatibility, generate_example,
    validate_instance, validate_schema,
};
pub use config::{CompatibilityConfig, LoaderConfig};
pub use error::{Error, Result};
pub use loader::{load_contract_files, load_contracts, load_schemas, LoadFailure, Loaded, SchemaFile};
pub use parser::{Condition, Contract, ContractElement, DocumentParser, ElementKind, ErrorDescriptor, Parameter};
pub use report::{Problem, ProblemKind};
