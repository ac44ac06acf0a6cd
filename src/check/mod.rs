//! Checkers for contract-lock
//!
//! This module contains:
//! - `consistency`: single-contract checks (missing conditions, contradictions, descriptions)
//! - `compatibility`: producer/consumer pairing, references, error-kind agreement
//! - `schema`: JSON-schema meta validation, example round trip, cross-schema comparison

pub mod compatibility;
pub mod consistency;
pub mod schema;

pub use compatibility::{
    check_compatibility, check_compatibility_with, check_error_consistency, check_pairing, check_references,
};
pub use consistency::check_consistency;
pub use schema::{
    check_example_round_trip, check_schema_compatibility, generate_example, load_schema, load_valid_schema,
    meta_violations, validate_instance, validate_schema,
};
