//! Analysis module for contract-lock
//!
//! This module contains:
//! - `conditions`: contradiction detection over free-text conditions
//! - `types`: declared-type compatibility (contract types and JSON-schema types)

pub mod conditions;
pub mod types;

pub use conditions::{
    are_contradictory, find_contradictions, find_contradictions_between, mentions_token, substitute_token,
    ContradictionReport, Operator,
};
pub use types::{are_compatible, schema_primitives_compatible, schema_types_compatible, split_generic, SchemaType};
