//! CLI module for contract-lock
//!
//! Handles module selection, run orchestration and output formatting

pub mod filters;
pub mod output;
pub mod verify;
