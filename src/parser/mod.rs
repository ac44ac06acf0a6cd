//! Parser module for contract-lock
//!
//! This module contains:
//! - `contracts`: the in-memory contract model
//! - `document`: parses markdown contract documents into [`Contract`]s
//! - `interface`: extracts classes, interfaces and method signatures from the interface code block

pub mod contracts;
pub mod document;
pub mod interface;

pub use contracts::{
    Condition, Contract, ContractElement, ElementKind, ErrorDescriptor, Parameter, RelatedContract,
};
pub use document::{parse_contract_file, DocumentParser, DEFAULT_VERSION, UNKNOWN_STATUS};
pub use interface::{split_parameters, DocComment, InterfaceParser};
