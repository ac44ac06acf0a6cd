//! Run configuration
//!
//! Defaults mirror the document convention; the CLI overrides them from
//! command-line arguments.

/// Directory discovery settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderConfig {
    /// Extension of contract documents, without the dot
    pub document_extension: String,
    /// Index file skipped by exact name
    pub index_file: String,
    /// Extension of schema files, without the dot
    pub schema_extension: String,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        LoaderConfig {
            document_extension: "md".to_string(),
            index_file: "README.md".to_string(),
            schema_extension: "json".to_string(),
        }
    }
}

/// Cross-contract check settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompatibilityConfig {
    /// Token standing for a method's return value in postconditions
    pub result_placeholder: String,
}

impl Default for CompatibilityConfig {
    fn default() -> Self {
        CompatibilityConfig {
            result_placeholder: "result".to_string(),
        }
    }
}
