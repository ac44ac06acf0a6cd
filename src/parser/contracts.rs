//! Contract model
//!
//! In-memory structure parsed from one contract document: the contract itself,
//! its element tree (classes/interfaces owning methods) and the conditions
//! attached to each element.

use serde::Serialize;
use std::fmt;

/// A free-text logical condition (precondition, postcondition or invariant)
///
/// Conditions have no identity of their own. They are only ever compared
/// through the condition analyzer's pattern rules.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Condition(String);

impl Condition {
    pub fn new(text: impl Into<String>) -> Self {
        Condition(text.into())
    }

    /// The condition text, verbatim as it appeared in the document
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Condition {
    fn from(text: &str) -> Self {
        Condition::new(text)
    }
}

impl From<String> for Condition {
    fn from(text: String) -> Self {
        Condition(text)
    }
}

/// A typed parameter of a method signature
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Parameter {
    /// Parameter name (final whitespace token of the declaration)
    pub name: String,
    /// Declared type name, possibly generic (e.g. `Stream<JSONObject>`)
    pub type_name: String,
    /// Description from an `@param` tag, if any
    pub description: Option<String>,
}

impl Parameter {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Parameter {
            name: name.into(),
            type_name: type_name.into(),
            description: None,
        }
    }
}

/// A declared error a method may raise
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorDescriptor {
    /// Error kind as declared (e.g. `IOException` or `java.io.IOException`)
    pub kind: String,
    pub description: String,
}

impl ErrorDescriptor {
    pub fn new(kind: impl Into<String>, description: impl Into<String>) -> Self {
        ErrorDescriptor {
            kind: kind.into(),
            description: description.into(),
        }
    }

    /// Unqualified kind name, used to group occurrences across contracts
    pub fn simple_name(&self) -> &str {
        self.kind.rsplit('.').next().unwrap_or(&self.kind)
    }
}

/// Kind of contract element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    Method,
    Class,
    Interface,
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ElementKind::Method => "method",
            ElementKind::Class => "class",
            ElementKind::Interface => "interface",
        };
        f.write_str(label)
    }
}

/// A named structural unit of a contract (method, class or interface)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContractElement {
    pub name: String,
    pub kind: ElementKind,
    pub description: String,
    pub preconditions: Vec<Condition>,
    pub postconditions: Vec<Condition>,
    /// Invariants local to this element
    pub invariants: Vec<Condition>,
    pub parameters: Vec<Parameter>,
    pub return_type: Option<String>,
    pub return_description: Option<String>,
    pub errors: Vec<ErrorDescriptor>,
    pub code_example: Option<String>,
    /// Name of the enclosing element. Non-owning: resolve it through
    /// [`Contract::parent_of`].
    pub parent: Option<String>,
    /// Owned child elements (a class owns its methods)
    pub children: Vec<ContractElement>,
}

impl ContractElement {
    pub fn new(name: impl Into<String>, kind: ElementKind) -> Self {
        ContractElement {
            name: name.into(),
            kind,
            description: String::new(),
            preconditions: Vec::new(),
            postconditions: Vec::new(),
            invariants: Vec::new(),
            parameters: Vec::new(),
            return_type: None,
            return_description: None,
            errors: Vec::new(),
            code_example: None,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn is_method(&self) -> bool {
        self.kind == ElementKind::Method
    }

    /// Declared return type, ignoring blank and `void` declarations
    pub fn output_type(&self) -> Option<&str> {
        self.return_type
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty() && *t != "void")
    }
}

/// A reference to another contract from the "Related Contracts" section
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelatedContract {
    /// Display name of the link
    pub name: String,
    /// Link target, as written in the document
    pub path: String,
}

/// One parsed contract document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Contract {
    pub name: String,
    pub version: String,
    pub status: String,
    /// Source path; unique across one verification run
    pub path: String,
    pub description: String,
    pub elements: Vec<ContractElement>,
    pub related_contracts: Vec<RelatedContract>,
    /// Document-level invariants
    pub invariants: Vec<Condition>,
    /// SHA-256 of the source text (lowercase hex)
    pub fingerprint: String,
}

impl Contract {
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        status: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        Contract {
            name: name.into(),
            version: version.into(),
            status: status.into(),
            path: path.into(),
            description: String::new(),
            elements: Vec::new(),
            related_contracts: Vec::new(),
            invariants: Vec::new(),
            fingerprint: String::new(),
        }
    }

    /// Every method of the contract: top-level methods first in document
    /// order, then methods owned by classes/interfaces.
    pub fn methods(&self) -> impl Iterator<Item = &ContractElement> {
        let top_level = self.elements.iter().filter(|e| e.is_method());
        let owned = self
            .elements
            .iter()
            .filter(|e| !e.is_method())
            .flat_map(|e| e.children.iter())
            .filter(|c| c.is_method());
        top_level.chain(owned)
    }

    /// Find a method by exact name
    pub fn find_method(&self, name: &str) -> Option<&ContractElement> {
        self.methods().find(|m| m.name == name)
    }

    /// Resolve an element's back-reference to its enclosing element
    pub fn parent_of(&self, element: &ContractElement) -> Option<&ContractElement> {
        let parent = element.parent.as_deref()?;
        self.elements.iter().find(|e| e.name == parent)
    }

    /// Human-readable owner label for a method: `Class.method` or `method`
    pub fn qualified_name(&self, element: &ContractElement) -> String {
        match self.parent_of(element) {
            Some(parent) => format!("{}.{}", parent.name, element.name),
            None => element.name.clone(),
        }
    }
}
