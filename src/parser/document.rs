//! Contract document parser
//!
//! Parses one markdown contract document into a [`Contract`]. The document
//! format is a loose convention, not a grammar: each section is found by its
//! own header marker and ends at the next header. The Conditions and Examples
//! sections are the exception: they span their `###` blocks. Only the title
//! is required; every other missing section leaves its field empty.
//!
//! ```text
//! # Contract: PriceListConverter
//! **Version**: 1.2.0
//! **Status**: Approved
//!
//! ## Description
//! ## Interface            (fenced code block with type signatures)
//! ## Preconditions and Postconditions
//! ### convert()
//! - **Preconditions**:
//!   - input != null
//! - **Postconditions**:
//!   - result is not null
//! ## Invariants
//! ## Related Contracts    ([Deduplicator](../deduplicator/deduplicator.md))
//! ## Examples
//! ```

use crate::error::{Error, Result};
use crate::parser::contracts::{Condition, Contract, ContractElement, ElementKind, ErrorDescriptor, RelatedContract};
use crate::parser::interface::InterfaceParser;
use pulldown_cmark::{CodeBlockKind, Event, Parser, Tag};
use regex::Regex;
use sha2::{Digest, Sha256};
use std::ops::Range;
use std::path::Path;
use tracing::{debug, warn};

/// Version used when the document has no version marker
pub const DEFAULT_VERSION: &str = "1.0.0";
/// Status used when the document has no status marker
pub const UNKNOWN_STATUS: &str = "unknown";

const TITLE_PREFIXES: &[&str] = &["Contract:", "Контракт:"];
const DESCRIPTION_HEADERS: &[&str] = &["Description", "Описание"];
const INTERFACE_HEADERS: &[&str] = &["Interface", "Интерфейс"];
const CONDITIONS_HEADERS: &[&str] = &["Preconditions and Postconditions", "Предусловия и постусловия"];
const INVARIANTS_HEADERS: &[&str] = &["Invariants", "Инварианты"];
const RELATED_HEADERS: &[&str] = &["Related Contracts", "Связанные контракты"];
const EXAMPLES_HEADERS: &[&str] = &["Examples", "Примеры"];

/// Labelled sub-lists inside a per-method conditions block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConditionLabel {
    Preconditions,
    Postconditions,
    Exceptions,
    Invariants,
}

impl ConditionLabel {
    fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "preconditions" | "предусловия" => Some(ConditionLabel::Preconditions),
            "postconditions" | "постусловия" => Some(ConditionLabel::Postconditions),
            "exceptions" | "errors" | "исключения" => Some(ConditionLabel::Exceptions),
            "invariants" | "инварианты" => Some(ConditionLabel::Invariants),
            _ => None,
        }
    }
}

/// A markdown heading with its byte range
#[derive(Debug, Clone)]
struct Heading {
    level: usize,
    text: String,
    range: Range<usize>,
}

/// A fenced or indented code block with its byte range
#[derive(Debug, Clone)]
struct CodeBlock {
    start: usize,
    language: String,
    code: String,
}

/// A located section: the heading text and the body range after it
#[derive(Debug, Clone)]
struct Section {
    title: String,
    body: Range<usize>,
}

/// Heading and code block outline of one document
struct Outline {
    headings: Vec<Heading>,
    code_blocks: Vec<CodeBlock>,
    len: usize,
}

impl Outline {
    fn build(content: &str) -> Self {
        let mut headings = Vec::new();
        let mut code_blocks = Vec::new();
        let mut heading: Option<Heading> = None;
        let mut block: Option<CodeBlock> = None;

        for (event, range) in Parser::new(content).into_offset_iter() {
            match event {
                Event::Start(Tag::Heading(level, _, _)) => {
                    heading = Some(Heading { level: level as usize, text: String::new(), range });
                }
                Event::End(Tag::Heading(..)) => {
                    if let Some(mut done) = heading.take() {
                        done.text = done.text.trim().to_string();
                        headings.push(done);
                    }
                }
                Event::Start(Tag::CodeBlock(kind)) => {
                    let language = match kind {
                        CodeBlockKind::Fenced(lang) => lang.trim().to_string(),
                        CodeBlockKind::Indented => String::new(),
                    };
                    block = Some(CodeBlock { start: range.start, language, code: String::new() });
                }
                Event::End(Tag::CodeBlock(_)) => {
                    if let Some(done) = block.take() {
                        code_blocks.push(done);
                    }
                }
                Event::Text(text) | Event::Code(text) => {
                    if let Some(h) = heading.as_mut() {
                        h.text.push_str(&text);
                    } else if let Some(b) = block.as_mut() {
                        b.code.push_str(&text);
                    }
                }
                _ => {}
            }
        }

        Outline { headings, code_blocks, len: content.len() }
    }

    /// Body of heading `idx`
    ///
    /// A flat section stops at the next heading of any level. A nested one
    /// runs on through its subsections to the next heading of the same or
    /// higher level.
    fn section_at(&self, idx: usize, nested: bool) -> Section {
        let heading = &self.headings[idx];
        let end = self.headings[idx + 1..]
            .iter()
            .find(|h| !nested || h.level <= heading.level)
            .map_or(self.len, |h| h.range.start);
        Section {
            title: heading.text.clone(),
            body: heading.range.end.min(end)..end,
        }
    }

    fn position(&self, names: &[&str]) -> Option<usize> {
        self.headings.iter().position(|h| {
            let text = h.text.to_lowercase();
            names.iter().any(|n| text == n.to_lowercase())
        })
    }

    /// First section whose heading matches one of `names` (case-insensitive),
    /// ending at the next heading
    fn find(&self, names: &[&str]) -> Option<Section> {
        Some(self.section_at(self.position(names)?, false))
    }

    /// Like [`Outline::find`], but the section keeps its subsections
    fn find_nested(&self, names: &[&str]) -> Option<Section> {
        Some(self.section_at(self.position(names)?, true))
    }

    /// Direct subsections (next heading level down) inside `parent`
    fn subsections(&self, parent: &Section) -> Vec<Section> {
        let inside: Vec<usize> = self
            .headings
            .iter()
            .enumerate()
            .filter(|(_, h)| h.range.start >= parent.body.start && h.range.start < parent.body.end)
            .map(|(idx, _)| idx)
            .collect();
        let Some(top) = inside.iter().map(|&idx| self.headings[idx].level).min() else {
            return Vec::new();
        };
        inside
            .into_iter()
            .filter(|&idx| self.headings[idx].level == top)
            .map(|idx| self.section_at(idx, true))
            .collect()
    }

    fn first_code_block(&self, range: &Range<usize>) -> Option<&CodeBlock> {
        self.code_blocks.iter().find(|b| range.contains(&b.start))
    }
}

/// Parser for contract documents
pub struct DocumentParser {
    version_re: Regex,
    status_re: Regex,
    bullet_re: Regex,
    label_re: Regex,
    link_re: Regex,
    interface: InterfaceParser,
}

impl DocumentParser {
    /// Create a parser (compiles the extraction patterns once)
    pub fn new() -> Result<Self> {
        Ok(DocumentParser {
            version_re: Regex::new(r"\*\*(?:Version|Версия)(?:\*\*:|:\*\*)[ \t]*([\d.]+)")?,
            status_re: Regex::new(r"\*\*(?:Status|Статус)(?:\*\*:|:\*\*)[ \t]*([^\n]+)")?,
            bullet_re: Regex::new(r"^(\s*)[-*+]\s+(.*)$")?,
            label_re: Regex::new(r"^\*\*([^*:]+?):?\*\*:?\s*(.*)$")?,
            link_re: Regex::new(r"\[([^\]]*)\]\(([^)\s]*)\)")?,
            interface: InterfaceParser::new()?,
        })
    }

    /// Read and parse the document at `path`
    pub fn parse_file(&self, path: &Path) -> Result<Contract> {
        if !path.exists() {
            return Err(Error::NotFound { path: path.to_path_buf() });
        }
        let content = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.parse_str(path, &content)
    }

    /// Parse document text; `path` is recorded as the contract's source
    pub fn parse_str(&self, path: &Path, content: &str) -> Result<Contract> {
        let outline = Outline::build(content);

        // (1) title
        let name = outline
            .headings
            .iter()
            .filter(|h| h.level == 1)
            .find_map(|h| {
                TITLE_PREFIXES
                    .iter()
                    .find_map(|prefix| h.text.strip_prefix(prefix))
                    .map(|rest| rest.trim().to_string())
            })
            .ok_or_else(|| Error::MalformedDocument { path: path.to_path_buf() })?;

        // (2) version, (3) status
        let version = self
            .version_re
            .captures(content)
            .map(|caps| caps[1].trim_end_matches('.').to_string())
            .unwrap_or_else(|| DEFAULT_VERSION.to_string());
        let status = self
            .status_re
            .captures(content)
            .map(|caps| caps[1].trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| UNKNOWN_STATUS.to_string());

        let mut contract = Contract::new(name, version, status, path.to_string_lossy());
        contract.fingerprint = format!("{:x}", Sha256::digest(content.as_bytes()));

        // (4) description
        if let Some(section) = outline.find(DESCRIPTION_HEADERS) {
            contract.description = content[section.body].trim().to_string();
        }

        // (5) interface
        if let Some(section) = outline.find(INTERFACE_HEADERS) {
            match outline.first_code_block(&section.body) {
                Some(block) => {
                    debug!(language = %block.language, "parsing interface block");
                    contract.elements = self.interface.parse(&block.code);
                }
                None => debug!(contract = %contract.name, "interface section has no code block"),
            }
        }

        // (6) per-method conditions
        if let Some(section) = outline.find_nested(CONDITIONS_HEADERS) {
            for block in outline.subsections(&section) {
                self.merge_condition_block(&mut contract, &block.title, &content[block.body]);
            }
        }

        // (7) invariants
        if let Some(section) = outline.find(INVARIANTS_HEADERS) {
            contract.invariants = self.bullets(&content[section.body]).into_iter().map(Condition::from).collect();
        }

        // (8) related contracts
        if let Some(section) = outline.find(RELATED_HEADERS) {
            contract.related_contracts = self
                .link_re
                .captures_iter(&content[section.body])
                .map(|caps| RelatedContract {
                    name: caps[1].trim().to_string(),
                    path: caps[2].trim().to_string(),
                })
                .collect();
        }

        if let Some(section) = outline.find_nested(EXAMPLES_HEADERS) {
            for example in outline.subsections(&section) {
                if let Some(block) = outline.first_code_block(&example.body) {
                    attach_example(&mut contract, &example.title, &block.code);
                }
            }
        }

        debug!(
            contract = %contract.name,
            elements = contract.elements.len(),
            invariants = contract.invariants.len(),
            related = contract.related_contracts.len(),
            "parsed contract document"
        );
        Ok(contract)
    }

    /// Merge one `### method` block into the matching method, or synthesize
    /// a bare top-level method when none matches
    fn merge_condition_block(&self, contract: &mut Contract, header: &str, text: &str) {
        let (owner, name) = method_key(header);
        if name.is_empty() {
            warn!(contract = %contract.name, header, "conditions block without a method name");
            return;
        }

        let lists = self.labelled_lists(text);
        let method = match locate_method(contract, owner.as_deref(), &name) {
            Some((idx, Some(child))) => &mut contract.elements[idx].children[child],
            Some((idx, None)) => &mut contract.elements[idx],
            None => {
                debug!(contract = %contract.name, method = %name, "synthesizing method from conditions block");
                contract.elements.push(ContractElement::new(name.clone(), ElementKind::Method));
                let last = contract.elements.len() - 1;
                &mut contract.elements[last]
            }
        };

        for (label, items) in lists {
            match label {
                ConditionLabel::Preconditions => method.preconditions.extend(items.into_iter().map(Condition::from)),
                ConditionLabel::Postconditions => method.postconditions.extend(items.into_iter().map(Condition::from)),
                ConditionLabel::Invariants => method.invariants.extend(items.into_iter().map(Condition::from)),
                ConditionLabel::Exceptions => {
                    for item in items {
                        let descriptor = parse_error_item(&item);
                        let known = method.errors.iter_mut().find(|e| e.simple_name() == descriptor.simple_name());
                        match known {
                            Some(existing) if existing.description.is_empty() => existing.description = descriptor.description,
                            Some(_) => {}
                            None => method.errors.push(descriptor),
                        }
                    }
                }
            }
        }
    }

    /// `- **Label**:` headed sub-lists, one entry per nested bullet
    fn labelled_lists(&self, text: &str) -> Vec<(ConditionLabel, Vec<String>)> {
        let mut lists: Vec<(ConditionLabel, Vec<String>)> = Vec::new();
        // Indent of the label line currently collecting items
        let mut open: Option<usize> = None;

        for line in text.lines() {
            if line.trim().is_empty() {
                continue;
            }
            let Some(caps) = self.bullet_re.captures(line) else {
                open = None;
                continue;
            };
            let indent = indent_width(&caps[1]);
            let item = caps[2].trim();

            if let Some(label_indent) = open {
                if indent > label_indent {
                    if let Some((_, items)) = lists.last_mut() {
                        items.push(clean_item(item));
                    }
                    continue;
                }
                open = None;
            }

            if let Some(label_caps) = self.label_re.captures(item) {
                if let Some(label) = ConditionLabel::from_label(&label_caps[1]) {
                    lists.push((label, Vec::new()));
                    open = Some(indent);
                }
            }
        }

        lists
    }

    /// Every bullet item in `text`
    fn bullets(&self, text: &str) -> Vec<String> {
        text.lines()
            .filter_map(|line| self.bullet_re.captures(line))
            .map(|caps| clean_item(&caps[2]))
            .filter(|item| !item.is_empty())
            .collect()
    }
}

/// Width of leading whitespace, tabs counted as four columns
fn indent_width(prefix: &str) -> usize {
    prefix.chars().map(|c| if c == '\t' { 4 } else { 1 }).sum()
}

/// Trim a list item and drop a wrapping pair of backticks
fn clean_item(item: &str) -> String {
    let item = item.trim();
    item.strip_prefix('`')
        .and_then(|rest| rest.strip_suffix('`'))
        .filter(|inner| !inner.contains('`'))
        .unwrap_or(item)
        .trim()
        .to_string()
}

/// `Kind: description`, `Kind - description` or a bare `Kind`
fn parse_error_item(item: &str) -> ErrorDescriptor {
    let (kind, description) = item
        .split_once(": ")
        .or_else(|| item.split_once(" - "))
        .or_else(|| item.split_once(" — "))
        .unwrap_or((item, ""));
    let kind = kind.trim().trim_matches('`').trim_end_matches(':').trim();
    ErrorDescriptor::new(kind, description.trim())
}

/// Split a conditions header into an optional owner and a method name:
/// `convert()`, `convert(File input)`, `Converter.convert()`, `` `dedupe` ``
fn method_key(header: &str) -> (Option<String>, String) {
    let signature = header.trim().trim_matches('`');
    let head = signature.split('(').next().unwrap_or_default().trim();
    // A leading return type (`Stream<X> convert(...)`) is dropped
    let head = head.rsplit(char::is_whitespace).next().unwrap_or(head);
    match head.rsplit_once('.') {
        Some((owner, name)) => (Some(owner.trim().to_string()), name.trim().to_string()),
        None => (None, head.to_string()),
    }
}

/// Position of a method: `(element index, Some(child index))` for owned
/// methods, `(element index, None)` for top-level ones
fn locate_method(contract: &Contract, owner: Option<&str>, name: &str) -> Option<(usize, Option<usize>)> {
    for (idx, element) in contract.elements.iter().enumerate() {
        if element.is_method() {
            if owner.is_none() && element.name == name {
                return Some((idx, None));
            }
            continue;
        }
        if owner.is_some_and(|o| o != element.name) {
            continue;
        }
        if let Some(child) = element.children.iter().position(|c| c.is_method() && c.name == name) {
            return Some((idx, Some(child)));
        }
    }
    None
}

/// Attach an example code block to the element named by `header`
fn attach_example(contract: &mut Contract, header: &str, code: &str) {
    let (owner, name) = method_key(header);
    if let Some(element) = contract.elements.iter_mut().find(|e| owner.is_none() && e.name == name) {
        element.code_example = Some(code.to_string());
        return;
    }
    match locate_method(contract, owner.as_deref(), &name) {
        Some((idx, Some(child))) => contract.elements[idx].children[child].code_example = Some(code.to_string()),
        Some((idx, None)) => contract.elements[idx].code_example = Some(code.to_string()),
        None => debug!(contract = %contract.name, example = %header, "example does not name a known element"),
    }
}

/// Parse the contract document at `path` with a fresh parser
pub fn parse_contract_file(path: &Path) -> Result<Contract> {
    DocumentParser::new()?.parse_file(path)
}
