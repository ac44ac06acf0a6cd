//! Interface block parser
//!
//! Best-effort structural extraction from the type-signature code block of a
//! contract document. Finds class/interface declarations and the method
//! signatures they own; it is not a language parser.

use crate::error::Result;
use crate::parser::contracts::{ContractElement, ElementKind, ErrorDescriptor, Parameter};
use regex::Regex;
use tracing::debug;

/// Words that can precede a name and a parenthesis without being a method
/// declaration (`return foo(x);`, `new Foo(...)`, modifiers misread as types)
const NON_TYPE_WORDS: &[&str] = &[
    "return", "new", "else", "throw", "case", "public", "protected", "private", "static", "final",
    "abstract", "default", "synchronized", "native",
];

const NON_METHOD_NAMES: &[&str] = &["if", "for", "while", "switch", "catch", "synchronized", "return"];

/// Parsed documentation comment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocComment {
    /// Free text before the first `@tag` line
    pub description: String,
    /// `(name, description)` from `@param`
    pub params: Vec<(String, String)>,
    /// Description from `@return`
    pub returns: Option<String>,
    /// `(kind, description)` from `@throws` / `@exception`
    pub throws: Vec<(String, String)>,
}

impl DocComment {
    /// Parse the inside of a `/** ... */` block
    pub fn parse(body: &str) -> Self {
        let mut doc = DocComment::default();
        let mut description_lines = Vec::new();
        // Tag currently collecting continuation lines: (tag, text)
        let mut current: Option<(String, String)> = None;

        for raw in body.lines() {
            let line = raw.trim().trim_start_matches('*').trim();
            if line.starts_with('@') {
                if let Some((tag, text)) = current.take() {
                    doc.apply_tag(&tag, &text);
                }
                let (tag, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
                current = Some((tag.to_string(), rest.trim().to_string()));
            } else if let Some((_, text)) = current.as_mut() {
                if !line.is_empty() {
                    if !text.is_empty() {
                        text.push(' ');
                    }
                    text.push_str(line);
                }
            } else if !line.is_empty() {
                description_lines.push(line);
            }
        }
        if let Some((tag, text)) = current.take() {
            doc.apply_tag(&tag, &text);
        }

        doc.description = description_lines.join(" ");
        doc
    }

    fn apply_tag(&mut self, tag: &str, text: &str) {
        let (head, rest) = match text.split_once(char::is_whitespace) {
            Some((head, rest)) => (head.to_string(), rest.trim().to_string()),
            None => (text.to_string(), String::new()),
        };
        match tag {
            "@param" if !head.is_empty() => self.params.push((head, rest)),
            "@return" | "@returns" => self.returns = Some(text.to_string()),
            "@throws" | "@exception" if !head.is_empty() => self.throws.push((head, rest)),
            _ => {}
        }
    }
}

/// A `/** ... */` block located in the source
#[derive(Debug, Clone)]
struct DocBlock {
    end: usize,
    doc: DocComment,
}

/// Parser for the interface code block
pub struct InterfaceParser {
    type_re: Regex,
    method_re: Regex,
    doc_re: Regex,
    comment_re: Regex,
    gap_re: Regex,
}

impl InterfaceParser {
    pub fn new() -> Result<Self> {
        Ok(InterfaceParser {
            type_re: Regex::new(
                r"\b(?:(?:public|protected|private|abstract|static|final|sealed)\s+)*(class|interface)\s+(\w+)[^{;]*\{",
            )?,
            method_re: Regex::new(
                r"\b(?:(?:public|protected|private|static|final|abstract|default|synchronized|native)\s+)*(?:<[^>\n]*>\s+)?([\w.$]+(?:\s*<[^;{}()\n]*>)?(?:\[\])*)\s+(\w+)\s*\(([^)]*)\)(?:\s*throws\s+([\w.$,\s]+?))?\s*[;{]",
            )?,
            doc_re: Regex::new(r"(?s)/\*\*(.*?)\*/")?,
            comment_re: Regex::new(r"(?s)/\*.*?\*/|//[^\n]*")?,
            gap_re: Regex::new(r"^(?:\s|@\w+(?:\([^)]*\))?)*$")?,
        })
    }

    /// Extract class/interface elements (with their methods) from `code`
    pub fn parse(&self, code: &str) -> Vec<ContractElement> {
        let docs = self.doc_blocks(code);
        let stripped = self.blank_comments(code);

        let mut elements = Vec::new();
        let mut consumed_until = 0;

        for caps in self.type_re.captures_iter(&stripped) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            if whole.start() < consumed_until {
                debug!(name = &caps[2], "skipping nested type declaration");
                continue;
            }

            let open = whole.end() - 1;
            let close = matching_brace(&stripped, open);
            if close.is_none() {
                debug!(name = &caps[2], "unclosed type block runs to the end of the code");
            }
            consumed_until = close.unwrap_or(stripped.len());

            let kind = if &caps[1] == "class" { ElementKind::Class } else { ElementKind::Interface };
            let mut element = ContractElement::new(&caps[2], kind);
            if let Some(doc) = nearest_doc(&docs, &self.gap_re, code, whole.start()) {
                element.description = doc.description.clone();
            }

            let body_start = open + 1;
            // Without a closing brace the body is the rest of the code
            let body_end = close.map_or(stripped.len(), |end| end - 1);
            element.children = self.parse_methods(code, &stripped, &docs, body_start, body_end, &element.name);

            debug!(name = %element.name, kind = %element.kind, methods = element.children.len(), "parsed interface element");
            elements.push(element);
        }

        elements
    }

    fn parse_methods(
        &self,
        code: &str,
        stripped: &str,
        docs: &[DocBlock],
        body_start: usize,
        body_end: usize,
        owner: &str,
    ) -> Vec<ContractElement> {
        let body = &stripped[body_start..body_end];
        let mut methods = Vec::new();

        for caps in self.method_re.captures_iter(body) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            // Only declarations directly inside the block, not inside nested bodies
            if brace_depth(&body[..whole.start()]) != 0 {
                continue;
            }

            let return_type = normalize_space(&caps[1]);
            let name = caps[2].to_string();
            let first_word = return_type.split(['<', ' ']).next().unwrap_or_default();
            if NON_TYPE_WORDS.contains(&first_word) || NON_METHOD_NAMES.contains(&name.as_str()) {
                continue;
            }

            let mut method = ContractElement::new(name, ElementKind::Method);
            method.parent = Some(owner.to_string());
            method.return_type = Some(return_type);
            method.parameters = split_parameters(&caps[3]);

            let doc = nearest_doc(docs, &self.gap_re, code, body_start + whole.start());
            if let Some(doc) = doc {
                method.description = doc.description.clone();
                method.return_description = doc.returns.clone();
                for (param_name, text) in &doc.params {
                    if let Some(param) = method.parameters.iter_mut().find(|p| &p.name == param_name) {
                        param.description = Some(text.clone());
                    }
                }
                for (kind, text) in &doc.throws {
                    method.errors.push(ErrorDescriptor::new(kind.clone(), text.clone()));
                }
            }

            if let Some(throws) = caps.get(4) {
                for kind in throws.as_str().split(',').map(str::trim).filter(|k| !k.is_empty()) {
                    let declared = ErrorDescriptor::new(kind, "");
                    let already = method.errors.iter().any(|e| e.simple_name() == declared.simple_name());
                    if !already {
                        method.errors.push(declared);
                    }
                }
            }

            methods.push(method);
        }

        methods
    }

    fn doc_blocks(&self, code: &str) -> Vec<DocBlock> {
        self.doc_re
            .captures_iter(code)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                Some(DocBlock {
                    end: whole.end(),
                    doc: DocComment::parse(caps.get(1)?.as_str()),
                })
            })
            .collect()
    }

    /// Replace comments with spaces of the same byte length so offsets into
    /// the unmodified code stay valid
    fn blank_comments(&self, code: &str) -> String {
        let mut out = String::with_capacity(code.len());
        let mut last = 0;
        for m in self.comment_re.find_iter(code) {
            out.push_str(&code[last..m.start()]);
            for c in m.as_str().chars() {
                if c == '\n' {
                    out.push('\n');
                } else {
                    out.extend(std::iter::repeat(' ').take(c.len_utf8()));
                }
            }
            last = m.end();
        }
        out.push_str(&code[last..]);
        out
    }
}

/// The doc comment that ends right before `decl_start`, separated from it by
/// whitespace and annotations only
fn nearest_doc<'a>(docs: &'a [DocBlock], gap_re: &Regex, code: &str, decl_start: usize) -> Option<&'a DocComment> {
    let block = docs.iter().rev().find(|d| d.end <= decl_start)?;
    if gap_re.is_match(&code[block.end..decl_start]) {
        Some(&block.doc)
    } else {
        None
    }
}

/// Index just past the brace matching the one at `open`, if it is closed
fn matching_brace(code: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (idx, c) in code[open..].char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(open + idx + 1);
                }
            }
            _ => {}
        }
    }
    None
}

/// Net brace depth of `text`
fn brace_depth(text: &str) -> i64 {
    text.chars().fold(0i64, |depth, c| match c {
        '{' => depth + 1,
        '}' => depth - 1,
        _ => depth,
    })
}

fn normalize_space(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Split a parameter list on top-level commas; the last whitespace token of
/// each parameter is its name, everything before it the type.
pub fn split_parameters(params: &str) -> Vec<Parameter> {
    let mut pieces = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (idx, c) in params.char_indices() {
        match c {
            '<' => depth += 1,
            '>' => depth -= 1,
            ',' if depth <= 0 => {
                pieces.push(&params[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    pieces.push(&params[start..]);

    pieces
        .into_iter()
        .filter_map(|piece| {
            let tokens: Vec<&str> = piece
                .split_whitespace()
                .filter(|t| !t.starts_with('@') && *t != "final")
                .collect();
            let (name, type_tokens) = tokens.split_last()?;
            Some(Parameter::new(*name, type_tokens.join(" ")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONVERTER: &str = r#"
/**
 * Converts supplier price lists into JSON records.
 * @since 1.0
 */
public interface PriceListConverter {
    /**
     * Converts a price list file.
     * @param input the source file
     * @return stream of converted records
     * @throws IOException if the file cannot be read
     */
    Stream<JSONObject> convert(File input) throws IOException, ConversionException;

    // not a method (comment)
    Map<String, List<Integer>> groupBy(Map<String, Integer> weights, final @NotNull String key);

    void reset();
}

public class Deduplicator implements Closeable {
    private final Map<String, JSONObject> seen = new HashMap<>();

    public Stream<JSONObject> dedupe(Stream<JSONObject> items) {
        if (items == null) {
            return Stream.empty();
        }
        return items.filter(x -> seen.put(key(x), x) == null);
    }

    static class Entry {
        int weight(int base);
    }
}
"#;

    #[test]
    fn test_parse_types_and_methods() {
        let parser = InterfaceParser::new().unwrap();
        let elements = parser.parse(CONVERTER);
        let names: Vec<&str> = elements.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["PriceListConverter", "Deduplicator"]);

        let converter = &elements[0];
        assert_eq!(converter.kind, ElementKind::Interface);
        assert_eq!(converter.description, "Converts supplier price lists into JSON records.");
        let methods: Vec<&str> = converter.children.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(methods, vec!["convert", "groupBy", "reset"]);
    }

    #[test]
    fn test_method_signature_details() {
        let parser = InterfaceParser::new().unwrap();
        let elements = parser.parse(CONVERTER);
        let convert = &elements[0].children[0];

        assert_eq!(convert.parent.as_deref(), Some("PriceListConverter"));
        assert_eq!(convert.return_type.as_deref(), Some("Stream<JSONObject>"));
        assert_eq!(convert.description, "Converts a price list file.");
        assert_eq!(convert.return_description.as_deref(), Some("stream of converted records"));
        assert_eq!(convert.parameters, vec![Parameter {
            name: "input".into(),
            type_name: "File".into(),
            description: Some("the source file".into()),
        }]);

        let kinds: Vec<&str> = convert.errors.iter().map(|e| e.kind.as_str()).collect();
        assert_eq!(kinds, vec!["IOException", "ConversionException"]);
        assert_eq!(convert.errors[0].description, "if the file cannot be read");
    }

    #[test]
    fn test_generic_parameters_split_on_top_level_commas() {
        let parser = InterfaceParser::new().unwrap();
        let elements = parser.parse(CONVERTER);
        let group_by = &elements[0].children[1];

        assert_eq!(group_by.return_type.as_deref(), Some("Map<String, List<Integer>>"));
        assert_eq!(group_by.parameters.len(), 2);
        assert_eq!(group_by.parameters[0].type_name, "Map<String, Integer>");
        assert_eq!(group_by.parameters[0].name, "weights");
        assert_eq!(group_by.parameters[1].type_name, "String");
        assert_eq!(group_by.parameters[1].name, "key");
    }

    #[test]
    fn test_method_bodies_and_nested_types_are_not_split() {
        let parser = InterfaceParser::new().unwrap();
        let elements = parser.parse(CONVERTER);
        let dedup = &elements[1];

        assert_eq!(dedup.kind, ElementKind::Class);
        assert!(dedup.description.is_empty());
        let methods: Vec<&str> = dedup.children.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(methods, vec!["dedupe"]);
        assert_eq!(dedup.children[0].parameters[0].type_name, "Stream<JSONObject>");
    }

    #[test]
    fn test_unclosed_block_runs_to_end_of_code() {
        let parser = InterfaceParser::new().unwrap();
        let elements = parser.parse("interface Foo {\n  String имя");
        assert_eq!(elements.len(), 1);
        assert_eq!(elements[0].name, "Foo");
        assert!(elements[0].children.is_empty());

        let elements = parser.parse("interface Ценник {\n  void сбросить();\n  String имя");
        assert_eq!(elements[0].name, "Ценник");
        let methods: Vec<&str> = elements[0].children.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(methods, vec!["сбросить"]);
    }

    #[test]
    fn test_matching_brace() {
        assert_eq!(matching_brace("{ { } }x", 0), Some(7));
        assert_eq!(matching_brace("{ { }", 0), None);
        assert_eq!(matching_brace("{ имя", 0), None);
    }

    #[test]
    fn test_non_ascii_doc_comments_and_names() {
        let parser = InterfaceParser::new().unwrap();
        let code = "/** Конвертер прайс-листов. */\ninterface Конвертер {\n    /**\n     * Преобразует файл.\n     * @param вход исходный файл\n     */\n    Stream<JSONObject> преобразовать(File вход);\n}\n";
        let elements = parser.parse(code);
        assert_eq!(elements.len(), 1);
        assert_eq!(elements[0].description, "Конвертер прайс-листов.");
        let method = &elements[0].children[0];
        assert_eq!(method.name, "преобразовать");
        assert_eq!(method.description, "Преобразует файл.");
        assert_eq!(method.parameters[0].description.as_deref(), Some("исходный файл"));
    }

    #[test]
    fn test_doc_comment_parsing() {
        let doc = DocComment::parse(
            "\n * Loads records\n * into the database.\n *\n * @param batch records to load,\n *        never empty\n * @exception java.sql.SQLException on failure\n",
        );
        assert_eq!(doc.description, "Loads records into the database.");
        assert_eq!(doc.params, vec![("batch".to_string(), "records to load, never empty".to_string())]);
        assert_eq!(doc.throws, vec![("java.sql.SQLException".to_string(), "on failure".to_string())]);
        assert!(doc.returns.is_none());
    }

    #[test]
    fn test_split_parameters() {
        assert!(split_parameters("").is_empty());
        assert!(split_parameters("   ").is_empty());
        let params = split_parameters("String a, List<Map<String, Integer>> b, int... rest");
        let pairs: Vec<(&str, &str)> = params.iter().map(|p| (p.type_name.as_str(), p.name.as_str())).collect();
        assert_eq!(pairs, vec![("String", "a"), ("List<Map<String, Integer>>", "b"), ("int...", "rest")]);
    }
}
