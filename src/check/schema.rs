//! JSON-schema checks
//!
//! Three independent concerns:
//! - structural validity of a schema against the Draft-7 meta-schema
//! - self-consistency: a generated example must validate against its schema
//! - cross-schema compatibility of properties shared by two schemas
//!
//! Validation itself is delegated to `jsonschema` with Draft 7 semantics and
//! `format` assertions enabled.

use crate::analysis::types::{schema_types_compatible, SchemaType};
use crate::error::{Error, Result};
use crate::report::{Problem, ProblemKind};
use jsonschema::{Draft, ValidationError, Validator};
use serde_json::{json, Map, Value};
use std::path::Path;
use tracing::debug;

const DRAFT7_META_SCHEMA: &str = "http://json-schema.org/draft-07/schema#";

/// Constraints compared between two schemas' shared properties
const COMPARED_CONSTRAINTS: &[&str] = &["minimum", "maximum", "minLength", "maxLength", "pattern"];

/// Read and decode a schema file
pub fn load_schema(path: &Path) -> Result<Value> {
    if !path.exists() {
        return Err(Error::NotFound { path: path.to_path_buf() });
    }
    let text = std::fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| Error::JsonDecode {
        path: path.to_path_buf(),
        source,
    })
}

/// Load a schema file and check it against the meta-schema
pub fn load_valid_schema(path: &Path) -> Result<Value> {
    let schema = load_schema(path)?;
    validate_schema(path, &schema)?;
    Ok(schema)
}

/// Structural validity; `SchemaError` lists every violation
pub fn validate_schema(path: &Path, schema: &Value) -> Result<()> {
    let violations = meta_violations(schema);
    if violations.is_empty() {
        Ok(())
    } else {
        Err(Error::SchemaError {
            path: path.to_path_buf(),
            violations,
        })
    }
}

/// Draft 7 validator with `format` treated as an assertion
fn draft7(schema: &Value) -> std::result::Result<Validator, ValidationError<'static>> {
    jsonschema::options()
        .with_draft(Draft::Draft7)
        .should_validate_formats(true)
        .build(schema)
}

/// `#/json/pointer: message`
fn describe(error: &ValidationError<'_>) -> String {
    format!("#{}: {}", error.instance_path, error)
}

/// Every meta-schema violation in `schema`, as `#/json/pointer: message`
///
/// The schema is validated as an instance of the Draft-7 meta-schema, so the
/// pointers locate the offending keyword inside `schema`.
pub fn meta_violations(schema: &Value) -> Vec<String> {
    let meta = match draft7(&json!({ "$ref": DRAFT7_META_SCHEMA })) {
        Ok(meta) => meta,
        Err(e) => return vec![format!("#: meta-schema unavailable: {e}")],
    };
    meta.iter_errors(schema).map(|error| describe(&error)).collect()
}

/// Validate `instance` against `schema`; one message per violation
///
/// A schema that does not compile yields a single violation at the root.
pub fn validate_instance(instance: &Value, schema: &Value) -> Vec<String> {
    let validator = match draft7(schema) {
        Ok(validator) => validator,
        Err(e) => {
            debug!(error = %e, "schema does not compile");
            return vec![format!("#: invalid schema: {e}")];
        }
    };
    validator.iter_errors(instance).map(|error| describe(&error)).collect()
}

/// Example instance built from a schema's declared shape
///
/// An `example` keyword wins. Objects recurse into `properties`, arrays hold
/// one element generated from `items`, strings use a literal for the common
/// formats. A type list uses its first non-null member, and a schema without
/// `type` yields an empty object.
pub fn generate_example(schema: &Value) -> Value {
    let Some(map) = schema.as_object() else {
        return json!({});
    };
    if let Some(example) = map.get("example") {
        return example.clone();
    }
    match map.get("type") {
        None => json!({}),
        Some(Value::String(name)) => example_for_type(map, name),
        Some(Value::Array(members)) => match members.iter().filter_map(Value::as_str).find(|t| *t != "null") {
            Some(name) => example_for_type(map, name),
            None => Value::Null,
        },
        Some(_) => Value::Null,
    }
}

fn example_for_type(schema: &Map<String, Value>, type_name: &str) -> Value {
    match type_name {
        "object" => {
            let object: Map<String, Value> = schema
                .get("properties")
                .and_then(Value::as_object)
                .map(|props| props.iter().map(|(k, v)| (k.clone(), generate_example(v))).collect())
                .unwrap_or_default();
            Value::Object(object)
        }
        "array" => match schema.get("items") {
            Some(Value::Array(positional)) => Value::Array(positional.iter().map(generate_example).collect()),
            Some(items) => Value::Array(vec![generate_example(items)]),
            None => Value::Array(Vec::new()),
        },
        "string" => match schema.get("format").and_then(Value::as_str) {
            Some("date-time") => json!("2025-04-15T12:00:00Z"),
            Some("date") => json!("2025-04-15"),
            Some("email") => json!("example@example.com"),
            Some("uri") => json!("https://example.com"),
            _ => json!("example"),
        },
        "number" | "integer" => json!(42),
        "boolean" => json!(true),
        _ => Value::Null,
    }
}

/// Generate an example and validate it against its own schema
pub fn check_example_round_trip(schema: &Value) -> Vec<Problem> {
    let example = generate_example(schema);
    validate_instance(&example, schema)
        .into_iter()
        .map(|violation| {
            Problem::new(
                ProblemKind::InvalidExample,
                format!("Generated example does not satisfy its schema: {violation}"),
            )
        })
        .collect()
}

/// Compare the properties two schemas share, recursing into `items`
pub fn check_schema_compatibility(schema_a: &Value, schema_b: &Value) -> Vec<Problem> {
    let mut problems = Vec::new();
    compare_properties(schema_a, schema_b, "", &mut problems);
    problems
}

fn compare_properties(schema_a: &Value, schema_b: &Value, prefix: &str, problems: &mut Vec<Problem>) {
    let props_a = schema_a.get("properties").and_then(Value::as_object);
    let props_b = schema_b.get("properties").and_then(Value::as_object);

    if let (Some(props_a), Some(props_b)) = (props_a, props_b) {
        for (name, prop_a) in props_a {
            let Some(prop_b) = props_b.get(name) else {
                continue;
            };
            let label = format!("{prefix}{name}");
            compare_property(&label, prop_a, prop_b, problems);
        }
    }

    if let (Some(items_a), Some(items_b)) = (schema_a.get("items"), schema_b.get("items")) {
        compare_properties(items_a, items_b, &format!("{prefix}items."), problems);
    }
}

fn compare_property(label: &str, prop_a: &Value, prop_b: &Value, problems: &mut Vec<Problem>) {
    let type_a = prop_a.get("type").and_then(SchemaType::from_value);
    let type_b = prop_b.get("type").and_then(SchemaType::from_value);
    if let (Some(type_a), Some(type_b)) = (type_a, type_b) {
        if !schema_types_compatible(&type_a, &type_b) {
            problems.push(Problem::new(
                ProblemKind::TypeMismatch,
                format!("Incompatible types for property '{label}': {type_a} and {type_b}"),
            ));
        }
    }

    if let (Some(format_a), Some(format_b)) = (prop_a.get("format"), prop_b.get("format")) {
        if format_a != format_b {
            problems.push(Problem::new(
                ProblemKind::FormatMismatch,
                format!("Incompatible formats for property '{label}': {format_a} and {format_b}"),
            ));
        }
    }

    for constraint in COMPARED_CONSTRAINTS {
        if let (Some(value_a), Some(value_b)) = (prop_a.get(*constraint), prop_b.get(*constraint)) {
            if value_a != value_b {
                problems.push(Problem::new(
                    ProblemKind::ConstraintMismatch,
                    format!("Incompatible {constraint} for property '{label}': {value_a} and {value_b}"),
                ));
            }
        }
    }
}
