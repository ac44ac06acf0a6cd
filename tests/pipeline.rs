//! End-to-end runs over contract documents and schemas on disk

use contract_lock::check::schema::load_valid_schema;
use contract_lock::{
    check_compatibility, check_consistency, check_references, generate_example, load_contracts, validate_instance,
    Contract, Error, LoaderConfig, ProblemKind,
};
use serde_json::json;
use std::fs;
use std::path::Path;

fn converter_doc(postcondition: &str) -> String {
    format!(
        r#"# Contract: Converter

**Version**: 1.4.2
**Status**: Approved

## Description

Reads supplier price lists and emits JSON records.

## Interface

```java
/**
 * Price list converter.
 */
public interface Converter {{
    /**
     * Converts one file.
     * @param input price list file
     * @return converted records
     */
    Stream<JSONObject> convert(File input) throws IOException;
}}
```

## Preconditions and Postconditions

### convert()

- **Preconditions**:
  - input is not null
- **Postconditions**:
  - {postcondition}

## Related Contracts

- [Deduplicator](deduplicator.md)
"#
    )
}

const DEDUPLICATOR_DOC: &str = r#"# Contract: Deduplicator

**Version**: 2.0.0
**Status**: Draft

## Interface

```java
/**
 * Drops repeated records.
 */
public class Deduplicator {
    public Stream<JSONObject> dedupe(Stream<JSONObject> items) {
        return items.distinct();
    }
}
```

## Preconditions and Postconditions

### Deduplicator.dedupe()

- **Preconditions**:
  - items is not null
- **Postconditions**:
  - result is not null

## Related Contracts

- [Converter](./converter.md)
"#;

fn workspace(converter_post: &str) -> (tempfile::TempDir, Vec<Contract>) {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("converter.md"), converter_doc(converter_post)).unwrap();
    fs::write(dir.path().join("deduplicator.md"), DEDUPLICATOR_DOC).unwrap();
    fs::write(dir.path().join("README.md"), "# Contracts\n").unwrap();
    let loaded = load_contracts(dir.path(), &LoaderConfig::default()).unwrap();
    assert!(loaded.failures.is_empty());
    (dir, loaded.items)
}

fn split(contracts: &[Contract]) -> (Vec<Contract>, Vec<Contract>) {
    contracts.iter().cloned().partition(|c| c.name == "Converter")
}

#[test]
fn non_null_pipeline_is_compatible() {
    let (_dir, contracts) = workspace("result is not null");
    assert_eq!(contracts.len(), 2);

    let (producers, consumers) = split(&contracts);
    let problems = check_compatibility(&producers, &consumers).unwrap();
    assert!(problems.is_empty(), "{problems:?}");
}

#[test]
fn contradicting_bounds_are_a_hard_incompatibility() {
    let (_dir, contracts) = workspace("result > 0");
    let mut contracts = contracts;
    let dedupe = contracts
        .iter_mut()
        .find(|c| c.name == "Deduplicator")
        .and_then(|c| c.elements.first_mut())
        .and_then(|class| class.children.first_mut())
        .unwrap();
    dedupe.preconditions = vec!["items <= 0".into()];

    let (producers, consumers) = split(&contracts);
    match check_compatibility(&producers, &consumers) {
        Err(Error::HardIncompatibility { postcondition, precondition, .. }) => {
            assert_eq!(postcondition, "result > 0");
            assert_eq!(precondition, "items <= 0");
        }
        other => panic!("expected a hard incompatibility, got {other:?}"),
    }
}

#[test]
fn parsed_documents_are_consistent() {
    let (_dir, contracts) = workspace("result is not null");
    for contract in &contracts {
        assert!(check_consistency(contract).is_empty(), "{}: {:?}", contract.name, check_consistency(contract));
    }
}

#[test]
fn markers_round_trip() {
    let (_dir, contracts) = workspace("result is not null");
    let converter = contracts.iter().find(|c| c.name == "Converter").unwrap();
    assert_eq!(converter.version, "1.4.2");
    assert_eq!(converter.status, "Approved");
    assert!(Path::new(&converter.path).ends_with("converter.md"));

    let convert = converter.find_method("convert").unwrap();
    assert_eq!(convert.return_type.as_deref(), Some("Stream<JSONObject>"));
    assert_eq!(convert.errors[0].kind, "IOException");
    assert_eq!(converter.qualified_name(convert), "Converter.convert");
}

#[test]
fn method_without_preconditions_is_one_problem() {
    let dir = tempfile::tempdir().unwrap();
    let doc = "# Contract: Loader\n\n## Preconditions and Postconditions\n\n### load()\n\n- **Postconditions**:\n  - result >= 0\n";
    fs::write(dir.path().join("loader.md"), doc).unwrap();

    let loaded = load_contracts(dir.path(), &LoaderConfig::default()).unwrap();
    let loader = &loaded.items[0];
    assert_eq!(loader.version, "1.0.0");
    assert_eq!(loader.status, "unknown");

    let problems = check_consistency(loader);
    assert_eq!(problems.len(), 1);
    assert_eq!(problems[0].kind, ProblemKind::MissingPreconditions);
    assert!(problems[0].message.contains("load"));
    assert!(problems[0].message.contains("Loader"));
}

#[test]
fn unresolved_reference_names_both_contracts() {
    let (dir, _) = workspace("result is not null");
    let doc = "# Contract: Analyzer\n\n## Related Contracts\n\n- [Reporter](reporter.md)\n- [Converter](converter.md)\n";
    fs::write(dir.path().join("analyzer.md"), doc).unwrap();

    let loaded = load_contracts(dir.path(), &LoaderConfig::default()).unwrap();
    let problems = check_references(&loaded.items);
    assert_eq!(problems.len(), 1);
    assert_eq!(problems[0].kind, ProblemKind::UnresolvedReference);
    assert!(problems[0].message.contains("Analyzer"));
    assert!(problems[0].message.contains("Reporter"));
}

#[test]
fn schema_examples_follow_declared_shape() {
    let dir = tempfile::tempdir().unwrap();
    let schema = json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "type": "array",
        "items": {
            "type": "object",
            "required": ["sku", "price"],
            "properties": {
                "sku": { "type": "string" },
                "price": { "type": "number", "minimum": 0 },
                "seen": { "type": "string", "format": "date" }
            }
        }
    });
    let path = dir.path().join("records.json");
    fs::write(&path, serde_json::to_string_pretty(&schema).unwrap()).unwrap();

    let schema = load_valid_schema(&path).unwrap();
    let example = generate_example(&schema);
    let items = example.as_array().unwrap();
    assert_eq!(items.len(), 1);
    let record = items[0].as_object().unwrap();
    assert!(record.contains_key("sku") && record.contains_key("price") && record.contains_key("seen"));
    assert!(validate_instance(&example, &schema).is_empty());
}
