//! Cross-contract compatibility checks
//!
//! Producer/consumer pairing plus two whole-workspace checks: related-contract
//! references must resolve, and an error kind named in several contracts must
//! be declared the same way everywhere.

use crate::analysis::conditions::{are_contradictory, mentions_token, substitute_token};
use crate::analysis::types::are_compatible;
use crate::config::CompatibilityConfig;
use crate::error::{Error, Result};
use crate::parser::contracts::{Condition, Contract, ContractElement, Parameter};
use crate::report::{Problem, ProblemKind};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info};

/// Check producers against consumers with the default configuration
pub fn check_compatibility(producers: &[Contract], consumers: &[Contract]) -> Result<Vec<Problem>> {
    check_compatibility_with(producers, consumers, &CompatibilityConfig::default())
}

/// Check producers against consumers
///
/// Referential integrity and error-kind consistency run over all contracts
/// (producers and consumers) and are reported as problems. Then the methods
/// are paired by [`check_pairing`], which may abort the check with
/// [`Error::HardIncompatibility`]. Callers that must keep the problems found
/// before an abort run the three checks themselves.
pub fn check_compatibility_with(
    producers: &[Contract],
    consumers: &[Contract],
    config: &CompatibilityConfig,
) -> Result<Vec<Problem>> {
    let mut problems = check_references(producers.iter().chain(consumers));
    problems.extend(check_error_consistency(producers.iter().chain(consumers)));
    check_pairing(producers, consumers, config)?;
    debug!(problems = problems.len(), "compatibility check complete");
    Ok(problems)
}

/// Pair producer outputs with consumer inputs
///
/// Every producer method with a return type is paired with every consumer
/// method parameter of a compatible type. A producer postcondition that, with
/// the placeholder replaced by the parameter name, contradicts a consumer
/// precondition is an [`Error::HardIncompatibility`].
///
/// The placeholder is matched as a literal whole word. Paraphrases such as
/// "the return value" are not recognized.
pub fn check_pairing(producers: &[Contract], consumers: &[Contract], config: &CompatibilityConfig) -> Result<()> {
    let outputs: Vec<(&Contract, &ContractElement)> = producers
        .iter()
        .flat_map(|c| c.methods().filter(|m| m.output_type().is_some()).map(move |m| (c, m)))
        .collect();
    let inputs: Vec<(&Contract, &ContractElement)> = consumers
        .iter()
        .flat_map(|c| c.methods().filter(|m| !m.parameters.is_empty()).map(move |m| (c, m)))
        .collect();

    info!(outputs = outputs.len(), inputs = inputs.len(), "pairing producer and consumer methods");

    let mut pairs = 0usize;
    for (producer, output) in &outputs {
        let Some(output_type) = output.output_type() else {
            continue;
        };
        for (consumer, input) in &inputs {
            for param in &input.parameters {
                if !are_compatible(output_type, &param.type_name) {
                    continue;
                }
                pairs += 1;
                check_pair(producer, output, consumer, input, param, config)?;
            }
        }
    }

    debug!(pairs, "pairing complete");
    Ok(())
}

fn check_pair(
    producer: &Contract,
    output: &ContractElement,
    consumer: &Contract,
    input: &ContractElement,
    param: &Parameter,
    config: &CompatibilityConfig,
) -> Result<()> {
    let placeholder = config.result_placeholder.as_str();
    for post in output.postconditions.iter().filter(|p| mentions_token(p.as_str(), placeholder)) {
        let substituted = Condition::new(substitute_token(post.as_str(), placeholder, &param.name));
        for pre in input.preconditions.iter().filter(|q| mentions_token(q.as_str(), &param.name)) {
            if let Some(report) = are_contradictory(&substituted, pre) {
                debug!(lhs = %report.left_hand_side, "hard incompatibility");
                return Err(Error::HardIncompatibility {
                    producer: format!("{} ({})", producer.qualified_name(output), producer.name),
                    consumer: format!("{} ({})", consumer.qualified_name(input), consumer.name),
                    postcondition: post.to_string(),
                    precondition: pre.to_string(),
                });
            }
        }
    }
    Ok(())
}

/// Every related-contract reference must resolve to a loaded contract
///
/// A target resolves when, with any `#fragment` removed, it equals a loaded
/// path, equals one after resolving it against the referring document's
/// directory, or shares its file name with one.
pub fn check_references<'a>(contracts: impl IntoIterator<Item = &'a Contract>) -> Vec<Problem> {
    let contracts: Vec<&Contract> = contracts.into_iter().collect();
    let loaded: Vec<PathBuf> = contracts.iter().map(|c| normalize(Path::new(&c.path))).collect();
    let basenames: BTreeSet<&str> = contracts
        .iter()
        .filter_map(|c| Path::new(&c.path).file_name().and_then(|n| n.to_str()))
        .collect();

    let mut problems = Vec::new();
    for contract in &contracts {
        let base = Path::new(&contract.path).parent().unwrap_or_else(|| Path::new(""));
        for related in &contract.related_contracts {
            let target = related.path.split('#').next().unwrap_or_default().trim();
            if target.is_empty() {
                continue;
            }
            let target_path = Path::new(target);
            let resolved = loaded.contains(&normalize(target_path))
                || loaded.contains(&normalize(&base.join(target_path)))
                || target_path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| basenames.contains(n));
            if !resolved {
                problems.push(Problem::new(
                    ProblemKind::UnresolvedReference,
                    format!(
                        "Contract {} references unresolved contract {} ({})",
                        contract.name, related.name, related.path
                    ),
                ));
            }
        }
    }
    problems
}

/// Lexical normalization: drops `.` and folds `..` without touching the filesystem
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// An error kind named in several contracts must be declared the same way
///
/// Occurrences are grouped by simple name (`IOException` and
/// `java.io.IOException` are the same error); a group spanning more than one
/// contract with more than one distinct declared kind is one problem.
pub fn check_error_consistency<'a>(contracts: impl IntoIterator<Item = &'a Contract>) -> Vec<Problem> {
    // simple name -> declared kind -> contracts declaring it
    let mut occurrences: BTreeMap<&str, BTreeMap<&str, BTreeSet<&str>>> = BTreeMap::new();
    for contract in contracts {
        for method in contract.methods() {
            for error in &method.errors {
                occurrences
                    .entry(error.simple_name())
                    .or_default()
                    .entry(error.kind.as_str())
                    .or_default()
                    .insert(contract.name.as_str());
            }
        }
    }

    occurrences
        .into_iter()
        .filter_map(|(simple, kinds)| {
            let contracts: BTreeSet<&str> = kinds.values().flatten().copied().collect();
            if contracts.len() < 2 || kinds.len() < 2 {
                return None;
            }
            let detail: Vec<String> = kinds
                .iter()
                .map(|(kind, owners)| format!("{} in {}", kind, owners.iter().copied().collect::<Vec<_>>().join(", ")))
                .collect();
            Some(Problem::new(
                ProblemKind::InconsistentError,
                format!("Inconsistent declaration of error {}: {}", simple, detail.join("; ")),
            ))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::contracts::{ElementKind, ErrorDescriptor, RelatedContract};

    fn producer(post: &[&str]) -> Contract {
        let mut contract = Contract::new("Converter", "1.0.0", "Approved", "contracts/converter/converter.md");
        let mut convert = ContractElement::new("convert", ElementKind::Method);
        convert.return_type = Some("Stream<JSONObject>".to_string());
        convert.postconditions = post.iter().map(|c| Condition::from(*c)).collect();
        contract.elements.push(convert);
        contract
    }

    fn consumer(pre: &[&str]) -> Contract {
        let mut contract = Contract::new("Deduplicator", "1.0.0", "Approved", "contracts/deduplicator/deduplicator.md");
        let mut dedupe = ContractElement::new("dedupe", ElementKind::Method);
        dedupe.parameters = vec![Parameter::new("items", "Stream<JSONObject>")];
        dedupe.preconditions = pre.iter().map(|c| Condition::from(*c)).collect();
        contract.elements.push(dedupe);
        contract
    }

    #[test]
    fn test_agreeing_non_null_conditions_pass() {
        let problems = check_compatibility(&[producer(&["result is not null"])], &[consumer(&["items is not null"])]).unwrap();
        assert!(problems.is_empty());
    }

    #[test]
    fn test_contradiction_is_hard_incompatibility() {
        let err = check_compatibility(&[producer(&["result > 0"])], &[consumer(&["items <= 0"])]).unwrap_err();
        match err {
            Error::HardIncompatibility { producer, consumer, postcondition, precondition } => {
                assert_eq!(postcondition, "result > 0");
                assert_eq!(precondition, "items <= 0");
                assert!(producer.contains("convert"));
                assert!(consumer.contains("dedupe"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_incompatible_types_are_not_paired() {
        let mut consumer = consumer(&["items <= 0"]);
        consumer.elements[0].parameters = vec![Parameter::new("items", "List<JSONObject>")];
        assert!(check_compatibility(&[producer(&["result > 0"])], &[consumer]).unwrap().is_empty());
    }

    #[test]
    fn test_placeholder_is_configurable() {
        let config = CompatibilityConfig { result_placeholder: "out".to_string() };
        let result = check_compatibility_with(&[producer(&["result > 0"])], &[consumer(&["items <= 0"])], &config);
        assert!(result.unwrap().is_empty());

        let result = check_compatibility_with(&[producer(&["out > 0"])], &[consumer(&["items <= 0"])], &config);
        assert!(matches!(result, Err(Error::HardIncompatibility { .. })));
    }

    #[test]
    fn test_problems_are_collected_before_pairing_aborts() {
        let mut converter = producer(&["result > 0"]);
        converter.related_contracts = vec![RelatedContract { name: "Ghost".into(), path: "ghost.md".into() }];
        let producers = [converter];
        let consumers = [consumer(&["items <= 0"])];

        let problems = check_references(producers.iter().chain(&consumers));
        assert_eq!(problems.len(), 1);
        assert_eq!(problems[0].message, "Contract Converter references unresolved contract Ghost (ghost.md)");
        let pairing = check_pairing(&producers, &consumers, &CompatibilityConfig::default());
        assert!(matches!(pairing, Err(Error::HardIncompatibility { .. })));
    }

    #[test]
    fn test_unresolved_reference_names_both_contracts() {
        let mut converter = producer(&[]);
        converter.related_contracts = vec![
            RelatedContract { name: "Deduplicator".into(), path: "../deduplicator/deduplicator.md".into() },
            RelatedContract { name: "Archiver".into(), path: "../archiver/archiver.md".into() },
        ];
        let problems = check_references(&[converter, consumer(&[])]);
        assert_eq!(problems.len(), 1);
        assert_eq!(problems[0].kind, ProblemKind::UnresolvedReference);
        assert!(problems[0].message.contains("Converter"));
        assert!(problems[0].message.contains("Archiver"));
    }

    #[test]
    fn test_reference_resolution_forms() {
        let mut converter = producer(&[]);
        converter.related_contracts = vec![
            RelatedContract { name: "exact".into(), path: "contracts/deduplicator/deduplicator.md".into() },
            RelatedContract { name: "relative".into(), path: "./../deduplicator/deduplicator.md#dedupe".into() },
            RelatedContract { name: "basename".into(), path: "elsewhere/deduplicator.md".into() },
        ];
        assert!(check_references(&[converter, consumer(&[])]).is_empty());
    }

    #[test]
    fn test_error_kind_disagreement() {
        let mut converter = producer(&[]);
        converter.elements[0].errors = vec![ErrorDescriptor::new("java.io.IOException", "read failure")];
        let mut dedup = consumer(&[]);
        dedup.elements[0].errors = vec![ErrorDescriptor::new("com.acme.IOException", "")];

        let problems = check_error_consistency(&[converter, dedup]);
        assert_eq!(problems.len(), 1);
        assert_eq!(problems[0].kind, ProblemKind::InconsistentError);
        assert!(problems[0].message.contains("java.io.IOException in Converter"));
        assert!(problems[0].message.contains("com.acme.IOException in Deduplicator"));
    }

    #[test]
    fn test_same_error_kind_everywhere_is_consistent() {
        let mut converter = producer(&[]);
        converter.elements[0].errors = vec![ErrorDescriptor::new("IOException", "")];
        let mut dedup = consumer(&[]);
        dedup.elements[0].errors = vec![ErrorDescriptor::new("IOException", "other text")];
        assert!(check_error_consistency(&[converter, dedup]).is_empty());
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(Path::new("a/b/../c/./d.md")), PathBuf::from("a/c/d.md"));
        assert_eq!(normalize(Path::new("../x.md")), PathBuf::from("../x.md"));
    }
}
