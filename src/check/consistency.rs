//! Single-contract consistency checks

use crate::analysis::conditions::{find_contradictions, find_contradictions_between};
use crate::parser::contracts::{Condition, Contract, ContractElement};
use crate::report::{Problem, ProblemKind};
use tracing::debug;

/// Check one contract for internal consistency
///
/// For every method (top-level and owned by a class/interface):
/// - at least one precondition and one postcondition
/// - no contradiction within the preconditions or within the postconditions
/// - no contradiction between an invariant and a pre- or postcondition
///
/// The invariants a method is held to are the contract-level invariants plus
/// the element-local invariants of the method and of its enclosing element.
/// Classes and interfaces must carry a description; methods are exempt.
///
/// Exhaustive: every violation found is reported in one pass.
pub fn check_consistency(contract: &Contract) -> Vec<Problem> {
    let mut problems = Vec::new();

    for element in contract.elements.iter().filter(|e| !e.is_method()) {
        if element.description.trim().is_empty() {
            problems.push(Problem::new(
                ProblemKind::MissingDescription,
                format!("{} {} in contract {} has no description", element.kind, element.name, contract.name),
            ));
        }
    }

    for method in contract.methods() {
        check_method(contract, method, &mut problems);
    }

    debug!(contract = %contract.name, problems = problems.len(), "consistency check complete");
    problems
}

fn check_method(contract: &Contract, method: &ContractElement, problems: &mut Vec<Problem>) {
    let label = contract.qualified_name(method);

    if method.preconditions.is_empty() {
        problems.push(Problem::new(
            ProblemKind::MissingPreconditions,
            format!("Method {} in contract {} has no preconditions", label, contract.name),
        ));
    }
    if method.postconditions.is_empty() {
        problems.push(Problem::new(
            ProblemKind::MissingPostconditions,
            format!("Method {} in contract {} has no postconditions", label, contract.name),
        ));
    }

    for report in find_contradictions(&method.preconditions) {
        problems.push(contradiction(contract, &label, "preconditions", &report.to_string()));
    }
    for report in find_contradictions(&method.postconditions) {
        problems.push(contradiction(contract, &label, "postconditions", &report.to_string()));
    }

    let invariants = invariants_for(contract, method);
    for report in find_contradictions_between(&invariants, &method.preconditions) {
        problems.push(contradiction(contract, &label, "invariants and preconditions", &report.to_string()));
    }
    for report in find_contradictions_between(&invariants, &method.postconditions) {
        problems.push(contradiction(contract, &label, "invariants and postconditions", &report.to_string()));
    }
}

fn invariants_for(contract: &Contract, method: &ContractElement) -> Vec<Condition> {
    let mut invariants = contract.invariants.clone();
    if let Some(parent) = contract.parent_of(method) {
        invariants.extend(parent.invariants.iter().cloned());
    }
    invariants.extend(method.invariants.iter().cloned());
    invariants
}

fn contradiction(contract: &Contract, label: &str, between: &str, detail: &str) -> Problem {
    Problem::new(
        ProblemKind::Contradiction,
        format!("Contradiction in {} of method {} in contract {}: {}", between, label, contract.name, detail),
    )
}
