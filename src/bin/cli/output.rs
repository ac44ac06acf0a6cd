//! Output formatting for check results
//!
//! Formats run reports and parsed contracts as human-readable text, JSON, or Markdown

use crate::cli::verify::RunReport;
use contract_lock::{Contract, ContractElement};
use serde_json::json;
use std::fmt::Write;

/// Output format for every subcommand
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Human,
    Json,
    Markdown,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "human" => Ok(OutputFormat::Human),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            _ => Err(format!("Unknown format: {}. Expected: human, json, markdown", s)),
        }
    }
}

/// Format a run report
pub fn format_report(report: &RunReport, format: OutputFormat) -> String {
    match format {
        OutputFormat::Human => format_human(report),
        OutputFormat::Json => format_json(report),
        OutputFormat::Markdown => format_markdown(report),
    }
}

fn format_human(report: &RunReport) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "Running contract-lock {} check...\n", report.check);

    for subject in &report.subjects {
        let _ = writeln!(output, "{}", subject.subject);
        if subject.problems.is_empty() {
            output.push_str("  ✅ Status: PASSED\n");
        } else {
            let _ = writeln!(output, "  ❌ Status: FAILED ({} problems)", subject.problems.len());
            for problem in &subject.problems {
                let _ = writeln!(output, "    - {}", problem);
            }
        }
        output.push('\n');
    }

    if let Some(hard) = &report.hard_incompatibility {
        let _ = writeln!(output, "❌ {}\n", hard);
    }

    if !report.failures.is_empty() {
        output.push_str("Skipped files:\n");
        for failure in &report.failures {
            let _ = writeln!(output, "  ⚠️  {}: {}", failure.path, failure.error);
        }
        output.push('\n');
    }

    let failed = report.subjects.len() - report.passed_count();
    let _ = writeln!(
        output,
        "check result: {}. {} passed; {} failed; {} problems; {} skipped",
        if report.is_failure() { "FAILED" } else { "ok" },
        report.passed_count(),
        failed,
        report.problem_count(),
        report.failures.len()
    );
    output
}

fn format_json(report: &RunReport) -> String {
    let output = json!({
        "summary": {
            "check": report.check,
            "subjects": report.subjects.len(),
            "passed": report.passed_count(),
            "problems": report.problem_count(),
            "skipped": report.failures.len(),
            "failed": report.is_failure(),
        },
        "report": report,
    });
    serde_json::to_string_pretty(&output).unwrap_or_else(|_| "{}".to_string())
}

fn format_markdown(report: &RunReport) -> String {
    let mut md = String::new();
    let _ = writeln!(md, "# Contract Lock {} Report\n", capitalize(report.check));

    md.push_str("## Summary\n\n");
    let _ = writeln!(md, "- **Subjects:** {}", report.subjects.len());
    let _ = writeln!(md, "- **Passed:** {} ✅", report.passed_count());
    let _ = writeln!(md, "- **Problems:** {} ❌", report.problem_count());
    let _ = writeln!(md, "- **Skipped files:** {} ⚠️\n", report.failures.len());

    md.push_str("## Results\n\n");
    md.push_str("| Subject | Problems | Status |\n");
    md.push_str("|---------|----------|--------|\n");
    for subject in &report.subjects {
        let status = if subject.problems.is_empty() { "✅ Passed" } else { "❌ Failed" };
        let _ = writeln!(md, "| `{}` | {} | {} |", subject.subject, subject.problems.len(), status);
    }

    let failing: Vec<_> = report.subjects.iter().filter(|s| !s.problems.is_empty()).collect();
    if !failing.is_empty() {
        md.push_str("\n## Problems\n\n");
        for subject in failing {
            let _ = writeln!(md, "### `{}`\n", subject.subject);
            for problem in &subject.problems {
                let _ = writeln!(md, "- {}", problem);
            }
            md.push('\n');
        }
    }

    if let Some(hard) = &report.hard_incompatibility {
        let _ = writeln!(md, "\n## Hard Incompatibility\n\n{}\n", hard);
    }

    if !report.failures.is_empty() {
        md.push_str("\n## Skipped Files\n\n");
        for failure in &report.failures {
            let _ = writeln!(md, "- `{}`: {}", failure.path, failure.error);
        }
    }
    md
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Format a parsed contract
pub fn format_contract(contract: &Contract, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(contract).unwrap_or_else(|_| "{}".to_string()),
        OutputFormat::Human | OutputFormat::Markdown => format_contract_outline(contract, format),
    }
}

fn format_contract_outline(contract: &Contract, format: OutputFormat) -> String {
    let markdown = format == OutputFormat::Markdown;
    let mut out = String::new();
    if markdown {
        let _ = writeln!(out, "# {}\n", contract.name);
    } else {
        let _ = writeln!(out, "{}", contract.name);
    }
    let _ = writeln!(out, "  version: {}", contract.version);
    let _ = writeln!(out, "  status: {}", contract.status);
    let _ = writeln!(out, "  path: {}", contract.path);
    let _ = writeln!(out, "  sha256: {}", contract.fingerprint);

    for element in &contract.elements {
        write_element(&mut out, element, 1);
    }
    if !contract.invariants.is_empty() {
        out.push_str("  invariants:\n");
        for invariant in &contract.invariants {
            let _ = writeln!(out, "    - {}", invariant);
        }
    }
    for related in &contract.related_contracts {
        let _ = writeln!(out, "  related: {} -> {}", related.name, related.path);
    }
    out
}

fn write_element(out: &mut String, element: &ContractElement, depth: usize) {
    let indent = "  ".repeat(depth);
    let params: Vec<String> = element
        .parameters
        .iter()
        .map(|p| format!("{} {}", p.type_name, p.name))
        .collect();
    if element.is_method() {
        let _ = writeln!(
            out,
            "{}{} {}({})",
            indent,
            element.return_type.as_deref().unwrap_or("?"),
            element.name,
            params.join(", ")
        );
    } else {
        let _ = writeln!(out, "{}{} {}", indent, element.kind, element.name);
    }
    for pre in &element.preconditions {
        let _ = writeln!(out, "{}  requires: {}", indent, pre);
    }
    for post in &element.postconditions {
        let _ = writeln!(out, "{}  ensures: {}", indent, post);
    }
    for error in &element.errors {
        let _ = writeln!(out, "{}  throws: {}", indent, error.kind);
    }
    for child in &element.children {
        write_element(out, child, depth + 1);
    }
}
