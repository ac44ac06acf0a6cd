//! Contradiction detection over free-text conditions
//!
//! Fast pattern-matching heuristic, not a solver. Two conditions contradict
//! when they share the same left-hand side (text before the comparison
//! operator, trimmed) and use one of the opposing operator pairs:
//! - `>` and `<=`
//! - `<` and `>=`
//! - `==` and `!=`
//!
//! Limitations: no arithmetic, no transitive bounds, no whitespace
//! normalization beyond a trim, and the right-hand sides are never compared.
//! Missed contradictions are expected; false positives should stay rare.

use crate::parser::contracts::Condition;
use serde::Serialize;
use std::fmt;

/// Comparison operator recognized in a condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Operator {
    Gt,
    Le,
    Lt,
    Ge,
    Eq,
    Ne,
}

impl Operator {
    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Gt => ">",
            Operator::Le => "<=",
            Operator::Lt => "<",
            Operator::Ge => ">=",
            Operator::Eq => "==",
            Operator::Ne => "!=",
        }
    }

    /// Byte offset of the operator in `condition`, if present
    fn find_in(self, condition: &str) -> Option<usize> {
        match self {
            Operator::Gt => find_strict(condition, '>', &['-', '=', '>']),
            Operator::Lt => find_strict(condition, '<', &['<']),
            Operator::Le | Operator::Ge | Operator::Eq | Operator::Ne => condition.find(self.symbol()),
        }
    }

    /// Left-hand side of `condition` for this operator, trimmed
    fn left_hand_side(self, condition: &str) -> Option<&str> {
        let pos = self.find_in(condition)?;
        let lhs = condition[..pos].trim();
        if lhs.is_empty() {
            None
        } else {
            Some(lhs)
        }
    }
}

/// Find a bare `<` or `>`: not followed by `=`, not preceded by any of
/// `excluded_before` (so `->`, `=>` and `>>` are not comparisons).
fn find_strict(condition: &str, op: char, excluded_before: &[char]) -> Option<usize> {
    let mut prev: Option<char> = None;
    let mut chars = condition.char_indices().peekable();
    while let Some((idx, c)) = chars.next() {
        if c == op {
            let next = chars.peek().map(|(_, n)| *n);
            let prev_ok = prev.map_or(true, |p| !excluded_before.contains(&p));
            if next != Some('=') && prev_ok {
                return Some(idx);
            }
        }
        prev = Some(c);
    }
    None
}

/// Opposing operator pairs
const RULES: [(Operator, Operator); 3] = [
    (Operator::Gt, Operator::Le),
    (Operator::Lt, Operator::Ge),
    (Operator::Eq, Operator::Ne),
];

/// A detected contradiction between two conditions
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContradictionReport {
    /// First condition, verbatim
    pub first: String,
    /// Second condition, verbatim
    pub second: String,
    /// Shared left-hand side
    pub left_hand_side: String,
    /// Operator found in the first condition
    pub first_operator: Operator,
    /// Operator found in the second condition
    pub second_operator: Operator,
}

impl fmt::Display for ContradictionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' contradicts '{}'", self.first, self.second)
    }
}

/// Check a single pair of conditions
pub fn are_contradictory(first: &Condition, second: &Condition) -> Option<ContradictionReport> {
    let (a, b) = (first.as_str(), second.as_str());
    for (op1, op2) in RULES {
        for (first_op, second_op) in [(op1, op2), (op2, op1)] {
            let (Some(lhs_a), Some(lhs_b)) = (first_op.left_hand_side(a), second_op.left_hand_side(b)) else {
                continue;
            };
            if lhs_a == lhs_b {
                return Some(ContradictionReport {
                    first: a.to_string(),
                    second: b.to_string(),
                    left_hand_side: lhs_a.to_string(),
                    first_operator: first_op,
                    second_operator: second_op,
                });
            }
        }
    }
    None
}

/// Every contradicting unordered pair within one list, in input order
pub fn find_contradictions(conditions: &[Condition]) -> Vec<ContradictionReport> {
    let mut reports = Vec::new();
    for (i, first) in conditions.iter().enumerate() {
        for second in &conditions[i + 1..] {
            if let Some(report) = are_contradictory(first, second) {
                reports.push(report);
            }
        }
    }
    reports
}

/// Every contradicting cross pair between two lists, in input order
pub fn find_contradictions_between(first: &[Condition], second: &[Condition]) -> Vec<ContradictionReport> {
    first
        .iter()
        .flat_map(|a| second.iter().filter_map(move |b| are_contradictory(a, b)))
        .collect()
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Byte ranges of whole-word occurrences of `token` in `text`
fn token_positions(text: &str, token: &str) -> Vec<usize> {
    if token.is_empty() {
        return Vec::new();
    }
    text.match_indices(token)
        .filter(|(idx, _)| {
            let before = text[..*idx].chars().next_back();
            let after = text[idx + token.len()..].chars().next();
            !before.is_some_and(is_ident_char) && !after.is_some_and(is_ident_char)
        })
        .map(|(idx, _)| idx)
        .collect()
}

/// Whether `condition` mentions `token` as a whole word
///
/// Literal match only: `results` or `return value` do not mention `result`.
pub fn mentions_token(condition: &str, token: &str) -> bool {
    !token_positions(condition, token).is_empty()
}

/// Replace every whole-word occurrence of `token` with `replacement`
pub fn substitute_token(condition: &str, token: &str, replacement: &str) -> String {
    let mut out = String::with_capacity(condition.len());
    let mut last = 0;
    for idx in token_positions(condition, token) {
        out.push_str(&condition[last..idx]);
        out.push_str(replacement);
        last = idx + token.len();
    }
    out.push_str(&condition[last..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_substitution_is_whole_word() {
        assert!(mentions_token("result > 0", "result"));
        assert!(mentions_token("result.size() > 0", "result"));
        assert!(!mentions_token("results > 0", "result"));
        assert!(!mentions_token("the return value is positive", "result"));
        assert_eq!(substitute_token("result > 0 && result < max_result", "result", "items"), "items > 0 && items < max_result");
        assert_eq!(substitute_token("no placeholder", "result", "items"), "no placeholder");
    }

    fn conds(items: &[&str]) -> Vec<Condition> {
        items.iter().map(|c| Condition::from(*c)).collect()
    }

    #[test]
    fn test_greater_vs_less_equal() {
        let reports = find_contradictions(&conds(&["x > 0", "x <= 0"]));
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].left_hand_side, "x");
        assert_eq!(reports[0].first, "x > 0");
        assert_eq!(reports[0].second, "x <= 0");
        assert_eq!(reports[0].first_operator, Operator::Gt);
        assert_eq!(reports[0].second_operator, Operator::Le);
    }

    #[test]
    fn test_same_operator_is_not_contradiction() {
        assert!(find_contradictions(&conds(&["x > 0", "x > 1"])).is_empty());
    }

    #[test]
    fn test_rules_apply_in_either_order() {
        let reports = find_contradictions(&conds(&["count >= 1", "count < 1"]));
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].first_operator, Operator::Ge);
        assert_eq!(reports[0].second_operator, Operator::Lt);

        let reports = find_contradictions(&conds(&["state != OPEN", "state == OPEN"]));
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].left_hand_side, "state");
    }

    #[test]
    fn test_greater_equal_is_not_read_as_greater() {
        // `>=` vs `<=` matches no rule
        assert!(find_contradictions(&conds(&["x >= 0", "x <= 10"])).is_empty());
    }

    #[test]
    fn test_different_left_hand_sides() {
        assert!(find_contradictions(&conds(&["x > 0", "y <= 0"])).is_empty());
    }

    #[test]
    fn test_all_pairs_reported_in_order() {
        let reports = find_contradictions(&conds(&["x > 0", "x <= 0", "x <= 5"]));
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].second, "x <= 0");
        assert_eq!(reports[1].second, "x <= 5");
    }

    #[test]
    fn test_no_self_pairing() {
        assert!(find_contradictions(&conds(&["x > 0"])).is_empty());
    }

    #[test]
    fn test_cross_lists() {
        let invariants = conds(&["size >= 0", "name != null"]);
        let pre = conds(&["size < 0", "name == null", "other > 1"]);
        let reports = find_contradictions_between(&invariants, &pre);
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].first, "size >= 0");
        assert_eq!(reports[1].first, "name != null");
    }

    #[test]
    fn test_malformed_conditions_pass_silently() {
        let reports = find_contradictions(&conds(&["", "> 0", "<= 0", "result is not null"]));
        assert!(reports.is_empty());
    }

    #[test]
    fn test_implication_arrow_is_not_comparison() {
        assert!(find_contradictions(&conds(&["a => b", "a <= b"])).is_empty());
    }
}
