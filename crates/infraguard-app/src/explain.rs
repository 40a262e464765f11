//! The `explain` use case: look up rule and code documentation.

use infraguard_types::explain::{self, Explanation};

/// Output from the explain use case.
#[derive(Clone, Debug)]
pub enum ExplainOutput {
    Found(Explanation),
    /// Unknown identifier; includes the known rule ids and codes.
    NotFound {
        identifier: String,
        available_rule_ids: &'static [&'static str],
        available_codes: &'static [&'static str],
    },
}

/// Look up an explanation for a rule id or finding code.
pub fn run_explain(identifier: &str) -> ExplainOutput {
    match explain::lookup_explanation(identifier) {
        Some(exp) => ExplainOutput::Found(exp),
        None => ExplainOutput::NotFound {
            identifier: identifier.to_string(),
            available_rule_ids: explain::all_rule_ids(),
            available_codes: explain::all_codes(),
        },
    }
}

/// Format an explanation for terminal display.
pub fn format_explanation(exp: &Explanation) -> String {
    let mut out = String::new();

    out.push_str(exp.title);
    out.push('\n');
    out.push_str(&"=".repeat(exp.title.len()));
    out.push_str("\n\n");
    out.push_str(exp.description);
    out.push_str("\n\nRemediation\n-----------\n");
    out.push_str(exp.remediation);
    out.push_str("\n\nExamples\n--------\n\n");
    out.push_str("Before (violation):\n```hcl\n");
    out.push_str(exp.examples.before);
    out.push_str("\n```\n\nAfter (fixed):\n```hcl\n");
    out.push_str(exp.examples.after);
    out.push_str("\n```\n");

    out
}

/// Format the "not found" message for terminal display.
pub fn format_not_found(identifier: &str, rule_ids: &[&str], codes: &[&str]) -> String {
    let mut out = format!("Unknown rule id or code: {identifier}\n\nAvailable rule ids:\n");
    for id in rule_ids {
        out.push_str(&format!("  - {id}\n"));
    }
    out.push_str("\nAvailable codes:\n");
    for code in codes {
        out.push_str(&format!("  - {code}\n"));
    }
    out
}
