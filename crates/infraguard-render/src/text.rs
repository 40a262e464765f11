use crate::{RenderableReport, RenderableVerdictStatus};

fn action_marker(action: &str) -> char {
    match action {
        "create" => '+',
        "update" => '~',
        "destroy" => '-',
        _ => '=',
    }
}

/// Plain terminal output: one line per rule, findings indented below their rule.
pub fn render_text(report: &RenderableReport) -> String {
    let mut out = String::new();

    if let Some(error) = &report.error {
        out.push_str(&format!("error: {error}\n"));
    }

    for rule in &report.rules {
        let status = if rule.passed { "PASS" } else { "FAIL" };
        out.push_str(&format!(
            "[{status}] {} ({}): {}\n",
            rule.rule_id,
            rule.severity.as_str(),
            rule.message
        ));
        for f in report.findings.iter().filter(|f| f.rule_id == rule.rule_id) {
            let place = match (&f.location, &f.resource) {
                (Some(loc), _) => format!("{loc}: "),
                (None, Some(resource)) => format!("{resource}: "),
                (None, None) => String::new(),
            };
            out.push_str(&format!("    {place}{} [{}]\n", f.message, f.code));
        }
    }

    if let Some(plan) = &report.plan {
        out.push_str("\nplan:\n");
        for action in plan {
            out.push_str(&format!("  {} {}", action_marker(&action.action), action.address));
            if !action.changed_attributes.is_empty() {
                out.push_str(&format!(" ({})", action.changed_attributes.join(", ")));
            }
            out.push('\n');
        }
    }

    let failed = report.rules.iter().filter(|r| !r.passed).count();
    let verdict = match report.verdict {
        RenderableVerdictStatus::Error => "ERROR".to_string(),
        v => format!(
            "{} ({} rules, {} failed, {} resources)",
            v.as_str(),
            report.rules.len(),
            failed,
            report.data.resources
        ),
    };
    out.push_str(&format!("\ninfraguard: {verdict}\n"));
    out
}
