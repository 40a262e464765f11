use crate::{RenderableReport, RenderableSeverity};

fn escape_cell(s: &str) -> String {
    s.replace('|', "\\|").replace('\n', " ")
}

pub fn render_markdown(report: &RenderableReport) -> String {
    let mut out = String::new();

    out.push_str("# Infraguard report\n\n");
    let failed = report.rules.iter().filter(|r| !r.passed).count();
    out.push_str(&format!(
        "- Verdict: **{}**\n- Resources: {}\n- Rules: {} passed / {} failed\n- Findings: {} (emitted) / {} (total)\n\n",
        report.verdict.as_str(),
        report.data.resources,
        report.rules.len() - failed,
        failed,
        report.data.findings_emitted,
        report.data.findings_total
    ));

    if let Some(error) = &report.error {
        out.push_str(&format!("> Error: {error}\n\n"));
    }
    if let Some(r) = &report.data.truncated_reason {
        out.push_str(&format!("> Note: {r}\n\n"));
    }

    if !report.rules.is_empty() {
        out.push_str("## Rules\n\n");
        out.push_str("| Rule | Severity | Status | Message |\n");
        out.push_str("|---|---|---|---|\n");
        for rule in &report.rules {
            out.push_str(&format!(
                "| `{}` | {} | {} | {} |\n",
                rule.rule_id,
                rule.severity.as_str(),
                if rule.passed { "pass" } else { "fail" },
                escape_cell(&rule.message)
            ));
        }
        out.push('\n');
    }

    if report.findings.is_empty() {
        out.push_str("No findings.\n");
    } else {
        out.push_str("## Findings\n\n");
        for f in &report.findings {
            let sev = match f.severity {
                RenderableSeverity::Blocking => "BLOCKING",
                RenderableSeverity::Advisory => "ADVISORY",
            };
            out.push_str(&format!("- [{sev}] `{}` / `{}`: {}", f.rule_id, f.code, f.message));
            if let Some(loc) = &f.location {
                out.push_str(&format!(" (`{loc}`)"));
            }
            out.push('\n');
            if let Some(help) = &f.help {
                out.push_str(&format!("  - help: {help}\n"));
            }
        }
    }

    if let Some(plan) = &report.plan {
        out.push_str("\n## Plan\n\n");
        if plan.is_empty() {
            out.push_str("Nothing to do.\n");
        }
        for action in plan {
            out.push_str(&format!("- {} `{}`", action.action, action.address));
            if !action.changed_attributes.is_empty() {
                out.push_str(&format!(" ({})", action.changed_attributes.join(", ")));
            }
            out.push('\n');
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::{failing_report, fatal_report};

    #[test]
    fn renders_failing_report() {
        insta::assert_snapshot!(render_markdown(&failing_report()), @r"
# Infraguard report

- Verdict: **FAIL**
- Resources: 2
- Rules: 1 passed / 2 failed
- Findings: 2 (emitted) / 2 (total)

## Rules

| Rule | Severity | Status | Message |
|---|---|---|---|
| `structural.required_blocks` | blocking | pass | passed |
| `security.open_ingress` | blocking | fail | aws_security_group.ssh allows port 22 from 0.0.0.0/0 |
| `tagging.required_tags` | advisory | fail | aws_vpc.main is missing tag `Name` |

## Findings

- [BLOCKING] `security.open_ingress` / `open_ingress`: aws_security_group.ssh allows port 22 from 0.0.0.0/0 (`main.tf:12:1`)
  - help: Restrict the source CIDR.
- [ADVISORY] `tagging.required_tags` / `missing_tag`: aws_vpc.main is missing tag `Name` (`main.tf:1:1`)

## Plan

- update `aws_vpc.main` (cidr_block)
- create `aws_security_group.ssh`
");
    }

    #[test]
    fn renders_fatal_error_without_sections() {
        let md = render_markdown(&fatal_report());
        assert!(md.contains("Verdict: **ERROR**"));
        assert!(md.contains("> Error: parse error at main.tf:3:1"));
        assert!(!md.contains("## Rules"));
        assert!(!md.contains("## Plan"));
        assert!(md.ends_with("No findings.\n"));
    }

    #[test]
    fn renders_truncation_note_and_escapes_pipes() {
        let mut report = failing_report();
        report.data.truncated_reason = Some("findings truncated to max_findings=1".to_string());
        report.rules[1].message = "a | b".to_string();
        let md = render_markdown(&report);
        assert!(md.contains("> Note: findings truncated to max_findings=1"));
        assert!(md.contains("a \\| b"));
    }

    #[test]
    fn empty_plan_says_so() {
        let mut report = failing_report();
        report.plan = Some(Vec::new());
        assert!(render_markdown(&report).contains("## Plan\n\nNothing to do.\n"));
    }
}
