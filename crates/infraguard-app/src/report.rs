use anyhow::Context;
use infraguard_domain::report::Report;
use infraguard_render::{
    RenderableData, RenderableFinding, RenderableLocation, RenderablePlanAction, RenderableReport,
    RenderableRule, RenderableSeverity, RenderableVerdictStatus,
};
use infraguard_types::{
    Category, ErrorKind, FatalError, Finding, Location, ReportEnvelope, ReportSummary, RuleResult,
    SCHEMA_REPORT_V1, Severity, SeverityCounts, ToolMeta, Verdict, ids,
};
use time::OffsetDateTime;

pub(crate) fn tool_meta() -> ToolMeta {
    ToolMeta {
        name: "infraguard".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }
}

/// Wrap a domain report in run metadata.
pub(crate) fn envelope(
    report: Report,
    started_at: OffsetDateTime,
    finished_at: OffsetDateTime,
) -> ReportEnvelope {
    ReportEnvelope {
        schema: SCHEMA_REPORT_V1.to_string(),
        tool: tool_meta(),
        started_at,
        finished_at,
        verdict: report.verdict,
        results: report.results,
        plan: report.plan,
        error: report.error,
        summary: report.summary,
    }
}

/// The report written when the tool itself failed (bad config, unreadable input, ...).
pub fn runtime_error_report(message: &str) -> ReportEnvelope {
    let now = OffsetDateTime::now_utc();
    ReportEnvelope {
        schema: SCHEMA_REPORT_V1.to_string(),
        tool: tool_meta(),
        started_at: now,
        finished_at: now,
        verdict: Verdict::Fail,
        results: vec![RuleResult {
            rule_id: ids::CHECK_TOOL_RUNTIME.to_string(),
            category: Category::EngineError,
            severity: Severity::Blocking,
            passed: false,
            message: message.to_string(),
            findings: vec![Finding {
                code: ids::CODE_RUNTIME_ERROR.to_string(),
                message: message.to_string(),
                resource: None,
                attribute: None,
                location: None,
                help: Some("Fix the tool error and re-run infraguard.".to_string()),
                data: serde_json::Value::Null,
            }],
        }],
        plan: None,
        error: Some(FatalError {
            kind: ErrorKind::Runtime,
            message: message.to_string(),
            location: None,
        }),
        summary: ReportSummary {
            rules_evaluated: 1,
            rules_failed: 1,
            counts: SeverityCounts {
                blocking_failed: 1,
                ..SeverityCounts::default()
            },
            findings_total: 1,
            findings_emitted: 1,
            ..ReportSummary::default()
        },
    }
}

/// 0 on pass, 1 on failed rules, 2 when the run stopped on an error.
pub fn report_exit_code(report: &ReportEnvelope) -> i32 {
    match (&report.error, report.verdict) {
        (Some(_), _) => 2,
        (None, Verdict::Fail) => 1,
        (None, Verdict::Pass) => 0,
    }
}

pub fn parse_report_json(text: &str) -> anyhow::Result<ReportEnvelope> {
    let value: serde_json::Value = serde_json::from_str(text).context("parse report json")?;
    let schema = value
        .get("schema")
        .and_then(|v| v.as_str())
        .unwrap_or_default();
    if schema != SCHEMA_REPORT_V1 {
        anyhow::bail!("unknown report schema: {schema:?} (expected {SCHEMA_REPORT_V1})");
    }
    serde_json::from_value(value).context("parse infraguard report")
}

pub fn serialize_report(report: &ReportEnvelope) -> anyhow::Result<Vec<u8>> {
    serde_json::to_vec_pretty(report).context("serialize report")
}

pub fn to_renderable(report: &ReportEnvelope) -> RenderableReport {
    let verdict = match (&report.error, report.verdict) {
        (Some(_), _) => RenderableVerdictStatus::Error,
        (None, Verdict::Pass) => RenderableVerdictStatus::Pass,
        (None, Verdict::Fail) => RenderableVerdictStatus::Fail,
    };

    RenderableReport {
        verdict,
        rules: report
            .results
            .iter()
            .map(|r| RenderableRule {
                rule_id: r.rule_id.clone(),
                severity: renderable_severity(r.severity),
                passed: r.passed,
                message: r.message.clone(),
            })
            .collect(),
        findings: report
            .results
            .iter()
            .flat_map(|r| r.findings.iter().map(move |f| renderable_finding(r, f)))
            .collect(),
        plan: report.plan.as_ref().map(|actions| {
            actions
                .iter()
                .map(|a| RenderablePlanAction {
                    address: a.address.clone(),
                    action: a.action.as_str().to_string(),
                    changed_attributes: a.changed_attributes.clone(),
                })
                .collect()
        }),
        error: report.error.as_ref().map(|e| e.message.clone()),
        data: RenderableData {
            resources: report.summary.resources,
            findings_emitted: report.summary.findings_emitted,
            findings_total: report.summary.findings_total,
            truncated_reason: report.summary.truncated_reason.clone(),
        },
    }
}

fn renderable_severity(severity: Severity) -> RenderableSeverity {
    match severity {
        Severity::Blocking => RenderableSeverity::Blocking,
        Severity::Advisory => RenderableSeverity::Advisory,
    }
}

fn renderable_location(loc: &Location) -> RenderableLocation {
    RenderableLocation {
        path: loc.path.as_str().to_string(),
        line: loc.line,
        col: loc.col,
    }
}

fn renderable_finding(result: &RuleResult, f: &Finding) -> RenderableFinding {
    RenderableFinding {
        severity: renderable_severity(result.severity),
        rule_id: result.rule_id.clone(),
        code: f.code.clone(),
        message: f.message.clone(),
        resource: f.resource.clone(),
        location: f.location.as_ref().map(renderable_location),
        help: f.help.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use infraguard_types::{Action, PlanAction, SourcePath};

    fn sample() -> ReportEnvelope {
        let now = OffsetDateTime::UNIX_EPOCH;
        ReportEnvelope {
            schema: SCHEMA_REPORT_V1.to_string(),
            tool: tool_meta(),
            started_at: now,
            finished_at: now,
            verdict: Verdict::Pass,
            results: vec![RuleResult {
                rule_id: ids::RULE_TAGGING_REQUIRED_TAGS.to_string(),
                category: Category::Tagging,
                severity: Severity::Advisory,
                passed: false,
                message: "aws_vpc.main is missing tag `Name`".to_string(),
                findings: vec![Finding {
                    code: ids::CODE_MISSING_TAG.to_string(),
                    message: "aws_vpc.main is missing tag `Name`".to_string(),
                    resource: Some("aws_vpc.main".to_string()),
                    attribute: Some("tags".to_string()),
                    location: Some(Location {
                        path: SourcePath::new("main.tf"),
                        line: Some(5),
                        col: Some(1),
                    }),
                    help: None,
                    data: serde_json::json!({ "tag": "Name" }),
                }],
            }],
            plan: Some(vec![PlanAction {
                address: "aws_vpc.main".to_string(),
                action: Action::NoOp,
                depends_on: Vec::new(),
                changed_attributes: Vec::new(),
            }]),
            error: None,
            summary: ReportSummary {
                resources: 1,
                rules_evaluated: 1,
                rules_failed: 1,
                findings_total: 1,
                findings_emitted: 1,
                ..ReportSummary::default()
            },
        }
    }

    #[test]
    fn serialized_reports_parse_back() {
        let report = sample();
        let bytes = serialize_report(&report).expect("serialize");
        let text = String::from_utf8(bytes).expect("utf8");
        assert_eq!(parse_report_json(&text).expect("parse"), report);
    }

    #[test]
    fn foreign_schemas_are_rejected() {
        let err = parse_report_json(r#"{"schema": "other.report.v1"}"#).expect_err("schema");
        assert!(err.to_string().contains("unknown report schema"));
        assert!(parse_report_json("not json").is_err());
    }

    #[test]
    fn renderable_findings_carry_their_rule() {
        let renderable = to_renderable(&sample());
        assert_eq!(renderable.verdict, RenderableVerdictStatus::Pass);
        assert_eq!(renderable.rules.len(), 1);
        let finding = &renderable.findings[0];
        assert_eq!(finding.rule_id, ids::RULE_TAGGING_REQUIRED_TAGS);
        assert_eq!(finding.severity, RenderableSeverity::Advisory);
        assert_eq!(
            finding.location.as_ref().map(ToString::to_string).as_deref(),
            Some("main.tf:5:1")
        );
        let plan = renderable.plan.expect("plan");
        assert_eq!(plan[0].action, "no-op");
    }

    #[test]
    fn runtime_errors_exit_with_two() {
        let report = runtime_error_report("config file not found");
        assert_eq!(report_exit_code(&report), 2);
        assert_eq!(report.results[0].rule_id, ids::CHECK_TOOL_RUNTIME);
        let renderable = to_renderable(&report);
        assert_eq!(renderable.verdict, RenderableVerdictStatus::Error);
        assert_eq!(renderable.error.as_deref(), Some("config file not found"));
    }

    #[test]
    fn exit_codes_follow_the_verdict() {
        let mut report = sample();
        assert_eq!(report_exit_code(&report), 0);
        report.verdict = Verdict::Fail;
        assert_eq!(report_exit_code(&report), 1);
    }
}
