use crate::*;

/// A failing run with one blocking and one advisory finding and a small plan.
pub fn failing_report() -> RenderableReport {
    RenderableReport {
        verdict: RenderableVerdictStatus::Fail,
        rules: vec![
            RenderableRule {
                rule_id: "structural.required_blocks".to_string(),
                severity: RenderableSeverity::Blocking,
                passed: true,
                message: "passed".to_string(),
            },
            RenderableRule {
                rule_id: "security.open_ingress".to_string(),
                severity: RenderableSeverity::Blocking,
                passed: false,
                message: "aws_security_group.ssh allows port 22 from 0.0.0.0/0".to_string(),
            },
            RenderableRule {
                rule_id: "tagging.required_tags".to_string(),
                severity: RenderableSeverity::Advisory,
                passed: false,
                message: "aws_vpc.main is missing tag `Name`".to_string(),
            },
        ],
        findings: vec![
            RenderableFinding {
                severity: RenderableSeverity::Blocking,
                rule_id: "security.open_ingress".to_string(),
                code: "open_ingress".to_string(),
                message: "aws_security_group.ssh allows port 22 from 0.0.0.0/0".to_string(),
                resource: Some("aws_security_group.ssh".to_string()),
                location: Some(RenderableLocation {
                    path: "main.tf".to_string(),
                    line: Some(12),
                    col: Some(1),
                }),
                help: Some("Restrict the source CIDR.".to_string()),
            },
            RenderableFinding {
                severity: RenderableSeverity::Advisory,
                rule_id: "tagging.required_tags".to_string(),
                code: "missing_tag".to_string(),
                message: "aws_vpc.main is missing tag `Name`".to_string(),
                resource: Some("aws_vpc.main".to_string()),
                location: Some(RenderableLocation {
                    path: "main.tf".to_string(),
                    line: Some(1),
                    col: Some(1),
                }),
                help: None,
            },
        ],
        plan: Some(vec![
            RenderablePlanAction {
                address: "aws_vpc.main".to_string(),
                action: "update".to_string(),
                changed_attributes: vec!["cidr_block".to_string()],
            },
            RenderablePlanAction {
                address: "aws_security_group.ssh".to_string(),
                action: "create".to_string(),
                changed_attributes: Vec::new(),
            },
        ]),
        error: None,
        data: RenderableData {
            resources: 2,
            findings_emitted: 2,
            findings_total: 2,
            truncated_reason: None,
        },
    }
}

/// A run stopped by a parse error.
pub fn fatal_report() -> RenderableReport {
    RenderableReport {
        verdict: RenderableVerdictStatus::Error,
        rules: Vec::new(),
        findings: Vec::new(),
        plan: None,
        error: Some("parse error at main.tf:3:1: expected `}`".to_string()),
        data: RenderableData {
            resources: 0,
            findings_emitted: 0,
            findings_total: 0,
            truncated_reason: None,
        },
    }
}
