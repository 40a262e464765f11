//! Render use cases: Markdown, plain text and GitHub annotations from in-memory reports.

use infraguard_render::RenderableReport;

pub fn render_markdown(report: &RenderableReport) -> String {
    infraguard_render::render_markdown(report)
}

pub fn render_text(report: &RenderableReport) -> String {
    infraguard_render::render_text(report)
}

pub fn render_annotations(report: &RenderableReport, max: usize) -> Vec<String> {
    infraguard_render::render_github_annotations(report)
        .into_iter()
        .take(max)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use infraguard_render::{
        RenderableData, RenderableFinding, RenderableReport, RenderableSeverity,
        RenderableVerdictStatus,
    };

    fn sample_report() -> RenderableReport {
        let finding = |code: &str| RenderableFinding {
            severity: RenderableSeverity::Advisory,
            rule_id: "tagging.required_tags".to_string(),
            code: code.to_string(),
            message: "bad".to_string(),
            resource: Some("aws_vpc.main".to_string()),
            location: None,
            help: None,
        };
        RenderableReport {
            verdict: RenderableVerdictStatus::Pass,
            rules: Vec::new(),
            findings: vec![finding("missing_tag"), finding("empty_tag")],
            plan: None,
            error: None,
            data: RenderableData {
                resources: 1,
                findings_emitted: 2,
                findings_total: 2,
                truncated_reason: None,
            },
        }
    }

    #[test]
    fn render_annotations_respects_max() {
        assert_eq!(render_annotations(&sample_report(), 1).len(), 1);
        assert_eq!(render_annotations(&sample_report(), 10).len(), 2);
    }

    #[test]
    fn render_markdown_and_text_smoke() {
        let report = sample_report();
        assert!(render_markdown(&report).starts_with("# Infraguard report"));
        assert!(render_text(&report).contains("infraguard: PASS"));
    }
}
