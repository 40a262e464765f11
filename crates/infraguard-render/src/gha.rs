use crate::{RenderableReport, RenderableSeverity};

fn escape(s: &str) -> String {
    s.replace('%', "%25").replace('\r', "%0D").replace('\n', "%0A")
}

/// Render findings as GitHub Actions workflow command annotations.
///
/// Format:
/// `::{level} file={path},line={line},col={col}::{message}`
pub fn render_github_annotations(report: &RenderableReport) -> Vec<String> {
    let mut out = Vec::new();

    if let Some(error) = &report.error {
        out.push(format!("::error::[infraguard] {}", escape(error)));
    }

    for f in &report.findings {
        let level = match f.severity {
            RenderableSeverity::Blocking => "error",
            RenderableSeverity::Advisory => "warning",
        };

        let mut meta = String::new();
        if let Some(loc) = &f.location {
            meta.push_str(&format!("file={}", loc.path));
            if let Some(line) = loc.line {
                meta.push_str(&format!(",line={line}"));
            }
            if let Some(col) = loc.col {
                meta.push_str(&format!(",col={col}"));
            }
        }

        let message = escape(&format!("[{}:{}] {}", f.rule_id, f.code, f.message));
        if meta.is_empty() {
            out.push(format!("::{level}::{message}"));
        } else {
            out.push(format!("::{level} {meta}::{message}"));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::{failing_report, fatal_report};

    #[test]
    fn severity_maps_to_level() {
        let lines = render_github_annotations(&failing_report());
        assert_eq!(
            lines,
            vec![
                "::error file=main.tf,line=12,col=1::[security.open_ingress:open_ingress] aws_security_group.ssh allows port 22 from 0.0.0.0/0",
                "::warning file=main.tf,line=1,col=1::[tagging.required_tags:missing_tag] aws_vpc.main is missing tag `Name`",
            ]
        );
    }

    #[test]
    fn fatal_error_is_annotated_and_escaped() {
        let mut report = fatal_report();
        report.error = Some("line one\nline two 100%".to_string());
        assert_eq!(
            render_github_annotations(&report),
            vec!["::error::[infraguard] line one%0Aline two 100%25"]
        );
    }
}
