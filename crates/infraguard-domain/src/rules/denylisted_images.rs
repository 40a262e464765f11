use crate::policy::RulePolicy;
use crate::rule::{Rule, RuleError};
use crate::rules::utils::{Allowlist, all_checked, build_globset, is_managed, resolved_attribute, resource_finding};
use infraguard_graph::Graph;
use infraguard_types::{Category, Finding, Severity, ids};
use serde_json::json;

const IMAGE_ATTRIBUTES: &[&str] = &["ami", "image_id"];

/// Machine images matching a configured denylist.
pub struct DenylistedImages {
    severity: Severity,
    allow: Vec<String>,
    deny: Vec<String>,
}

impl DenylistedImages {
    pub fn new(policy: &RulePolicy) -> Self {
        Self {
            severity: policy.severity,
            allow: policy.allow.clone(),
            deny: policy.options.deny.clone(),
        }
    }
}

impl Rule for DenylistedImages {
    fn id(&self) -> &str {
        ids::RULE_SECURITY_DENYLISTED_IMAGES
    }

    fn category(&self) -> Category {
        Category::Security
    }

    fn severity(&self) -> Severity {
        self.severity
    }

    fn check(&self, graph: &Graph) -> Result<Vec<Finding>, RuleError> {
        let Some(deny) = build_globset(&self.deny)? else {
            return Ok(Vec::new());
        };
        let allow = Allowlist::new(&self.allow)?;
        let mut out = Vec::new();

        for resource in all_checked(graph, &allow).filter(|r| is_managed(r)) {
            for attribute in IMAGE_ATTRIBUTES {
                let Some(value) = resolved_attribute(graph, resource, attribute)? else {
                    continue;
                };
                let Some(image) = value.as_str() else {
                    continue;
                };
                let matched: Vec<&str> = deny
                    .matches(image)
                    .into_iter()
                    .map(|i| self.deny[i].as_str())
                    .collect();
                if matched.is_empty() {
                    continue;
                }
                out.push(resource_finding(
                    ids::CODE_DENYLISTED_IMAGE,
                    resource,
                    Some(*attribute),
                    format!("{} uses denylisted image `{image}`", resource.address),
                    "Switch to an approved, patched image.",
                    json!({ "image": image, "patterns": matched }),
                ));
            }
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::RuleOptions;
    use crate::test_support::bound_graph;

    fn rule(deny: &[&str]) -> DenylistedImages {
        DenylistedImages::new(&RulePolicy::enabled(Severity::Blocking).with_options(RuleOptions {
            deny: deny.iter().map(|s| s.to_string()).collect(),
            ..RuleOptions::default()
        }))
    }

    const CONFIG: &str = r#"
variable "legacy_ami" {
  default = "ami-0legacy1234"
}

resource "aws_instance" "mongo" {
  ami           = var.legacy_ami
  instance_type = "t3.large"
}

resource "aws_launch_template" "nodes" {
  image_id = "ami-0abc"
}
"#;

    #[test]
    fn matching_images_are_reported() {
        let findings = rule(&["ami-0legacy*"]).check(&bound_graph(CONFIG)).expect("check");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].resource.as_deref(), Some("aws_instance.mongo"));
        assert_eq!(findings[0].data["patterns"], json!(["ami-0legacy*"]));
    }

    #[test]
    fn empty_denylist_passes() {
        assert!(rule(&[]).check(&bound_graph(CONFIG)).expect("check").is_empty());
    }

    #[test]
    fn invalid_pattern_is_a_rule_error() {
        let err = rule(&["ami-["])
            .check(&bound_graph(CONFIG))
            .expect_err("invalid glob");
        assert!(matches!(err, RuleError::InvalidPattern { .. }));
    }
}
