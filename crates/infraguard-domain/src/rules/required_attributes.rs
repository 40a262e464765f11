use crate::policy::{AttributeRequirement, RulePolicy};
use crate::rule::{Rule, RuleError};
use crate::rules::utils::{Allowlist, all_checked, is_managed, resolved_attribute, resource_finding};
use infraguard_graph::Graph;
use infraguard_types::{Category, Finding, Severity, ids};
use serde_json::json;
use std::collections::BTreeMap;

/// Per resource type, required attributes are present and of the declared type.
pub struct RequiredAttributes {
    severity: Severity,
    allow: Vec<String>,
    requirements: BTreeMap<String, Vec<AttributeRequirement>>,
}

impl RequiredAttributes {
    pub fn new(policy: &RulePolicy) -> Self {
        Self {
            severity: policy.severity,
            allow: policy.allow.clone(),
            requirements: policy.options.attributes.clone(),
        }
    }
}

impl Rule for RequiredAttributes {
    fn id(&self) -> &str {
        ids::RULE_STRUCTURAL_REQUIRED_ATTRIBUTES
    }

    fn category(&self) -> Category {
        Category::Structural
    }

    fn severity(&self) -> Severity {
        self.severity
    }

    fn check(&self, graph: &Graph) -> Result<Vec<Finding>, RuleError> {
        let allow = Allowlist::new(&self.allow)?;
        let mut out = Vec::new();

        for resource in all_checked(graph, &allow).filter(|r| is_managed(r)) {
            let Some(requirements) = self.requirements.get(resource.resource_type()) else {
                continue;
            };
            for req in requirements {
                let Some(value) = resolved_attribute(graph, resource, &req.name)? else {
                    out.push(resource_finding(
                        ids::CODE_MISSING_ATTRIBUTE,
                        resource,
                        Some(&req.name),
                        format!("{} is missing required attribute `{}`", resource.address, req.name),
                        "Set the attribute; the resource cannot be created without it.",
                        json!({ "expected": req.kind.as_str() }),
                    ));
                    continue;
                };
                if !req.kind.accepts(&value) {
                    out.push(resource_finding(
                        ids::CODE_ATTRIBUTE_TYPE_MISMATCH,
                        resource,
                        Some(&req.name),
                        format!(
                            "{}.{} should be {}, found {}",
                            resource.address,
                            req.name,
                            req.kind.as_str(),
                            value.type_name()
                        ),
                        "Use a value of the expected type.",
                        json!({ "expected": req.kind.as_str(), "found": value.type_name() }),
                    ));
                }
            }
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::default_options;
    use crate::test_support::{bound_graph, graph};

    fn rule() -> RequiredAttributes {
        RequiredAttributes::new(
            &RulePolicy::enabled(Severity::Blocking)
                .with_options(default_options(ids::RULE_STRUCTURAL_REQUIRED_ATTRIBUTES)),
        )
    }

    #[test]
    fn missing_and_mistyped_attributes_are_reported() {
        let g = graph(
            r#"
resource "aws_vpc" "main" {}

resource "aws_instance" "db" {
  ami           = ["ami-123"]
  instance_type = "t3.micro"
}
"#,
        );
        let findings = rule().check(&g).expect("check");
        let summary: Vec<(&str, Option<&str>)> = findings
            .iter()
            .map(|f| (f.code.as_str(), f.attribute.as_deref()))
            .collect();
        assert_eq!(
            summary,
            vec![
                (ids::CODE_MISSING_ATTRIBUTE, Some("cidr_block")),
                (ids::CODE_ATTRIBUTE_TYPE_MISMATCH, Some("ami")),
            ]
        );
    }

    #[test]
    fn references_are_resolved_or_accepted() {
        let g = bound_graph(
            r#"
variable "cidr" {
  type    = string
  default = "10.0.0.0/16"
}

resource "aws_vpc" "main" {
  cidr_block = var.cidr
}

resource "aws_subnet" "a" {
  vpc_id     = aws_vpc.main.id
  cidr_block = cidrsubnet(var.cidr, 8, 1)
}
"#,
        );
        assert!(rule().check(&g).expect("check").is_empty());
    }

    #[test]
    fn null_counts_as_missing() {
        let g = graph("resource \"aws_vpc\" \"main\" {\n  cidr_block = null\n}\n");
        let findings = rule().check(&g).expect("check");
        assert_eq!(findings[0].code, ids::CODE_MISSING_ATTRIBUTE);
    }
}
