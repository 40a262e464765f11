use crate::policy::RulePolicy;
use crate::rule::{Rule, RuleError};
use crate::rules::utils::{Allowlist, checked, resolved_attribute, resource_finding};
use infraguard_graph::Graph;
use infraguard_types::{Category, Finding, Severity, ids};
use serde_json::json;

const PUBLIC_ACLS: &[&str] = &["public-read", "public-read-write"];

const BLOCK_FLAGS: &[&str] = &[
    "block_public_acls",
    "block_public_policy",
    "ignore_public_acls",
    "restrict_public_buckets",
];

/// Buckets readable by anyone, and public access blocks that leave a gap.
pub struct PublicStorage {
    severity: Severity,
    allow: Vec<String>,
}

impl PublicStorage {
    pub fn new(policy: &RulePolicy) -> Self {
        Self {
            severity: policy.severity,
            allow: policy.allow.clone(),
        }
    }
}

impl Rule for PublicStorage {
    fn id(&self) -> &str {
        ids::RULE_SECURITY_PUBLIC_STORAGE
    }

    fn category(&self) -> Category {
        Category::Security
    }

    fn severity(&self) -> Severity {
        self.severity
    }

    fn check(&self, graph: &Graph) -> Result<Vec<Finding>, RuleError> {
        let allow = Allowlist::new(&self.allow)?;
        let mut out = Vec::new();

        for resource_type in ["aws_s3_bucket", "aws_s3_bucket_acl"] {
            for resource in checked(graph, resource_type, &allow) {
                let Some(acl) = resolved_attribute(graph, resource, "acl")? else {
                    continue;
                };
                let Some(acl) = acl.as_str().filter(|a| PUBLIC_ACLS.contains(a)) else {
                    continue;
                };
                out.push(resource_finding(
                    ids::CODE_PUBLIC_ACL,
                    resource,
                    Some("acl"),
                    format!("{} uses canned ACL `{acl}`", resource.address),
                    "Use `private` and grant access through bucket policies scoped to known principals.",
                    json!({ "acl": acl }),
                ));
            }
        }

        for resource in checked(graph, "aws_s3_bucket_public_access_block", &allow) {
            let mut open_flags = Vec::new();
            for flag in BLOCK_FLAGS {
                // Unset flags default to false on the provider side.
                let value = resolved_attribute(graph, resource, flag)?;
                match value {
                    None => open_flags.push(*flag),
                    Some(v) if v.as_bool() == Some(false) => open_flags.push(*flag),
                    Some(_) => {}
                }
            }
            if open_flags.is_empty() {
                continue;
            }
            out.push(resource_finding(
                ids::CODE_PUBLIC_ACCESS_NOT_BLOCKED,
                resource,
                Some(open_flags[0]),
                format!(
                    "{} does not block public access: {} not enabled",
                    resource.address,
                    open_flags.join(", ")
                ),
                "Set all four public access block flags to true.",
                json!({ "flags": open_flags }),
            ));
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::bound_graph;

    fn rule() -> PublicStorage {
        PublicStorage::new(&RulePolicy::enabled(Severity::Blocking))
    }

    #[test]
    fn public_acls_are_reported() {
        let g = bound_graph(
            r#"
resource "aws_s3_bucket" "backups" {
  bucket = "mongo-backups"
  acl    = "public-read"
}

resource "aws_s3_bucket" "logs" {
  bucket = "logs"
  acl    = "private"
}

resource "aws_s3_bucket_acl" "backups" {
  bucket = aws_s3_bucket.backups.id
  acl    = "public-read-write"
}
"#,
        );
        let findings = rule().check(&g).expect("check");
        let resources: Vec<&str> = findings.iter().filter_map(|f| f.resource.as_deref()).collect();
        assert_eq!(resources, vec!["aws_s3_bucket.backups", "aws_s3_bucket_acl.backups"]);
    }

    #[test]
    fn partial_public_access_block_is_reported() {
        let g = bound_graph(
            r#"
resource "aws_s3_bucket_public_access_block" "backups" {
  bucket                  = "mongo-backups"
  block_public_acls       = true
  block_public_policy     = false
  ignore_public_acls      = true
}
"#,
        );
        let findings = rule().check(&g).expect("check");
        assert_eq!(findings.len(), 1);
        assert_eq!(
            findings[0].data["flags"],
            json!(["block_public_policy", "restrict_public_buckets"])
        );
    }

    #[test]
    fn fully_blocked_bucket_passes() {
        let g = bound_graph(
            r#"
resource "aws_s3_bucket_public_access_block" "backups" {
  bucket                  = "mongo-backups"
  block_public_acls       = true
  block_public_policy     = true
  ignore_public_acls      = true
  restrict_public_buckets = true
}
"#,
        );
        assert!(rule().check(&g).expect("check").is_empty());
    }
}
