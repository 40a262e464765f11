//! Explain registry for rules and codes.
//!
//! Maps rule IDs and codes to human-readable explanations with remediation guidance.

use crate::ids;

/// Explanation entry for a rule or code.
#[derive(Debug, Clone)]
pub struct Explanation {
    /// Short description of the rule/code.
    pub title: &'static str,
    /// What the rule does and why it exists.
    pub description: &'static str,
    /// How to fix violations.
    pub remediation: &'static str,
    /// Before/after configuration examples.
    pub examples: ExamplePair,
}

/// Before and after configuration examples.
#[derive(Debug, Clone)]
pub struct ExamplePair {
    /// Configuration that would trigger a finding.
    pub before: &'static str,
    /// Configuration that passes the rule.
    pub after: &'static str,
}

/// Look up an explanation by rule_id or code.
///
/// Returns `None` if the identifier is not recognized.
pub fn lookup_explanation(identifier: &str) -> Option<Explanation> {
    match identifier {
        // Rule IDs
        ids::RULE_STRUCTURAL_REQUIRED_BLOCKS => Some(explain_required_blocks()),
        ids::RULE_STRUCTURAL_REQUIRED_ATTRIBUTES => Some(explain_required_attributes()),
        ids::RULE_SECURITY_OPEN_INGRESS => Some(explain_open_ingress()),
        ids::RULE_SECURITY_WILDCARD_PERMISSIONS => Some(explain_wildcard_permissions()),
        ids::RULE_SECURITY_PUBLIC_STORAGE => Some(explain_public_storage()),
        ids::RULE_SECURITY_DENYLISTED_IMAGES => Some(explain_denylisted_images()),
        ids::RULE_TAGGING_REQUIRED_TAGS => Some(explain_required_tags()),
        ids::RULE_DEPENDENCY_CONSISTENCY => Some(explain_dependency_consistency()),
        ids::RULE_DEPENDENCY_REACHABILITY => Some(explain_dependency_reachability()),

        // Codes
        ids::CODE_MISSING_PROVIDER | ids::CODE_MISSING_NETWORK => Some(explain_required_blocks()),
        ids::CODE_MISSING_ATTRIBUTE | ids::CODE_ATTRIBUTE_TYPE_MISMATCH => {
            Some(explain_required_attributes())
        }
        ids::CODE_OPEN_INGRESS => Some(explain_open_ingress()),
        ids::CODE_WILDCARD_ACTION => Some(explain_wildcard_action()),
        ids::CODE_WILDCARD_PRINCIPAL => Some(explain_wildcard_principal()),
        ids::CODE_PUBLIC_ACL => Some(explain_public_acl()),
        ids::CODE_PUBLIC_ACCESS_NOT_BLOCKED => Some(explain_public_access_not_blocked()),
        ids::CODE_DENYLISTED_IMAGE => Some(explain_denylisted_images()),
        ids::CODE_MISSING_TAG | ids::CODE_EMPTY_TAG => Some(explain_required_tags()),
        ids::CODE_CONTRADICTORY_DEPENDS_ON => Some(explain_dependency_consistency()),
        ids::CODE_DANGLING_DEPENDENCY => Some(explain_dependency_reachability()),

        _ => None,
    }
}

/// List all known rule IDs, in catalog order.
pub fn all_rule_ids() -> &'static [&'static str] {
    &[
        ids::RULE_STRUCTURAL_REQUIRED_BLOCKS,
        ids::RULE_STRUCTURAL_REQUIRED_ATTRIBUTES,
        ids::RULE_SECURITY_OPEN_INGRESS,
        ids::RULE_SECURITY_WILDCARD_PERMISSIONS,
        ids::RULE_SECURITY_PUBLIC_STORAGE,
        ids::RULE_SECURITY_DENYLISTED_IMAGES,
        ids::RULE_TAGGING_REQUIRED_TAGS,
        ids::RULE_DEPENDENCY_CONSISTENCY,
        ids::RULE_DEPENDENCY_REACHABILITY,
    ]
}

/// List all known codes.
pub fn all_codes() -> &'static [&'static str] {
    &[
        ids::CODE_MISSING_PROVIDER,
        ids::CODE_MISSING_NETWORK,
        ids::CODE_MISSING_ATTRIBUTE,
        ids::CODE_ATTRIBUTE_TYPE_MISMATCH,
        ids::CODE_OPEN_INGRESS,
        ids::CODE_WILDCARD_ACTION,
        ids::CODE_WILDCARD_PRINCIPAL,
        ids::CODE_PUBLIC_ACL,
        ids::CODE_PUBLIC_ACCESS_NOT_BLOCKED,
        ids::CODE_DENYLISTED_IMAGE,
        ids::CODE_MISSING_TAG,
        ids::CODE_EMPTY_TAG,
        ids::CODE_CONTRADICTORY_DEPENDS_ON,
        ids::CODE_DANGLING_DEPENDENCY,
    ]
}

// --- Rule-level explanations ---

fn explain_required_blocks() -> Explanation {
    Explanation {
        title: "Required Top-Level Blocks",
        description: "\
Verifies that the configuration declares the blocks every deployment needs:
- each required provider (e.g. `aws`) has a `provider` block
- at least one network resource (by default `aws_vpc`) exists

A configuration without a provider block silently relies on ambient credentials
and region, and one without a network places workloads in the default VPC.",
        remediation: "\
Declare the provider explicitly and create a dedicated network:
- add `provider \"aws\" { region = var.region }`
- add an `aws_vpc` resource and place subnets and security groups inside it",
        examples: ExamplePair {
            before: r#"resource "aws_instance" "db" {
  ami           = "ami-0abc"
  instance_type = "t3.medium"
}"#,
            after: r#"provider "aws" {
  region = "us-east-1"
}

resource "aws_vpc" "main" {
  cidr_block = "10.0.0.0/16"
}"#,
        },
    }
}

fn explain_required_attributes() -> Explanation {
    Explanation {
        title: "Required Attributes",
        description: "\
Checks that resources of specific types declare the attributes they need, and
that literal values have the expected type (string, number, bool, list, map).

Values that are references or expressions are accepted when their concrete
value cannot be known before apply.",
        remediation: "\
Add the missing attribute, or fix the literal so it has the expected type:
- `instance_type = \"t3.medium\"` (string), not `instance_type = 3`
- `cidr_block = \"10.0.0.0/16\"` on every `aws_vpc`",
        examples: ExamplePair {
            before: r#"resource "aws_vpc" "main" {
  enable_dns_support = true
}"#,
            after: r#"resource "aws_vpc" "main" {
  cidr_block         = "10.0.0.0/16"
  enable_dns_support = true
}"#,
        },
    }
}

fn explain_open_ingress() -> Explanation {
    Explanation {
        title: "Open Ingress on Sensitive Ports",
        description: "\
Flags ingress rules whose source is anywhere (`0.0.0.0/0` or `::/0`) and whose
port range covers a sensitive port (SSH 22, RDP 3389, databases such as 27017,
3306, 5432, 6379, 9200), or that allow every protocol.

Exposing administrative or database ports to the whole internet is the most
common cause of compromised instances.",
        remediation: "\
Restrict the source to a known address range (office VPN, bastion subnet), or
reach the instance through a bastion / SSM Session Manager instead of opening
the port.",
        examples: ExamplePair {
            before: r#"ingress {
  from_port   = 22
  to_port     = 22
  protocol    = "tcp"
  cidr_blocks = ["0.0.0.0/0"]
}"#,
            after: r#"ingress {
  from_port   = 22
  to_port     = 22
  protocol    = "tcp"
  cidr_blocks = ["10.20.0.0/16"]
}"#,
        },
    }
}

fn explain_wildcard_permissions() -> Explanation {
    Explanation {
        title: "Wildcard Permission Grants",
        description: "\
Flags IAM policy statements that allow every action (`*`), every action of a
service (`s3:*`), or grant access to every principal (`*`).

Policies are inspected whether they are written as JSON strings, heredocs,
`jsonencode(...)` calls, or `aws_iam_policy_document` data sources.",
        remediation: "\
List the specific actions the workload needs and name the principals that may
assume or access the resource.",
        examples: ExamplePair {
            before: r#"policy = jsonencode({
  Statement = [{ Effect = "Allow", Action = "*", Resource = "*" }]
})"#,
            after: r#"policy = jsonencode({
  Statement = [{
    Effect   = "Allow"
    Action   = ["s3:GetObject"]
    Resource = "arn:aws:s3:::backups/*"
  }]
})"#,
        },
    }
}

fn explain_public_storage() -> Explanation {
    Explanation {
        title: "Public Storage",
        description: "\
Flags storage buckets configured for public access: a `public-read` or
`public-read-write` ACL, or a public access block with any of its four
protections disabled.",
        remediation: "\
Keep buckets private and serve public content through a CDN with an origin
access identity. Set all four public access block flags to `true`.",
        examples: ExamplePair {
            before: r#"resource "aws_s3_bucket_acl" "backups" {
  bucket = aws_s3_bucket.backups.id
  acl    = "public-read"
}"#,
            after: r#"resource "aws_s3_bucket_public_access_block" "backups" {
  bucket                  = aws_s3_bucket.backups.id
  block_public_acls       = true
  block_public_policy     = true
  ignore_public_acls      = true
  restrict_public_buckets = true
}"#,
        },
    }
}

fn explain_denylisted_images() -> Explanation {
    Explanation {
        title: "Denylisted Machine Images",
        description: "\
Flags compute instances and launch templates whose machine image identifier
(`ami` / `image_id`) matches a configured denylist pattern, such as images with
known vulnerabilities or end-of-life operating systems.",
        remediation: "\
Switch to an approved image, ideally looked up through an `aws_ami` data
source filtered on a maintained image family.",
        examples: ExamplePair {
            before: r#"resource "aws_instance" "mongo" {
  ami           = "ami-0deprecated1234"
  instance_type = "t3.large"
}"#,
            after: r#"resource "aws_instance" "mongo" {
  ami           = data.aws_ami.ubuntu.id
  instance_type = "t3.large"
}"#,
        },
    }
}

fn explain_required_tags() -> Explanation {
    Explanation {
        title: "Required Tags",
        description: "\
Checks that resources of the configured types carry every required tag key
(by default `Name`) with a non-empty value. Tags drive cost allocation,
ownership and automated cleanup.",
        remediation: "\
Add the missing keys to the resource's `tags` map, or share them through a
`locals` block referenced from every resource.",
        examples: ExamplePair {
            before: r#"resource "aws_vpc" "main" {
  cidr_block = "10.0.0.0/16"
}"#,
            after: r#"resource "aws_vpc" "main" {
  cidr_block = "10.0.0.0/16"
  tags = {
    Name = "main"
  }
}"#,
        },
    }
}

fn explain_dependency_consistency() -> Explanation {
    Explanation {
        title: "Consistent Dependencies",
        description: "\
Detects `depends_on` entries that contradict attribute-level references: a
resource declares that it depends on a target which itself (directly or
transitively) references the declaring resource. Such a configuration cannot be
ordered and fails at plan time.",
        remediation: "\
Remove the `depends_on` entry, or break the reference chain that points back at
the declaring resource.",
        examples: ExamplePair {
            before: r#"resource "aws_security_group" "db" {
  vpc_id     = aws_vpc.main.id
  depends_on = [aws_instance.db]
}

resource "aws_instance" "db" {
  vpc_security_group_ids = [aws_security_group.db.id]
}"#,
            after: r#"resource "aws_security_group" "db" {
  vpc_id = aws_vpc.main.id
}

resource "aws_instance" "db" {
  vpc_security_group_ids = [aws_security_group.db.id]
}"#,
        },
    }
}

fn explain_dependency_reachability() -> Explanation {
    Explanation {
        title: "Reachable Dependencies Exist",
        description: "\
Walks the dependency graph from the entry points (resources referenced by
`output` blocks, or configured entry addresses) and reports any dependency that
points at a resource which is not declared.",
        remediation: "\
Declare the missing resource or remove the reference to it.",
        examples: ExamplePair {
            before: r#"output "endpoint" {
  value = aws_eks_cluster.main.endpoint
}
# aws_eks_cluster.main references aws_iam_role.cluster, which is missing"#,
            after: r#"resource "aws_iam_role" "cluster" {
  name               = "eks-cluster"
  assume_role_policy = data.aws_iam_policy_document.eks.json
}"#,
        },
    }
}

// --- Code-level explanations ---

fn explain_wildcard_action() -> Explanation {
    let mut exp = explain_wildcard_permissions();
    exp.title = "Wildcard Action";
    exp
}

fn explain_wildcard_principal() -> Explanation {
    let mut exp = explain_wildcard_permissions();
    exp.title = "Wildcard Principal";
    exp
}

fn explain_public_acl() -> Explanation {
    let mut exp = explain_public_storage();
    exp.title = "Public Bucket ACL";
    exp
}

fn explain_public_access_not_blocked() -> Explanation {
    let mut exp = explain_public_storage();
    exp.title = "Public Access Not Blocked";
    exp
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_by_rule_id() {
        assert!(lookup_explanation(ids::RULE_SECURITY_OPEN_INGRESS).is_some());
        assert!(lookup_explanation(ids::RULE_TAGGING_REQUIRED_TAGS).is_some());
        assert!(lookup_explanation(ids::RULE_DEPENDENCY_REACHABILITY).is_some());
    }

    #[test]
    fn lookup_by_code() {
        let exp = lookup_explanation(ids::CODE_WILDCARD_PRINCIPAL).expect("known code");
        assert_eq!(exp.title, "Wildcard Principal");
        assert!(lookup_explanation(ids::CODE_OPEN_INGRESS).is_some());
    }

    #[test]
    fn lookup_unknown_returns_none() {
        assert!(lookup_explanation("unknown.rule").is_none());
        assert!(lookup_explanation("unknown_code").is_none());
    }

    #[test]
    fn all_rule_ids_are_valid() {
        for id in all_rule_ids() {
            assert!(
                lookup_explanation(id).is_some(),
                "rule_id {} should be in registry",
                id
            );
        }
    }

    #[test]
    fn all_codes_are_valid() {
        for code in all_codes() {
            assert!(
                lookup_explanation(code).is_some(),
                "code {} should be in registry",
                code
            );
        }
    }
}
