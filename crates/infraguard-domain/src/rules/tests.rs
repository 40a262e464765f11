use super::builtin_rules;
use crate::evaluate;
use crate::policy::{CATALOG, EffectiveConfig, RulePolicy};
use crate::report;
use crate::test_support::bound_graph;
use infraguard_types::{Category, Severity, Verdict, ids};

const BASELINE: &str = r#"
provider "aws" {
  region = "eu-west-1"
}

resource "aws_vpc" "main" {
  cidr_block = "10.0.0.0/16"
  tags = {
    Name = "main"
  }
}
"#;

fn with_security_group(cidr: &str) -> String {
    format!(
        r#"{BASELINE}
resource "aws_security_group" "ssh" {{
  vpc_id = aws_vpc.main.id
  tags = {{
    Name = "ssh"
  }}

  ingress {{
    from_port   = 22
    to_port     = 22
    protocol    = "tcp"
    cidr_blocks = ["{cidr}"]
  }}
}}
"#
    )
}

fn result<'a>(
    results: &'a [infraguard_types::RuleResult],
    rule_id: &str,
) -> &'a infraguard_types::RuleResult {
    results
        .iter()
        .find(|r| r.rule_id == rule_id)
        .expect("rule result")
}

#[test]
fn builtin_rules_follow_catalog_order() {
    let rules = builtin_rules(&EffectiveConfig::default());
    let order: Vec<&str> = rules.iter().map(|r| r.id()).collect();
    let catalog: Vec<&str> = CATALOG.iter().map(|(id, _)| *id).collect();
    assert_eq!(order, catalog);
}

#[test]
fn disabled_rules_are_not_built() {
    let mut cfg = EffectiveConfig::default();
    cfg.rules
        .insert(ids::RULE_SECURITY_PUBLIC_STORAGE.to_string(), RulePolicy::disabled());
    let rules = builtin_rules(&cfg);
    assert_eq!(rules.len(), CATALOG.len() - 1);
    assert!(rules.iter().all(|r| r.id() != ids::RULE_SECURITY_PUBLIC_STORAGE));
}

#[test]
fn baseline_passes_every_rule() {
    let g = bound_graph(BASELINE);
    let results = evaluate(&g, &builtin_rules(&EffectiveConfig::default()));
    let failed: Vec<&str> = results
        .iter()
        .filter(|r| !r.passed)
        .map(|r| r.rule_id.as_str())
        .collect();
    assert!(failed.is_empty(), "unexpected failures: {failed:?}");
}

#[test]
fn ssh_open_to_the_world_fails_the_run() {
    let g = bound_graph(&with_security_group("0.0.0.0/0"));
    let results = evaluate(&g, &builtin_rules(&EffectiveConfig::default()));

    let ingress = result(&results, ids::RULE_SECURITY_OPEN_INGRESS);
    assert!(!ingress.passed);
    assert_eq!(ingress.severity, Severity::Blocking);
    assert!(ingress.is_blocking_failure());

    let report = report::generate(results, None, g.resources().len());
    assert_eq!(report.verdict, Verdict::Fail);
}

#[test]
fn ssh_from_a_private_range_passes() {
    let g = bound_graph(&with_security_group("10.20.0.0/16"));
    let results = evaluate(&g, &builtin_rules(&EffectiveConfig::default()));
    assert!(result(&results, ids::RULE_SECURITY_OPEN_INGRESS).passed);
    assert_eq!(report::generate(results, None, 0).verdict, Verdict::Pass);
}

#[test]
fn missing_name_tag_is_advisory_only() {
    let text = BASELINE.replace("  tags = {\n    Name = \"main\"\n  }\n", "");
    let g = bound_graph(&text);
    let results = evaluate(&g, &builtin_rules(&EffectiveConfig::default()));

    let tags = result(&results, ids::RULE_TAGGING_REQUIRED_TAGS);
    assert!(!tags.passed);
    assert_eq!(tags.severity, Severity::Advisory);
    assert_eq!(tags.category, Category::Tagging);

    let report = report::generate(results, None, g.resources().len());
    assert_eq!(report.verdict, Verdict::Pass);
    assert_eq!(report.counts.advisory_failed, 1);
    assert_eq!(report.counts.blocking_failed, 0);
}

#[test]
fn cyclic_graph_still_gets_every_result() {
    let text = format!(
        r#"{BASELINE}
resource "aws_subnet" "a" {{
  vpc_id          = aws_vpc.main.id
  cidr_block      = "10.0.1.0/24"
  ipv6_cidr_block = aws_subnet.b.ipv6_cidr_block_association_id
}}

resource "aws_subnet" "b" {{
  vpc_id          = aws_vpc.main.id
  cidr_block      = "10.0.2.0/24"
  ipv6_cidr_block = aws_subnet.a.ipv6_cidr_block_association_id
}}
"#
    );
    let g = bound_graph(&text);
    let rules = builtin_rules(&EffectiveConfig::default());
    let results = evaluate(&g, &rules);
    assert_eq!(results.len(), rules.len());
    assert!(results.iter().all(|r| r.category != Category::EngineError));
}

#[test]
fn tags_that_refer_to_each_other_stay_advisory() {
    let text = format!(
        r#"{BASELINE}
resource "aws_subnet" "a" {{
  vpc_id     = aws_vpc.main.id
  cidr_block = "10.0.1.0/24"
  tags = {{
    Name = aws_subnet.b.tags.Name
  }}
}}

resource "aws_subnet" "b" {{
  vpc_id     = aws_vpc.main.id
  cidr_block = "10.0.2.0/24"
  tags = {{
    Name = aws_subnet.a.tags.Name
  }}
}}
"#
    );
    let g = bound_graph(&text);
    let rules = builtin_rules(&EffectiveConfig::default());
    let results = evaluate(&g, &rules);
    assert!(results.iter().all(|r| r.category != Category::EngineError));

    let tags = result(&results, ids::RULE_TAGGING_REQUIRED_TAGS);
    assert_eq!(tags.category, Category::Tagging);
    assert_eq!(tags.severity, Severity::Advisory);
    assert!(tags.passed, "{}", tags.message);
}
