use crate::rule::Rule;
use infraguard_graph::Graph;
use infraguard_types::{Category, Finding, RuleResult, Severity, ids};
use rayon::prelude::*;
use serde_json::json;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, warn};

/// Run every rule against `graph`. Returns exactly one result per rule, in registration order.
///
/// Rules run in parallel. A rule that errors or panics yields an `engine-error` result; the
/// other rules are unaffected.
pub fn evaluate(graph: &Graph, rules: &[Box<dyn Rule>]) -> Vec<RuleResult> {
    let results: Vec<RuleResult> = rules
        .par_iter()
        .map(|rule| run_rule(graph, rule.as_ref()))
        .collect();
    debug!(
        rules = results.len(),
        failed = results.iter().filter(|r| !r.passed).count(),
        "evaluated rules"
    );
    results
}

fn run_rule(graph: &Graph, rule: &dyn Rule) -> RuleResult {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| rule.check(graph)));
    match outcome {
        Ok(Ok(findings)) => RuleResult {
            rule_id: rule.id().to_string(),
            category: rule.category(),
            severity: rule.severity(),
            passed: findings.is_empty(),
            message: summarize(&findings),
            findings,
        },
        Ok(Err(err)) => engine_error(rule, err.to_string()),
        Err(payload) => engine_error(rule, format!("panicked: {}", panic_message(payload.as_ref()))),
    }
}

fn summarize(findings: &[Finding]) -> String {
    match findings {
        [] => "passed".to_string(),
        [only] => only.message.clone(),
        [first, rest @ ..] => format!("{} (and {} more)", first.message, rest.len()),
    }
}

fn engine_error(rule: &dyn Rule, detail: String) -> RuleResult {
    warn!(rule = rule.id(), error = %detail, "rule failed internally");
    let message = format!("rule `{}` failed: {detail}", rule.id());
    RuleResult {
        rule_id: rule.id().to_string(),
        category: Category::EngineError,
        severity: Severity::Blocking,
        passed: false,
        message: message.clone(),
        findings: vec![Finding {
            code: ids::CODE_RULE_ENGINE_ERROR.to_string(),
            message,
            resource: None,
            attribute: None,
            location: None,
            help: Some("This is a bug in the rule or its configuration, not in the infrastructure.".to_string()),
            data: json!({ "rule_id": rule.id(), "declared_category": rule.category().as_str() }),
        }],
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        return s.to_string();
    }
    if let Some(s) = payload.downcast_ref::<String>() {
        return s.clone();
    }
    "unknown panic payload".to_string()
}
