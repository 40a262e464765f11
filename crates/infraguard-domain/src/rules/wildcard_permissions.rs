use crate::policy::RulePolicy;
use crate::rule::{Rule, RuleError};
use crate::rules::utils::{Allowlist, all_checked, resolve, resource_finding, strings};
use infraguard_graph::{Graph, Resource, Value};
use infraguard_types::{Category, Finding, Severity, ids};
use serde_json::json;
use tracing::debug;

/// Attributes that hold an IAM policy document (JSON text or `jsonencode` structure).
const POLICY_ATTRIBUTES: &[&str] = &["policy", "assume_role_policy"];

/// IAM statements that allow every action of a service or trust every principal.
pub struct WildcardPermissions {
    severity: Severity,
    allow: Vec<String>,
}

/// A statement reduced to the fields the rule looks at.
struct Statement<'a> {
    attribute: String,
    allows: bool,
    actions: Vec<&'a str>,
    principals: Vec<&'a str>,
}

impl WildcardPermissions {
    pub fn new(policy: &RulePolicy) -> Self {
        Self {
            severity: policy.severity,
            allow: policy.allow.clone(),
        }
    }
}

fn is_wildcard_action(action: &str) -> bool {
    action == "*" || action.ends_with(":*")
}

/// A policy document as structured data: JSON strings are decoded, maps are used as is.
fn document(value: Value) -> Option<Value> {
    match value {
        Value::String(text) => match serde_json::from_str::<serde_json::Value>(&text) {
            Ok(json) => Some(Value::from(json)),
            Err(err) => {
                debug!(error = %err, "policy text is not JSON; skipping");
                None
            }
        },
        map @ Value::Map(_) => Some(map),
        _ => None,
    }
}

/// Statements of a JSON-shaped policy document (`Statement` may be one object or a list).
fn json_statements<'a>(attribute: &str, doc: &'a Value) -> Vec<Statement<'a>> {
    let Some(statements) = doc.get("Statement") else {
        return Vec::new();
    };
    statements
        .iter_items()
        .enumerate()
        .filter(|(_, s)| s.as_map().is_some())
        .map(|(i, s)| Statement {
            attribute: format!("{attribute}.Statement[{i}]"),
            allows: s
                .get("Effect")
                .and_then(Value::as_str)
                .is_none_or(|e| e.eq_ignore_ascii_case("allow")),
            actions: s.get("Action").map(strings).unwrap_or_default(),
            principals: match s.get("Principal") {
                Some(Value::Map(map)) => map.values().flat_map(strings).collect(),
                Some(other) => strings(other),
                None => Vec::new(),
            },
        })
        .collect()
}

/// `statement` blocks of an `aws_iam_policy_document` data source.
fn block_statements(doc: &Value) -> Vec<Statement<'_>> {
    let Some(statements) = doc.get("statement") else {
        return Vec::new();
    };
    statements
        .iter_items()
        .enumerate()
        .filter(|(_, s)| s.as_map().is_some())
        .map(|(i, s)| Statement {
            attribute: format!("statement[{i}]"),
            allows: s
                .get("effect")
                .and_then(Value::as_str)
                .is_none_or(|e| e.eq_ignore_ascii_case("allow")),
            actions: s.get("actions").map(strings).unwrap_or_default(),
            principals: s
                .get("principals")
                .map(|blocks| {
                    blocks
                        .iter_items()
                        .filter_map(|b| b.get("identifiers"))
                        .flat_map(strings)
                        .collect()
                })
                .unwrap_or_default(),
        })
        .collect()
}

impl Rule for WildcardPermissions {
    fn id(&self) -> &str {
        ids::RULE_SECURITY_WILDCARD_PERMISSIONS
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

        for resource in all_checked(graph, &allow) {
            if resource.resource_type() == "aws_iam_policy_document" {
                let doc = resolve(graph, &Value::Map(resource.attributes.clone()))?;
                report(resource, block_statements(&doc), &mut out);
                continue;
            }
            for attribute in POLICY_ATTRIBUTES {
                let Some(raw) = resource.attribute(attribute) else {
                    continue;
                };
                let Some(doc) = document(resolve(graph, raw)?) else {
                    continue;
                };
                report(resource, json_statements(attribute, &doc), &mut out);
            }
        }

        Ok(out)
    }
}

fn report(resource: &Resource, statements: Vec<Statement<'_>>, out: &mut Vec<Finding>) {
    for statement in statements.into_iter().filter(|s| s.allows) {
        let actions: Vec<&str> = statement
            .actions
            .iter()
            .copied()
            .filter(|a| is_wildcard_action(a))
            .collect();
        if !actions.is_empty() {
            out.push(resource_finding(
                ids::CODE_WILDCARD_ACTION,
                resource,
                Some(&statement.attribute),
                format!(
                    "{} allows wildcard action {}",
                    resource.address,
                    actions.join(", ")
                ),
                "List the specific actions the workload needs.",
                json!({ "actions": actions }),
            ));
        }
        if statement.principals.contains(&"*") {
            out.push(resource_finding(
                ids::CODE_WILDCARD_PRINCIPAL,
                resource,
                Some(&statement.attribute),
                format!("{} trusts any principal (`*`)", resource.address),
                "Name the accounts, roles or services that may assume or access this resource.",
                json!({ "principals": statement.principals }),
            ));
        }
    }
}
