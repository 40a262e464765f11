use crate::rule::RuleError;
use globset::{Glob, GlobSet, GlobSetBuilder};
use infraguard_graph::{Graph, GraphError, Mode, Resource, Value};
use infraguard_types::Finding;
use serde_json::Value as JsonValue;
use tracing::debug;

pub fn build_globset(patterns: &[String]) -> Result<Option<GlobSet>, RuleError> {
    if patterns.is_empty() {
        return Ok(None);
    }

    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|e| RuleError::InvalidPattern {
            pattern: pattern.clone(),
            message: e.to_string(),
        })?;
        builder.add(glob);
    }
    builder
        .build()
        .map(Some)
        .map_err(|e| RuleError::InvalidPattern {
            pattern: patterns.join(", "),
            message: e.to_string(),
        })
}

/// Resource addresses a rule skips.
pub struct Allowlist(Option<GlobSet>);

impl Allowlist {
    pub fn new(patterns: &[String]) -> Result<Self, RuleError> {
        build_globset(patterns).map(Allowlist)
    }

    pub fn skips(&self, resource: &Resource) -> bool {
        self.0
            .as_ref()
            .is_some_and(|set| set.is_match(resource.address.to_string()))
    }
}

/// Managed resources of one type that the allowlist does not skip.
pub fn checked<'g>(
    graph: &'g Graph,
    resource_type: &'g str,
    allow: &'g Allowlist,
) -> impl Iterator<Item = &'g Resource> {
    graph
        .list_resources(resource_type)
        .filter(move |r| !allow.skips(r))
}

/// Every resource and data source the allowlist does not skip.
pub fn all_checked<'g>(graph: &'g Graph, allow: &'g Allowlist) -> impl Iterator<Item = &'g Resource> {
    graph.resources.iter().filter(move |r| !allow.skips(r))
}

pub fn is_managed(resource: &Resource) -> bool {
    resource.address.mode == Mode::Managed
}

/// Deep-resolve a value. A reference that cannot be resolved statically (resource
/// attributes that refer to each other in a loop) is [`Value::Unknown`], like any other
/// computed value.
pub fn resolve(graph: &Graph, value: &Value) -> Result<Value, RuleError> {
    match graph.resolve_value(value) {
        Ok(resolved) => Ok(resolved),
        Err(GraphError::UnresolvedReference { reference, reason }) => {
            debug!(%reference, %reason, "value not statically known");
            Ok(Value::Unknown)
        }
        Err(err) => Err(err.into()),
    }
}

/// An attribute resolved through variables and locals; `None` when absent or null.
pub fn resolved_attribute(
    graph: &Graph,
    resource: &Resource,
    name: &str,
) -> Result<Option<Value>, RuleError> {
    let Some(value) = resource.attribute(name) else {
        return Ok(None);
    };
    match resolve(graph, value)? {
        Value::Null => Ok(None),
        resolved => Ok(Some(resolved)),
    }
}

/// Strings among a value's items (a single string counts as one item).
pub fn strings(value: &Value) -> Vec<&str> {
    value.iter_items().filter_map(Value::as_str).collect()
}

pub fn resource_finding(
    code: &str,
    resource: &Resource,
    attribute: Option<&str>,
    message: String,
    help: &str,
    data: JsonValue,
) -> Finding {
    Finding {
        code: code.to_string(),
        message,
        resource: Some(resource.address.to_string()),
        attribute: attribute.map(str::to_string),
        location: resource.location.clone(),
        help: Some(help.to_string()),
        data,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_patterns_are_rule_errors() {
        let err = build_globset(&["aws_[".to_string()]).expect_err("invalid glob");
        assert!(matches!(err, RuleError::InvalidPattern { .. }));
    }

    #[test]
    fn looping_resource_attributes_resolve_to_unknown() {
        let graph = crate::test_support::bound_graph(
            r#"
resource "aws_vpc" "a" {
  tags = { Name = aws_vpc.b.tags.Name }
}

resource "aws_vpc" "b" {
  tags = { Name = aws_vpc.a.tags.Name }
}
"#,
        );
        let a = graph.lookup("aws_vpc", "a").expect("a");
        let tags = resolved_attribute(&graph, a, "tags").expect("no rule error");
        assert_eq!(tags, Some(Value::Unknown));
    }

    #[test]
    fn allowlist_matches_addresses() {
        let graph = crate::test_support::graph(
            "resource \"aws_instance\" \"bastion\" {}\nresource \"aws_instance\" \"db\" {}\n",
        );
        let allow = Allowlist::new(&["aws_instance.bastion*".to_string()]).expect("globs");
        let kept: Vec<String> = checked(&graph, "aws_instance", &allow)
            .map(|r| r.address.to_string())
            .collect();
        assert_eq!(kept, vec!["aws_instance.db"]);
    }
}
