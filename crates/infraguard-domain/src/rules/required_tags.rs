use crate::policy::RulePolicy;
use crate::rule::{Rule, RuleError};
use crate::rules::utils::{
    Allowlist, all_checked, build_globset, is_managed, resolve, resolved_attribute, resource_finding,
};
use infraguard_graph::{Graph, Value};
use infraguard_types::{Category, Finding, Severity, ids};
use serde_json::json;
use std::collections::BTreeSet;

/// Resources of the configured types carry every required tag with a non-empty value.
pub struct RequiredTags {
    severity: Severity,
    allow: Vec<String>,
    required: Vec<String>,
    resource_types: Vec<String>,
}

impl RequiredTags {
    pub fn new(policy: &RulePolicy) -> Self {
        Self {
            severity: policy.severity,
            allow: policy.allow.clone(),
            required: policy.options.required_tags.clone(),
            resource_types: policy.options.resource_types.clone(),
        }
    }
}

/// Tag keys every resource inherits from `default_tags` in provider blocks.
fn default_tag_keys(graph: &Graph) -> Result<BTreeSet<String>, RuleError> {
    let mut keys = BTreeSet::new();
    for provider in graph.providers() {
        let Some(blocks) = provider.attributes.get("default_tags") else {
            continue;
        };
        for block in blocks.iter_items() {
            let Some(tags) = block.get("tags") else {
                continue;
            };
            if let Value::Map(map) = resolve(graph, tags)? {
                keys.extend(map.keys().cloned());
            }
        }
    }
    Ok(keys)
}

impl Rule for RequiredTags {
    fn id(&self) -> &str {
        ids::RULE_TAGGING_REQUIRED_TAGS
    }

    fn category(&self) -> Category {
        Category::Tagging
    }

    fn severity(&self) -> Severity {
        self.severity
    }

    fn check(&self, graph: &Graph) -> Result<Vec<Finding>, RuleError> {
        if self.required.is_empty() {
            return Ok(Vec::new());
        }
        let allow = Allowlist::new(&self.allow)?;
        let types = build_globset(&self.resource_types)?;
        let inherited = default_tag_keys(graph)?;
        let mut out = Vec::new();

        for resource in all_checked(graph, &allow).filter(|r| is_managed(r)) {
            if let Some(types) = &types
                && !types.is_match(resource.resource_type())
            {
                continue;
            }

            let tags = match resolved_attribute(graph, resource, "tags")? {
                None => None,
                Some(Value::Map(map)) => Some(map),
                // Computed tags (merge(), conditionals) cannot be checked statically.
                Some(_) => continue,
            };

            for key in &self.required {
                let value = tags.as_ref().and_then(|t| t.get(key));
                match value {
                    None if inherited.contains(key) => {}
                    None => out.push(resource_finding(
                        ids::CODE_MISSING_TAG,
                        resource,
                        Some("tags"),
                        format!("{} is missing tag `{key}`", resource.address),
                        "Add the tag so the resource can be attributed and found.",
                        json!({ "tag": key }),
                    )),
                    Some(Value::String(s)) if s.trim().is_empty() => out.push(resource_finding(
                        ids::CODE_EMPTY_TAG,
                        resource,
                        Some("tags"),
                        format!("{} has an empty `{key}` tag", resource.address),
                        "Give the tag a meaningful value.",
                        json!({ "tag": key }),
                    )),
                    Some(Value::Null) => out.push(resource_finding(
                        ids::CODE_EMPTY_TAG,
                        resource,
                        Some("tags"),
                        format!("{} has a null `{key}` tag", resource.address),
                        "Give the tag a meaningful value.",
                        json!({ "tag": key }),
                    )),
                    Some(_) => {}
                }
            }
        }

        Ok(out)
    }
}
