use crate::policy::RulePolicy;
use crate::rule::{Rule, RuleError};
use crate::rules::utils::{Allowlist, resource_finding};
use infraguard_graph::{Graph, Reference, Resource, ResourceAddress};
use infraguard_types::{Category, Finding, Severity, ids};
use serde_json::json;
use std::collections::{BTreeSet, VecDeque};
use tracing::debug;

/// Resources reachable from the entry points must not depend on anything undeclared.
pub struct Reachability {
    severity: Severity,
    allow: Vec<String>,
    entry_points: Vec<String>,
}

impl Reachability {
    pub fn new(policy: &RulePolicy) -> Self {
        Self {
            severity: policy.severity,
            allow: policy.allow.clone(),
            entry_points: policy.options.entry_points.clone(),
        }
    }

    /// Configured entry points; otherwise resources that outputs read; otherwise everything.
    fn roots(&self, graph: &Graph, out: &mut Vec<Finding>) -> Vec<ResourceAddress> {
        if !self.entry_points.is_empty() {
            let mut roots = Vec::new();
            for entry in &self.entry_points {
                match ResourceAddress::parse(entry).filter(|a| graph.lookup_address(a).is_some()) {
                    Some(address) => roots.push(address),
                    None => out.push(Finding {
                        code: ids::CODE_DANGLING_DEPENDENCY.to_string(),
                        message: format!("entry point `{entry}` is not declared"),
                        resource: Some(entry.clone()),
                        attribute: None,
                        location: None,
                        help: Some("Fix the entry point address in the configuration.".to_string()),
                        data: json!({ "entry_point": entry }),
                    }),
                }
            }
            return roots;
        }

        let mut roots = Vec::new();
        for output in graph.outputs() {
            for address in graph.value_dependencies(&output.value) {
                if !roots.contains(&address) {
                    roots.push(address);
                }
            }
        }
        if roots.is_empty() {
            roots = graph.resources().iter().map(|r| r.address.clone()).collect();
        }
        roots
    }
}

/// References and `depends_on` entries of `resource` whose target is not declared.
fn dangling(graph: &Graph, resource: &Resource) -> Vec<String> {
    let mut missing = Vec::new();
    let mut note = |target: String| {
        if !missing.contains(&target) {
            missing.push(target);
        }
    };
    for value in resource.attributes.values() {
        for reference in value.references() {
            let exists = match reference {
                Reference::Resource { address, .. } => graph.lookup_address(address).is_some(),
                Reference::Variable { name } => graph.variable(name).is_some(),
                Reference::Local { name } => graph.local(name).is_some(),
                Reference::Module { name } => graph.module(name).is_some(),
            };
            if !exists {
                note(match reference.target_resource() {
                    Some(address) => address.to_string(),
                    None => reference.to_string(),
                });
            }
        }
    }
    for target in &resource.depends_on {
        if graph.lookup_address(target).is_none() {
            note(target.to_string());
        }
    }
    missing
}

impl Rule for Reachability {
    fn id(&self) -> &str {
        ids::RULE_DEPENDENCY_REACHABILITY
    }

    fn category(&self) -> Category {
        Category::Dependency
    }

    fn severity(&self) -> Severity {
        self.severity
    }

    fn check(&self, graph: &Graph) -> Result<Vec<Finding>, RuleError> {
        let allow = Allowlist::new(&self.allow)?;
        let mut out = Vec::new();
        let roots = self.roots(graph, &mut out);

        let mut seen: BTreeSet<String> = roots.iter().map(ResourceAddress::to_string).collect();
        let mut queue: VecDeque<ResourceAddress> = roots.into();
        let mut visited = 0usize;

        while let Some(address) = queue.pop_front() {
            let Some(resource) = graph.lookup_address(&address) else {
                continue;
            };
            visited += 1;

            if !allow.skips(resource) {
                for target in dangling(graph, resource) {
                    out.push(resource_finding(
                        ids::CODE_DANGLING_DEPENDENCY,
                        resource,
                        None,
                        format!("{} depends on undeclared `{target}`", resource.address),
                        "Declare the target or remove the reference.",
                        json!({ "target": target }),
                    ));
                }
            }

            for next in graph.dependencies(resource) {
                if graph.lookup_address(&next).is_some() && seen.insert(next.to_string()) {
                    queue.push_back(next);
                }
            }
        }

        debug!(visited, "walked reachable resources");
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::RuleOptions;
    use crate::test_support::graph;
    use infraguard_graph::Value;

    fn rule(entry_points: &[&str]) -> Reachability {
        Reachability::new(&RulePolicy::enabled(Severity::Blocking).with_options(RuleOptions {
            entry_points: entry_points.iter().map(|s| s.to_string()).collect(),
            ..RuleOptions::default()
        }))
    }

    const CONFIG: &str = r#"
resource "aws_vpc" "main" {}

resource "aws_subnet" "a" {
  vpc_id = aws_vpc.main.id
}

resource "aws_instance" "orphan" {}

output "subnet_id" {
  value = aws_subnet.a.id
}
"#;

    /// Parsing rejects dangling references, so inject one after the fact.
    fn with_dangling(mut g: Graph, owner: &str, target: ResourceAddress) -> Graph {
        let owner = ResourceAddress::parse(owner).expect("address");
        let resource = g
            .resources
            .iter_mut()
            .find(|r| r.address == owner)
            .expect("resource");
        resource.attributes.insert(
            "security_group".to_string(),
            Value::Reference(Reference::resource(target, &["id"])),
        );
        g
    }

    #[test]
    fn declared_graph_passes() {
        assert!(rule(&[]).check(&graph(CONFIG)).expect("check").is_empty());
    }

    #[test]
    fn dangling_dependency_under_an_output_is_reported() {
        let g = with_dangling(
            graph(CONFIG),
            "aws_vpc.main",
            ResourceAddress::managed("aws_security_group", "gone"),
        );
        let findings = rule(&[]).check(&g).expect("check");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].resource.as_deref(), Some("aws_vpc.main"));
        assert_eq!(findings[0].data["target"], json!("aws_security_group.gone"));
    }

    #[test]
    fn unreachable_resources_are_not_walked() {
        let g = with_dangling(
            graph(CONFIG),
            "aws_instance.orphan",
            ResourceAddress::managed("aws_security_group", "gone"),
        );
        assert!(rule(&[]).check(&g).expect("check").is_empty());
        assert_eq!(rule(&["aws_instance.orphan"]).check(&g).expect("check").len(), 1);
    }

    #[test]
    fn unknown_entry_point_is_reported() {
        let findings = rule(&["aws_instance.missing"]).check(&graph(CONFIG)).expect("check");
        assert_eq!(findings.len(), 1);
        assert!(findings[0].message.contains("aws_instance.missing"));
    }
}
