use crate::policy::RulePolicy;
use crate::rule::{Rule, RuleError};
use crate::rules::utils::{Allowlist, all_checked, resource_finding};
use infraguard_graph::{Graph, ResourceAddress};
use infraguard_types::{Category, Finding, Severity, ids};
use serde_json::json;
use std::collections::{BTreeMap, VecDeque};
use tracing::debug;

/// `depends_on` edges that point back at the declaring resource through its own dependents.
pub struct DependencyConsistency {
    severity: Severity,
    allow: Vec<String>,
}

impl DependencyConsistency {
    pub fn new(policy: &RulePolicy) -> Self {
        Self {
            severity: policy.severity,
            allow: policy.allow.clone(),
        }
    }
}

/// Shortest dependency path from `start` to `goal`, both ends included.
fn dependency_path(
    graph: &Graph,
    start: &ResourceAddress,
    goal: &ResourceAddress,
) -> Option<Vec<ResourceAddress>> {
    let mut parent: BTreeMap<String, Option<ResourceAddress>> = BTreeMap::new();
    let mut queue = VecDeque::from([start.clone()]);
    parent.insert(start.to_string(), None);

    while let Some(current) = queue.pop_front() {
        let Some(resource) = graph.lookup_address(&current) else {
            continue;
        };
        for next in graph.dependencies(resource) {
            if parent.contains_key(&next.to_string()) {
                continue;
            }
            parent.insert(next.to_string(), Some(current.clone()));
            if &next == goal {
                let mut path = vec![next];
                while let Some(Some(prev)) = path.last().and_then(|a| parent.get(&a.to_string())) {
                    path.push(prev.clone());
                }
                path.reverse();
                return Some(path);
            }
            queue.push_back(next);
        }
    }
    None
}

impl Rule for DependencyConsistency {
    fn id(&self) -> &str {
        ids::RULE_DEPENDENCY_CONSISTENCY
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

        for resource in all_checked(graph, &allow) {
            if resource.depends_on.is_empty() {
                continue;
            }
            let referenced = graph.reference_dependencies(resource);

            for target in &resource.depends_on {
                if target == &resource.address {
                    out.push(resource_finding(
                        ids::CODE_CONTRADICTORY_DEPENDS_ON,
                        resource,
                        Some("depends_on"),
                        format!("{} lists itself in depends_on", resource.address),
                        "Remove the entry; a resource cannot wait for itself.",
                        json!({ "target": target.to_string(), "path": [target.to_string()] }),
                    ));
                    continue;
                }

                if let Some(path) = dependency_path(graph, target, &resource.address) {
                    let mut cycle = vec![resource.address.to_string()];
                    cycle.extend(path.iter().map(ResourceAddress::to_string));
                    out.push(resource_finding(
                        ids::CODE_CONTRADICTORY_DEPENDS_ON,
                        resource,
                        Some("depends_on"),
                        format!(
                            "{} depends_on {} but {} already depends on it: {}",
                            resource.address,
                            target,
                            target,
                            cycle.join(" -> ")
                        ),
                        "Drop the depends_on entry or the reference that points the other way.",
                        json!({ "target": target.to_string(), "path": cycle }),
                    ));
                    continue;
                }

                if referenced.contains(target) {
                    debug!(
                        resource = %resource.address,
                        target = %target,
                        "depends_on entry is already implied by a reference"
                    );
                }
            }
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::graph;

    fn rule() -> DependencyConsistency {
        DependencyConsistency::new(&RulePolicy::enabled(Severity::Blocking))
    }

    #[test]
    fn depends_on_against_a_reference_is_reported() {
        let g = graph(
            r#"
resource "aws_vpc" "main" {
  depends_on = [aws_subnet.a]
}

resource "aws_subnet" "a" {
  vpc_id = aws_vpc.main.id
}
"#,
        );
        let findings = rule().check(&g).expect("check");
        assert_eq!(findings.len(), 1);
        assert_eq!(
            findings[0].data["path"],
            json!(["aws_vpc.main", "aws_subnet.a", "aws_vpc.main"])
        );
    }

    #[test]
    fn transitive_contradiction_goes_through_locals() {
        let g = graph(
            r#"
resource "aws_vpc" "main" {
  depends_on = [aws_instance.web]
}

locals {
  subnet = aws_subnet.a.id
}

resource "aws_subnet" "a" {
  vpc_id = aws_vpc.main.id
}

resource "aws_instance" "web" {
  subnet_id = local.subnet
}
"#,
        );
        let findings = rule().check(&g).expect("check");
        assert_eq!(
            findings[0].data["path"],
            json!(["aws_vpc.main", "aws_instance.web", "aws_subnet.a", "aws_vpc.main"])
        );
    }

    #[test]
    fn redundant_depends_on_is_not_a_violation() {
        let g = graph(
            r#"
resource "aws_vpc" "main" {}

resource "aws_subnet" "a" {
  vpc_id     = aws_vpc.main.id
  depends_on = [aws_vpc.main]
}
"#,
        );
        assert!(rule().check(&g).expect("check").is_empty());
    }

    #[test]
    fn self_dependency_is_reported() {
        let g = graph(
            r#"
resource "aws_vpc" "main" {
  depends_on = [aws_vpc.main]
}
"#,
        );
        let findings = rule().check(&g).expect("check");
        assert_eq!(findings.len(), 1);
        assert!(findings[0].message.contains("itself"));
    }
}
