//! Plan simulation: order resources so dependencies come first and diff them against a
//! previous graph.

use infraguard_graph::{Graph, Mode, Resource};
use infraguard_types::{Action, ActionCounts, ErrorKind, FatalError, Location, PlanAction};
use std::collections::{BTreeSet, HashMap};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlanError {
    #[error("dependency cycle: {}", .path.join(" -> "))]
    Cycle {
        /// Addresses along one cycle; the first address is repeated at the end.
        path: Vec<String>,
        location: Option<Location>,
    },
}

impl PlanError {
    pub fn to_fatal(&self) -> FatalError {
        match self {
            PlanError::Cycle { location, .. } => FatalError {
                kind: ErrorKind::Cycle,
                message: self.to_string(),
                location: location.clone(),
            },
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Plan {
    pub actions: Vec<PlanAction>,
}

impl Plan {
    /// True when applying the plan would change nothing.
    pub fn is_noop(&self) -> bool {
        self.actions.iter().all(|a| a.action == Action::NoOp)
    }

    pub fn counts(&self) -> ActionCounts {
        let mut counts = ActionCounts::default();
        for action in &self.actions {
            match action.action {
                Action::Create => counts.create += 1,
                Action::Update => counts.update += 1,
                Action::Destroy => counts.destroy += 1,
                Action::NoOp => counts.no_op += 1,
            }
        }
        counts
    }

    pub fn into_actions(self) -> Vec<PlanAction> {
        self.actions
    }
}

/// Plan the transition from `previous` (nothing, when `None`) to `graph`.
///
/// Creates, updates and no-ops follow dependency order; ties keep declaration order.
/// Destroys come last, dependents before the resources they depend on. Data sources are
/// read, not managed: they take part in ordering but get no action.
pub fn plan(graph: &Graph, previous: Option<&Graph>) -> Result<Plan, PlanError> {
    let order = topological_order(graph)?;
    let mut actions = Vec::with_capacity(graph.resources.len());

    for index in order {
        let resource = &graph.resources[index];
        if !is_managed(resource) {
            continue;
        }
        let (action, changed_attributes) = match previous.and_then(|p| p.lookup_address(&resource.address)) {
            None => (Action::Create, Vec::new()),
            Some(before) if resource.same_config(before) => (Action::NoOp, Vec::new()),
            Some(before) => (Action::Update, changed_attributes(before, resource)),
        };
        actions.push(PlanAction {
            address: resource.address.to_string(),
            action,
            depends_on: declared_dependencies(graph, resource),
            changed_attributes,
        });
    }

    if let Some(previous) = previous {
        let mut order = topological_order(previous)?;
        order.reverse();
        for index in order {
            let resource = &previous.resources[index];
            if !is_managed(resource) || graph.lookup_address(&resource.address).is_some() {
                continue;
            }
            actions.push(PlanAction {
                address: resource.address.to_string(),
                action: Action::Destroy,
                depends_on: declared_dependencies(previous, resource),
                changed_attributes: Vec::new(),
            });
        }
    }

    let plan = Plan { actions };
    let counts = plan.counts();
    debug!(
        create = counts.create,
        update = counts.update,
        destroy = counts.destroy,
        no_op = counts.no_op,
        "planned"
    );
    Ok(plan)
}

fn is_managed(resource: &Resource) -> bool {
    resource.address.mode == Mode::Managed
}

/// Managed dependencies of `resource` that exist in `graph`, as address strings.
fn declared_dependencies(graph: &Graph, resource: &Resource) -> Vec<String> {
    graph
        .dependencies(resource)
        .into_iter()
        .filter(|a| a.mode == Mode::Managed && graph.lookup_address(a).is_some())
        .map(|a| a.to_string())
        .collect()
}

/// Names of attributes that differ, current order first, then attributes that were removed.
fn changed_attributes(before: &Resource, after: &Resource) -> Vec<String> {
    let mut changed: Vec<String> = after
        .attributes
        .iter()
        .filter(|(name, value)| before.attributes.get(*name) != Some(*value))
        .map(|(name, _)| name.clone())
        .collect();
    changed.extend(
        before
            .attributes
            .keys()
            .filter(|name| !after.attributes.contains_key(*name))
            .cloned(),
    );
    if before.depends_on != after.depends_on {
        changed.push("depends_on".to_string());
    }
    changed
}

/// Kahn's algorithm over resource indices. The ready set is ordered by declaration index.
fn topological_order(graph: &Graph) -> Result<Vec<usize>, PlanError> {
    let resources = &graph.resources;
    let index: HashMap<String, usize> = resources
        .iter()
        .enumerate()
        .map(|(i, r)| (r.address.to_string(), i))
        .collect();

    let deps: Vec<Vec<usize>> = resources
        .iter()
        .map(|r| {
            graph
                .dependencies(r)
                .iter()
                .filter_map(|a| index.get(&a.to_string()).copied())
                .collect()
        })
        .collect();

    let mut dependents = vec![Vec::new(); resources.len()];
    let mut pending: Vec<usize> = deps.iter().map(Vec::len).collect();
    for (i, targets) in deps.iter().enumerate() {
        for &target in targets {
            dependents[target].push(i);
        }
    }

    let mut ready: BTreeSet<usize> = (0..resources.len()).filter(|&i| pending[i] == 0).collect();
    let mut order = Vec::with_capacity(resources.len());
    while let Some(next) = ready.pop_first() {
        order.push(next);
        for &dependent in &dependents[next] {
            pending[dependent] -= 1;
            if pending[dependent] == 0 {
                ready.insert(dependent);
            }
        }
    }

    if order.len() == resources.len() {
        return Ok(order);
    }

    let path = find_cycle(&deps, &pending);
    let location = path.first().and_then(|&i| resources[i].location.clone());
    Err(PlanError::Cycle {
        path: path.iter().map(|&i| resources[i].address.to_string()).collect(),
        location,
    })
}

/// Walk unfinished nodes along unfinished dependencies until one repeats.
///
/// Every node left with `pending > 0` has at least one dependency that is also unfinished,
/// so the walk always closes a cycle.
fn find_cycle(deps: &[Vec<usize>], pending: &[usize]) -> Vec<usize> {
    let Some(start) = (0..pending.len()).find(|&i| pending[i] > 0) else {
        return Vec::new();
    };
    let mut walk = vec![start];
    let mut current = start;
    loop {
        let Some(&next) = deps[current].iter().find(|&&d| pending[d] > 0) else {
            return walk;
        };
        if let Some(pos) = walk.iter().position(|&n| n == next) {
            let mut cycle = walk.split_off(pos);
            cycle.push(next);
            return cycle;
        }
        walk.push(next);
        current = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::graph;

    fn addresses(plan: &Plan) -> Vec<(&str, Action)> {
        plan.actions
            .iter()
            .map(|a| (a.address.as_str(), a.action))
            .collect()
    }

    const NETWORK: &str = r#"
resource "aws_instance" "web" {
  subnet_id = aws_subnet.a.id
}

resource "aws_subnet" "a" {
  vpc_id = aws_vpc.main.id
}

resource "aws_vpc" "main" {
  cidr_block = "10.0.0.0/16"
}

resource "aws_s3_bucket" "logs" {}
"#;

    #[test]
    fn fresh_plan_creates_dependencies_first() {
        let plan = plan(&graph(NETWORK), None).expect("plan");
        assert_eq!(
            addresses(&plan),
            vec![
                ("aws_vpc.main", Action::Create),
                ("aws_subnet.a", Action::Create),
                ("aws_instance.web", Action::Create),
                ("aws_s3_bucket.logs", Action::Create),
            ]
        );
        assert_eq!(plan.actions[1].depends_on, vec!["aws_vpc.main"]);
    }

    #[test]
    fn identical_graphs_plan_to_no_ops() {
        let g = graph(NETWORK);
        let plan = plan(&g, Some(&g)).expect("plan");
        assert!(plan.is_noop());
        assert_eq!(plan.counts().no_op, 4);
    }

    #[test]
    fn changes_and_removals_are_planned() {
        let before = graph(NETWORK);
        let after = graph(
            r#"
resource "aws_vpc" "main" {
  cidr_block = "10.1.0.0/16"
}

resource "aws_s3_bucket" "logs" {}

resource "aws_s3_bucket" "audit" {}
"#,
        );
        let plan = plan(&after, Some(&before)).expect("plan");
        assert_eq!(
            addresses(&plan),
            vec![
                ("aws_vpc.main", Action::Update),
                ("aws_s3_bucket.logs", Action::NoOp),
                ("aws_s3_bucket.audit", Action::Create),
                ("aws_instance.web", Action::Destroy),
                ("aws_subnet.a", Action::Destroy),
            ]
        );
        assert_eq!(plan.actions[0].changed_attributes, vec!["cidr_block"]);
        assert_eq!(
            plan.counts(),
            ActionCounts {
                create: 1,
                update: 1,
                destroy: 2,
                no_op: 1
            }
        );
    }

    #[test]
    fn depends_on_orders_resources() {
        let g = graph(
            r#"
resource "aws_instance" "app" {
  depends_on = [aws_s3_bucket.assets]
}

resource "aws_s3_bucket" "assets" {}
"#,
        );
        let plan = plan(&g, None).expect("plan");
        assert_eq!(plan.actions[0].address, "aws_s3_bucket.assets");
        assert_eq!(plan.actions[1].depends_on, vec!["aws_s3_bucket.assets"]);
    }

    #[test]
    fn data_sources_are_ordered_but_not_planned() {
        let text = r#"
resource "aws_instance" "web" {
  ami = data.aws_ami.ubuntu.id
}

data "aws_ami" "ubuntu" {
  owners = [aws_iam_role.reader.arn]
}

resource "aws_iam_role" "reader" {}
"#;
        let g = graph(text);
        let fresh = plan(&g, None).expect("plan");
        assert_eq!(
            addresses(&fresh),
            vec![
                ("aws_iam_role.reader", Action::Create),
                ("aws_instance.web", Action::Create),
            ]
        );
        assert!(fresh.actions[1].depends_on.is_empty());

        let gone = plan(&Graph::default(), Some(&g)).expect("plan");
        assert_eq!(
            addresses(&gone),
            vec![
                ("aws_instance.web", Action::Destroy),
                ("aws_iam_role.reader", Action::Destroy),
            ]
        );
    }

    #[test]
    fn cycle_names_its_resources() {
        let g = graph(
            r#"
resource "aws_vpc" "main" {}

resource "aws_subnet" "a" {
  vpc_id = aws_subnet.b.id
}

resource "aws_subnet" "b" {
  vpc_id = aws_subnet.a.id
}
"#,
        );
        let err = plan(&g, None).expect_err("cycle");
        let PlanError::Cycle { path, location } = &err;
        assert_eq!(path, &vec!["aws_subnet.a", "aws_subnet.b", "aws_subnet.a"]);
        assert_eq!(location.as_ref().and_then(|l| l.line), Some(4));
        assert_eq!(err.to_fatal().kind, ErrorKind::Cycle);
        assert!(err.to_string().contains("aws_subnet.a -> aws_subnet.b"));
    }

    #[test]
    fn changed_depends_on_is_an_update() {
        let before = graph("resource \"aws_s3_bucket\" \"a\" {}\nresource \"aws_s3_bucket\" \"b\" {}\n");
        let after = graph(
            "resource \"aws_s3_bucket\" \"a\" {}\nresource \"aws_s3_bucket\" \"b\" {\n  depends_on = [aws_s3_bucket.a]\n}\n",
        );
        let plan = plan(&after, Some(&before)).expect("plan");
        assert_eq!(plan.actions[1].action, Action::Update);
        assert_eq!(plan.actions[1].changed_attributes, vec!["depends_on"]);
    }
}
