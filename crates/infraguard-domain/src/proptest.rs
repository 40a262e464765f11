//! Property tests over randomly generated dependency graphs.

use crate::evaluate;
use crate::plan::plan;
use crate::policy::EffectiveConfig;
use crate::rules::builtin_rules;
use infraguard_graph::Graph;
use infraguard_types::Action;
use proptest::prelude::*;

/// A DAG over `n` buckets: `edges[i]` lists lower-numbered buckets that bucket `i` reads.
/// Declaration order is shuffled so it says nothing about dependency order.
fn arb_dag() -> impl Strategy<Value = (Vec<Vec<usize>>, Vec<usize>)> {
    (1usize..9).prop_flat_map(|n| {
        let edges = (0..n)
            .map(|i| proptest::sample::subsequence((0..i).collect::<Vec<_>>(), 0..=i))
            .collect::<Vec<_>>();
        let order = Just((0..n).collect::<Vec<_>>()).prop_shuffle();
        (edges, order)
    })
}

fn render((edges, order): &(Vec<Vec<usize>>, Vec<usize>)) -> String {
    let mut out = String::new();
    for &i in order {
        out.push_str(&format!("resource \"aws_s3_bucket\" \"b{i}\" {{\n"));
        out.push_str(&format!("  bucket = \"bucket-{i}\"\n"));
        for j in &edges[i] {
            out.push_str(&format!("  reads_{j} = aws_s3_bucket.b{j}.arn\n"));
        }
        out.push_str("}\n\n");
    }
    out
}

fn parse(text: &str) -> Graph {
    infraguard_graph::parse(text).expect("generated configuration parses")
}

proptest! {
    #[test]
    fn creates_follow_dependencies(dag in arb_dag()) {
        let g = parse(&render(&dag));
        let plan = plan(&g, None).expect("acyclic");
        prop_assert_eq!(plan.actions.len(), g.resources().len());
        for (pos, action) in plan.actions.iter().enumerate() {
            prop_assert_eq!(action.action, Action::Create);
            for dep in &action.depends_on {
                let dep_pos = plan.actions.iter().position(|a| &a.address == dep);
                prop_assert!(dep_pos.is_some_and(|p| p < pos), "{} planned before {}", action.address, dep);
            }
        }
    }

    #[test]
    fn destroys_run_dependents_first(dag in arb_dag()) {
        let g = parse(&render(&dag));
        let plan = plan(&Graph::default(), Some(&g)).expect("acyclic");
        for (pos, action) in plan.actions.iter().enumerate() {
            prop_assert_eq!(action.action, Action::Destroy);
            for dep in &action.depends_on {
                let dep_pos = plan.actions.iter().position(|a| &a.address == dep);
                prop_assert!(dep_pos.is_some_and(|p| p > pos), "{} destroyed after {}", action.address, dep);
            }
        }
    }

    #[test]
    fn unchanged_graph_plans_nothing(dag in arb_dag()) {
        let g = parse(&render(&dag));
        prop_assert!(plan(&g, Some(&g)).expect("acyclic").is_noop());
    }

    #[test]
    fn evaluation_is_stable(dag in arb_dag()) {
        let g = parse(&render(&dag));
        let rules = builtin_rules(&EffectiveConfig::default());
        let first = evaluate(&g, &rules);
        let second = evaluate(&g, &rules);
        prop_assert_eq!(first, second);
    }
}
