//! Property-based tests for parsing.

use crate::model::ResourceAddress;
use crate::parse::{parse, parse_files};
use crate::value::{Reference, Value};
use proptest::prelude::*;

// ============================================================================
// Strategies
// ============================================================================

#[derive(Clone, Debug)]
struct ResourceSpec {
    resource_type: &'static str,
    attrs: Vec<(String, AttrSpec)>,
}

#[derive(Clone, Debug)]
enum AttrSpec {
    Str(String),
    Num(u32),
    Bool(bool),
    /// Reference to the `id` of an earlier resource (index into the preceding ones).
    Ref(usize),
}

fn arb_type() -> impl Strategy<Value = &'static str> {
    prop_oneof![
        Just("aws_vpc"),
        Just("aws_subnet"),
        Just("aws_instance"),
        Just("aws_s3_bucket"),
    ]
}

fn arb_attr() -> impl Strategy<Value = AttrSpec> {
    prop_oneof![
        "[a-z0-9./-]{0,12}".prop_map(AttrSpec::Str),
        (0u32..70000).prop_map(AttrSpec::Num),
        any::<bool>().prop_map(AttrSpec::Bool),
        (0usize..8).prop_map(AttrSpec::Ref),
    ]
}

fn arb_key() -> impl Strategy<Value = String> {
    "[a-z][a-z_]{0,8}".prop_filter("keywords are not attribute names", |k| {
        !matches!(k.as_str(), "true" | "false" | "null" | "for" | "in" | "if")
    })
}

fn arb_resource() -> impl Strategy<Value = ResourceSpec> {
    (
        arb_type(),
        prop::collection::btree_map(arb_key(), arb_attr(), 0..5),
    )
        .prop_map(|(resource_type, attrs)| ResourceSpec {
            resource_type,
            attrs: attrs.into_iter().collect(),
        })
}

/// Render resources named `r0`, `r1`, ...; references only point backwards.
fn render(resources: &[ResourceSpec]) -> String {
    let mut out = String::new();
    for (i, r) in resources.iter().enumerate() {
        out.push_str(&format!("resource \"{}\" \"r{i}\" {{\n", r.resource_type));
        for (key, attr) in &r.attrs {
            let value = match attr {
                AttrSpec::Str(s) => format!("\"{s}\""),
                AttrSpec::Num(n) => n.to_string(),
                AttrSpec::Bool(b) => b.to_string(),
                AttrSpec::Ref(target) if i > 0 => {
                    let j = target % i;
                    format!("{}.r{j}.id", resources[j].resource_type)
                }
                AttrSpec::Ref(_) => "null".to_string(),
            };
            out.push_str(&format!("  {key} = {value}\n"));
        }
        out.push_str("}\n\n");
    }
    out
}

proptest! {
    /// Parsing the same text twice yields structurally equal graphs.
    #[test]
    fn parse_is_deterministic(resources in prop::collection::vec(arb_resource(), 0..8)) {
        let text = render(&resources);
        let first = parse(&text).expect("generated config parses");
        let second = parse(&text).expect("generated config parses");
        prop_assert_eq!(first, second);
    }

    /// Resources keep declaration order and every attribute survives.
    #[test]
    fn parse_preserves_declaration_order(resources in prop::collection::vec(arb_resource(), 1..8)) {
        let text = render(&resources);
        let graph = parse(&text).expect("generated config parses");
        prop_assert_eq!(graph.resources.len(), resources.len());
        for (i, (parsed, spec)) in graph.resources.iter().zip(&resources).enumerate() {
            prop_assert_eq!(&parsed.address, &ResourceAddress::managed(spec.resource_type, &format!("r{i}")));
            prop_assert_eq!(parsed.attributes.len(), spec.attrs.len());
        }
    }

    /// References always point at an earlier resource's `id`.
    #[test]
    fn references_point_backwards(resources in prop::collection::vec(arb_resource(), 1..8)) {
        let text = render(&resources);
        let graph = parse(&text).expect("generated config parses");
        for (i, resource) in graph.resources.iter().enumerate() {
            for value in resource.attributes.values() {
                if let Value::Reference(Reference::Resource { address, path }) = value {
                    let target = graph
                        .resources
                        .iter()
                        .position(|r| &r.address == address)
                        .expect("target exists");
                    prop_assert!(target < i);
                    prop_assert_eq!(path, &vec!["id".to_string()]);
                }
            }
        }
    }

    /// Splitting a configuration over several files does not change the graph content.
    #[test]
    fn split_files_match_single_file(resources in prop::collection::vec(arb_resource(), 2..8)) {
        let text = render(&resources);
        let head_text = render(&resources[..resources.len() / 2]);
        // Rendering is positional, so the rest of the text is the tail with its original names.
        let tail_text = text[head_text.len()..].to_string();

        let whole = parse(&text).expect("single file");
        let split = parse_files(&[("network.tf", head_text.as_str()), ("compute.tf", tail_text.as_str())])
            .expect("split files");
        prop_assert_eq!(whole.resources.len(), split.resources.len());
        for (a, b) in whole.resources.iter().zip(&split.resources) {
            prop_assert!(a.same_config(b));
        }
    }
}
