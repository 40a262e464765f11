use crate::policy::RulePolicy;
use crate::rule::{Rule, RuleError};
use infraguard_graph::Graph;
use infraguard_types::{Category, Finding, Severity, ids};
use serde_json::json;

/// Required provider blocks and a network resource are declared.
pub struct RequiredBlocks {
    severity: Severity,
    providers: Vec<String>,
    network_types: Vec<String>,
}

impl RequiredBlocks {
    pub fn new(policy: &RulePolicy) -> Self {
        Self {
            severity: policy.severity,
            providers: policy.options.required_providers.clone(),
            network_types: policy.options.network_types.clone(),
        }
    }
}

impl Rule for RequiredBlocks {
    fn id(&self) -> &str {
        ids::RULE_STRUCTURAL_REQUIRED_BLOCKS
    }

    fn category(&self) -> Category {
        Category::Structural
    }

    fn severity(&self) -> Severity {
        self.severity
    }

    fn check(&self, graph: &Graph) -> Result<Vec<Finding>, RuleError> {
        let mut out = Vec::new();

        for provider in &self.providers {
            if graph.has_provider(provider) {
                continue;
            }
            out.push(Finding {
                code: ids::CODE_MISSING_PROVIDER.to_string(),
                message: format!("provider `{provider}` is not configured"),
                resource: None,
                attribute: None,
                location: None,
                help: Some(format!("Add a `provider \"{provider}\" {{ ... }}` block.")),
                data: json!({ "provider": provider }),
            });
        }

        let has_network = self
            .network_types
            .iter()
            .any(|ty| graph.list_resources(ty).next().is_some());
        if !self.network_types.is_empty() && !has_network {
            out.push(Finding {
                code: ids::CODE_MISSING_NETWORK.to_string(),
                message: format!(
                    "no network resource declared (expected one of: {})",
                    self.network_types.join(", ")
                ),
                resource: None,
                attribute: None,
                location: None,
                help: Some("Declare the network the other resources are placed in.".to_string()),
                data: json!({ "network_types": self.network_types }),
            });
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::default_options;
    use crate::test_support::graph;

    fn rule() -> RequiredBlocks {
        RequiredBlocks::new(
            &RulePolicy::enabled(Severity::Blocking)
                .with_options(default_options(ids::RULE_STRUCTURAL_REQUIRED_BLOCKS)),
        )
    }

    #[test]
    fn provider_and_vpc_satisfy_the_rule() {
        let g = graph(
            "provider \"aws\" {\n  region = \"us-east-1\"\n}\nresource \"aws_vpc\" \"main\" {}\n",
        );
        assert!(rule().check(&g).expect("check").is_empty());
    }

    #[test]
    fn empty_config_misses_both() {
        let findings = rule().check(&graph("")).expect("check");
        let codes: Vec<&str> = findings.iter().map(|f| f.code.as_str()).collect();
        assert_eq!(codes, vec![ids::CODE_MISSING_PROVIDER, ids::CODE_MISSING_NETWORK]);
    }

    #[test]
    fn data_source_is_not_a_network() {
        let g = graph("provider \"aws\" {}\ndata \"aws_vpc\" \"default\" {}\n");
        let findings = rule().check(&g).expect("check");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].code, ids::CODE_MISSING_NETWORK);
    }
}
