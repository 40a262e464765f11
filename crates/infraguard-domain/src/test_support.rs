use crate::rule::{Rule, RuleError};
use indexmap::IndexMap;
use infraguard_graph::Graph;
use infraguard_types::{Category, Finding, Severity};
use serde_json::Value as JsonValue;

pub fn graph(text: &str) -> Graph {
    infraguard_graph::parse(text).expect("parse")
}

/// Parsed and bound with no supplied inputs, so every variable takes its default.
pub fn bound_graph(text: &str) -> Graph {
    graph(text).bind_variables(&IndexMap::new()).expect("bind")
}

/// A rule with canned findings, for exercising the engine.
pub struct StaticRule {
    id: String,
    severity: Severity,
    messages: Vec<String>,
}

impl StaticRule {
    pub fn passing(id: &str) -> Self {
        Self::failing(id, &[])
    }

    pub fn failing(id: &str, messages: &[&str]) -> Self {
        Self {
            id: id.to_string(),
            severity: Severity::Blocking,
            messages: messages.iter().map(|m| m.to_string()).collect(),
        }
    }

    pub fn advisory(mut self) -> Self {
        self.severity = Severity::Advisory;
        self
    }
}

impl Rule for StaticRule {
    fn id(&self) -> &str {
        &self.id
    }

    fn category(&self) -> Category {
        Category::Structural
    }

    fn severity(&self) -> Severity {
        self.severity
    }

    fn check(&self, _graph: &Graph) -> Result<Vec<Finding>, RuleError> {
        Ok(self
            .messages
            .iter()
            .map(|m| Finding {
                code: "static".to_string(),
                message: m.clone(),
                resource: None,
                attribute: None,
                location: None,
                help: None,
                data: JsonValue::Null,
            })
            .collect())
    }
}
