use infraguard_graph::VarType;
use infraguard_types::{Severity, ids};
use std::collections::BTreeMap;

/// One attribute a resource type must carry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttributeRequirement {
    pub name: String,
    pub kind: VarType,
}

impl AttributeRequirement {
    pub fn new(name: &str, kind: VarType) -> Self {
        Self {
            name: name.to_string(),
            kind,
        }
    }
}

/// Rule parameters. Each rule reads only the fields it understands.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RuleOptions {
    /// `structural.required_blocks`
    pub required_providers: Vec<String>,
    pub network_types: Vec<String>,
    /// `structural.required_attributes`: resource type -> requirements.
    pub attributes: BTreeMap<String, Vec<AttributeRequirement>>,
    /// `security.open_ingress`
    pub sensitive_ports: Vec<u16>,
    /// `security.denylisted_images`: glob patterns over image ids.
    pub deny: Vec<String>,
    /// `tagging.required_tags`
    pub required_tags: Vec<String>,
    /// `tagging.required_tags`: glob patterns over resource types.
    pub resource_types: Vec<String>,
    /// `dependency.reachability`: resource addresses; empty means outputs (or everything).
    pub entry_points: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RulePolicy {
    pub enabled: bool,
    pub severity: Severity,
    /// Glob patterns over resource addresses that the rule skips.
    pub allow: Vec<String>,
    pub options: RuleOptions,
}

impl RulePolicy {
    pub fn enabled(severity: Severity) -> Self {
        Self {
            enabled: true,
            severity,
            allow: Vec::new(),
            options: RuleOptions::default(),
        }
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::enabled(Severity::Advisory)
        }
    }

    pub fn with_options(mut self, options: RuleOptions) -> Self {
        self.options = options;
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EffectiveConfig {
    pub profile: String,
    pub max_findings: usize,
    pub rules: BTreeMap<String, RulePolicy>,
}

impl EffectiveConfig {
    /// Policy of an enabled rule; `None` when the rule is disabled or unknown.
    pub fn rule_policy(&self, rule_id: &str) -> Option<&RulePolicy> {
        self.rules.get(rule_id).filter(|p| p.enabled)
    }
}

impl Default for EffectiveConfig {
    /// Every built-in rule enabled with its catalog severity and default options.
    fn default() -> Self {
        let rules = CATALOG
            .iter()
            .map(|(id, severity)| {
                (
                    id.to_string(),
                    RulePolicy::enabled(*severity).with_options(default_options(id)),
                )
            })
            .collect();
        Self {
            profile: "default".to_string(),
            max_findings: 200,
            rules,
        }
    }
}

/// Built-in rules in registration order, with their default severity.
pub const CATALOG: &[(&str, Severity)] = &[
    (ids::RULE_STRUCTURAL_REQUIRED_BLOCKS, Severity::Blocking),
    (ids::RULE_STRUCTURAL_REQUIRED_ATTRIBUTES, Severity::Blocking),
    (ids::RULE_SECURITY_OPEN_INGRESS, Severity::Blocking),
    (ids::RULE_SECURITY_WILDCARD_PERMISSIONS, Severity::Blocking),
    (ids::RULE_SECURITY_PUBLIC_STORAGE, Severity::Blocking),
    (ids::RULE_SECURITY_DENYLISTED_IMAGES, Severity::Blocking),
    (ids::RULE_TAGGING_REQUIRED_TAGS, Severity::Advisory),
    (ids::RULE_DEPENDENCY_CONSISTENCY, Severity::Blocking),
    (ids::RULE_DEPENDENCY_REACHABILITY, Severity::Blocking),
];

pub const DEFAULT_SENSITIVE_PORTS: &[u16] = &[22, 3389, 3306, 5432, 6379, 9200, 27017];

/// Default parameters for a built-in rule.
pub fn default_options(rule_id: &str) -> RuleOptions {
    let strings = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();
    match rule_id {
        ids::RULE_STRUCTURAL_REQUIRED_BLOCKS => RuleOptions {
            required_providers: strings(&["aws"]),
            network_types: strings(&["aws_vpc"]),
            ..RuleOptions::default()
        },
        ids::RULE_STRUCTURAL_REQUIRED_ATTRIBUTES => RuleOptions {
            attributes: default_attribute_requirements(),
            ..RuleOptions::default()
        },
        ids::RULE_SECURITY_OPEN_INGRESS => RuleOptions {
            sensitive_ports: DEFAULT_SENSITIVE_PORTS.to_vec(),
            ..RuleOptions::default()
        },
        ids::RULE_TAGGING_REQUIRED_TAGS => RuleOptions {
            required_tags: strings(&["Name"]),
            resource_types: strings(&[
                "aws_vpc",
                "aws_subnet",
                "aws_instance",
                "aws_security_group",
                "aws_s3_bucket",
                "aws_eks_cluster",
            ]),
            ..RuleOptions::default()
        },
        _ => RuleOptions::default(),
    }
}

fn default_attribute_requirements() -> BTreeMap<String, Vec<AttributeRequirement>> {
    let mut out = BTreeMap::new();
    out.insert(
        "aws_vpc".to_string(),
        vec![AttributeRequirement::new("cidr_block", VarType::String)],
    );
    out.insert(
        "aws_subnet".to_string(),
        vec![
            AttributeRequirement::new("vpc_id", VarType::String),
            AttributeRequirement::new("cidr_block", VarType::String),
        ],
    );
    out.insert(
        "aws_instance".to_string(),
        vec![
            AttributeRequirement::new("ami", VarType::String),
            AttributeRequirement::new("instance_type", VarType::String),
        ],
    );
    out.insert(
        "aws_eks_cluster".to_string(),
        vec![
            AttributeRequirement::new("role_arn", VarType::String),
            AttributeRequirement::new("vpc_config", VarType::List),
        ],
    );
    out.insert(
        "aws_ecr_repository".to_string(),
        vec![AttributeRequirement::new("name", VarType::String)],
    );
    out
}
