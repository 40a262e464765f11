use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const SCHEMA_CONFIG_V1: &str = "infraguard.config.v1";

/// `infraguard.toml` schema v1.
///
/// User-facing and permissive: every field is optional and layered over the chosen profile.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct InfraguardConfigV1 {
    /// Optional schema string for tooling (`infraguard.config.v1`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    /// `default`, `strict`, `advisory` or `permissive`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,

    /// How many findings to emit before truncating the list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_findings: Option<u32>,

    /// Map of rule_id -> config.
    #[serde(default)]
    pub rules: BTreeMap<String, RuleConfig>,
}

/// Per-rule settings. Option lists replace the profile's list when present.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RuleConfig {
    /// Override preset enable/disable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,

    /// Override preset severity: `blocking` or `advisory`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,

    /// Glob patterns over resource addresses the rule skips.
    #[serde(default)]
    pub allow: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_providers: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_types: Option<Vec<String>>,

    /// resource type -> attribute name -> kind (`string`, `number`, `bool`, `list`, `map`, `any`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<BTreeMap<String, BTreeMap<String, String>>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sensitive_ports: Option<Vec<u16>>,

    /// Glob patterns over image ids.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deny: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_tags: Option<Vec<String>>,

    /// Glob patterns over resource types.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_types: Option<Vec<String>>,

    /// Resource addresses to walk from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_points: Option<Vec<String>>,
}
