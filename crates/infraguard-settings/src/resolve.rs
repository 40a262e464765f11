use crate::model::{InfraguardConfigV1, RuleConfig};
use crate::presets::{self, PROFILES};
use anyhow::Context;
use globset::Glob;
use infraguard_domain::policy::{AttributeRequirement, CATALOG, EffectiveConfig, RulePolicy};
use infraguard_graph::VarType;
use infraguard_types::Severity;
use std::collections::BTreeMap;

#[derive(Clone, Debug, Default)]
pub struct Overrides {
    pub profile: Option<String>,
    pub max_findings: Option<u32>,
}

#[derive(Clone, Debug)]
pub struct ResolvedConfig {
    pub effective: EffectiveConfig,
}

pub fn resolve_config(
    cfg: InfraguardConfigV1,
    overrides: Overrides,
) -> anyhow::Result<ResolvedConfig> {
    let profile = overrides
        .profile
        .clone()
        .or(cfg.profile.clone())
        .unwrap_or_else(|| "default".to_string());

    let Some(mut effective) = presets::preset(&profile) else {
        anyhow::bail!("unknown profile: {profile} (expected one of {})", PROFILES.join("|"));
    };

    if let Some(mf) = overrides.max_findings.or(cfg.max_findings) {
        effective.max_findings = mf as usize;
    }

    for (rule_id, rc) in &cfg.rules {
        if !CATALOG.iter().any(|(id, _)| id == rule_id) {
            anyhow::bail!("unknown rule in config: {rule_id}");
        }
        let entry = effective
            .rules
            .entry(rule_id.clone())
            .or_insert_with(RulePolicy::disabled);
        apply_rule_config(rule_id, rc, entry)?;
    }

    Ok(ResolvedConfig { effective })
}

fn apply_rule_config(rule_id: &str, rc: &RuleConfig, entry: &mut RulePolicy) -> anyhow::Result<()> {
    if let Some(enabled) = rc.enabled {
        entry.enabled = enabled;
    }
    if let Some(sev) = rc.severity.as_deref() {
        entry.severity =
            parse_severity(sev).with_context(|| format!("invalid severity for {rule_id}"))?;
    }
    if !rc.allow.is_empty() {
        validate_globs(rule_id, "allow", &rc.allow)?;
        entry.allow = rc.allow.clone();
    }

    let options = &mut entry.options;
    if let Some(v) = &rc.required_providers {
        options.required_providers = v.clone();
    }
    if let Some(v) = &rc.network_types {
        options.network_types = v.clone();
    }
    if let Some(v) = &rc.attributes {
        options.attributes =
            parse_attributes(v).with_context(|| format!("invalid attributes for {rule_id}"))?;
    }
    if let Some(v) = &rc.sensitive_ports {
        options.sensitive_ports = v.clone();
    }
    if let Some(v) = &rc.deny {
        validate_globs(rule_id, "deny", v)?;
        options.deny = v.clone();
    }
    if let Some(v) = &rc.required_tags {
        options.required_tags = v.clone();
    }
    if let Some(v) = &rc.resource_types {
        validate_globs(rule_id, "resource_types", v)?;
        options.resource_types = v.clone();
    }
    if let Some(v) = &rc.entry_points {
        options.entry_points = v.clone();
    }
    Ok(())
}

fn validate_globs(rule_id: &str, field: &str, patterns: &[String]) -> anyhow::Result<()> {
    for pattern in patterns {
        Glob::new(pattern)
            .with_context(|| format!("invalid {field} glob for {rule_id}: {pattern}"))?;
    }
    Ok(())
}

fn parse_severity(v: &str) -> anyhow::Result<Severity> {
    match v {
        "blocking" | "error" => Ok(Severity::Blocking),
        "advisory" | "warning" | "warn" => Ok(Severity::Advisory),
        other => anyhow::bail!("unknown severity: {other} (expected blocking|advisory)"),
    }
}

fn parse_attributes(
    table: &BTreeMap<String, BTreeMap<String, String>>,
) -> anyhow::Result<BTreeMap<String, Vec<AttributeRequirement>>> {
    let mut out = BTreeMap::new();
    for (resource_type, attributes) in table {
        let mut requirements = Vec::with_capacity(attributes.len());
        for (name, kind) in attributes {
            let Some(kind) = VarType::from_keyword(kind) else {
                anyhow::bail!("unknown attribute kind `{kind}` for {resource_type}.{name}");
            };
            requirements.push(AttributeRequirement::new(name, kind));
        }
        out.insert(resource_type.clone(), requirements);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_config_toml;
    use infraguard_types::ids;

    fn resolve(toml: &str, overrides: Overrides) -> anyhow::Result<EffectiveConfig> {
        let cfg = parse_config_toml(toml)?;
        resolve_config(cfg, overrides).map(|r| r.effective)
    }

    #[test]
    fn empty_config_is_the_default_profile() {
        let effective = resolve("", Overrides::default()).expect("resolve");
        assert_eq!(effective, EffectiveConfig::default());
    }

    #[test]
    fn file_settings_layer_over_the_profile() {
        let effective = resolve(
            r#"
profile = "strict"
max_findings = 10

[rules."security.denylisted_images"]
deny = ["ami-0legacy*"]

[rules."tagging.required_tags"]
severity = "advisory"
required_tags = ["Name", "Owner"]
allow = ["aws_instance.scratch_*"]

[rules."structural.required_attributes".attributes.aws_db_instance]
engine = "string"
allocated_storage = "number"
"#,
            Overrides::default(),
        )
        .expect("resolve");

        assert_eq!(effective.profile, "strict");
        assert_eq!(effective.max_findings, 10);
        let deny = effective
            .rule_policy(ids::RULE_SECURITY_DENYLISTED_IMAGES)
            .expect("enabled");
        assert_eq!(deny.options.deny, vec!["ami-0legacy*"]);

        let tags = effective.rule_policy(ids::RULE_TAGGING_REQUIRED_TAGS).expect("enabled");
        assert_eq!(tags.severity, Severity::Advisory);
        assert_eq!(tags.options.required_tags, vec!["Name", "Owner"]);
        assert_eq!(tags.allow, vec!["aws_instance.scratch_*"]);
        // Untouched options keep the profile's defaults.
        assert!(!tags.options.resource_types.is_empty());

        let attrs = effective
            .rule_policy(ids::RULE_STRUCTURAL_REQUIRED_ATTRIBUTES)
            .expect("enabled");
        assert_eq!(
            attrs.options.attributes["aws_db_instance"],
            vec![
                AttributeRequirement::new("allocated_storage", VarType::Number),
                AttributeRequirement::new("engine", VarType::String),
            ]
        );
    }

    #[test]
    fn overrides_win_over_the_file() {
        let effective = resolve(
            "profile = \"strict\"\nmax_findings = 10\n",
            Overrides {
                profile: Some("advisory".to_string()),
                max_findings: Some(3),
            },
        )
        .expect("resolve");
        assert_eq!(effective.profile, "advisory");
        assert_eq!(effective.max_findings, 3);
    }

    #[test]
    fn rules_can_be_disabled() {
        let effective = resolve(
            "[rules.\"dependency.reachability\"]\nenabled = false\n",
            Overrides::default(),
        )
        .expect("resolve");
        assert!(effective.rule_policy(ids::RULE_DEPENDENCY_REACHABILITY).is_none());
    }

    #[test]
    fn bad_input_is_rejected_with_context() {
        let cases = [
            ("profile = \"lenient\"", "unknown profile"),
            ("[rules.\"security.nope\"]\nenabled = true", "unknown rule"),
            ("[rules.\"security.open_ingress\"]\nseverity = \"fatal\"", "invalid severity"),
            ("[rules.\"security.open_ingress\"]\nallow = [\"aws_[\"]", "invalid allow glob"),
            (
                "[rules.\"structural.required_attributes\".attributes.aws_vpc]\ncidr_block = \"text\"",
                "invalid attributes",
            ),
        ];
        for (toml, expected) in cases {
            let err = resolve(toml, Overrides::default()).expect_err(toml);
            assert!(
                format!("{err:#}").contains(expected),
                "{toml}: {err:#} does not mention {expected}"
            );
        }
    }
}
