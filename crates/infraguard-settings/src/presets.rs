use infraguard_domain::policy::{CATALOG, EffectiveConfig, RulePolicy, default_options};
use infraguard_types::{Severity, ids};
use std::collections::BTreeMap;

pub const PROFILES: &[&str] = &["default", "strict", "advisory", "permissive"];

/// Preset profiles are opinionated defaults; anything finer goes into `infraguard.toml`.
pub fn preset(profile: &str) -> Option<EffectiveConfig> {
    let rules = match profile {
        "default" => catalog_rules(|_, severity| Some(severity)),
        "strict" => catalog_rules(|_, _| Some(Severity::Blocking)),
        "advisory" => catalog_rules(|_, _| Some(Severity::Advisory)),
        // Security rules only; structure and hygiene are left to the author.
        "permissive" => catalog_rules(|id, severity| id.starts_with("security.").then_some(severity)),
        _ => return None,
    };
    Some(EffectiveConfig {
        profile: profile.to_string(),
        max_findings: 200,
        rules,
    })
}

/// The catalog with default options; `severity` returns `None` to disable a rule.
fn catalog_rules(
    severity: impl Fn(&str, Severity) -> Option<Severity>,
) -> BTreeMap<String, RulePolicy> {
    CATALOG
        .iter()
        .map(|(id, default)| {
            let policy = match severity(id, *default) {
                Some(severity) => RulePolicy::enabled(severity),
                None => RulePolicy::disabled(),
            };
            (id.to_string(), policy.with_options(default_options(id)))
        })
        .collect()
}
