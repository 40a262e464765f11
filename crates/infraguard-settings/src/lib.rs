//! Config parsing and profile/preset resolution.
//!
//! IO-free: configuration arrives as strings and leaves as an [`EffectiveConfig`].

#![forbid(unsafe_code)]

mod model;
mod presets;
mod resolve;

pub use infraguard_domain::policy::EffectiveConfig;
pub use model::{InfraguardConfigV1, RuleConfig, SCHEMA_CONFIG_V1};
pub use presets::PROFILES;
pub use resolve::{Overrides, ResolvedConfig};

/// Parse `infraguard.toml` into a typed model.
pub fn parse_config_toml(input: &str) -> anyhow::Result<InfraguardConfigV1> {
    let cfg: InfraguardConfigV1 = toml::from_str(input)?;
    Ok(cfg)
}

/// Resolve the effective config used by the engine (profile preset, then file, then overrides).
pub fn resolve_config(
    cfg: InfraguardConfigV1,
    overrides: Overrides,
) -> anyhow::Result<ResolvedConfig> {
    resolve::resolve_config(cfg, overrides)
}
