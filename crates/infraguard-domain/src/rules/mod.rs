//! Built-in rules. Each is an independent [`Rule`] configured from its [`RulePolicy`].

use crate::policy::{CATALOG, EffectiveConfig, RulePolicy};
use crate::rule::Rule;
use infraguard_types::ids;

mod consistency;
mod denylisted_images;
mod open_ingress;
mod public_storage;
mod reachability;
mod required_attributes;
mod required_blocks;
mod required_tags;
mod utils;
mod wildcard_permissions;

#[cfg(test)]
mod tests;

pub use consistency::DependencyConsistency;
pub use denylisted_images::DenylistedImages;
pub use open_ingress::OpenIngress;
pub use public_storage::PublicStorage;
pub use reachability::Reachability;
pub use required_attributes::RequiredAttributes;
pub use required_blocks::RequiredBlocks;
pub use required_tags::RequiredTags;
pub use wildcard_permissions::WildcardPermissions;

/// The enabled built-in rules, in catalog order. Callers may append their own rules.
pub fn builtin_rules(cfg: &EffectiveConfig) -> Vec<Box<dyn Rule>> {
    CATALOG
        .iter()
        .filter_map(|(id, _)| cfg.rule_policy(id).and_then(|policy| build(id, policy)))
        .collect()
}

fn build(rule_id: &str, policy: &RulePolicy) -> Option<Box<dyn Rule>> {
    let rule: Box<dyn Rule> = match rule_id {
        ids::RULE_STRUCTURAL_REQUIRED_BLOCKS => Box::new(RequiredBlocks::new(policy)),
        ids::RULE_STRUCTURAL_REQUIRED_ATTRIBUTES => Box::new(RequiredAttributes::new(policy)),
        ids::RULE_SECURITY_OPEN_INGRESS => Box::new(OpenIngress::new(policy)),
        ids::RULE_SECURITY_WILDCARD_PERMISSIONS => Box::new(WildcardPermissions::new(policy)),
        ids::RULE_SECURITY_PUBLIC_STORAGE => Box::new(PublicStorage::new(policy)),
        ids::RULE_SECURITY_DENYLISTED_IMAGES => Box::new(DenylistedImages::new(policy)),
        ids::RULE_TAGGING_REQUIRED_TAGS => Box::new(RequiredTags::new(policy)),
        ids::RULE_DEPENDENCY_CONSISTENCY => Box::new(DependencyConsistency::new(policy)),
        ids::RULE_DEPENDENCY_REACHABILITY => Box::new(Reachability::new(policy)),
        _ => return None,
    };
    Some(rule)
}
