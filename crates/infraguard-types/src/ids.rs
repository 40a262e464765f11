//! Stable identifiers for rules and finding codes.
//!
//! `rule_id` is a dotted namespace (`<category>.<name>`). `code` is a short snake_case
//! discriminator.

// Rules
pub const RULE_STRUCTURAL_REQUIRED_BLOCKS: &str = "structural.required_blocks";
pub const RULE_STRUCTURAL_REQUIRED_ATTRIBUTES: &str = "structural.required_attributes";
pub const RULE_SECURITY_OPEN_INGRESS: &str = "security.open_ingress";
pub const RULE_SECURITY_WILDCARD_PERMISSIONS: &str = "security.wildcard_permissions";
pub const RULE_SECURITY_PUBLIC_STORAGE: &str = "security.public_storage";
pub const RULE_SECURITY_DENYLISTED_IMAGES: &str = "security.denylisted_images";
pub const RULE_TAGGING_REQUIRED_TAGS: &str = "tagging.required_tags";
pub const RULE_DEPENDENCY_CONSISTENCY: &str = "dependency.consistency";
pub const RULE_DEPENDENCY_REACHABILITY: &str = "dependency.reachability";

// Codes: structural.required_blocks
pub const CODE_MISSING_PROVIDER: &str = "missing_provider";
pub const CODE_MISSING_NETWORK: &str = "missing_network";

// Codes: structural.required_attributes
pub const CODE_MISSING_ATTRIBUTE: &str = "missing_attribute";
pub const CODE_ATTRIBUTE_TYPE_MISMATCH: &str = "attribute_type_mismatch";

// Codes: security.open_ingress
pub const CODE_OPEN_INGRESS: &str = "open_ingress";

// Codes: security.wildcard_permissions
pub const CODE_WILDCARD_ACTION: &str = "wildcard_action";
pub const CODE_WILDCARD_PRINCIPAL: &str = "wildcard_principal";

// Codes: security.public_storage
pub const CODE_PUBLIC_ACL: &str = "public_acl";
pub const CODE_PUBLIC_ACCESS_NOT_BLOCKED: &str = "public_access_not_blocked";

// Codes: security.denylisted_images
pub const CODE_DENYLISTED_IMAGE: &str = "denylisted_image";

// Codes: tagging.required_tags
pub const CODE_MISSING_TAG: &str = "missing_tag";
pub const CODE_EMPTY_TAG: &str = "empty_tag";

// Codes: dependency.consistency
pub const CODE_CONTRADICTORY_DEPENDS_ON: &str = "contradictory_depends_on";

// Codes: dependency.reachability
pub const CODE_DANGLING_DEPENDENCY: &str = "dangling_dependency";

// Engine-level
pub const CODE_RULE_ENGINE_ERROR: &str = "rule_engine_error";

// Tool-level
pub const CHECK_TOOL_RUNTIME: &str = "tool.runtime";
pub const CODE_RUNTIME_ERROR: &str = "runtime_error";
