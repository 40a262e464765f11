//! Stable DTOs and IDs used across the infraguard workspace.
//!
//! This crate is intentionally boring:
//! - data types for rule results, plan actions and the emitted report
//! - stable string IDs and codes
//! - canonical config-relative path handling
//! - explain registry for remediation guidance

#![forbid(unsafe_code)]

pub mod explain;
pub mod ids;
pub mod path;
pub mod receipt;

pub use explain::{lookup_explanation, ExamplePair, Explanation};
pub use path::SourcePath;
pub use receipt::{
    Action, ActionCounts, Category, ErrorKind, FatalError, Finding, Location, PlanAction,
    ReportEnvelope, ReportSummary, RuleResult, Severity, SeverityCounts, ToolMeta, Verdict,
    SCHEMA_REPORT_V1,
};
