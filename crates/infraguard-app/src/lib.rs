//! Use case orchestration for infraguard.
//!
//! This crate provides the application layer: use cases that coordinate the graph, domain, repo,
//! and render layers. It stays thin and delegates the real work to those layers.
//!
//! The CLI crate depends on this; it only handles argument parsing and I/O.

#![forbid(unsafe_code)]

mod check;
mod explain;
mod render;
mod report;

pub use check::{CheckInput, CheckOutput, parse_var_assignment, run_check, run_plan};
pub use explain::{ExplainOutput, format_explanation, format_not_found, run_explain};
pub use render::{render_annotations, render_markdown, render_text};
pub use report::{
    parse_report_json, report_exit_code, runtime_error_report, serialize_report, to_renderable,
};
