//! Pure policy evaluation, plan simulation and reporting (no IO).
//!
//! Input: a resource graph built by `infraguard-graph` and an effective policy.
//! Output: rule results, an ordered plan, and a report with verdict and counts.

#![forbid(unsafe_code)]

pub mod plan;
pub mod policy;
pub mod report;
pub mod rules;

mod engine;
mod rule;

pub use engine::evaluate;
pub use rule::{Rule, RuleError};

#[cfg(test)]
mod proptest;
#[cfg(test)]
mod test_support;
