//! The `check` and `plan` use cases: load configuration, evaluate policy, simulate the plan and
//! produce a report.

use anyhow::Context;
use camino::Utf8Path;
use indexmap::IndexMap;
use infraguard_domain::plan::plan;
use infraguard_domain::report::{self, Report};
use infraguard_domain::rules::builtin_rules;
use infraguard_graph::{Graph, GraphError, InputValue};
use infraguard_settings::{Overrides, ResolvedConfig};
use infraguard_types::ReportEnvelope;
use time::OffsetDateTime;
use tracing::debug;

use crate::report::envelope;

/// Input for the check and plan use cases.
#[derive(Clone, Debug)]
pub struct CheckInput<'a> {
    /// A `.tf` file or a directory of them.
    pub path: &'a Utf8Path,
    /// Config file contents (empty string if not found).
    pub config_text: &'a str,
    pub overrides: Overrides,
    /// `--var name=value` assignments, in command-line order. They win over `var_file`.
    pub vars: Vec<(String, String)>,
    pub var_file: Option<&'a Utf8Path>,
    /// Prior-state snapshot to plan against.
    pub state: Option<&'a Utf8Path>,
}

/// Output from the check and plan use cases.
#[derive(Clone, Debug)]
pub struct CheckOutput {
    pub report: ReportEnvelope,
    pub resolved_config: ResolvedConfig,
    /// The bound configuration graph; `None` when loading it failed.
    pub graph: Option<Graph>,
    pub exit_code: i32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Stage {
    /// Rules and plan.
    Check,
    /// Plan only; no rule runs.
    Plan,
}

/// Evaluate every enabled rule and simulate the plan.
pub fn run_check(input: CheckInput<'_>) -> anyhow::Result<CheckOutput> {
    run(input, Stage::Check)
}

/// Simulate the plan without evaluating rules.
pub fn run_plan(input: CheckInput<'_>) -> anyhow::Result<CheckOutput> {
    run(input, Stage::Plan)
}

/// Split a `name=value` command-line assignment.
pub fn parse_var_assignment(s: &str) -> anyhow::Result<(String, String)> {
    let Some((name, value)) = s.split_once('=') else {
        anyhow::bail!("expected name=value, got `{s}`");
    };
    let name = name.trim();
    if name.is_empty() {
        anyhow::bail!("variable name is empty in `{s}`");
    }
    Ok((name.to_string(), value.to_string()))
}

fn run(input: CheckInput<'_>, stage: Stage) -> anyhow::Result<CheckOutput> {
    let started_at = OffsetDateTime::now_utc();

    // Empty config is allowed; defaults apply.
    let cfg = if input.config_text.trim().is_empty() {
        infraguard_settings::InfraguardConfigV1::default()
    } else {
        infraguard_settings::parse_config_toml(input.config_text).context("parse config")?
    };
    let resolved = infraguard_settings::resolve_config(cfg, input.overrides.clone())
        .context("resolve config")?;

    let (graph, prior) = match load_graphs(&input) {
        Ok(loaded) => loaded,
        Err(err) => {
            let Some(graph_err) = err.downcast_ref::<GraphError>() else {
                return Err(err);
            };
            debug!(kind = ?graph_err.kind(), "configuration rejected");
            let report = Report::from_fatal(graph_err.to_fatal());
            return Ok(finish(report, started_at, resolved, None));
        }
    };

    let resources = graph.resources().len();
    let results = match stage {
        Stage::Check => infraguard_domain::evaluate(&graph, &builtin_rules(&resolved.effective)),
        Stage::Plan => Vec::new(),
    };

    let mut report = match plan(&graph, prior.as_ref()) {
        Ok(plan) => report::generate(results, Some(plan), resources),
        Err(err) => {
            debug!(error = %err, "planning failed");
            Report::with_plan_error(results, err.to_fatal(), resources)
        }
    };
    report.truncate_findings(resolved.effective.max_findings);

    Ok(finish(report, started_at, resolved, Some(graph)))
}

/// The bound configuration graph and the optional prior state.
fn load_graphs(input: &CheckInput<'_>) -> anyhow::Result<(Graph, Option<Graph>)> {
    let mut inputs: IndexMap<String, InputValue> = IndexMap::new();
    if let Some(path) = input.var_file {
        for (name, value) in infraguard_repo::read_var_file(path)? {
            inputs.insert(name, InputValue::Value(value));
        }
    }
    for (name, raw) in &input.vars {
        inputs.insert(name.clone(), InputValue::Raw(raw.clone()));
    }

    let graph = infraguard_repo::load_config(input.path)?.bind_variables(&inputs)?;
    let prior = input.state.map(infraguard_repo::load_state).transpose()?;
    debug!(
        resources = graph.resources().len(),
        variables = inputs.len(),
        prior = prior.is_some(),
        "loaded configuration"
    );
    Ok((graph, prior))
}

fn finish(
    report: Report,
    started_at: OffsetDateTime,
    resolved_config: ResolvedConfig,
    graph: Option<Graph>,
) -> CheckOutput {
    let exit_code = report.exit_code();
    CheckOutput {
        report: envelope(report, started_at, OffsetDateTime::now_utc()),
        resolved_config,
        graph,
        exit_code,
    }
}
