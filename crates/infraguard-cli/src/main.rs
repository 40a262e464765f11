//! CLI entry point for infraguard.
//!
//! This module stays thin: argument parsing, I/O, logging setup and exit codes.
//! All business logic lives in the `infraguard-app` crate.

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Args, Parser, Subcommand, ValueEnum};
use infraguard_app::{
    CheckInput, CheckOutput, ExplainOutput, parse_report_json, parse_var_assignment,
    render_annotations, render_markdown, render_text, run_check, run_explain, run_plan,
    runtime_error_report, serialize_report, to_renderable,
};
use infraguard_settings::Overrides;
use infraguard_types::ReportEnvelope;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG: &str = "infraguard.toml";

/// Exit code for tool errors (bad arguments, unreadable input, invalid config).
const EXIT_ERROR: i32 = 2;

#[derive(Parser, Debug)]
#[command(
    name = "infraguard",
    version,
    about = "Policy validator and plan simulator for Terraform-style HCL configurations"
)]
struct Cli {
    /// Path to the infraguard config TOML (default: ./infraguard.toml when present).
    #[arg(long)]
    config: Option<Utf8PathBuf>,

    /// Override profile (default|strict|advisory|permissive).
    #[arg(long)]
    profile: Option<String>,

    /// Override maximum findings to emit.
    #[arg(long)]
    max_findings: Option<u32>,

    /// Log filter (e.g. `debug`, `infraguard_graph=trace`). Falls back to RUST_LOG, then `warn`.
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    cmd: Commands,
}

/// Inputs shared by `check` and `plan`.
#[derive(Args, Debug, Clone)]
struct Source {
    /// A `.tf` file or a directory of `*.tf` files.
    path: Utf8PathBuf,

    /// Set a variable (`name=value`). Repeatable; wins over `--var-file`.
    #[arg(long = "var", value_parser = parse_var_assignment)]
    vars: Vec<(String, String)>,

    /// A `*.tfvars` or `*.tfvars.json` file.
    #[arg(long)]
    var_file: Option<Utf8PathBuf>,

    /// Prior-state snapshot (JSON written by `--state-out`, or `.tf` text) to plan against.
    #[arg(long)]
    state: Option<Utf8PathBuf>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    Json,
    Text,
    Md,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Evaluate policy rules, simulate the plan and write the report.
    Check {
        #[command(flatten)]
        source: Source,

        /// Where to write the JSON report.
        #[arg(long, default_value = "artifacts/infraguard/report.json")]
        report_out: Utf8PathBuf,

        /// What to print on stdout.
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,

        /// Write a Markdown report alongside the JSON.
        #[arg(long)]
        write_markdown: bool,

        /// Where to write the Markdown report (if enabled).
        #[arg(long, default_value = "artifacts/infraguard/comment.md")]
        markdown_out: Utf8PathBuf,

        /// Write the configuration graph as a state snapshot for a later `--state`.
        #[arg(long)]
        state_out: Option<Utf8PathBuf>,
    },

    /// Simulate the plan only; no rule runs.
    Plan {
        #[command(flatten)]
        source: Source,
    },

    /// Render Markdown from an existing JSON report.
    Md {
        /// Path to the JSON report file.
        #[arg(long, default_value = "artifacts/infraguard/report.json")]
        report: Utf8PathBuf,

        /// Where to write the Markdown output (if not specified, prints to stdout).
        #[arg(long, short)]
        output: Option<Utf8PathBuf>,
    },

    /// Render GitHub Actions annotations from an existing JSON report.
    Annotations {
        /// Path to the JSON report file.
        #[arg(long, default_value = "artifacts/infraguard/report.json")]
        report: Utf8PathBuf,

        /// Maximum number of annotations to emit.
        #[arg(long, default_value = "10")]
        max: usize,
    },

    /// Explain a rule id or finding code with remediation guidance.
    Explain {
        /// The rule id (e.g. "security.open_ingress") or code (e.g. "open_ingress").
        identifier: String,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(err) = init_tracing(cli.log_level.as_deref()) {
        eprintln!("infraguard error: {err:#}");
        std::process::exit(EXIT_ERROR);
    }

    let code = match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("infraguard error: {err:#}");
            EXIT_ERROR
        }
    };
    std::process::exit(code);
}

fn init_tracing(level: Option<&str>) -> anyhow::Result<()> {
    let filter = match level {
        Some(level) => {
            EnvFilter::try_new(level).with_context(|| format!("invalid --log-level: {level}"))?
        }
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("install log subscriber: {e}"))
}

fn run(cli: Cli) -> anyhow::Result<i32> {
    let overrides = Overrides {
        profile: cli.profile.clone(),
        max_findings: cli.max_findings,
    };
    match cli.cmd {
        Commands::Check {
            source,
            report_out,
            format,
            write_markdown,
            markdown_out,
            state_out,
        } => Ok(cmd_check(
            cli.config.as_deref(),
            overrides,
            &source,
            &report_out,
            format,
            write_markdown.then_some(markdown_out.as_path()),
            state_out.as_deref(),
        )),
        Commands::Plan { source } => cmd_plan(cli.config.as_deref(), overrides, &source),
        Commands::Md { report, output } => cmd_md(&report, output.as_deref()),
        Commands::Annotations { report, max } => cmd_annotations(&report, max),
        Commands::Explain { identifier } => Ok(cmd_explain(&identifier)),
    }
}

/// Config text: an explicit `--config` must exist; the default file is optional.
fn read_config(path: Option<&Utf8Path>) -> anyhow::Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path).with_context(|| format!("read config: {path}")),
        None => {
            let path = Utf8Path::new(DEFAULT_CONFIG);
            if path.is_file() {
                std::fs::read_to_string(path).with_context(|| format!("read config: {path}"))
            } else {
                debug!("no {DEFAULT_CONFIG} found; using defaults");
                Ok(String::new())
            }
        }
    }
}

fn check_input<'a>(source: &'a Source, config_text: &'a str, overrides: Overrides) -> CheckInput<'a> {
    CheckInput {
        path: &source.path,
        config_text,
        overrides,
        vars: source.vars.clone(),
        var_file: source.var_file.as_deref(),
        state: source.state.as_deref(),
    }
}

fn cmd_check(
    config: Option<&Utf8Path>,
    overrides: Overrides,
    source: &Source,
    report_out: &Utf8Path,
    format: Format,
    markdown_out: Option<&Utf8Path>,
    state_out: Option<&Utf8Path>,
) -> i32 {
    let result = (|| -> anyhow::Result<i32> {
        let config_text = read_config(config)?;
        let output = run_check(check_input(source, &config_text, overrides))?;

        write_report_file(report_out, &output.report).context("write report json")?;
        if let Some(markdown_out) = markdown_out {
            let md = render_markdown(&to_renderable(&output.report));
            write_text_file(markdown_out, &md).context("write markdown")?;
        }
        if let Some(state_out) = state_out {
            write_snapshot(state_out, &output)?;
        }

        print_report(&output.report, format)?;
        Ok(output.exit_code)
    })();

    match result {
        Ok(code) => code,
        Err(err) => {
            let report = runtime_error_report(&format!("{err:#}"));
            if let Err(write_err) = write_report_file(report_out, &report) {
                warn!(error = %write_err, "could not write runtime error report");
            }
            eprintln!("infraguard error: {err:#}");
            EXIT_ERROR
        }
    }
}

fn cmd_plan(config: Option<&Utf8Path>, overrides: Overrides, source: &Source) -> anyhow::Result<i32> {
    let config_text = read_config(config)?;
    let output = run_plan(check_input(source, &config_text, overrides))?;
    print!("{}", render_text(&to_renderable(&output.report)));
    Ok(output.exit_code)
}

fn write_snapshot(path: &Utf8Path, output: &CheckOutput) -> anyhow::Result<()> {
    match &output.graph {
        Some(graph) => infraguard_repo::write_state(path, graph).context("write state snapshot"),
        None => {
            warn!(path = %path, "configuration did not load; no state snapshot written");
            Ok(())
        }
    }
}

fn print_report(report: &ReportEnvelope, format: Format) -> anyhow::Result<()> {
    match format {
        Format::Json => {
            let data = serialize_report(report)?;
            let text = String::from_utf8(data).context("report is not UTF-8")?;
            println!("{text}");
        }
        Format::Text => print!("{}", render_text(&to_renderable(report))),
        Format::Md => print!("{}", render_markdown(&to_renderable(report))),
    }
    Ok(())
}

fn create_parent(path: &Utf8Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_str().is_empty()
    {
        std::fs::create_dir_all(parent).with_context(|| format!("create directory: {parent}"))?;
    }
    Ok(())
}

fn write_report_file(path: &Utf8Path, report: &ReportEnvelope) -> anyhow::Result<()> {
    create_parent(path)?;
    let data = serialize_report(report)?;
    std::fs::write(path, data).with_context(|| format!("write report: {path}"))?;
    Ok(())
}

fn write_text_file(path: &Utf8Path, text: &str) -> anyhow::Result<()> {
    create_parent(path)?;
    std::fs::write(path, text).with_context(|| format!("write text: {path}"))?;
    Ok(())
}

fn read_report(path: &Utf8Path) -> anyhow::Result<ReportEnvelope> {
    let text = std::fs::read_to_string(path).with_context(|| format!("read report: {path}"))?;
    parse_report_json(&text)
}

fn cmd_md(report_path: &Utf8Path, output: Option<&Utf8Path>) -> anyhow::Result<i32> {
    let report = read_report(report_path)?;
    let md = render_markdown(&to_renderable(&report));
    match output {
        Some(out_path) => write_text_file(out_path, &md).context("write markdown output")?,
        None => print!("{md}"),
    }
    Ok(0)
}

fn cmd_annotations(report_path: &Utf8Path, max: usize) -> anyhow::Result<i32> {
    let report = read_report(report_path)?;
    for annotation in render_annotations(&to_renderable(&report), max) {
        println!("{annotation}");
    }
    Ok(0)
}

fn cmd_explain(identifier: &str) -> i32 {
    match run_explain(identifier) {
        ExplainOutput::Found(exp) => {
            print!("{}", infraguard_app::format_explanation(&exp));
            0
        }
        ExplainOutput::NotFound {
            identifier,
            available_rule_ids,
            available_codes,
        } => {
            eprint!(
                "{}",
                infraguard_app::format_not_found(&identifier, available_rule_ids, available_codes)
            );
            EXIT_ERROR
        }
    }
}
