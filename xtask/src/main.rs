//! Developer tasks (schema generation, explain coverage, report conformance).
//!
//! Keeping this separate avoids bloating the end-user CLI.

use anyhow::{Context, bail};
use infraguard_types::explain;
use schemars::schema_for;
use std::fs;
use std::path::{Path, PathBuf};

/// Project root (parent of the xtask directory).
fn project_root() -> PathBuf {
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR")
        .map(PathBuf::from)
        .or_else(|_| std::env::current_dir())
        .unwrap_or_else(|_| PathBuf::from("."));

    if manifest_dir.ends_with("xtask")
        && let Some(parent) = manifest_dir.parent()
    {
        return parent.to_path_buf();
    }
    manifest_dir
}

fn schemas_dir() -> PathBuf {
    project_root().join("schemas")
}

/// Schema definition with its target filename.
struct SchemaSpec {
    filename: &'static str,
    generate: fn() -> schemars::Schema,
}

fn generate_report_schema() -> schemars::Schema {
    schema_for!(infraguard_types::ReportEnvelope)
}

fn generate_config_schema() -> schemars::Schema {
    schema_for!(infraguard_settings::InfraguardConfigV1)
}

fn schema_specs() -> Vec<SchemaSpec> {
    vec![
        SchemaSpec {
            filename: "infraguard.report.v1.json",
            generate: generate_report_schema,
        },
        SchemaSpec {
            filename: "infraguard.config.v1.json",
            generate: generate_config_schema,
        },
    ]
}

/// Pretty-printed JSON with a trailing newline.
fn serialize_schema(schema: &schemars::Schema) -> anyhow::Result<String> {
    let mut json = serde_json::to_string_pretty(schema).context("serialize schema")?;
    json.push('\n');
    Ok(json)
}

fn emit_schemas() -> anyhow::Result<()> {
    let dir = schemas_dir();
    fs::create_dir_all(&dir).context("create schemas directory")?;

    for spec in schema_specs() {
        let json = serialize_schema(&(spec.generate)())?;
        let path = dir.join(spec.filename);
        fs::write(&path, &json).with_context(|| format!("write {}", path.display()))?;
        println!("Wrote {}", path.display());
    }
    Ok(())
}

/// Check that schemas/ matches what would be generated (for CI).
fn validate_schemas() -> anyhow::Result<()> {
    let dir = schemas_dir();
    let mut missing = Vec::new();
    let mut mismatched = Vec::new();

    for spec in schema_specs() {
        let path = dir.join(spec.filename);
        if !path.exists() {
            missing.push(spec.filename);
            continue;
        }
        let expected = serialize_schema(&(spec.generate)())?;
        let actual =
            fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
        if expected != actual {
            mismatched.push(spec.filename);
        }
    }

    if missing.is_empty() && mismatched.is_empty() {
        println!("All schemas are up to date.");
        return Ok(());
    }
    for name in &missing {
        eprintln!("  missing: {name}");
    }
    for name in &mismatched {
        eprintln!("  out of date: {name}");
    }
    eprintln!("\nRun `cargo xtask emit-schemas` to regenerate.");
    bail!("schema validation failed")
}

/// Relative, forward-slash, no `..`.
fn is_clean_path(path: &str) -> bool {
    !(path.starts_with('/')
        || path.contains("..")
        || path.contains('\\')
        || (path.len() >= 2 && path.as_bytes()[1] == b':'))
}

/// Problems with one report: schema violations and unclean location paths.
fn report_problems(validator: &jsonschema::Validator, report: &serde_json::Value) -> Vec<String> {
    let mut problems: Vec<String> = validator
        .iter_errors(report)
        .map(|e| format!("schema: {e}"))
        .collect();

    let mut check_location = |label: String, location: Option<&serde_json::Value>| {
        if let Some(path) = location.and_then(|l| l.get("path")).and_then(|p| p.as_str())
            && !is_clean_path(path)
        {
            problems.push(format!("{label}.location.path `{path}` is not clean"));
        }
    };

    check_location("error".to_string(), report.get("error").and_then(|e| e.get("location")));
    let results = report.get("results").and_then(|r| r.as_array());
    for (i, result) in results.into_iter().flatten().enumerate() {
        let findings = result.get("findings").and_then(|f| f.as_array());
        for (j, finding) in findings.into_iter().flatten().enumerate() {
            check_location(format!("results[{i}].findings[{j}]"), finding.get("location"));
        }
    }
    problems
}

/// Validate report files (or every `*.json` in the given directories) against the report schema.
fn conform(args: &[String]) -> anyhow::Result<()> {
    if args.is_empty() {
        bail!("usage: cargo xtask conform <report.json|dir>...");
    }
    let schema = serde_json::to_value(generate_report_schema()).context("schema to json")?;
    let validator = jsonschema::validator_for(&schema)
        .map_err(|e| anyhow::anyhow!("compile report schema: {e}"))?;

    let mut files = Vec::new();
    for arg in args {
        let path = Path::new(arg);
        if path.is_dir() {
            for entry in fs::read_dir(path).with_context(|| format!("read {arg}"))? {
                let entry = entry?.path();
                if entry.extension().is_some_and(|ext| ext == "json") {
                    files.push(entry);
                }
            }
        } else {
            files.push(path.to_path_buf());
        }
    }
    files.sort();

    let mut errors = Vec::new();
    for file in &files {
        let text = fs::read_to_string(file).with_context(|| format!("read {}", file.display()))?;
        let report: serde_json::Value = serde_json::from_str(&text)
            .with_context(|| format!("parse {} as JSON", file.display()))?;
        errors.extend(
            report_problems(&validator, &report)
                .into_iter()
                .map(|p| format!("{}: {p}", file.display())),
        );
    }

    if errors.is_empty() {
        println!("{} report(s) conform to infraguard.report.v1", files.len());
        return Ok(());
    }
    for error in &errors {
        eprintln!("  - {error}");
    }
    bail!("conformance failed with {} error(s)", errors.len())
}

/// Print a report with run-specific fields replaced by placeholders, for golden diffs.
fn normalize(args: &[String]) -> anyhow::Result<()> {
    let [path] = args else {
        bail!("usage: cargo xtask normalize <report.json>");
    };
    let text = fs::read_to_string(path).with_context(|| format!("read {path}"))?;
    let report: serde_json::Value =
        serde_json::from_str(&text).with_context(|| format!("parse {path}"))?;
    let normalized = infraguard_test_util::normalize_nondeterministic(report);
    println!(
        "{}",
        serde_json::to_string_pretty(&normalized).context("serialize report")?
    );
    Ok(())
}

/// Every rule id and code has a complete explanation.
fn explain_coverage() -> anyhow::Result<()> {
    let rule_ids = explain::all_rule_ids();
    let codes = explain::all_codes();
    let mut errors = Vec::new();

    for id in rule_ids.iter().chain(codes) {
        let Some(exp) = explain::lookup_explanation(id) else {
            errors.push(format!("'{id}' has no explanation"));
            continue;
        };
        for (field, value) in [
            ("title", exp.title),
            ("description", exp.description),
            ("remediation", exp.remediation),
        ] {
            if value.is_empty() {
                errors.push(format!("'{id}' has an empty {field}"));
            }
        }
    }

    if errors.is_empty() {
        println!("{} rule ids have explanations", rule_ids.len());
        println!("{} codes have explanations", codes.len());
        return Ok(());
    }
    for error in &errors {
        eprintln!("  - {error}");
    }
    bail!("explain coverage failed with {} error(s)", errors.len())
}

fn print_help() {
    eprintln!("xtask commands:");
    eprintln!("  help                      Show this message");
    eprintln!("  emit-schemas              Generate JSON schemas from Rust types to schemas/");
    eprintln!("  validate-schemas          Check that schemas/ matches generated output (for CI)");
    eprintln!("  print-schema-ids          Print known schema IDs");
    eprintln!("  conform <report|dir>...   Validate reports against infraguard.report.v1");
    eprintln!("  normalize <report>        Print a report with timestamps and version normalized");
    eprintln!("  explain-coverage          Check that all rule ids and codes have explanations");
}

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let cmd = args.get(1).map(String::as_str).unwrap_or("help");
    let rest = args.get(2..).unwrap_or_default();

    match cmd {
        "help" | "--help" | "-h" => {
            print_help();
            Ok(())
        }
        "emit-schemas" => emit_schemas(),
        "validate-schemas" => validate_schemas(),
        "conform" => conform(rest),
        "normalize" => normalize(rest),
        "explain-coverage" => explain_coverage(),
        "print-schema-ids" => {
            for spec in schema_specs() {
                println!("{}", spec.filename.trim_end_matches(".json"));
            }
            Ok(())
        }
        other => bail!("unknown xtask command: {other}\n\nRun `cargo xtask help` for usage."),
    }
    .context("xtask failed")
}
