//! Filesystem adapters: discover and read configuration files, variable files and state
//! snapshots, and turn them into graphs.
//!
//! Parse failures keep their [`GraphError`] as the root cause, so callers can
//! `downcast_ref::<GraphError>()` to classify them.

#![forbid(unsafe_code)]

mod discover;

use anyhow::Context;
use camino::Utf8Path;
use indexmap::IndexMap;
use infraguard_graph::{Graph, GraphError, Value};
use infraguard_types::SourcePath;
use tracing::debug;

pub use discover::discover_config_files;

/// Fuzz-friendly entry points: parsing without filesystem access. **Never panic** on any input.
pub mod fuzz {
    /// Parse arbitrary text as a configuration file.
    pub fn parse_config(text: &str) -> Result<(), infraguard_graph::GraphError> {
        infraguard_graph::parse(text).map(|_| ())
    }

    /// Parse arbitrary text as a `*.tfvars` file.
    pub fn parse_var_file(text: &str) -> Result<(), infraguard_graph::GraphError> {
        infraguard_graph::parse_tfvars(text).map(|_| ())
    }
}

/// The text of every configuration file under `path` (a directory, or a single `.tf` file).
pub fn read_config(path: &Utf8Path) -> anyhow::Result<Vec<(SourcePath, String)>> {
    let (root, files) = if path.is_file() {
        let name = path.file_name().unwrap_or(path.as_str());
        let root = path.parent().unwrap_or(Utf8Path::new("."));
        (root, vec![SourcePath::new(name)])
    } else {
        (path, discover_config_files(path).context("discover configuration files")?)
    };

    if files.is_empty() {
        anyhow::bail!("no *.tf files found in {path}");
    }

    let mut out = Vec::with_capacity(files.len());
    for file in files {
        let abs = root.join(file.as_str());
        let text = std::fs::read_to_string(&abs).with_context(|| format!("read {abs}"))?;
        out.push((file, text));
    }
    debug!(files = out.len(), root = %root, "read configuration");
    Ok(out)
}

/// Read and parse the configuration at `path` into one graph.
pub fn load_config(path: &Utf8Path) -> anyhow::Result<Graph> {
    let files = read_config(path)?;
    let files: Vec<(&str, &str)> = files
        .iter()
        .map(|(p, text)| (p.as_str(), text.as_str()))
        .collect();
    Ok(infraguard_graph::parse_files(&files)?)
}

/// A prior-state snapshot: a JSON-serialized graph, or configuration text (`.tf`).
pub fn load_state(path: &Utf8Path) -> anyhow::Result<Graph> {
    let text = std::fs::read_to_string(path).with_context(|| format!("read {path}"))?;
    if path.extension() == Some("json") {
        let graph: Graph =
            serde_json::from_str(&text).with_context(|| format!("parse state snapshot {path}"))?;
        return Ok(graph);
    }
    let name = path.file_name().unwrap_or(path.as_str());
    let graph = infraguard_graph::parse_file(name, &text)?;
    graph.validate_references()?;
    Ok(graph)
}

/// Write `graph` as a JSON state snapshot, creating parent directories.
pub fn write_state(path: &Utf8Path, graph: &Graph) -> anyhow::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_str().is_empty()
    {
        std::fs::create_dir_all(parent).with_context(|| format!("create {parent}"))?;
    }
    let json = serde_json::to_string_pretty(graph).context("serialize state snapshot")?;
    std::fs::write(path, json).with_context(|| format!("write {path}"))?;
    Ok(())
}

/// Variable values from a `*.tfvars` file, or a `*.tfvars.json` object.
pub fn read_var_file(path: &Utf8Path) -> anyhow::Result<IndexMap<String, Value>> {
    let text = std::fs::read_to_string(path).with_context(|| format!("read {path}"))?;
    if path.as_str().ends_with(".json") {
        let json: serde_json::Map<String, serde_json::Value> =
            serde_json::from_str(&text).with_context(|| format!("parse {path}"))?;
        return Ok(json.into_iter().map(|(k, v)| (k, Value::from(v))).collect());
    }
    infraguard_graph::parse_tfvars(&text)
        .map_err(|e| relocate(e, path))
        .map_err(anyhow::Error::from)
}

/// Point a parse error inside a variable file at that file.
fn relocate(err: GraphError, path: &Utf8Path) -> GraphError {
    match err {
        GraphError::Parse { message, location } => GraphError::Parse {
            message,
            location: location.map(|mut l| {
                l.path = SourcePath::new(path.file_name().unwrap_or(path.as_str()));
                l
            }),
        },
        other => other,
    }
}
