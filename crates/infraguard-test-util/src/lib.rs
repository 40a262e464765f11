//! Shared test utilities for the infraguard workspace.
//!
//! `xtask` needs [`normalize_nondeterministic`] at runtime, so this cannot live behind
//! `#[cfg(test)]` in another crate.

use serde_json::Value;

const TIMESTAMP: &str = "__TIMESTAMP__";
const VERSION: &str = "__VERSION__";

/// Normalize the fields of a report that change from run to run.
///
/// 1. **Root-only**: `tool.version` becomes `"__VERSION__"` when the root object looks like a
///    report envelope (`schema`, `tool`, `verdict`, `results` and `summary` all present). Finding
///    `data` payloads that happen to carry a `tool` object are left alone.
/// 2. **Recursive**: `started_at` and `finished_at` become `"__TIMESTAMP__"` at any depth.
pub fn normalize_nondeterministic(mut value: Value) -> Value {
    if let Some(obj) = value.as_object_mut() {
        let is_envelope = ["schema", "tool", "verdict", "results", "summary"]
            .iter()
            .all(|k| obj.contains_key(*k));
        if is_envelope
            && let Some(tool) = obj.get_mut("tool").and_then(Value::as_object_mut)
            && tool.contains_key("version")
        {
            tool.insert("version".to_string(), Value::String(VERSION.to_string()));
        }
    }
    normalize_timestamps(&mut value);
    value
}

fn normalize_timestamps(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for key in ["started_at", "finished_at"] {
                if let Some(v) = map.get_mut(key) {
                    *v = Value::String(TIMESTAMP.to_string());
                }
            }
            map.values_mut().for_each(normalize_timestamps);
        }
        Value::Array(items) => items.iter_mut().for_each(normalize_timestamps),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn envelope_version_and_timestamps_are_normalized() {
        let input = json!({
            "schema": "infraguard.report.v1",
            "tool": { "name": "infraguard", "version": "0.1.0" },
            "started_at": "2026-01-01T00:00:00Z",
            "finished_at": "2026-01-01T00:00:01Z",
            "verdict": "pass",
            "results": [
                { "findings": [{ "data": { "tool": { "name": "terraform", "version": "1.9" } } }] }
            ],
            "summary": {}
        });

        let result = normalize_nondeterministic(input);
        assert_eq!(result["tool"]["version"], VERSION);
        assert_eq!(result["tool"]["name"], "infraguard");
        assert_eq!(result["started_at"], TIMESTAMP);
        assert_eq!(result["finished_at"], TIMESTAMP);
        assert_eq!(
            result["results"][0]["findings"][0]["data"]["tool"]["version"],
            "1.9"
        );
    }

    #[test]
    fn non_envelopes_keep_their_version() {
        let input = json!({
            "tool": { "name": "other", "version": "2.0.0" },
            "run": { "started_at": "2026-01-01T00:00:00Z" }
        });
        let result = normalize_nondeterministic(input);
        assert_eq!(result["tool"]["version"], "2.0.0");
        assert_eq!(result["run"]["started_at"], TIMESTAMP);
    }
}
