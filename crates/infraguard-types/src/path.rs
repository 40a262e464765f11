use camino::{Utf8Path, Utf8PathBuf};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Canonical config-relative path used in locations and reports.
///
/// Normalization rules are intentionally simple and deterministic:
/// - always forward slashes (`/`)
/// - no leading `./`
/// - an empty input becomes `.`
#[derive(
    Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(transparent)]
pub struct SourcePath(String);

impl Default for SourcePath {
    fn default() -> Self {
        SourcePath::new("main.tf")
    }
}

impl SourcePath {
    pub fn new<S: AsRef<str>>(s: S) -> Self {
        let mut v = s.as_ref().replace('\\', "/");
        while v.starts_with("./") {
            v = v.trim_start_matches("./").to_string();
        }
        if v.is_empty() {
            v = ".".to_string();
        }
        Self(v)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn to_utf8_pathbuf(&self) -> Utf8PathBuf {
        Utf8PathBuf::from(self.0.clone())
    }

    /// True for `*.tf` configuration files.
    pub fn is_config_file(&self) -> bool {
        Utf8Path::new(self.as_str())
            .extension()
            .is_some_and(|ext| ext == "tf")
    }
}

impl std::fmt::Display for SourcePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&Utf8Path> for SourcePath {
    fn from(value: &Utf8Path) -> Self {
        SourcePath::new(value.as_str())
    }
}

impl From<Utf8PathBuf> for SourcePath {
    fn from(value: Utf8PathBuf) -> Self {
        SourcePath::new(value.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_separators_and_leading_dot() {
        assert_eq!(SourcePath::new(".\\modules\\net.tf").as_str(), "modules/net.tf");
        assert_eq!(SourcePath::new("././main.tf").as_str(), "main.tf");
        assert_eq!(SourcePath::new("").as_str(), ".");
    }

    #[test]
    fn recognizes_config_files() {
        assert!(SourcePath::new("network.tf").is_config_file());
        assert!(!SourcePath::new("terraform.tfvars").is_config_file());
        assert!(!SourcePath::new("README.md").is_config_file());
    }
}
