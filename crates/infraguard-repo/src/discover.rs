use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use infraguard_types::SourcePath;
use std::path::PathBuf;
use walkdir::WalkDir;

/// `*.tf` files of one configuration, relative to `root`, in lexicographic order.
///
/// A configuration is a single directory; subdirectories belong to modules and are not read.
pub fn discover_config_files(root: &Utf8Path) -> anyhow::Result<Vec<SourcePath>> {
    let mut out = Vec::new();
    for entry in WalkDir::new(root).min_depth(1).max_depth(1) {
        let entry = entry.with_context(|| format!("list {root}"))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(abs) = pathbuf_to_utf8(entry.path().to_path_buf()) else {
            continue;
        };
        let rel = SourcePath::new(abs.strip_prefix(root).unwrap_or(&abs).as_str());
        if rel.is_config_file() {
            out.push(rel);
        }
    }

    // Stable order.
    out.sort();
    Ok(out)
}

fn pathbuf_to_utf8(path: PathBuf) -> Option<Utf8PathBuf> {
    Utf8PathBuf::from_path_buf(path).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn utf8_root(tmp: &TempDir) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).expect("utf8 path")
    }

    fn write_file(path: &Utf8Path, contents: &str) {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent");
        }
        std::fs::write(path, contents).expect("write file");
    }

    #[test]
    fn only_top_level_tf_files_are_discovered_in_order() {
        let tmp = TempDir::new().expect("temp dir");
        let root = utf8_root(&tmp);

        write_file(&root.join("variables.tf"), "");
        write_file(&root.join("main.tf"), "");
        write_file(&root.join("terraform.tfvars"), "");
        write_file(&root.join("README.md"), "");
        write_file(&root.join("modules/vpc/main.tf"), "");

        let files = discover_config_files(&root).expect("discover");
        let paths: Vec<&str> = files.iter().map(|p| p.as_str()).collect();
        assert_eq!(paths, vec!["main.tf", "variables.tf"]);
    }

    #[test]
    fn missing_directory_is_an_error() {
        let tmp = TempDir::new().expect("temp dir");
        let root = utf8_root(&tmp).join("absent");
        let err = discover_config_files(&root).expect_err("missing dir");
        assert!(err.to_string().contains("list"));
    }

    #[test]
    fn pathbuf_to_utf8_rejects_invalid() {
        #[cfg(unix)]
        {
            use std::ffi::OsString;
            use std::os::unix::ffi::OsStringExt;
            let invalid = OsString::from_vec(vec![0xFF, 0xFE, 0xFD]);
            assert!(pathbuf_to_utf8(PathBuf::from(invalid)).is_none());
        }
    }
}
