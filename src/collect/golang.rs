//! Go source collection
//!
//! A Go contract is either a self-contained module (a `go.mod` at the source
//! root) or a GOPATH-style import path that lives at
//! `<build path>/src/<source path>`.

use std::path::{Path, PathBuf};

use super::{
    has_extension, relative_name, sorted_walk, source_entry, CollectError, Collector, SOURCE_ROOT,
};
use crate::archive::ArchiveEntry;

/// Marker file of a self-contained Go module
pub const GO_MODULE_FILE: &str = "go.mod";

/// Extensions packaged for legacy installs
const LEGACY_EXTENSIONS: &[&str] = &["c", "h", "s", "go", "yaml", "json", "mod", "sum"];

/// Extensions packaged for lifecycle installs; adds vendor `modules.txt`
const LIFECYCLE_EXTENSIONS: &[&str] = &["c", "h", "s", "go", "yaml", "json", "mod", "sum", "txt"];

/// Whether `source_path` is a self-contained Go module
pub fn is_go_module(source_path: &Path) -> bool {
    source_path.join(GO_MODULE_FILE).is_file()
}

/// Collects Go smart contract source.
#[derive(Debug, Clone)]
pub struct GolangCollector {
    build_path: Option<PathBuf>,
    extensions: &'static [&'static str],
}

impl GolangCollector {
    /// Collector for the legacy format
    pub fn legacy(build_path: Option<PathBuf>) -> Self {
        Self {
            build_path,
            extensions: LEGACY_EXTENSIONS,
        }
    }

    /// Collector for the lifecycle format
    pub fn lifecycle(build_path: Option<PathBuf>) -> Self {
        Self {
            build_path,
            extensions: LIFECYCLE_EXTENSIONS,
        }
    }

    fn collect_module(&self, source_path: &Path) -> Result<Vec<ArchiveEntry>, CollectError> {
        let mut entries = Vec::new();
        for entry in sorted_walk(source_path, false) {
            let entry = entry?;
            if entry.file_type().is_file() && has_extension(entry.path(), self.extensions) {
                entries.push(source_entry(&entry, source_path)?);
            }
        }
        Ok(entries)
    }

    fn collect_gopath(
        &self,
        build_path: &Path,
        source_path: &Path,
    ) -> Result<Vec<ArchiveEntry>, CollectError> {
        let project_dir = build_path.join(SOURCE_ROOT).join(source_path);
        tracing::debug!(project = %project_dir.display(), "collecting GOPATH project");

        let mut entries = Vec::new();
        for entry in sorted_walk(&project_dir, false) {
            let entry = entry?;
            if !entry.file_type().is_file() || !has_extension(entry.path(), self.extensions) {
                continue;
            }
            // Relative to the build path, so names already start with src/
            let name = relative_name(entry.path(), build_path)?;
            entries.push(ArchiveEntry::from_file(
                name,
                entry.path(),
                entry.metadata()?.len(),
            ));
        }
        Ok(entries)
    }
}

impl Collector for GolangCollector {
    fn collect(&self, source_path: &Path) -> Result<Vec<ArchiveEntry>, CollectError> {
        if is_go_module(source_path) {
            tracing::debug!(source = %source_path.display(), "collecting Go module");
            return self.collect_module(source_path);
        }

        let build_path = self
            .build_path
            .as_deref()
            .ok_or_else(|| CollectError::MissingBuildPath(source_path.to_path_buf()))?;
        self.collect_gopath(build_path, source_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, contents: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn names(entries: Vec<ArchiveEntry>) -> Vec<String> {
        entries.iter().map(|e| e.name().to_string()).collect()
    }

    #[test]
    fn test_module_rooted_under_src() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "go.mod", "module example.com/cc\n");
        write(dir.path(), "go.sum", "");
        write(dir.path(), "main.go", "package main");
        write(dir.path(), "chaincode/asset.go", "package chaincode");
        write(dir.path(), "README.md", "# cc");
        write(dir.path(), "vendor/modules.txt", "# example.com/dep v1.0.0");

        let legacy = GolangCollector::legacy(None).collect(dir.path()).unwrap();
        assert_eq!(
            names(legacy),
            vec!["src/chaincode/asset.go", "src/go.mod", "src/go.sum", "src/main.go"]
        );

        let lifecycle = GolangCollector::lifecycle(None).collect(dir.path()).unwrap();
        assert!(names(lifecycle).contains(&"src/vendor/modules.txt".to_string()));
    }

    #[test]
    fn test_gopath_names_relative_to_build_path() {
        let gopath = TempDir::new().unwrap();
        write(gopath.path(), "src/github.com/acme/cc/cc.go", "package cc");
        write(gopath.path(), "src/github.com/acme/cc/lib/util.go", "package lib");
        write(gopath.path(), "src/github.com/acme/cc/notes.md", "skip");
        write(gopath.path(), "src/github.com/acme/other/x.go", "package other");

        let collector = GolangCollector::legacy(Some(gopath.path().to_path_buf()));
        let entries = collector.collect(Path::new("github.com/acme/cc")).unwrap();
        assert_eq!(
            names(entries),
            vec![
                "src/github.com/acme/cc/cc.go",
                "src/github.com/acme/cc/lib/util.go"
            ]
        );
    }

    #[test]
    fn test_gopath_without_build_path_fails() {
        let err = GolangCollector::legacy(None)
            .collect(Path::new("github.com/acme/missing"))
            .unwrap_err();
        assert!(matches!(err, CollectError::MissingBuildPath(_)));
    }

    #[test]
    fn test_missing_project_dir_is_walk_error() {
        let gopath = TempDir::new().unwrap();
        let err = GolangCollector::legacy(Some(gopath.path().to_path_buf()))
            .collect(Path::new("github.com/acme/missing"))
            .unwrap_err();
        assert!(matches!(err, CollectError::WalkError(_)));
    }
}
