//! Node.js source collection
//!
//! Includes what `npm pack --dry-run` would publish: the `files` allow-list
//! from `package.json` when present, otherwise everything not matched by
//! `.npmignore` (or `.gitignore` when there is no `.npmignore`). Symbolic
//! directory links are followed. `node_modules` is never included.

use std::ffi::OsStr;
use std::fs;
use std::path::Path;

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use serde::Deserialize;

use super::{
    relative_name, sorted_walk, source_entry, CollectError, Collector, IgnoreError, IgnoreRules,
};
use crate::archive::ArchiveEntry;

const NODE_MODULES: &str = "node_modules";

/// Rules npm applies whatever the package says
const DEFAULT_IGNORES: &[&str] = &[
    ".git",
    ".svn",
    ".hg",
    "CVS",
    ".npmrc",
    ".DS_Store",
    "npm-debug.log",
    "*.orig",
    ".*.swp",
    "._*",
    "/.lock-wscript",
    "/.wafpickle-*",
    "/build/config.gypi",
    "/package-lock.json",
    ".npmignore",
    ".gitignore",
];

/// Root file stems published even when ignored or left out of `files`
const ALWAYS_INCLUDED_STEMS: &[&str] = &["readme", "license", "licence"];

#[derive(Debug, Deserialize)]
struct PackageManifest {
    #[serde(default)]
    files: Option<Vec<String>>,
}

/// Collects Node.js smart contract source.
#[derive(Debug, Clone, Copy, Default)]
pub struct NodeCollector;

impl Collector for NodeCollector {
    fn collect(&self, source_path: &Path) -> Result<Vec<ArchiveEntry>, CollectError> {
        let rules = PublishRules::load(source_path)?;
        let mut entries = Vec::new();

        let walker = sorted_walk(source_path, true).filter_entry(|entry| {
            if entry.depth() == 0 || !entry.file_type().is_dir() {
                return true;
            }
            match entry.path().strip_prefix(source_path) {
                Ok(rel) => rules.descend(rel),
                Err(_) => false,
            }
        });

        for entry in walker {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }

            let rel = relative_name(entry.path(), source_path)?;
            if !rules.includes(Path::new(&rel)) {
                tracing::trace!(path = %rel, "excluded by publish rules");
                continue;
            }
            entries.push(source_entry(&entry, source_path)?);
        }

        Ok(entries)
    }
}

/// The publish decision for one package root
struct PublishRules {
    defaults: IgnoreRules,
    ignore: IgnoreRules,
    files: Option<GlobSet>,
}

impl PublishRules {
    fn load(root: &Path) -> Result<Self, CollectError> {
        let defaults = IgnoreRules::from_lines(DEFAULT_IGNORES.iter().copied())?;

        let npmignore = root.join(".npmignore");
        let gitignore = root.join(".gitignore");
        let ignore = if npmignore.is_file() {
            load_ignore_manifest(&npmignore)?
        } else if gitignore.is_file() {
            load_ignore_manifest(&gitignore)?
        } else {
            IgnoreRules::new()
        };

        let files = match read_files_field(&root.join("package.json")) {
            Some(patterns) => Some(build_files_set(&patterns)?),
            None => None,
        };

        Ok(Self {
            defaults,
            ignore,
            files,
        })
    }

    fn descend(&self, rel: &Path) -> bool {
        if is_node_modules(rel) || self.defaults.is_ignored(rel, true) {
            return false;
        }
        // With an allow-list every directory may hold a listed file
        self.files.is_some() || !self.ignore.is_ignored(rel, true)
    }

    fn includes(&self, rel: &Path) -> bool {
        if is_node_modules(rel) {
            return false;
        }
        if is_always_included(rel) {
            return true;
        }
        if self.defaults.is_ignored(rel, false) {
            return false;
        }
        match &self.files {
            Some(files) => rel.ancestors().any(|p| !p.as_os_str().is_empty() && files.is_match(p)),
            None => !self.ignore.is_ignored(rel, false),
        }
    }
}

fn is_node_modules(rel: &Path) -> bool {
    rel.components()
        .any(|c| c.as_os_str() == OsStr::new(NODE_MODULES))
}

fn is_always_included(rel: &Path) -> bool {
    if rel.components().count() != 1 {
        return false;
    }
    let name = rel.to_string_lossy().to_ascii_lowercase();
    if name == "package.json" {
        return true;
    }
    let stem = name.split('.').next().unwrap_or_default();
    ALWAYS_INCLUDED_STEMS.contains(&stem)
}

/// Rules from an ignore manifest. A manifest that cannot be read is skipped
/// with a warning; one with an invalid pattern is an error.
fn load_ignore_manifest(path: &Path) -> Result<IgnoreRules, IgnoreError> {
    match IgnoreRules::from_file(path) {
        Err(IgnoreError::IoError(e)) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "could not read ignore manifest, publishing without it"
            );
            Ok(IgnoreRules::new())
        }
        other => other,
    }
}

/// The `files` field of `package.json`, if the manifest is readable and has one
fn read_files_field(manifest_path: &Path) -> Option<Vec<String>> {
    let contents = fs::read_to_string(manifest_path).ok()?;
    match serde_json::from_str::<PackageManifest>(&contents) {
        Ok(manifest) => manifest.files,
        Err(e) => {
            tracing::warn!(
                path = %manifest_path.display(),
                error = %e,
                "could not parse package.json, publishing without a files list"
            );
            None
        }
    }
}

fn build_files_set(patterns: &[String]) -> Result<GlobSet, CollectError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let pattern = pattern.trim().trim_start_matches("./").trim_start_matches('/');
        let pattern = pattern.trim_end_matches('/');
        if pattern.is_empty() {
            continue;
        }
        let glob = GlobBuilder::new(pattern)
            .literal_separator(true)
            .build()
            .map_err(IgnoreError::from)?;
        builder.add(glob);
    }
    let set = builder.build().map_err(IgnoreError::from)?;
    Ok(set)
}
