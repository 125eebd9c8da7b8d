//! Smart contract source collection
//!
//! A collector walks a source tree and returns the ordered archive entries
//! for it. Source always lands under the `src/` virtual root; optional
//! metadata (CouchDB index definitions and the like) lands under `META-INF/`
//! after all source entries.

mod golang;
mod ignore;
mod java;
mod node;

pub use golang::{is_go_module, GolangCollector, GO_MODULE_FILE};
pub use ignore::{IgnoreError, IgnoreRules};
pub use java::JavaCollector;
pub use node::NodeCollector;

use std::cmp::Ordering;
use std::io;
use std::path::{Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

use crate::archive::{path_to_name, ArchiveEntry};

/// Virtual root for contract source inside the code archive
pub const SOURCE_ROOT: &str = "src";

/// Virtual root for contract metadata inside the code archive
pub const METADATA_ROOT: &str = "META-INF";

/// Errors for source collection
#[derive(Debug, thiserror::Error)]
pub enum CollectError {
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    #[error("Walk error: {0}")]
    WalkError(#[from] walkdir::Error),

    #[error("Path {path} is not within {root}")]
    PathNotInRoot { path: PathBuf, root: PathBuf },

    #[error("Ignore rules error: {0}")]
    IgnoreError(#[from] IgnoreError),

    #[error("No Go build path was given and {0} is not a Go module")]
    MissingBuildPath(PathBuf),
}

/// Turns a source directory into archive entries.
pub trait Collector {
    /// Collect the source entries under `source_path`, in walk order.
    fn collect(&self, source_path: &Path) -> Result<Vec<ArchiveEntry>, CollectError>;
}

/// Collect source entries and then any metadata entries.
pub fn collect_with_metadata(
    collector: &dyn Collector,
    source_path: &Path,
    metadata_path: Option<&Path>,
) -> Result<Vec<ArchiveEntry>, CollectError> {
    let mut entries = collector.collect(source_path)?;
    let source_count = entries.len();

    if let Some(metadata_path) = metadata_path {
        entries.extend(collect_metadata(metadata_path)?);
    }

    tracing::debug!(
        source = source_count,
        metadata = entries.len() - source_count,
        "collected smart contract entries"
    );
    Ok(entries)
}

/// Collect every `.json` file under `metadata_path` as `META-INF/<relative>`.
pub fn collect_metadata(metadata_path: &Path) -> Result<Vec<ArchiveEntry>, CollectError> {
    let mut entries = Vec::new();

    for entry in sorted_walk(metadata_path, false) {
        let entry = entry?;
        if !entry.file_type().is_file() || !has_extension(entry.path(), &["json"]) {
            continue;
        }

        let rel = relative_name(entry.path(), metadata_path)?;
        entries.push(ArchiveEntry::from_file(
            format!("{}/{}", METADATA_ROOT, rel),
            entry.path(),
            entry.metadata()?.len(),
        ));
    }

    Ok(entries)
}

/// Walk `root` with siblings in byte order of their file names, so the
/// resulting entry order never depends on the host filesystem.
pub(crate) fn sorted_walk(root: &Path, follow_links: bool) -> walkdir::IntoIter {
    WalkDir::new(root)
        .follow_links(follow_links)
        .sort_by(by_file_name)
        .into_iter()
}

fn by_file_name(a: &DirEntry, b: &DirEntry) -> Ordering {
    a.file_name().cmp(b.file_name())
}

/// Path of `path` relative to `root` as a forward-slash entry name.
pub(crate) fn relative_name(path: &Path, root: &Path) -> Result<String, CollectError> {
    let rel = path
        .strip_prefix(root)
        .map_err(|_| CollectError::PathNotInRoot {
            path: path.to_path_buf(),
            root: root.to_path_buf(),
        })?;
    Ok(path_to_name(rel))
}

/// Build a `src/`-rooted file entry for `entry`, named relative to `root`.
pub(crate) fn source_entry(entry: &DirEntry, root: &Path) -> Result<ArchiveEntry, CollectError> {
    let rel = relative_name(entry.path(), root)?;
    let size = entry.metadata()?.len();
    tracing::trace!(path = %entry.path().display(), "collecting source file");
    Ok(ArchiveEntry::from_file(
        format!("{}/{}", SOURCE_ROOT, rel),
        entry.path(),
        size,
    ))
}

pub(crate) fn has_extension(path: &Path, allowed: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| allowed.iter().any(|a| a.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}
