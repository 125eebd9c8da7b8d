//! Deterministic tar+gzip codec
//!
//! Writes gzipped tar archives whose bytes depend only on the ordered entry
//! names and contents, and streams existing archives back one regular file
//! at a time. Knows nothing about smart contracts.

mod read;
mod write;

pub use read::{list_file_names, ArchiveReader, FileEntry, Files};
pub use write::write_archive;

use std::io;
use std::path::{Path, PathBuf};

/// Timestamp stamped into every header (access, modify and change time)
pub const FIXED_TIMESTAMP: u64 = 0;

/// Mode of every regular file entry: rw-r--r--
pub const FILE_MODE: u32 = 0o100644;

/// Errors for archive encoding and decoding
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("Failed to read {path}: {source}")]
    ReadContent {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Size mismatch for {name}: descriptor says {expected} bytes but content has {actual}")]
    SizeMismatch {
        name: String,
        expected: u64,
        actual: u64,
    },

    #[error("Entry {name} is {size} bytes, more than the {limit} byte limit")]
    EntryTooLarge { name: String, size: u64, limit: u64 },

    #[error("Invalid archive entry name {0:?}")]
    InvalidName(String),

    #[error("Archive write error: {0}")]
    WriteError(#[source] io::Error),

    #[error("Archive read error: {0}")]
    ReadError(#[source] io::Error),
}

/// Where an entry's bytes come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryContent {
    /// A file on disk, read when the archive is written
    File(PathBuf),
    /// Bytes already in memory
    Bytes(Vec<u8>),
}

/// A single named file destined for an archive.
///
/// Names are relative and always use forward slashes, whatever the host
/// path convention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    name: String,
    content: EntryContent,
    size: u64,
}

impl ArchiveEntry {
    /// Entry backed by a file whose size was observed as `size` while walking
    pub fn from_file(name: impl AsRef<str>, path: impl Into<PathBuf>, size: u64) -> Self {
        Self {
            name: normalize_name(name.as_ref()),
            content: EntryContent::File(path.into()),
            size,
        }
    }

    /// Entry backed by in-memory bytes
    pub fn from_bytes(name: impl AsRef<str>, bytes: Vec<u8>) -> Self {
        let size = bytes.len() as u64;
        Self {
            name: normalize_name(name.as_ref()),
            content: EntryContent::Bytes(bytes),
            size,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn content(&self) -> &EntryContent {
        &self.content
    }

    pub fn size(&self) -> u64 {
        self.size
    }
}

/// Normalize an entry name: forward slashes, no leading `./` or `/`.
pub fn normalize_name(name: &str) -> String {
    let slashed = name.replace('\\', "/");
    let mut trimmed = slashed.as_str();
    loop {
        if let Some(rest) = trimmed.strip_prefix("./") {
            trimmed = rest;
        } else if let Some(rest) = trimmed.strip_prefix('/') {
            trimmed = rest;
        } else {
            break;
        }
    }
    trimmed.to_string()
}

/// Render a relative path as an entry name, joining components with `/`.
pub fn path_to_name(path: &Path) -> String {
    let parts: Vec<_> = path
        .components()
        .filter_map(|c| match c {
            std::path::Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect();
    normalize_name(&parts.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backslashes_normalized() {
        let entry = ArchiveEntry::from_bytes("src\\lib\\index.js", b"x".to_vec());
        assert_eq!(entry.name(), "src/lib/index.js");
    }

    #[test]
    fn test_leading_dot_and_slash_stripped() {
        assert_eq!(normalize_name("./src/main.go"), "src/main.go");
        assert_eq!(normalize_name("/META-INF/a.json"), "META-INF/a.json");
        assert_eq!(normalize_name(".//x"), "x");
    }

    #[test]
    fn test_size_tracks_bytes() {
        let entry = ArchiveEntry::from_bytes("metadata.json", b"{}".to_vec());
        assert_eq!(entry.size(), 2);
    }

    #[test]
    fn test_path_to_name() {
        let path = Path::new("src").join("github.com").join("cc.go");
        assert_eq!(path_to_name(&path), "src/github.com/cc.go");
    }
}
