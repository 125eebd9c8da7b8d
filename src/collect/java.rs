//! Java source collection
//!
//! Every file in the tree is packaged; the peer builds with Gradle or Maven
//! and needs the whole project.

use std::path::Path;

use super::{sorted_walk, source_entry, CollectError, Collector};
use crate::archive::ArchiveEntry;

/// Collects Java smart contract source.
#[derive(Debug, Clone, Copy, Default)]
pub struct JavaCollector;

impl Collector for JavaCollector {
    fn collect(&self, source_path: &Path) -> Result<Vec<ArchiveEntry>, CollectError> {
        let mut entries = Vec::new();
        for entry in sorted_walk(source_path, false) {
            let entry = entry?;
            if entry.file_type().is_file() {
                entries.push(source_entry(&entry, source_path)?);
            }
        }
        Ok(entries)
    }
}
