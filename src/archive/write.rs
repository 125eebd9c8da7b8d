//! Deterministic archive writer

use std::borrow::Cow;
use std::fs;

use flate2::{Compression, GzBuilder};
use rayon::prelude::*;
use tar::{Builder, EntryType, Header, HeaderMode};

use super::{ArchiveEntry, CodecError, EntryContent, FILE_MODE, FIXED_TIMESTAMP};

/// Write `entries` as a gzipped tar, in the order given.
///
/// File-backed contents are loaded in parallel but appended strictly in
/// descriptor order, so identical ordered inputs always yield identical
/// bytes. Every header carries the same mode, owner and timestamps, and the
/// gzip header carries no mtime or filename.
pub fn write_archive(entries: &[ArchiveEntry]) -> Result<Vec<u8>, CodecError> {
    let contents: Vec<Cow<'_, [u8]>> = entries
        .par_iter()
        .map(load_content)
        .collect::<Result<_, _>>()?;

    let encoder = GzBuilder::new()
        .mtime(0)
        .write(Vec::new(), Compression::default());
    let mut builder = Builder::new(encoder);
    builder.mode(HeaderMode::Deterministic);

    for (entry, data) in entries.iter().zip(&contents) {
        if entry.name().is_empty() {
            return Err(CodecError::InvalidName(entry.name().to_string()));
        }
        let mut header = canonical_header(data.len() as u64);
        builder
            .append_data(&mut header, entry.name(), data.as_ref())
            .map_err(CodecError::WriteError)?;
        tracing::trace!(name = entry.name(), size = data.len(), "appended archive entry");
    }

    let encoder = builder.into_inner().map_err(CodecError::WriteError)?;
    encoder.finish().map_err(CodecError::WriteError)
}

fn load_content(entry: &ArchiveEntry) -> Result<Cow<'_, [u8]>, CodecError> {
    let data = match entry.content() {
        EntryContent::Bytes(bytes) => Cow::Borrowed(bytes.as_slice()),
        EntryContent::File(path) => {
            let bytes = fs::read(path).map_err(|source| CodecError::ReadContent {
                path: path.clone(),
                source,
            })?;
            Cow::Owned(bytes)
        }
    };

    let actual = data.len() as u64;
    if actual != entry.size() {
        return Err(CodecError::SizeMismatch {
            name: entry.name().to_string(),
            expected: entry.size(),
            actual,
        });
    }
    Ok(data)
}

fn canonical_header(size: u64) -> Header {
    let mut header = Header::new_gnu();
    header.set_entry_type(EntryType::Regular);
    header.set_size(size);
    header.set_mode(FILE_MODE);
    header.set_uid(0);
    header.set_gid(0);
    header.set_mtime(FIXED_TIMESTAMP);
    if let Some(gnu) = header.as_gnu_mut() {
        gnu.set_atime(FIXED_TIMESTAMP);
        gnu.set_ctime(FIXED_TIMESTAMP);
    }
    header
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use std::io::Cursor;
    use tar::Archive;
    use tempfile::TempDir;

    fn sample_entries(dir: &TempDir) -> Vec<ArchiveEntry> {
        fs::write(dir.path().join("main.go"), "package main\n").unwrap();
        vec![
            ArchiveEntry::from_file("src/main.go", dir.path().join("main.go"), 13),
            ArchiveEntry::from_bytes("META-INF/statedb/couchdb/indexes/index.json", b"{}".to_vec()),
        ]
    }

    #[test]
    fn test_write_is_deterministic() {
        let dir = TempDir::new().unwrap();
        let entries = sample_entries(&dir);

        let first = write_archive(&entries).unwrap();
        let second = write_archive(&entries).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_order_changes_bytes() {
        let dir = TempDir::new().unwrap();
        let entries = sample_entries(&dir);
        let mut reversed = entries.clone();
        reversed.reverse();

        assert_ne!(write_archive(&entries).unwrap(), write_archive(&reversed).unwrap());
    }

    #[test]
    fn test_canonical_headers() {
        let dir = TempDir::new().unwrap();
        let bytes = write_archive(&sample_entries(&dir)).unwrap();

        let mut archive = Archive::new(GzDecoder::new(Cursor::new(bytes)));
        let mut names = Vec::new();
        for entry in archive.entries().unwrap() {
            let entry = entry.unwrap();
            let header = entry.header();
            assert_eq!(header.mtime().unwrap(), 0);
            assert_eq!(header.uid().unwrap(), 0);
            assert_eq!(header.gid().unwrap(), 0);
            assert_eq!(header.mode().unwrap() & 0o777, 0o644);
            assert!(header.entry_type().is_file());
            let gnu = header.as_gnu().unwrap();
            assert_eq!(gnu.atime().unwrap(), 0);
            assert_eq!(gnu.ctime().unwrap(), 0);
            names.push(entry.path().unwrap().to_string_lossy().to_string());
        }
        assert_eq!(
            names,
            vec!["src/main.go", "META-INF/statedb/couchdb/indexes/index.json"]
        );
    }

    #[test]
    fn test_long_names_survive() {
        let name = format!("src/{}/index.js", "deeply-nested".repeat(12));
        let bytes = write_archive(&[ArchiveEntry::from_bytes(&name, b"ok".to_vec())]).unwrap();

        let mut archive = Archive::new(GzDecoder::new(Cursor::new(bytes)));
        let entry = archive.entries().unwrap().next().unwrap().unwrap();
        assert_eq!(entry.path().unwrap().to_string_lossy(), name);
    }

    #[test]
    fn test_size_mismatch_rejected() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.js"), "abc").unwrap();
        let entries = vec![ArchiveEntry::from_file("src/a.js", dir.path().join("a.js"), 99)];

        let err = write_archive(&entries).unwrap_err();
        match err {
            CodecError::SizeMismatch { name, expected, actual } => {
                assert_eq!(name, "src/a.js");
                assert_eq!(expected, 99);
                assert_eq!(actual, 3);
            }
            other => panic!("Expected SizeMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_file_reports_path() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("gone.js");
        let entries = vec![ArchiveEntry::from_file("src/gone.js", &missing, 1)];

        let err = write_archive(&entries).unwrap_err();
        assert!(matches!(err, CodecError::ReadContent { ref path, .. } if path == &missing));
        assert!(err.to_string().contains("gone.js"));
    }

    #[test]
    fn test_empty_archive_is_valid() {
        let bytes = write_archive(&[]).unwrap();
        let mut archive = Archive::new(GzDecoder::new(Cursor::new(bytes)));
        assert_eq!(archive.entries().unwrap().count(), 0);
    }
}
