//! Streaming archive reader
//!
//! Decoding is a strict sequential state machine: decompress, read the next
//! header, stream that entry's content, repeat. There is no random access.

use std::io::{self, Read};

use flate2::read::GzDecoder;
use tar::{Archive, Entries, Entry};

use super::{path_to_name, CodecError};

/// Pull-style reader over a gzipped tar stream.
pub struct ArchiveReader<R: Read> {
    archive: Archive<GzDecoder<R>>,
}

impl<R: Read> ArchiveReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            archive: Archive::new(GzDecoder::new(reader)),
        }
    }

    /// Iterate over the regular files in the archive.
    ///
    /// Directory and special entries are skipped. The iterator is single
    /// pass; reading the archive again needs a fresh reader over the bytes.
    pub fn files(&mut self) -> Result<Files<'_, R>, CodecError> {
        let entries = self.archive.entries().map_err(CodecError::ReadError)?;
        Ok(Files { entries })
    }
}

/// Lazy sequence of the regular files in an archive.
///
/// Each yielded [`FileEntry`] shares the underlying decompressor, so it must
/// be finished with (read to the end, or dropped) before calling `next`
/// again. Holding two entries from one archive at once is not supported.
pub struct Files<'a, R: 'a + Read> {
    entries: Entries<'a, GzDecoder<R>>,
}

impl<'a, R: 'a + Read> Iterator for Files<'a, R> {
    type Item = Result<FileEntry<'a, R>, CodecError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.entries.next()? {
                Ok(entry) => entry,
                Err(e) => return Some(Err(CodecError::ReadError(e))),
            };

            if !entry.header().entry_type().is_file() {
                continue;
            }

            let name = match entry.path() {
                Ok(path) => path_to_name(&path),
                Err(e) => return Some(Err(CodecError::ReadError(e))),
            };
            return Some(Ok(FileEntry { name, inner: entry }));
        }
    }
}

/// One regular file streamed out of an archive
pub struct FileEntry<'a, R: 'a + Read> {
    name: String,
    inner: Entry<'a, GzDecoder<R>>,
}

impl<'a, R: 'a + Read> FileEntry<'a, R> {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Size recorded in the header
    pub fn size(&self) -> u64 {
        self.inner.size()
    }

    /// Read the remaining content into memory
    pub fn read_content(&mut self) -> Result<Vec<u8>, CodecError> {
        let mut buf = Vec::with_capacity(initial_capacity(self.size()));
        self.inner
            .read_to_end(&mut buf)
            .map_err(CodecError::ReadError)?;
        Ok(buf)
    }

    /// Read the remaining content into memory, failing if the entry holds
    /// more than `limit` bytes.
    ///
    /// The header size is checked before anything is allocated, and the read
    /// itself stops one byte past the limit whatever the header claims.
    pub fn read_content_limited(&mut self, limit: u64) -> Result<Vec<u8>, CodecError> {
        if self.size() > limit {
            return Err(self.too_large(self.size(), limit));
        }

        let mut buf = Vec::with_capacity(initial_capacity(self.size()));
        (&mut self.inner)
            .take(limit.saturating_add(1))
            .read_to_end(&mut buf)
            .map_err(CodecError::ReadError)?;
        if buf.len() as u64 > limit {
            return Err(self.too_large(buf.len() as u64, limit));
        }
        Ok(buf)
    }

    fn too_large(&self, size: u64, limit: u64) -> CodecError {
        CodecError::EntryTooLarge {
            name: self.name.clone(),
            size,
            limit,
        }
    }

    /// Discard the remaining content, returning the number of bytes skipped
    pub fn drain(&mut self) -> Result<u64, CodecError> {
        io::copy(&mut self.inner, &mut io::sink()).map_err(CodecError::ReadError)
    }
}

impl<'a, R: 'a + Read> Read for FileEntry<'a, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

/// Header sizes are untrusted; buffers start small and grow as data arrives
const MAX_INITIAL_CAPACITY: u64 = 64 * 1024;

fn initial_capacity(size: u64) -> usize {
    size.min(MAX_INITIAL_CAPACITY) as usize
}

/// Names of every regular file in an archive, in archive order.
pub fn list_file_names<R: Read>(reader: R) -> Result<Vec<String>, CodecError> {
    let mut archive = ArchiveReader::new(reader);
    let mut names = Vec::new();
    for file in archive.files()? {
        let mut file = file?;
        file.drain()?;
        names.push(file.name().to_string());
    }
    Ok(names)
}
