use flate2::read::DeflateDecoder;
use std::io::Read;
use tracing::debug;

use crate::error::{Error, Result};

use super::parser::ZipParser;
use super::structures::{CompressionMethod, ZipFileEntry};

/// A fully buffered ZIP archive with its parsed central directory.
pub struct ZipArchive {
    data: Vec<u8>,
    entries: Vec<ZipFileEntry>,
}

impl ZipArchive {
    /// Parse the central directory of `data`.
    ///
    /// Fails with [`Error::InvalidArchive`] if the index is malformed; in that
    /// case no entry is ever handed out.
    pub fn new(data: Vec<u8>) -> Result<Self> {
        let entries = ZipParser::new(&data).list_files()?;
        debug!(entries = entries.len(), size = data.len(), "parsed central directory");
        Ok(Self { data, entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in central directory order.
    pub fn entries(&self) -> std::slice::Iter<'_, ZipFileEntry> {
        self.entries.iter()
    }

    /// Decompress an entry's content and verify its CRC-32.
    pub fn read(&self, entry: &ZipFileEntry) -> Result<Vec<u8>> {
        if entry.is_encrypted() {
            return Err(Error::invalid_archive(format!(
                "{}: encrypted entries are not supported",
                entry.display_name()
            )));
        }

        let parser = ZipParser::new(&self.data);
        let data_offset = parser.get_data_offset(entry)?;
        let compressed = parser.slice(data_offset, entry.compressed_size, "entry data")?;

        let content = match entry.compression_method {
            CompressionMethod::Stored => compressed.to_vec(),
            CompressionMethod::Deflate => {
                // The declared size is only a hint; never trust it for a huge allocation.
                let hint = entry.uncompressed_size.min(self.data.len() as u64 * 4) as usize;
                let mut buf = Vec::with_capacity(hint);
                // One byte past the declared size is enough for the size check to fail.
                DeflateDecoder::new(compressed)
                    .take(entry.uncompressed_size.saturating_add(1))
                    .read_to_end(&mut buf)
                    .map_err(|e| {
                        Error::invalid_archive(format!("{}: {e}", entry.display_name()))
                    })?;
                buf
            }
            CompressionMethod::Unknown(method) => {
                return Err(Error::invalid_archive(format!(
                    "{}: unsupported compression method {method}",
                    entry.display_name()
                )));
            }
        };

        if content.len() as u64 != entry.uncompressed_size {
            return Err(Error::invalid_archive(format!(
                "{}: expected {} bytes, got {}",
                entry.display_name(),
                entry.uncompressed_size,
                content.len()
            )));
        }

        let crc32 = crc32fast::hash(&content);
        if crc32 != entry.crc32 {
            return Err(Error::invalid_archive(format!(
                "{}: checksum mismatch (expected {:08x}, got {crc32:08x})",
                entry.display_name(),
                entry.crc32
            )));
        }

        Ok(content)
    }
}
