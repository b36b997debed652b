//! Low-level ZIP archive parser.
//!
//! This module handles the binary parsing of ZIP file structures from a
//! fully buffered archive.
//!
//! ## Parsing Strategy
//!
//! ZIP files are designed to be read from the end:
//! 1. Find the End of Central Directory (EOCD) at the buffer's end
//! 2. If ZIP64, read the ZIP64 EOCD for large file support
//! 3. Read the Central Directory to get metadata for all files
//! 4. For extraction, read each file's Local File Header and data
//!
//! Every offset taken from the archive is bounds-checked against the buffer,
//! so a truncated or corrupt archive surfaces as [`Error::InvalidArchive`]
//! instead of a panic.

use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{self, Cursor, Read};

use crate::error::{Error, Result};

use super::structures::*;

/// Maximum ZIP comment size allowed by the format (65535 bytes).
///
/// This limits the search area when looking for EOCD with a comment.
const MAX_COMMENT_SIZE: u64 = 65535;

/// ZIP64 extended information extra field ID.
const ZIP64_EXTRA_ID: u16 = 0x0001;

/// Low-level ZIP parser over an in-memory archive.
///
/// Typically used through [`ZipArchive`](super::ZipArchive) rather than
/// directly.
pub struct ZipParser<'a> {
    data: &'a [u8],
}

impl<'a> ZipParser<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    fn size(&self) -> u64 {
        self.data.len() as u64
    }

    /// Borrow `len` bytes at `offset`, failing if the range leaves the buffer.
    pub fn slice(&self, offset: u64, len: u64, what: &str) -> Result<&'a [u8]> {
        let end = offset
            .checked_add(len)
            .filter(|end| *end <= self.size())
            .ok_or_else(|| {
                Error::invalid_archive(format!(
                    "{what} at offset {offset} ({len} bytes) exceeds archive size {}",
                    self.size()
                ))
            })?;
        Ok(&self.data[offset as usize..end as usize])
    }

    /// Find and parse the End of Central Directory record.
    ///
    /// Handles both the simple case (no comment) and archives with comments
    /// by searching backwards for the signature.
    ///
    /// # Returns
    ///
    /// A tuple of (EOCD record, offset of EOCD in the buffer).
    pub fn find_eocd(&self) -> Result<(EndOfCentralDirectory, u64)> {
        let eocd_size = EndOfCentralDirectory::SIZE as u64;
        if self.size() < eocd_size {
            return Err(Error::invalid_archive("not a valid ZIP file (too small)"));
        }

        // Common case: no comment, EOCD is the last 22 bytes.
        let offset = self.size() - eocd_size;
        let buf = self.slice(offset, eocd_size, "End of Central Directory")?;
        if &buf[0..4] == EndOfCentralDirectory::SIGNATURE && &buf[20..22] == b"\x00\x00" {
            let eocd = EndOfCentralDirectory::from_bytes(buf)?;
            return Ok((eocd, offset));
        }

        // The EOCD could be earlier if there's a ZIP comment.
        let search_size = (MAX_COMMENT_SIZE + eocd_size).min(self.size());
        let search_start = self.size() - search_size;
        let buf = self.slice(search_start, search_size, "End of Central Directory")?;

        for i in (0..=buf.len() - EndOfCentralDirectory::SIZE).rev() {
            if &buf[i..i + 4] == EndOfCentralDirectory::SIGNATURE {
                // The comment length field must account for the remaining bytes.
                let comment_len = u16::from_le_bytes([buf[i + 20], buf[i + 21]]) as usize;

                if comment_len == buf.len() - i - EndOfCentralDirectory::SIZE {
                    let eocd = EndOfCentralDirectory::from_bytes(
                        &buf[i..i + EndOfCentralDirectory::SIZE],
                    )?;
                    return Ok((eocd, search_start + i as u64));
                }
            }
        }

        Err(Error::invalid_archive("not a valid ZIP file (no End of Central Directory)"))
    }

    /// Read the ZIP64 End of Central Directory record.
    ///
    /// Called when the regular EOCD indicates ZIP64 extensions are needed
    /// (fields set to 0xFFFF or 0xFFFFFFFF).
    pub fn read_zip64_eocd(&self, eocd_offset: u64) -> Result<Zip64EOCD> {
        // The locator sits immediately before the regular EOCD
        let locator_offset = eocd_offset
            .checked_sub(Zip64EOCDLocator::SIZE as u64)
            .ok_or_else(|| Error::invalid_archive("missing ZIP64 locator"))?;
        let locator = Zip64EOCDLocator::from_bytes(self.slice(
            locator_offset,
            Zip64EOCDLocator::SIZE as u64,
            "ZIP64 locator",
        )?)?;

        Zip64EOCD::from_bytes(self.slice(
            locator.eocd64_offset,
            Zip64EOCD::MIN_SIZE as u64,
            "ZIP64 End of Central Directory",
        )?)
    }

    /// List all entries in the archive, in central directory order.
    ///
    /// The whole central directory is parsed before anything is returned, so a
    /// corrupt index is rejected before a single entry is extracted.
    pub fn list_files(&self) -> Result<Vec<ZipFileEntry>> {
        let (eocd, eocd_offset) = self.find_eocd()?;
        if eocd.is_multi_disk() {
            return Err(Error::invalid_archive("multi-disk archives are not supported"));
        }

        let (cd_offset, cd_size, total_entries) = if eocd.is_zip64() {
            let eocd64 = self.read_zip64_eocd(eocd_offset)?;
            (eocd64.cd_offset, eocd64.cd_size, eocd64.total_entries)
        } else {
            (
                eocd.cd_offset as u64,
                eocd.cd_size as u64,
                eocd.total_entries as u64,
            )
        };

        let cd_data = self.slice(cd_offset, cd_size, "Central Directory")?;
        if total_entries > cd_size / CDFH_MIN_SIZE as u64 {
            return Err(Error::invalid_archive(format!(
                "Central Directory of {cd_size} bytes cannot hold {total_entries} entries"
            )));
        }

        let mut entries = Vec::with_capacity(total_entries as usize);
        let mut cursor = Cursor::new(cd_data);

        for _ in 0..total_entries {
            entries.push(self.parse_cdfh(&mut cursor)?);
        }

        Ok(entries)
    }

    /// Parse a Central Directory File Header from a cursor.
    fn parse_cdfh(&self, cursor: &mut Cursor<&[u8]>) -> Result<ZipFileEntry> {
        let eof = |e: io::Error| Error::truncated("Central Directory File Header", e);

        let mut sig = [0u8; 4];
        cursor.read_exact(&mut sig).map_err(eof)?;
        if sig != CDFH_SIGNATURE {
            return Err(Error::invalid_archive(format!(
                "bad Central Directory File Header signature at offset {}",
                cursor.position() - 4
            )));
        }

        let version_made_by = cursor.read_u16::<LittleEndian>().map_err(eof)?;
        let _version_needed = cursor.read_u16::<LittleEndian>().map_err(eof)?;
        let flags = cursor.read_u16::<LittleEndian>().map_err(eof)?;
        let compression_method = cursor.read_u16::<LittleEndian>().map_err(eof)?;
        let _last_mod_time = cursor.read_u16::<LittleEndian>().map_err(eof)?;
        let _last_mod_date = cursor.read_u16::<LittleEndian>().map_err(eof)?;
        let crc32 = cursor.read_u32::<LittleEndian>().map_err(eof)?;
        let mut compressed_size = cursor.read_u32::<LittleEndian>().map_err(eof)? as u64;
        let mut uncompressed_size = cursor.read_u32::<LittleEndian>().map_err(eof)? as u64;
        let file_name_length = cursor.read_u16::<LittleEndian>().map_err(eof)?;
        let extra_field_length = cursor.read_u16::<LittleEndian>().map_err(eof)?;
        let file_comment_length = cursor.read_u16::<LittleEndian>().map_err(eof)?;
        let _disk_number_start = cursor.read_u16::<LittleEndian>().map_err(eof)?;
        let _internal_attrs = cursor.read_u16::<LittleEndian>().map_err(eof)?;
        let external_attrs = cursor.read_u32::<LittleEndian>().map_err(eof)?;
        let mut lfh_offset = cursor.read_u32::<LittleEndian>().map_err(eof)? as u64;

        // Names are kept as raw bytes: their encoding is decided later.
        let mut raw_name = vec![0u8; file_name_length as usize];
        cursor.read_exact(&mut raw_name).map_err(eof)?;

        let extra_field_end = cursor.position() + extra_field_length as u64;
        if extra_field_end > cursor.get_ref().len() as u64 {
            return Err(Error::invalid_archive(format!(
                "extra field of {} overruns the Central Directory",
                String::from_utf8_lossy(&raw_name)
            )));
        }

        while cursor.position() + 4 <= extra_field_end {
            let header_id = cursor.read_u16::<LittleEndian>().map_err(eof)?;
            let field_size = cursor.read_u16::<LittleEndian>().map_err(eof)?;
            let field_end = (cursor.position() + field_size as u64).min(extra_field_end);

            if header_id == ZIP64_EXTRA_ID {
                // Fields are present only if the corresponding header field is 0xFFFFFFFF
                if uncompressed_size == 0xFFFFFFFF && cursor.position() + 8 <= field_end {
                    uncompressed_size = cursor.read_u64::<LittleEndian>().map_err(eof)?;
                }
                if compressed_size == 0xFFFFFFFF && cursor.position() + 8 <= field_end {
                    compressed_size = cursor.read_u64::<LittleEndian>().map_err(eof)?;
                }
                if lfh_offset == 0xFFFFFFFF && cursor.position() + 8 <= field_end {
                    lfh_offset = cursor.read_u64::<LittleEndian>().map_err(eof)?;
                }
            }
            cursor.set_position(field_end);
        }

        cursor.set_position(extra_field_end + file_comment_length as u64);

        let is_directory =
            ZipFileEntry::detect_directory(&raw_name, version_made_by, external_attrs);

        Ok(ZipFileEntry {
            raw_name,
            flags,
            version_made_by,
            external_attrs,
            compression_method: CompressionMethod::from_u16(compression_method),
            compressed_size,
            uncompressed_size,
            crc32,
            lfh_offset,
            is_directory,
        })
    }

    /// Get the offset where an entry's compressed data begins.
    ///
    /// The Local File Header has its own variable-length fields that may
    /// differ from the Central Directory entry, so it has to be read.
    pub fn get_data_offset(&self, entry: &ZipFileEntry) -> Result<u64> {
        let lfh_buf = self.slice(entry.lfh_offset, LFH_SIZE as u64, "Local File Header")?;

        if &lfh_buf[0..4] != LFH_SIGNATURE {
            return Err(Error::invalid_archive(format!(
                "bad Local File Header for {}",
                entry.display_name()
            )));
        }

        // Name and extra field lengths sit at offsets 26 and 28.
        let file_name_length = u16::from_le_bytes([lfh_buf[26], lfh_buf[27]]) as u64;
        let extra_field_length = u16::from_le_bytes([lfh_buf[28], lfh_buf[29]]) as u64;

        Ok(entry.lfh_offset + LFH_SIZE as u64 + file_name_length + extra_field_length)
    }
}
