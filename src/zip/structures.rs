use byteorder::{LittleEndian, ReadBytesExt};
use std::borrow::Cow;
use std::io::{self, Cursor};

use crate::error::{Error, Result};

/// ZIP compression methods
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionMethod {
    Stored,
    Deflate,
    Unknown(u16),
}

impl CompressionMethod {
    pub fn from_u16(value: u16) -> Self {
        match value {
            0 => CompressionMethod::Stored,
            8 => CompressionMethod::Deflate,
            _ => CompressionMethod::Unknown(value),
        }
    }
}

/// End of Central Directory (EOCD) - 22 bytes minimum
pub struct EndOfCentralDirectory {
    pub disk_number: u16,
    pub disk_with_cd: u16,
    pub disk_entries: u16,
    pub total_entries: u16,
    pub cd_size: u32,
    pub cd_offset: u32,
    pub comment_len: u16,
}

impl EndOfCentralDirectory {
    pub const SIGNATURE: &'static [u8] = b"PK\x05\x06";
    pub const SIZE: usize = 22;

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < Self::SIZE || &data[0..4] != Self::SIGNATURE {
            return Err(Error::invalid_archive("invalid End of Central Directory"));
        }

        Self::read_fields(&mut Cursor::new(&data[4..]))
            .map_err(|e| Error::truncated("End of Central Directory", e))
    }

    fn read_fields(cursor: &mut Cursor<&[u8]>) -> io::Result<Self> {
        Ok(Self {
            disk_number: cursor.read_u16::<LittleEndian>()?,
            disk_with_cd: cursor.read_u16::<LittleEndian>()?,
            disk_entries: cursor.read_u16::<LittleEndian>()?,
            total_entries: cursor.read_u16::<LittleEndian>()?,
            cd_size: cursor.read_u32::<LittleEndian>()?,
            cd_offset: cursor.read_u32::<LittleEndian>()?,
            comment_len: cursor.read_u16::<LittleEndian>()?,
        })
    }

    pub fn is_zip64(&self) -> bool {
        self.disk_entries == 0xFFFF
            || self.total_entries == 0xFFFF
            || self.cd_size == 0xFFFFFFFF
            || self.cd_offset == 0xFFFFFFFF
    }

    pub fn is_multi_disk(&self) -> bool {
        self.disk_number != 0 || self.disk_with_cd != 0
    }
}

/// ZIP64 End of Central Directory Locator - 20 bytes
pub struct Zip64EOCDLocator {
    pub disk_with_eocd64: u32,
    pub eocd64_offset: u64,
    pub total_disks: u32,
}

impl Zip64EOCDLocator {
    pub const SIGNATURE: &'static [u8] = b"PK\x06\x07";
    pub const SIZE: usize = 20;

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < Self::SIZE || &data[0..4] != Self::SIGNATURE {
            return Err(Error::invalid_archive("invalid ZIP64 locator"));
        }

        Self::read_fields(&mut Cursor::new(&data[4..]))
            .map_err(|e| Error::truncated("ZIP64 locator", e))
    }

    fn read_fields(cursor: &mut Cursor<&[u8]>) -> io::Result<Self> {
        Ok(Self {
            disk_with_eocd64: cursor.read_u32::<LittleEndian>()?,
            eocd64_offset: cursor.read_u64::<LittleEndian>()?,
            total_disks: cursor.read_u32::<LittleEndian>()?,
        })
    }
}

/// ZIP64 End of Central Directory - 56 bytes minimum
pub struct Zip64EOCD {
    pub eocd64_size: u64,
    pub version_made_by: u16,
    pub version_needed: u16,
    pub disk_number: u32,
    pub disk_with_cd: u32,
    pub disk_entries: u64,
    pub total_entries: u64,
    pub cd_size: u64,
    pub cd_offset: u64,
}

impl Zip64EOCD {
    pub const SIGNATURE: &'static [u8] = b"PK\x06\x06";
    pub const MIN_SIZE: usize = 56;

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < Self::MIN_SIZE || &data[0..4] != Self::SIGNATURE {
            return Err(Error::invalid_archive("invalid ZIP64 End of Central Directory"));
        }

        Self::read_fields(&mut Cursor::new(&data[4..]))
            .map_err(|e| Error::truncated("ZIP64 End of Central Directory", e))
    }

    fn read_fields(cursor: &mut Cursor<&[u8]>) -> io::Result<Self> {
        Ok(Self {
            eocd64_size: cursor.read_u64::<LittleEndian>()?,
            version_made_by: cursor.read_u16::<LittleEndian>()?,
            version_needed: cursor.read_u16::<LittleEndian>()?,
            disk_number: cursor.read_u32::<LittleEndian>()?,
            disk_with_cd: cursor.read_u32::<LittleEndian>()?,
            disk_entries: cursor.read_u64::<LittleEndian>()?,
            total_entries: cursor.read_u64::<LittleEndian>()?,
            cd_size: cursor.read_u64::<LittleEndian>()?,
            cd_offset: cursor.read_u64::<LittleEndian>()?,
        })
    }
}

/// Central Directory File Header (CDFH) - 46 bytes minimum
pub const CDFH_SIGNATURE: &[u8] = b"PK\x01\x02";
pub const CDFH_MIN_SIZE: usize = 46;

/// Local File Header (LFH) - 30 bytes
pub const LFH_SIGNATURE: &[u8] = b"PK\x03\x04";
pub const LFH_SIZE: usize = 30;

/// General purpose flag bits
pub const FLAG_ENCRYPTED: u16 = 0x0001;
pub const FLAG_UTF8: u16 = 0x0800;

// Host system, upper byte of "version made by"
const HOST_FAT: u8 = 0;
const HOST_UNIX: u8 = 3;
const HOST_NTFS: u8 = 11;
const HOST_VFAT: u8 = 14;
const HOST_MACOSX: u8 = 19;

const DOS_READ_ONLY: u32 = 0x01;
const DOS_DIRECTORY: u32 = 0x10;
const UNIX_TYPE_MASK: u32 = 0o170000;
const UNIX_DIRECTORY: u32 = 0o040000;

/// Parsed ZIP file entry information
#[derive(Debug, Clone)]
pub struct ZipFileEntry {
    /// Name exactly as stored in the central directory.
    pub raw_name: Vec<u8>,
    pub flags: u16,
    pub version_made_by: u16,
    pub external_attrs: u32,
    pub compression_method: CompressionMethod,
    pub compressed_size: u64,
    pub uncompressed_size: u64,
    pub crc32: u32,
    pub lfh_offset: u64,
    pub is_directory: bool,
}

impl ZipFileEntry {
    /// The archive did not set the UTF-8 (language encoding) flag, so the
    /// name is in some unspecified legacy encoding.
    pub fn is_non_utf8(&self) -> bool {
        self.flags & FLAG_UTF8 == 0
    }

    pub fn is_encrypted(&self) -> bool {
        self.flags & FLAG_ENCRYPTED != 0
    }

    /// Best-effort printable name for diagnostics.
    pub fn display_name(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.raw_name)
    }

    fn host(&self) -> u8 {
        (self.version_made_by >> 8) as u8
    }

    /// Permission bits to create the entry with.
    ///
    /// Unix and macOS archivers store `st_mode` in the upper half of the
    /// external attributes. DOS-family archivers only know a read-only bit.
    pub fn mode(&self) -> u32 {
        let default = if self.is_directory { 0o755 } else { 0o644 };
        match self.host() {
            HOST_UNIX | HOST_MACOSX => match (self.external_attrs >> 16) & 0o7777 {
                0 => default,
                perm => perm,
            },
            HOST_FAT | HOST_NTFS | HOST_VFAT => {
                if self.is_directory {
                    0o777
                } else if self.external_attrs & DOS_READ_ONLY != 0 {
                    0o444
                } else {
                    0o666
                }
            }
            _ => default,
        }
    }

    pub(crate) fn detect_directory(
        raw_name: &[u8],
        version_made_by: u16,
        external_attrs: u32,
    ) -> bool {
        if raw_name.last() == Some(&b'/') {
            return true;
        }
        match (version_made_by >> 8) as u8 {
            HOST_UNIX | HOST_MACOSX => (external_attrs >> 16) & UNIX_TYPE_MASK == UNIX_DIRECTORY,
            HOST_FAT | HOST_NTFS | HOST_VFAT => external_attrs & DOS_DIRECTORY != 0,
            _ => false,
        }
    }
}
