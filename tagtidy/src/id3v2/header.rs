//! Tag header and extended header parsing.
//!
//! Flag bit layouts differ per major version; any bit that a version
//! does not define is a hard parse error, the strongest corruption
//! signal these headers offer.

use super::{decode_syncsafe, read_u16, read_u32, TagError};

/// Magic prefix of every ID3v2 tag.
pub const MAGIC: &[u8; 3] = b"ID3";

/// Parsed ID3v2 tag header.
#[derive(Debug, Clone)]
pub struct TagHeader {
    /// Major version (2, 3 or 4, as in `ID3v2.<major>.<minor>`)
    pub version: u8,
    /// Minor version (informational; 0xFF is rejected)
    pub version_minor: u8,
    /// Byte size of everything after the 10-byte header
    pub body_size: u32,
    pub unsynchronisation: bool,
    /// v2.2 only
    pub compression: bool,
    /// v2.3/v2.4
    pub extended_header: bool,
    /// v2.3/v2.4
    pub experimental: bool,
    /// v2.4 only
    pub footer_present: bool,
}

impl TagHeader {
    /// Byte size of the fixed header.
    pub const SIZE: usize = 10;

    /// Interprets the first 10 bytes of a tag.
    pub fn parse(data: &[u8]) -> Result<TagHeader, TagError> {
        if data.len() < Self::SIZE || &data[..3] != MAGIC {
            return Err(TagError::Malformed("missing ID3 magic".to_string()));
        }
        let version = data[3];
        let version_minor = data[4];
        if !(2..=4).contains(&version) || version_minor == 0xFF {
            return Err(TagError::Malformed(format!(
                "unsupported version ID3v2.{}.{}",
                version, version_minor
            )));
        }

        let flags = data[5];
        let known_mask = match version {
            2 => 0xC0,
            3 => 0xE0,
            _ => 0xF0,
        };
        let unknown = flags & !known_mask;
        if unknown != 0 {
            return Err(TagError::Malformed(format!(
                "unknown ID3v2.{} header flags 0x{:02X}",
                version, unknown
            )));
        }

        let body_size = decode_syncsafe(&data[6..10])?;
        if body_size == 0 {
            return Err(TagError::Malformed("declared tag size is zero".to_string()));
        }

        Ok(TagHeader {
            version,
            version_minor,
            body_size,
            unsynchronisation: flags & 0x80 != 0,
            compression: version == 2 && flags & 0x40 != 0,
            extended_header: version >= 3 && flags & 0x40 != 0,
            experimental: version >= 3 && flags & 0x20 != 0,
            footer_present: version == 4 && flags & 0x10 != 0,
        })
    }

    /// Total on-disk byte size of the tag, header included.
    pub fn total_size(&self) -> u32 {
        Self::SIZE as u32 + self.body_size
    }

    /// Frame header size of this generation: 6 bytes for v2.2, 10 for
    /// v2.3/v2.4.
    pub fn frame_header_size(&self) -> usize {
        if self.version == 2 {
            6
        } else {
            10
        }
    }

    /// Fixed byte size of this generation's extended header, whether
    /// or not one is present.
    pub fn extended_header_size(&self) -> usize {
        match self.version {
            2 => 0,
            3 => 10,
            _ => 6,
        }
    }
}

/// Parsed extended tag header (v2.3 and v2.4 only).
#[derive(Debug, Clone)]
pub struct ExtendedHeader {
    /// Byte size of the extended header body that follows the fixed part
    pub body_size: u32,
    pub crc_data_present: bool,
    /// v2.4 only
    pub tag_is_an_update: bool,
    /// v2.4 only
    pub tag_restrictions: bool,
}

impl ExtendedHeader {
    /// Interprets the fixed portion of an extended header.
    ///
    /// v2.3 stores a plain 32-bit size and a 16-bit flags field; v2.4
    /// a syncsafe size that includes the fixed 6 bytes, and an 8-bit
    /// flags field. Unknown flag bits are hard errors, matching the
    /// main header's policy.
    pub fn parse(version: u8, data: &[u8]) -> Result<ExtendedHeader, TagError> {
        match version {
            3 => {
                let body_size = read_u32(&data[0..4]);
                let flags = read_u16(&data[4..6]);
                let unknown = flags & !0x8000;
                if unknown != 0 {
                    return Err(TagError::Malformed(format!(
                        "unknown ID3v2.3 extended header flags 0x{:04X}",
                        unknown
                    )));
                }
                Ok(ExtendedHeader {
                    body_size,
                    crc_data_present: flags & 0x8000 != 0,
                    tag_is_an_update: false,
                    tag_restrictions: false,
                })
            }
            4 => {
                let declared = decode_syncsafe(&data[0..4])?;
                let body_size = declared.checked_sub(6).ok_or_else(|| {
                    TagError::Malformed(
                        "ID3v2.4 extended header size below fixed minimum".to_string(),
                    )
                })?;
                let flags = data[5];
                let unknown = flags & !0x70;
                if unknown != 0 {
                    return Err(TagError::Malformed(format!(
                        "unknown ID3v2.4 extended header flags 0x{:02X}",
                        unknown
                    )));
                }
                Ok(ExtendedHeader {
                    body_size,
                    crc_data_present: flags & 0x20 != 0,
                    tag_is_an_update: flags & 0x40 != 0,
                    tag_restrictions: flags & 0x10 != 0,
                })
            }
            other => Err(TagError::Malformed(format!(
                "extended header on ID3v2.{}, which defines none",
                other
            ))),
        }
    }
}
