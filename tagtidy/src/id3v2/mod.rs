//! ID3v2 tag codec.
//!
//! The tag sits at the front of the file: a 10-byte header (magic,
//! major/minor version, flags, syncsafe size), an optional extended
//! header, then a sequence of frames padded out with null bytes to the
//! declared size. Three generations are read -- v2.2 (3-char frame
//! IDs, 24-bit sizes), v2.3 (4-char IDs, plain 32-bit sizes) and v2.4
//! (4-char IDs, syncsafe sizes) -- with per-generation flag layouts.
//! Writing always emits v2.3, preserving any frames from the original
//! tag that are not being replaced.
//!
//! Structurally invalid headers, flags or sizes are hard errors on
//! read. On write, a corrupted pre-existing tag aborts the whole
//! rewrite so no user data is silently dropped. Unknown frame content
//! is never fatal and is preserved byte for byte.

mod frames;
mod header;
mod read;
mod write;

pub use frames::FrameHeader;
pub use header::{ExtendedHeader, TagHeader};
pub use read::{read_tag, tag_size, Tag};
pub use write::write_tag;

use thiserror::Error;

/// ID3v2 codec errors
#[derive(Debug, Error)]
pub enum TagError {
    /// I/O error reading the tag region
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Bad magic, version, flags or size encountered during parsing
    #[error("malformed ID3v2 tag: {0}")]
    Malformed(String),

    /// A frame ID that is neither known, experimental nor remappable
    #[error("unknown ID3v2.{version} frame ID '{id}'")]
    UnknownFrameId { version: u8, id: String },

    /// The pre-existing tag failed re-validation during a rewrite;
    /// the write is aborted before any bytes are emitted
    #[error("refusing to rewrite over a corrupted ID3v2 tag: {0}")]
    CorruptOnWrite(String),

    /// Writing requires a fused record (title, album and artist set)
    #[error("record is missing mandatory text fields")]
    IncompleteRecord,
}

/// Decodes a 32-bit syncsafe integer (28 significant bits, the top bit
/// of every byte must be zero).
pub(crate) fn decode_syncsafe(bytes: &[u8]) -> Result<u32, TagError> {
    debug_assert_eq!(bytes.len(), 4);
    if bytes.iter().any(|b| b & 0x80 != 0) {
        return Err(TagError::Malformed(
            "syncsafe integer has a high bit set".to_string(),
        ));
    }
    Ok((u32::from(bytes[0]) << 21)
        | (u32::from(bytes[1]) << 14)
        | (u32::from(bytes[2]) << 7)
        | u32::from(bytes[3]))
}

/// Encodes a value below 2^28 as a 32-bit syncsafe integer.
pub(crate) fn encode_syncsafe(value: u32) -> [u8; 4] {
    debug_assert!(value < 1 << 28);
    [
        ((value >> 21) & 0x7F) as u8,
        ((value >> 14) & 0x7F) as u8,
        ((value >> 7) & 0x7F) as u8,
        (value & 0x7F) as u8,
    ]
}

pub(crate) fn read_u32(bytes: &[u8]) -> u32 {
    (u32::from(bytes[0]) << 24)
        | (u32::from(bytes[1]) << 16)
        | (u32::from(bytes[2]) << 8)
        | u32::from(bytes[3])
}

pub(crate) fn read_u24(bytes: &[u8]) -> u32 {
    (u32::from(bytes[0]) << 16) | (u32::from(bytes[1]) << 8) | u32::from(bytes[2])
}

pub(crate) fn read_u16(bytes: &[u8]) -> u16 {
    (u16::from(bytes[0]) << 8) | u16::from(bytes[1])
}
