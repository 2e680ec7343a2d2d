//! ID3v1 tag codec.
//!
//! The legacy tag is a fixed 128-byte record at the very end of the
//! file, optionally preceded by a 227-byte extended block. Layout of
//! the base tag: `TAG` marker, 30-byte title/artist/album, 4-byte
//! ASCII year, comment, genre byte. When byte 125 is zero and byte 126
//! is not, the tag is the v1.1 sub-variant and byte 126 carries the
//! track number (the comment shrinks to 28 bytes). The extended block
//! starts with `TAG+` and contributes 60-byte continuations of the
//! three text fields.
//!
//! A missing marker is not an error -- most files simply have no v1
//! tag -- so reading yields an all-absent record in that case.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use thiserror::Error;

use tagtidy_common::TrackRecord;

/// Byte size of the base ID3v1 tag.
pub const TAG_SIZE: usize = 128;
/// Byte size of the extended tag block preceding the base tag.
pub const EXT_SIZE: usize = 227;

const MARKER: &[u8; 3] = b"TAG";
const EXT_MARKER: &[u8; 4] = b"TAG+";

/// ID3v1 codec errors
#[derive(Debug, Error)]
pub enum Id3v1Error {
    /// I/O error reading the tag region
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The format stores track numbers in a single byte
    #[error("track number {0} does not fit in an ID3v1 tag (0-255)")]
    TrackOutOfRange(u32),
}

/// Reads the ID3v1 tag data from a file (if present).
///
/// v1.0 and v1.1 tags are supported along with the extended variant.
/// Files without a tag (or too short to hold one) yield an all-absent
/// record rather than an error.
pub fn read_tag(path: &Path) -> Result<TrackRecord, Id3v1Error> {
    let mut file = File::open(path)?;
    let file_len = file.metadata()?.len();
    if file_len < TAG_SIZE as u64 {
        return Ok(TrackRecord::default());
    }

    let mut tag = [0u8; TAG_SIZE];
    file.seek(SeekFrom::End(-(TAG_SIZE as i64)))?;
    file.read_exact(&mut tag)?;
    if &tag[..3] != MARKER {
        return Ok(TrackRecord::default());
    }

    let mut record = TrackRecord {
        title: non_empty(strip_field(&tag[3..33])),
        artist: non_empty(strip_field(&tag[33..63])),
        album: non_empty(strip_field(&tag[63..93])),
        ..Default::default()
    };
    if tag[93..97] != [0, 0, 0, 0] {
        record.year = strip_field(&tag[93..97]).parse().ok();
    }
    // 255 is the conventional "no genre" byte
    record.genre = match tag[127] {
        255 => None,
        genre => Some(genre),
    };
    // Byte 125 zero with byte 126 non-zero selects the v1.1 layout:
    // a 28-byte comment followed by a track number.
    if tag[125] == 0 && tag[126] != 0 {
        record.track = Some(u32::from(tag[126]));
    }

    if file_len >= (TAG_SIZE + EXT_SIZE) as u64 {
        let mut ext = [0u8; EXT_SIZE];
        file.seek(SeekFrom::End(-((TAG_SIZE + EXT_SIZE) as i64)))?;
        file.read_exact(&mut ext)?;
        if &ext[..4] == EXT_MARKER {
            append_extension(&mut record.title, strip_field(&ext[4..64]));
            append_extension(&mut record.artist, strip_field(&ext[64..124]));
            append_extension(&mut record.album, strip_field(&ext[124..184]));
        }
    }

    record.clean();
    Ok(record)
}

/// Converts the given record into a 128-byte ID3v1.1 tag.
///
/// Text fields longer than 29 bytes are truncated and null terminated;
/// shorter ones are null padded. An absent year is written as four
/// null bytes. Track numbers above 255 cannot be represented and are
/// a caller error.
pub fn write_tag(record: &TrackRecord) -> Result<[u8; TAG_SIZE], Id3v1Error> {
    let track = match record.track {
        Some(t) if t > 255 => return Err(Id3v1Error::TrackOutOfRange(t)),
        Some(t) => t as u8,
        None => 0,
    };

    let mut tag = [0u8; TAG_SIZE];
    tag[..3].copy_from_slice(MARKER);
    pack_field(&mut tag[3..33], record.title.as_deref());
    pack_field(&mut tag[33..63], record.artist.as_deref());
    pack_field(&mut tag[63..93], record.album.as_deref());
    if let Some(year) = record.year {
        let digits = format!("{:04}", year % 10000);
        tag[93..97].copy_from_slice(digits.as_bytes());
    }
    // Bytes 97..125 (comment) and byte 125 stay null, selecting v1.1.
    tag[126] = track;
    tag[127] = record.genre.unwrap_or(255);
    Ok(tag)
}

/// Decodes a fixed-width Latin-1 field, dropping null bytes and
/// surrounding whitespace.
fn strip_field(bytes: &[u8]) -> String {
    let text: String = bytes
        .iter()
        .filter(|&&b| b != 0)
        .map(|&b| b as char)
        .collect();
    text.trim().to_string()
}

/// Packs a string into a fixed-width field, truncating to width-1
/// plus a null terminator when too long.
fn pack_field(field: &mut [u8], value: Option<&str>) {
    let Some(value) = value else { return };
    let encoded: Vec<u8> = value
        .chars()
        .map(|c| if (c as u32) < 256 { c as u8 } else { b'?' })
        .collect();
    let len = encoded.len().min(field.len() - 1);
    field[..len].copy_from_slice(&encoded[..len]);
    // remaining bytes are already null
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

fn append_extension(field: &mut Option<String>, extension: String) {
    if extension.is_empty() {
        return;
    }
    match field {
        Some(value) => value.push_str(&extension),
        None => *field = Some(extension),
    }
}
