//! ID3v2 tag reading and text frame decoding.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use tagtidy_common::TrackRecord;

use super::frames::{text_frame_id, FrameHeader, TextField};
use super::header::{ExtendedHeader, TagHeader, MAGIC};
use super::TagError;

/// A fully walked ID3v2 tag.
///
/// Frame bodies stay in the tag byte buffer; headers record where each
/// body lives so callers can slice it out on demand.
#[derive(Debug)]
pub struct Tag {
    pub header: TagHeader,
    pub extended: Option<ExtendedHeader>,
    pub frames: Vec<FrameHeader>,
}

impl Tag {
    /// Parses a complete tag from its raw bytes (header included).
    pub fn parse(data: &[u8]) -> Result<Tag, TagError> {
        let header = TagHeader::parse(data)?;
        let total_size = header.total_size() as usize;
        if data.len() < total_size {
            return Err(TagError::Malformed(format!(
                "tag declares {} bytes but only {} are present",
                total_size,
                data.len()
            )));
        }

        let mut offset = TagHeader::SIZE;
        let extended = if header.extended_header {
            let fixed = header.extended_header_size();
            if offset + fixed > total_size {
                return Err(TagError::Malformed(
                    "extended header exceeds tag size".to_string(),
                ));
            }
            let xh = ExtendedHeader::parse(header.version, &data[offset..offset + fixed])?;
            offset += fixed + xh.body_size as usize;
            Some(xh)
        } else {
            None
        };

        let fh_size = header.frame_header_size();
        let mut frames = Vec::new();
        while offset + fh_size <= total_size {
            if data[offset] == 0 {
                // Padding. Most tags are allocated well beyond their
                // content so editors can rewrite them in place.
                break;
            }
            let body_offset = offset + fh_size;
            let frame = FrameHeader::parse(
                header.version,
                &data[offset..offset + fh_size],
                body_offset,
            )?;
            let body_end = body_offset + frame.body_size as usize;
            if body_end > total_size {
                return Err(TagError::Malformed(format!(
                    "frame '{}' body exceeds tag size",
                    frame.id
                )));
            }
            frames.push(frame);
            offset = body_end;
        }

        Ok(Tag {
            header,
            extended,
            frames,
        })
    }

    /// Returns the frame with the given ID. When the tag holds
    /// duplicates the last occurrence wins.
    pub fn frame(&self, id: &str) -> Option<&FrameHeader> {
        self.frames.iter().rev().find(|f| f.id == id)
    }

    fn text_field(&self, data: &[u8], field: TextField) -> Option<String> {
        let id = text_frame_id(self.header.version, field);
        let frame = self.frame(id)?;
        let start = frame.body_offset;
        let body = &data[start..start + frame.body_size as usize];
        decode_text(body)
    }

    /// Extracts the well-known text fields into a record.
    pub fn to_record(&self, data: &[u8]) -> TrackRecord {
        let track = self
            .text_field(data, TextField::Track)
            .and_then(|s| s.split('/').next().and_then(|n| n.trim().parse().ok()));
        let year = self
            .text_field(data, TextField::Year)
            .and_then(|s| s.chars().take(4).collect::<String>().parse().ok());
        TrackRecord {
            title: self.text_field(data, TextField::Title),
            album: self.text_field(data, TextField::Album),
            artist: self.text_field(data, TextField::Artist),
            track,
            year,
            genre: None,
        }
    }
}

/// Decodes a text frame body according to its leading encoding byte.
///
/// 0 is Latin-1, 1 UTF-16 with BOM, 2 UTF-16BE, 3 UTF-8. Undecodable
/// sequences are replaced rather than rejected.
pub(crate) fn decode_text(body: &[u8]) -> Option<String> {
    let (&encoding, text) = body.split_first()?;
    let decoded = match encoding {
        0 => text.iter().map(|&b| b as char).collect(),
        1 => {
            let (decoded, _, _) = encoding_rs::UTF_16LE.decode(text);
            decoded.into_owned()
        }
        2 => {
            let (decoded, _) = encoding_rs::UTF_16BE.decode_without_bom_handling(text);
            decoded.into_owned()
        }
        3 => String::from_utf8_lossy(text).into_owned(),
        _ => return None,
    };
    let trimmed = decoded.trim_matches(|c: char| c == '\0' || c.is_whitespace());
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Total on-disk byte length of a leading ID3v2 tag, 0 when the data
/// does not start with a valid one.
pub fn tag_size(data: &[u8]) -> u32 {
    match TagHeader::parse(data) {
        Ok(header) => header.total_size(),
        Err(_) => 0,
    }
}

/// Reads the ID3v2 tag of an MP3 file into a record.
///
/// A file without a tag yields an empty record rather than an error; a
/// present but malformed tag is an error.
pub fn read_tag(path: &Path) -> Result<TrackRecord, TagError> {
    let mut file = File::open(path)?;
    let mut header_bytes = [0u8; TagHeader::SIZE];
    let mut read = 0;
    while read < header_bytes.len() {
        let n = file.read(&mut header_bytes[read..])?;
        if n == 0 {
            break;
        }
        read += n;
    }
    if read < TagHeader::SIZE || &header_bytes[..3] != MAGIC {
        return Ok(TrackRecord::default());
    }

    let header = TagHeader::parse(&header_bytes)?;
    let mut data = header_bytes.to_vec();
    data.resize(header.total_size() as usize, 0);
    file.read_exact(&mut data[TagHeader::SIZE..])?;

    let tag = Tag::parse(&data)?;
    let mut record = tag.to_record(&data);
    record.clean();
    Ok(record)
}
