//! ID3v2.3 tag construction.
//!
//! Rewritten tags always come out as ID3v2.3 regardless of what the
//! file carried before. Frames other than the five replaced text
//! frames are copied over from the existing tag: players store their
//! own data in frames like POPM and losing it would throw away state
//! the user cannot easily regenerate.

use tagtidy_common::TrackRecord;
use tracing::warn;

use super::frames::{upgrade_frame_id, REPLACED_IDS};
use super::header::{TagHeader, MAGIC};
use super::read::Tag;
use super::{encode_syncsafe, TagError};

/// Builds a complete ID3v2.3 tag for `record`.
///
/// `original` is the file's current content (or any prefix covering a
/// leading tag); non-replaced frames found there are carried over.
/// `padding` trailing NUL bytes are appended so later edits can happen
/// in place.
pub fn write_tag(
    record: &TrackRecord,
    original: &[u8],
    padding: usize,
) -> Result<Vec<u8>, TagError> {
    if !record.is_fused() {
        return Err(TagError::IncompleteRecord);
    }

    let mut frames = Vec::new();
    // is_fused checked the three text fields above
    frames.extend(text_frame("TIT2", record.title.as_deref().unwrap_or("")));
    frames.extend(text_frame("TALB", record.album.as_deref().unwrap_or("")));
    frames.extend(text_frame("TPE1", record.artist.as_deref().unwrap_or("")));
    if let Some(track) = record.track {
        frames.extend(text_frame("TRCK", &track.to_string()));
    }
    if let Some(year) = record.year {
        frames.extend(text_frame("TYER", &year.to_string()));
    }

    if original.len() >= 3 && &original[..3] == MAGIC {
        let tag = Tag::parse(original)
            .map_err(|e| TagError::CorruptOnWrite(e.to_string()))?;
        copy_retained_frames(&tag, original, &mut frames);
    }

    frames.extend(std::iter::repeat(0).take(padding));

    let mut out = Vec::with_capacity(TagHeader::SIZE + frames.len());
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&[3, 0, 0]);
    out.extend_from_slice(&encode_syncsafe(frames.len() as u32));
    out.extend_from_slice(&frames);
    Ok(out)
}

/// Copies every frame the rewrite does not replace into `out`.
///
/// Frames from a v2.3 source are copied byte for byte. v2.2 and v2.4
/// sources get their bodies copied verbatim under a fresh v2.3 frame
/// header; v2.2 IDs are upgraded to the v2.3 vocabulary, and v2.2
/// frames with no v2.3 equivalent are dropped.
fn copy_retained_frames(tag: &Tag, original: &[u8], out: &mut Vec<u8>) {
    let version = tag.header.version;
    for frame in &tag.frames {
        let id: &str = if version == 2 {
            match upgrade_frame_id(&frame.id) {
                Some(mapped) => mapped,
                None => {
                    warn!(frame_id = %frame.id, "no ID3v2.3 equivalent, frame dropped");
                    continue;
                }
            }
        } else {
            &frame.id
        };
        if REPLACED_IDS.contains(&id) {
            continue;
        }
        let body = &original[frame.body_offset..frame.body_offset + frame.body_size as usize];
        if version == 3 {
            let start = frame.body_offset - frame.header_size;
            out.extend_from_slice(&original[start..frame.body_offset]);
        } else {
            out.extend_from_slice(id.as_bytes());
            out.extend_from_slice(&frame.body_size.to_be_bytes());
            out.extend_from_slice(&[0, 0]);
        }
        out.extend_from_slice(body);
    }
}

/// Builds a v2.3 text frame with Latin-1 content.
fn text_frame(id: &str, content: &str) -> Vec<u8> {
    let body = encode_latin1(content);
    let size = body.len() as u32 + 2; // encoding mark + content + NUL
    let mut frame = Vec::with_capacity(10 + size as usize);
    frame.extend_from_slice(id.as_bytes());
    frame.extend_from_slice(&size.to_be_bytes());
    frame.extend_from_slice(&[0, 0]);
    frame.push(0); // ISO-8859-1
    frame.extend_from_slice(&body);
    frame.push(0);
    frame
}

/// Encodes to Latin-1, substituting '?' for anything beyond it.
fn encode_latin1(s: &str) -> Vec<u8> {
    s.chars()
        .map(|c| if (c as u32) <= 0xFF { c as u8 } else { b'?' })
        .collect()
}
