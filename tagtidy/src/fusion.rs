//! Fusing the three metadata sources into one record.
//!
//! Every file yields up to three records: parsed from its path, read
//! from its ID3v1 tag and read from its ID3v2 tag. The path data tends
//! to be the most trustworthy since it is what the user actually sees,
//! while the two tags get equal weighting. ID3v1 text fields are
//! truncated to 30 bytes on disk, so whenever a v1 value is compared
//! against another source the other string is cut to 30 characters
//! first, and a v1 value is never preferred over an agreeing source.

use strsim::levenshtein;
use thiserror::Error;

use tagtidy_common::TrackRecord;

/// Two strings within this edit distance count as the same value.
const DISTANCE_THRESHOLD: usize = 3;

/// Fusion errors
#[derive(Debug, Error)]
pub enum FusionError {
    /// No source supplied a mandatory text field
    #[error("no source provided the {field}")]
    MissingField { field: &'static str },
}

/// Produces a single record from the three source records.
///
/// Title, album and artist must come out of at least one source;
/// numeric fields may end up `None`. The genre only ever lives in
/// tags, so the path source does not vote on it.
pub fn fuse(
    fp: &TrackRecord,
    v1: &TrackRecord,
    v2: &TrackRecord,
) -> Result<TrackRecord, FusionError> {
    Ok(TrackRecord {
        title: Some(fuse_text("title", &fp.title, &v1.title, &v2.title)?),
        album: Some(fuse_text("album", &fp.album, &v1.album, &v2.album)?),
        artist: Some(fuse_text("artist", &fp.artist, &v1.artist, &v2.artist)?),
        track: fuse_number(fp.track, v1.track, v2.track),
        year: fuse_number(fp.year, v1.year, v2.year),
        genre: fuse_number(None, v1.genre, v2.genre),
    })
}

/// Picks a text value: a path value confirmed by either tag wins, then
/// a v2 value confirmed by v1, then whichever source is present in
/// fp, v2, v1 order.
fn fuse_text(
    field: &'static str,
    fp: &Option<String>,
    v1: &Option<String>,
    v2: &Option<String>,
) -> Result<String, FusionError> {
    let fp_close_to_v1 = match (fp, v1) {
        (Some(fp), Some(v1)) => levenshtein(truncate(fp, 30), v1) < DISTANCE_THRESHOLD,
        _ => false,
    };
    let fp_close_to_v2 = match (fp, v2) {
        (Some(fp), Some(v2)) => levenshtein(fp, v2) < DISTANCE_THRESHOLD,
        _ => false,
    };
    let v1_close_to_v2 = match (v1, v2) {
        (Some(v1), Some(v2)) => levenshtein(v1, truncate(v2, 30)) < DISTANCE_THRESHOLD,
        _ => false,
    };

    if fp_close_to_v1 || fp_close_to_v2 {
        return Ok(fp.clone().unwrap_or_default());
    }
    if v1_close_to_v2 {
        return Ok(v2.clone().unwrap_or_default());
    }
    fp.clone()
        .or_else(|| v2.clone())
        .or_else(|| v1.clone())
        .ok_or(FusionError::MissingField { field })
}

/// Picks a numeric value: exact agreement wins, then presence in fp,
/// v2, v1 order. All sources absent is fine for numbers.
fn fuse_number<T: Copy + PartialEq>(fp: Option<T>, v1: Option<T>, v2: Option<T>) -> Option<T> {
    match (fp, v1, v2) {
        (Some(f), Some(o), _) | (Some(f), _, Some(o)) if f == o => Some(f),
        _ => match (v1, v2) {
            (Some(a), Some(b)) if a == b => Some(b),
            _ => fp.or(v2).or(v1),
        },
    }
}

/// Cuts a string to at most `limit` characters.
fn truncate(s: &str, limit: usize) -> &str {
    match s.char_indices().nth(limit) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
