//! Canonical track metadata and string normalization.
//!
//! A [`TrackRecord`] is produced once per file per source (file path,
//! ID3v1 tag, ID3v2 tag) and is read-only after creation. The fused
//! record handed to the collection must carry title, album and artist;
//! the numeric fields stay optional. Absence is always `None` -- a
//! track numbered 0 or a year of 0 is a value, not "unknown".

use std::fmt;

/// Generic information about a track.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackRecord {
    /// Track title, `None` if the source did not supply it
    pub title: Option<String>,
    /// Album name
    pub album: Option<String>,
    /// Artist name
    pub artist: Option<String>,
    /// Track number within the album
    pub track: Option<u32>,
    /// 4-digit calendar year
    pub year: Option<u16>,
    /// Numeric ID3v1 genre code (best effort only)
    pub genre: Option<u8>,
}

impl TrackRecord {
    /// Whether this record carries all three mandatory text fields.
    ///
    /// Only fused records satisfy this; the collection refuses
    /// anything else since artist/album are its index keys.
    pub fn is_fused(&self) -> bool {
        self.title.is_some() && self.album.is_some() && self.artist.is_some()
    }

    /// Normalizes all text fields in place via [`clean_string`].
    pub fn clean(&mut self) {
        for field in [&mut self.title, &mut self.album, &mut self.artist] {
            if let Some(value) = field.take() {
                let cleaned = clean_string(&value, false);
                if !cleaned.is_empty() {
                    *field = Some(cleaned);
                }
            }
        }
    }
}

impl fmt::Display for TrackRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(track) = self.track {
            write!(f, "{:02} ", track)?;
        }
        write!(
            f,
            "{} - {} by {}",
            self.title.as_deref().unwrap_or("?"),
            self.album.as_deref().unwrap_or("?"),
            self.artist.as_deref().unwrap_or("?"),
        )?;
        if let Some(year) = self.year {
            write!(f, " in {}", year)?;
        }
        Ok(())
    }
}

/// Words kept lowercase when fixing capitalisation (unless leading).
const TITLE_CASE_EXCEPTIONS: &[&str] = &["and", "at", "of", "or", "the"];

/// Cleans a string of weird punctuation or whitespace substitution.
///
/// In detail:
/// * all but the last `.` are replaced with spaces (the last one is
///   assumed to introduce a file extension when the input ends in
///   `.mp3`; otherwise every `.` goes)
/// * all `_` and `-` are replaced with spaces
/// * duplicate spaces are removed
/// * capitalisation is converted to title case
///
/// With `aggressive` set, bracketed segments like `[2001]` or
/// `[FLAC rip]` are removed as well. That is only safe on file names:
/// on album folders the brackets frequently hold the publication year.
pub fn clean_string(input: &str, aggressive: bool) -> String {
    let mut s = if input.to_ascii_lowercase().ends_with(".mp3") {
        // Keep the final dot so the extension survives word splitting.
        let dots = input.matches('.').count();
        replace_first_n(input, '.', ' ', dots.saturating_sub(1))
    } else {
        input.replace('.', " ")
    };
    s = s.replace(['-', '_'], " ");
    s = s.to_lowercase();

    let words: Vec<&str> = s.split_whitespace().collect();
    let mut fixed = Vec::with_capacity(words.len());
    for (i, word) in words.iter().enumerate() {
        if i == 0 || !TITLE_CASE_EXCEPTIONS.contains(word) {
            fixed.push(capitalize(word));
        } else {
            fixed.push((*word).to_string());
        }
    }
    let mut out = fixed.join(" ");

    if aggressive {
        out = strip_bracketed(&out);
        out = out.split_whitespace().collect::<Vec<_>>().join(" ");
    }
    out
}

/// Uppercases the first character of a word.
fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Replaces the first `n` occurrences of `from` with `to`.
fn replace_first_n(input: &str, from: char, to: char, n: usize) -> String {
    let mut remaining = n;
    input
        .chars()
        .map(|c| {
            if c == from && remaining > 0 {
                remaining -= 1;
                to
            } else {
                c
            }
        })
        .collect()
}

/// Removes `[...]` segments (non-nested, unterminated brackets kept).
fn strip_bracketed(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut depth = 0usize;
    for c in input.chars() {
        match c {
            '[' => depth += 1,
            ']' if depth > 0 => depth -= 1,
            _ if depth == 0 => out.push(c),
            _ => {}
        }
    }
    out
}
