//! Metadata extraction from file system paths.
//!
//! In a well laid out collection the grandparent directory names the
//! artist and the parent names the album, optionally prefixed with the
//! publication year as `[YYYY] `. The file name carries track number
//! and title. All of it is best effort.

use std::path::Path;

use tagtidy_common::{clean_string, TrackRecord};

/// Parses a record out of a file's location and name.
///
/// `cleaned_filename` must come from [`crate::scanner::clean_folder`]:
/// cleaning needs the whole directory's file list to strip words
/// shared by every name, which this function cannot see on its own.
pub fn read_path_data(path: &Path, cleaned_filename: &str) -> TrackRecord {
    let mut record = TrackRecord::default();

    let album_dir = path.parent().and_then(|p| p.file_name());
    let artist_dir = path
        .parent()
        .and_then(|p| p.parent())
        .and_then(|p| p.file_name());
    if let (Some(album_dir), Some(artist_dir)) = (album_dir, artist_dir) {
        let candidate = clean_string(&album_dir.to_string_lossy(), false);
        match split_year_prefix(&candidate) {
            Some((year, album)) => {
                record.year = Some(year);
                record.album = Some(album.to_string());
            }
            None => record.album = Some(candidate),
        }
        record.artist = Some(clean_string(&artist_dir.to_string_lossy(), false));
    }

    let words: Vec<&str> = cleaned_filename.split_whitespace().collect();
    if let Some((first, rest)) = words.split_first() {
        let title_words = if let Ok(track) = first.parse::<u32>() {
            record.track = Some(track);
            rest
        } else {
            &words[..]
        };
        let joined = title_words.join(" ");
        let title = joined.split('.').next().unwrap_or("").to_string();
        if !title.is_empty() {
            record.title = Some(title);
        }
    }
    record
}

/// Splits an album folder name of the form `[YYYY] Album` into its
/// year and remainder.
fn split_year_prefix(name: &str) -> Option<(u16, &str)> {
    let bytes = name.as_bytes();
    if bytes.len() < 7
        || bytes[0] != b'['
        || !bytes[1..5].iter().all(u8::is_ascii_digit)
        || bytes[5] != b']'
        || bytes[6] != b' '
    {
        return None;
    }
    let year = name[1..5].parse().ok()?;
    Some((year, &name[7..]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn parses_artist_album_track_and_title() {
        let path = PathBuf::from("/music/Pink Floyd/[1973] Dark Side of the Moon/01 Speak to Me.mp3");
        let record = read_path_data(&path, "01 Speak to Me.mp3");
        assert_eq!(record.artist.as_deref(), Some("Pink Floyd"));
        assert_eq!(record.album.as_deref(), Some("Dark Side of the Moon"));
        assert_eq!(record.year, Some(1973));
        assert_eq!(record.track, Some(1));
        assert_eq!(record.title.as_deref(), Some("Speak to Me"));
    }

    #[test]
    fn album_without_year_prefix() {
        let path = PathBuf::from("/music/Nirvana/Nevermind/05 Lithium.mp3");
        let record = read_path_data(&path, "05 Lithium.mp3");
        assert_eq!(record.album.as_deref(), Some("Nevermind"));
        assert_eq!(record.year, None);
    }

    #[test]
    fn filename_without_track_number() {
        let path = PathBuf::from("/music/Nirvana/Nevermind/Lithium.mp3");
        let record = read_path_data(&path, "Lithium.mp3");
        assert_eq!(record.track, None);
        assert_eq!(record.title.as_deref(), Some("Lithium"));
    }

    #[test]
    fn bracketed_text_that_is_not_a_year_kept_in_album() {
        let path = PathBuf::from("/music/Orbital/[Live] Glastonbury/01 Halcyon.mp3");
        let record = read_path_data(&path, "01 Halcyon.mp3");
        assert_eq!(record.album.as_deref(), Some("[live] Glastonbury"));
        assert_eq!(record.year, None);
    }

    #[test]
    fn empty_filename_yields_no_title() {
        let path = PathBuf::from("/music/A/B/x.mp3");
        let record = read_path_data(&path, "");
        assert_eq!(record.title, None);
        assert_eq!(record.track, None);
    }
}
