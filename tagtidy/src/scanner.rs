//! MP3 file discovery and per-folder filename cleaning.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use thiserror::Error;
use walkdir::WalkDir;

use tagtidy_common::clean_string;

/// File scanner errors
#[derive(Debug, Error)]
pub enum ScanError {
    /// Specified path does not exist
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// Path exists but is not a directory
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// Cannot access a directory entry
    #[error("File access error: {0}")]
    FileAccessError(String),
}

/// One directory's worth of MP3 files.
///
/// Filename cleaning works per folder (shared words across the folder
/// are removed) so files never leave their directory grouping.
#[derive(Debug, Clone)]
pub struct MusicFolder {
    /// Directory containing the files
    pub dir: PathBuf,
    /// MP3 file names within `dir`, in traversal order
    pub files: Vec<String>,
}

/// Recursively finds every MP3 file under `root`, grouped by folder.
///
/// Folders without MP3 files are omitted. Unreadable entries abort the
/// scan.
pub fn scan(root: &Path) -> Result<Vec<MusicFolder>, ScanError> {
    if !root.exists() {
        return Err(ScanError::PathNotFound(root.to_path_buf()));
    }
    if !root.is_dir() {
        return Err(ScanError::NotADirectory(root.to_path_buf()));
    }

    let mut folders: BTreeMap<PathBuf, Vec<String>> = BTreeMap::new();
    for entry in WalkDir::new(root).follow_links(false) {
        let entry = entry.map_err(|e| ScanError::FileAccessError(e.to_string()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let is_mp3 = path
            .extension()
            .map(|e| e.to_string_lossy().eq_ignore_ascii_case("mp3"))
            .unwrap_or(false);
        if !is_mp3 {
            continue;
        }
        if let (Some(dir), Some(name)) = (path.parent(), path.file_name()) {
            folders
                .entry(dir.to_path_buf())
                .or_default()
                .push(name.to_string_lossy().into_owned());
        }
    }

    Ok(folders
        .into_iter()
        .map(|(dir, mut files)| {
            files.sort();
            MusicFolder { dir, files }
        })
        .collect())
}

/// Cleans a folder's file names as a set.
///
/// Each name goes through [`clean_string`] aggressively (bracketed
/// segments carry no information in file names), then words repeated
/// in the same position across every name are removed. That undoes
/// file naming schemes which prefix each track with the artist or
/// album name. Single-file folders skip the shared word removal since
/// there is nothing to compare against.
pub fn clean_folder(files: &[String]) -> Vec<String> {
    let cleaned: Vec<String> = files.iter().map(|f| clean_string(f, true)).collect();
    if cleaned.len() > 1 {
        remove_common_words(&cleaned)
    } else {
        cleaned
    }
}

/// Removes words appearing at the same position in every string.
///
/// Only a run anchored at the start of the strings is removed (one
/// leading mismatch is tolerated, so numbering like `01 Artist - ...`
/// still gets its shared words stripped).
fn remove_common_words(strings: &[String]) -> Vec<String> {
    let mut word_lists: Vec<Vec<&str>> = strings
        .iter()
        .map(|s| s.split_whitespace().collect())
        .collect();
    let shortest = word_lists.iter().map(Vec::len).min().unwrap_or(0);

    for i in 0..shortest {
        let first = word_lists[0][i];
        let shared = word_lists[1..].iter().all(|words| words[i] == first);
        if shared {
            for words in &mut word_lists {
                words[i] = "";
            }
        } else if i > 0 {
            break;
        }
    }

    word_lists
        .into_iter()
        .map(|words| {
            words
                .into_iter()
                .filter(|w| !w.is_empty())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect()
}
