//! End-to-end organizing pipeline: scan, read, fuse, standardize,
//! then either report or rewrite the collection.

use std::path::Path;

use thiserror::Error;
use tracing::{debug, info, warn};

use tagtidy_common::{Config, TrackRecord, WriteMode};

use crate::collection::{Collection, PlannedMove, Track};
use crate::scanner::{self, ScanError};
use crate::{fusion, id3v1, id3v2, path_parser};

/// Pipeline errors
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Common(#[from] tagtidy_common::Error),
}

/// Counters reported after a run.
#[derive(Debug, Default, Clone, Copy)]
pub struct RunSummary {
    /// MP3 files found under the source root
    pub files_found: usize,
    /// Files whose sources could not be fused into a full record
    pub files_skipped: usize,
    /// Duplicate tracks dropped
    pub duplicates_removed: usize,
    /// Consistency warnings raised by the collection passes
    pub warnings: usize,
    /// Relocations planned
    pub moves_planned: usize,
    /// Files actually written (zero on a dry run)
    pub files_written: usize,
}

/// Runs the organizer over `root`, building the organized tree under
/// `dest_root`. With [`WriteMode::DryRun`] every planned move is
/// logged and nothing is touched.
pub fn run(
    root: &Path,
    dest_root: &Path,
    config: &Config,
    mode: WriteMode,
) -> Result<RunSummary, PipelineError> {
    let mut summary = RunSummary::default();
    let mut collection = Collection::new();

    for folder in scanner::scan(root)? {
        let cleaned = scanner::clean_folder(&folder.files);
        for (file, cleaned_name) in folder.files.iter().zip(&cleaned) {
            summary.files_found += 1;
            let path = folder.dir.join(file);
            if let Some(track) = load_track(&path, cleaned_name) {
                collection.add(track)?;
            } else {
                summary.files_skipped += 1;
            }
        }
    }
    info!(
        files = summary.files_found,
        skipped = summary.files_skipped,
        "collection scanned"
    );

    let before = collection.len();
    for warning in collection.remove_duplicates() {
        warn!("{}", warning);
        summary.warnings += 1;
    }
    summary.duplicates_removed = before - collection.len();

    for warning in collection.standardize_years(config.processing.album_year_strategy) {
        warn!("{}", warning);
        summary.warnings += 1;
    }
    collection.sort_by_track();

    let moves = collection.derive_layout(config, dest_root);
    summary.moves_planned = moves.len();
    for planned in &moves {
        match mode {
            WriteMode::DryRun => {
                info!(
                    source = %planned.source.display(),
                    dest = %planned.dest.display(),
                    "would move"
                );
            }
            WriteMode::Commit => {
                match write_file(planned, config) {
                    Ok(()) => summary.files_written += 1,
                    Err(e) => {
                        warn!(
                            source = %planned.source.display(),
                            error = %e,
                            "skipping file"
                        );
                        summary.warnings += 1;
                    }
                }
            }
        }
    }
    Ok(summary)
}

/// Reads all three metadata sources for one file and fuses them.
///
/// A malformed tag degrades that source to an empty record; a fusion
/// failure drops the file from the run. Either way the failure is
/// logged and never aborts the other files.
fn load_track(path: &Path, cleaned_name: &str) -> Option<Track> {
    let fp = path_parser::read_path_data(path, cleaned_name);
    let v1 = id3v1::read_tag(path).unwrap_or_else(|e| {
        warn!(path = %path.display(), error = %e, "unreadable ID3v1 tag");
        TrackRecord::default()
    });
    let v2 = id3v2::read_tag(path).unwrap_or_else(|e| {
        warn!(path = %path.display(), error = %e, "unreadable ID3v2 tag");
        TrackRecord::default()
    });
    debug!(path = %path.display(), %fp, %v1, %v2, "loaded sources");

    match fusion::fuse(&fp, &v1, &v2) {
        Ok(record) => Some(Track {
            path: path.to_path_buf(),
            record,
        }),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "cannot fuse metadata, file skipped");
            None
        }
    }
}

/// Writes one organized file: fresh ID3v2 tag, the original audio
/// stream, fresh ID3v1 trailer.
fn write_file(planned: &PlannedMove, config: &Config) -> Result<(), PipelineError> {
    let original = std::fs::read(&planned.source)?;
    let v2_tag = id3v2::write_tag(
        &planned.record,
        &original,
        config.output.id3v2_padding as usize,
    )
    .map_err(|e| tagtidy_common::Error::InvalidInput(e.to_string()))?;
    let v1_tag = id3v1::write_tag(&planned.record)
        .map_err(|e| tagtidy_common::Error::InvalidInput(e.to_string()))?;
    let audio = audio_stream(&original);

    if let Some(parent) = planned.dest.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut out = Vec::with_capacity(v2_tag.len() + audio.len() + v1_tag.len());
    out.extend_from_slice(&v2_tag);
    out.extend_from_slice(audio);
    out.extend_from_slice(&v1_tag);
    std::fs::write(&planned.dest, out)?;
    debug!(dest = %planned.dest.display(), "wrote file");
    Ok(())
}

/// Slices the bare audio stream out of an MP3 file's bytes: any
/// leading ID3v2 tag and any trailing ID3v1 tag (extended block
/// included) are cut away.
fn audio_stream(data: &[u8]) -> &[u8] {
    let start = (id3v2::tag_size(data) as usize).min(data.len());
    let mut end = data.len();
    if end - start >= id3v1::TAG_SIZE && &data[end - id3v1::TAG_SIZE..end - 125] == b"TAG" {
        end -= id3v1::TAG_SIZE;
        let ext_start = end.checked_sub(id3v1::EXT_SIZE);
        if let Some(ext_start) = ext_start {
            if ext_start >= start && &data[ext_start..ext_start + 4] == b"TAG+" {
                end = ext_start;
            }
        }
    }
    &data[start..end]
}
