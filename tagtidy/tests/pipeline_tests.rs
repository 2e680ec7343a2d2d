//! End-to-end pipeline tests over a fixture music tree.

use std::fs;
use std::path::Path;

use tempfile::TempDir;

use tagtidy::{id3v1, id3v2, pipeline};
use tagtidy_common::{Config, WriteMode};

const AUDIO: &[u8] = &[0xFF, 0xFB, 0x90, 0x44, 0x00, 0x11, 0x22, 0x33];

fn syncsafe(value: u32) -> [u8; 4] {
    [
        ((value >> 21) & 0x7F) as u8,
        ((value >> 14) & 0x7F) as u8,
        ((value >> 7) & 0x7F) as u8,
        (value & 0x7F) as u8,
    ]
}

fn v23_text_frame(id: &str, content: &str) -> Vec<u8> {
    let mut frame = id.as_bytes().to_vec();
    frame.extend_from_slice(&((content.len() as u32) + 2).to_be_bytes());
    frame.extend_from_slice(&[0, 0]);
    frame.push(0);
    frame.extend_from_slice(content.as_bytes());
    frame.push(0);
    frame
}

fn v23_tag(frames: &[Vec<u8>]) -> Vec<u8> {
    let body: Vec<u8> = frames.iter().flatten().copied().collect();
    let mut tag = b"ID3\x03\x00\x00".to_vec();
    tag.extend_from_slice(&syncsafe(body.len() as u32));
    tag.extend_from_slice(&body);
    tag
}

fn v1_tag(title: &str, artist: &str, album: &str, year: &str, track: u8, genre: u8) -> Vec<u8> {
    fn field(s: &str) -> [u8; 30] {
        let mut out = [0u8; 30];
        out[..s.len()].copy_from_slice(s.as_bytes());
        out
    }
    let mut tag = b"TAG".to_vec();
    tag.extend_from_slice(&field(title));
    tag.extend_from_slice(&field(artist));
    tag.extend_from_slice(&field(album));
    tag.extend_from_slice(year.as_bytes());
    tag.extend_from_slice(&[0u8; 29]); // comment + v1.1 separator
    tag.push(track);
    tag.push(genre);
    assert_eq!(tag.len(), 128);
    tag
}

fn popm_frame() -> Vec<u8> {
    let body = b"user@example.com\x00\xC0";
    let mut frame = b"POPM".to_vec();
    frame.extend_from_slice(&(body.len() as u32).to_be_bytes());
    frame.extend_from_slice(&[0, 0]);
    frame.extend_from_slice(body);
    frame
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

/// A consistently tagged two-track album folder, one track carrying a
/// POPM frame from some player.
fn write_queen_fixture(root: &Path) {
    let album = root.join("Queen/[1974] Sheer Heart Attack");
    fs::create_dir_all(&album).unwrap();

    let mut brighton = v23_tag(&[
        v23_text_frame("TIT2", "Brighton Rock"),
        v23_text_frame("TPE1", "Queen"),
        v23_text_frame("TALB", "Sheer Heart Attack"),
        v23_text_frame("TRCK", "1"),
        v23_text_frame("TYER", "1974"),
        popm_frame(),
    ]);
    brighton.extend_from_slice(AUDIO);
    brighton.extend_from_slice(&v1_tag(
        "Brighton Rock",
        "Queen",
        "Sheer Heart Attack",
        "1974",
        1,
        17,
    ));
    fs::write(album.join("01 Brighton Rock.mp3"), &brighton).unwrap();

    let mut killer = v23_tag(&[
        v23_text_frame("TIT2", "Killer Queen"),
        v23_text_frame("TPE1", "Queen"),
        v23_text_frame("TALB", "Sheer Heart Attack"),
        v23_text_frame("TRCK", "2"),
        v23_text_frame("TYER", "1974"),
    ]);
    killer.extend_from_slice(AUDIO);
    fs::write(album.join("02 Killer Queen.mp3"), &killer).unwrap();
}

#[test]
fn dry_run_plans_moves_without_touching_disk() {
    let src = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let dest_root = out.path().join("organized");
    write_queen_fixture(src.path());

    let summary = pipeline::run(
        src.path(),
        &dest_root,
        &Config::default(),
        WriteMode::DryRun,
    )
    .unwrap();

    assert_eq!(summary.files_found, 2);
    assert_eq!(summary.files_skipped, 0);
    assert_eq!(summary.moves_planned, 2);
    assert_eq!(summary.files_written, 0);
    assert!(!dest_root.exists());
}

#[test]
fn commit_builds_the_organized_tree() {
    let src = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let dest_root = out.path().join("organized");
    write_queen_fixture(src.path());

    let summary = pipeline::run(
        src.path(),
        &dest_root,
        &Config::default(),
        WriteMode::Commit,
    )
    .unwrap();
    assert_eq!(summary.files_written, 2);

    let dest = dest_root.join("Queen/[1974] Sheer Heart Attack/01 Brighton Rock.mp3");
    assert!(dest.exists());
    assert!(dest_root
        .join("Queen/[1974] Sheer Heart Attack/02 Killer Queen.mp3")
        .exists());

    // Both tags of the rewritten file carry the fused record.
    let v2 = id3v2::read_tag(&dest).unwrap();
    assert_eq!(v2.title.as_deref(), Some("Brighton Rock"));
    assert_eq!(v2.artist.as_deref(), Some("Queen"));
    assert_eq!(v2.album.as_deref(), Some("Sheer Heart Attack"));
    assert_eq!(v2.track, Some(1));
    assert_eq!(v2.year, Some(1974));

    let v1 = id3v1::read_tag(&dest).unwrap();
    assert_eq!(v1.title.as_deref(), Some("Brighton Rock"));
    assert_eq!(v1.track, Some(1));
    assert_eq!(v1.genre, Some(17));

    // Audio stream and foreign frames survive byte for byte.
    let bytes = fs::read(&dest).unwrap();
    assert!(contains(&bytes, AUDIO));
    assert!(contains(&bytes, &popm_frame()));
}

#[test]
fn untagged_file_organized_from_its_path_alone() {
    let src = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let dest_root = out.path().join("organized");
    let album = src.path().join("Nirvana/Nevermind");
    fs::create_dir_all(&album).unwrap();
    fs::write(album.join("05 Lithium.mp3"), AUDIO).unwrap();

    let summary = pipeline::run(
        src.path(),
        &dest_root,
        &Config::default(),
        WriteMode::Commit,
    )
    .unwrap();
    assert_eq!(summary.files_written, 1);

    // No year anywhere, so no album year prefix.
    let dest = dest_root.join("Nirvana/Nevermind/05 Lithium.mp3");
    assert!(dest.exists());

    let v2 = id3v2::read_tag(&dest).unwrap();
    assert_eq!(v2.title.as_deref(), Some("Lithium"));
    assert_eq!(v2.album.as_deref(), Some("Nevermind"));
    assert_eq!(v2.artist.as_deref(), Some("Nirvana"));
    assert_eq!(v2.track, Some(5));
    assert_eq!(v2.year, None);
}

#[test]
fn file_with_no_metadata_at_all_is_skipped() {
    let src = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    // No tags, and a name that cleans down to nothing, so no source
    // can supply a title.
    fs::write(src.path().join("...mp3"), AUDIO).unwrap();

    let summary = pipeline::run(
        src.path(),
        &out.path().join("organized"),
        &Config::default(),
        WriteMode::DryRun,
    )
    .unwrap();
    assert_eq!(summary.files_found, 1);
    assert_eq!(summary.files_skipped, 1);
    assert_eq!(summary.moves_planned, 0);
}

#[test]
fn duplicate_titles_collapse_to_one_file() {
    let src = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let dest_root = out.path().join("organized");
    let album = src.path().join("Queen/[1974] Queen II");
    fs::create_dir_all(&album).unwrap();

    for name in ["03 Ogre Battle.mp3", "04 Ogre Battle.mp3"] {
        let mut data = v23_tag(&[
            v23_text_frame("TIT2", "Ogre Battle"),
            v23_text_frame("TPE1", "Queen"),
            v23_text_frame("TALB", "Queen II"),
        ]);
        data.extend_from_slice(AUDIO);
        fs::write(album.join(name), &data).unwrap();
    }

    let summary = pipeline::run(
        src.path(),
        &dest_root,
        &Config::default(),
        WriteMode::Commit,
    )
    .unwrap();
    assert_eq!(summary.files_found, 2);
    assert_eq!(summary.duplicates_removed, 1);
    assert_eq!(summary.files_written, 1);
}
