//! The collection: fused tracks indexed by artist then album, plus the
//! consistency passes run across it before anything touches disk.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tagtidy_common::{AlbumYearStrategy, Config, Error, Result, TrackRecord};

/// A fused track tied to its source file.
#[derive(Debug, Clone)]
pub struct Track {
    /// Where the file currently lives
    pub path: PathBuf,
    /// Fused metadata
    pub record: TrackRecord,
}

/// One planned relocation of a source file into the organized tree.
#[derive(Debug, Clone)]
pub struct PlannedMove {
    /// Existing file
    pub source: PathBuf,
    /// Destination within the organized tree
    pub dest: PathBuf,
    /// Metadata to write into the relocated file's tags
    pub record: TrackRecord,
}

/// All scanned tracks, namespaced by artist then album.
#[derive(Debug, Default)]
pub struct Collection {
    artists: BTreeMap<String, BTreeMap<String, Vec<Track>>>,
    len: usize,
}

impl Collection {
    pub fn new() -> Collection {
        Collection::default()
    }

    /// Number of tracks held.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Adds a track. The record must be fused: artist and album are
    /// the index keys here, so a record missing either has no place to
    /// go.
    pub fn add(&mut self, track: Track) -> Result<()> {
        if !track.record.is_fused() {
            return Err(Error::InvalidInput(format!(
                "cannot add a non-fused track: {}",
                track.path.display()
            )));
        }
        // is_fused guarantees artist and album
        let artist = track.record.artist.clone().unwrap_or_default();
        let album = track.record.album.clone().unwrap_or_default();
        self.artists
            .entry(artist)
            .or_default()
            .entry(album)
            .or_default()
            .push(track);
        self.len += 1;
        Ok(())
    }

    /// Drops songs duplicated within one artist/album pairing.
    ///
    /// Duplicate artists or albums cannot exist on their own: every
    /// entry came from a real file, so either the songs are genuine
    /// duplicates or the fusion step produced names too dissimilar to
    /// reconcile, which cannot be fixed from here. The first-seen copy
    /// of each title is kept. Returns a warning per dropped duplicate
    /// whose track or year disagreed with the kept copy.
    pub fn remove_duplicates(&mut self) -> Vec<String> {
        let mut warnings = Vec::new();
        for (artist, albums) in &mut self.artists {
            for (album, tracks) in albums.iter_mut() {
                let mut seen: Vec<Track> = Vec::with_capacity(tracks.len());
                for track in tracks.drain(..) {
                    match seen.iter().find(|t| t.record.title == track.record.title) {
                        Some(kept) => {
                            if kept.record.track != track.record.track
                                || kept.record.year != track.record.year
                            {
                                warnings.push(format!(
                                    "songs with the same artist, album and title \
                                     but differing track or year for '{}' by '{}':\n  \
                                     {} ({})\n  {} ({})",
                                    album,
                                    artist,
                                    kept.record,
                                    kept.path.display(),
                                    track.record,
                                    track.path.display(),
                                ));
                            }
                            self.len -= 1;
                        }
                        None => seen.push(track),
                    }
                }
                *tracks = seen;
            }
        }
        warnings
    }

    /// Standardizes the year across each album's tracks.
    ///
    /// Only albums whose tracks disagree are touched. Returns one
    /// warning per album changed.
    pub fn standardize_years(&mut self, strategy: AlbumYearStrategy) -> Vec<String> {
        let mut warnings = Vec::new();
        if strategy == AlbumYearStrategy::Ignore {
            return warnings;
        }
        for (artist, albums) in &mut self.artists {
            for (album, tracks) in albums.iter_mut() {
                let mut votes: BTreeMap<Option<u16>, usize> = BTreeMap::new();
                for track in tracks.iter() {
                    *votes.entry(track.record.year).or_insert(0) += 1;
                }
                if votes.len() < 2 {
                    continue;
                }
                let winner = match strategy {
                    AlbumYearStrategy::Majority => majority_year(&votes),
                    AlbumYearStrategy::Latest => votes.keys().flatten().max().copied(),
                    AlbumYearStrategy::Ignore => unreachable!(),
                };
                warnings.push(format!(
                    "multiple album years for '{}' by '{}': {:?}; using {}",
                    album,
                    artist,
                    votes,
                    winner.map_or("none".to_string(), |y| y.to_string()),
                ));
                for track in tracks.iter_mut() {
                    track.record.year = winner;
                }
            }
        }
        warnings
    }

    /// Sorts each album's tracks by track number, unnumbered first.
    pub fn sort_by_track(&mut self) {
        for albums in self.artists.values_mut() {
            for tracks in albums.values_mut() {
                tracks.sort_by_key(|t| t.record.track);
            }
        }
    }

    /// Derives the organized tree: one move per track, laid out as
    /// `artist/[year] album/NN title.mp3` under `dest_root` with each
    /// name rendered through the configured patterns.
    pub fn derive_layout(&self, config: &Config, dest_root: &Path) -> Vec<PlannedMove> {
        let mut moves = Vec::with_capacity(self.len);
        for albums in self.artists.values() {
            for tracks in albums.values() {
                for track in tracks {
                    let record = &track.record;
                    let album_dir = match record.year {
                        Some(year) => {
                            format!("[{:04}] {}", year, config.format_album_name(record))
                        }
                        None => config.format_album_name(record),
                    };
                    let dest = dest_root
                        .join(config.format_artist_name(record))
                        .join(album_dir)
                        .join(format!("{}.mp3", config.format_track_name(record)));
                    moves.push(PlannedMove {
                        source: track.path.clone(),
                        dest,
                        record: record.clone(),
                    });
                }
            }
        }
        moves
    }
}

/// Majority vote over year ballots. Unknown years never win the vote
/// (an unknown majority still standardizes on the most frequent known
/// year); ties between known years go to the greater one.
fn majority_year(votes: &BTreeMap<Option<u16>, usize>) -> Option<u16> {
    votes
        .iter()
        .filter_map(|(year, count)| year.map(|y| (*count, y)))
        .max()
        .map(|(_, year)| year)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(title: &str, number: u32, year: Option<u16>) -> Track {
        Track {
            path: PathBuf::from(format!("/src/{:02} {}.mp3", number, title)),
            record: TrackRecord {
                title: Some(title.to_string()),
                album: Some("Queen II".to_string()),
                artist: Some("Queen".to_string()),
                track: Some(number),
                year,
                genre: None,
            },
        }
    }

    fn collect(tracks: Vec<Track>) -> Collection {
        let mut collection = Collection::new();
        for t in tracks {
            collection.add(t).unwrap();
        }
        collection
    }

    #[test]
    fn add_rejects_non_fused_records() {
        let mut collection = Collection::new();
        let mut incomplete = track("Procession", 1, None);
        incomplete.record.album = None;
        assert!(collection.add(incomplete).is_err());
        assert!(collection.is_empty());
    }

    #[test]
    fn duplicates_keep_first_seen_and_warn_on_disagreement() {
        let mut collection = collect(vec![
            track("Ogre Battle", 3, Some(1974)),
            track("Ogre Battle", 4, Some(1974)),
            track("Nevermore", 5, Some(1974)),
        ]);
        let warnings = collection.remove_duplicates();
        assert_eq!(collection.len(), 2);
        assert_eq!(warnings.len(), 1);

        // The surviving copy is the first added.
        let moves = collection.derive_layout(&Config::default(), Path::new("/out"));
        assert!(moves.iter().any(|m| m.record.track == Some(3)));
        assert!(!moves.iter().any(|m| m.record.track == Some(4)));
    }

    #[test]
    fn identical_duplicates_removed_silently() {
        let mut collection = collect(vec![
            track("Ogre Battle", 3, Some(1974)),
            track("Ogre Battle", 3, Some(1974)),
        ]);
        let warnings = collection.remove_duplicates();
        assert_eq!(collection.len(), 1);
        assert!(warnings.is_empty());
    }

    #[test]
    fn majority_year_vote_overrides_outliers() {
        let mut collection = collect(vec![
            track("Procession", 1, None),
            track("Father to Son", 2, Some(2001)),
            track("White Queen", 3, Some(2001)),
            track("Some Day One Day", 4, Some(1999)),
        ]);
        let warnings = collection.standardize_years(AlbumYearStrategy::Majority);
        assert_eq!(warnings.len(), 1);
        let moves = collection.derive_layout(&Config::default(), Path::new("/out"));
        assert!(moves.iter().all(|m| m.record.year == Some(2001)));
    }

    #[test]
    fn majority_of_unknown_years_falls_back_to_a_known_one() {
        let mut collection = collect(vec![
            track("A", 1, None),
            track("B", 2, None),
            track("C", 3, Some(1974)),
        ]);
        collection.standardize_years(AlbumYearStrategy::Majority);
        let moves = collection.derive_layout(&Config::default(), Path::new("/out"));
        assert!(moves.iter().all(|m| m.record.year == Some(1974)));
    }

    #[test]
    fn standardizing_rewrites_nothing_but_the_year() {
        let mut collection = collect(vec![
            track("A", 1, Some(1974)),
            track("B", 2, Some(1991)),
        ]);
        collection.standardize_years(AlbumYearStrategy::Majority);
        let moves = collection.derive_layout(&Config::default(), Path::new("/out"));
        let a = moves
            .iter()
            .find(|m| m.record.title.as_deref() == Some("A"))
            .unwrap();
        assert_eq!(a.record.artist.as_deref(), Some("Queen"));
        assert_eq!(a.record.album.as_deref(), Some("Queen II"));
        assert_eq!(a.record.track, Some(1));
        assert_eq!(a.record.genre, None);
        assert_eq!(a.source, PathBuf::from("/src/01 A.mp3"));
    }

    #[test]
    fn agreeing_years_left_untouched() {
        let mut collection = collect(vec![
            track("A", 1, Some(1974)),
            track("B", 2, Some(1974)),
        ]);
        assert!(collection
            .standardize_years(AlbumYearStrategy::Majority)
            .is_empty());
    }

    #[test]
    fn latest_strategy_takes_greatest_year() {
        let mut collection = collect(vec![
            track("A", 1, Some(1974)),
            track("B", 2, Some(1991)),
            track("C", 3, None),
        ]);
        collection.standardize_years(AlbumYearStrategy::Latest);
        let moves = collection.derive_layout(&Config::default(), Path::new("/out"));
        assert!(moves.iter().all(|m| m.record.year == Some(1991)));
    }

    #[test]
    fn ignore_strategy_changes_nothing() {
        let mut collection = collect(vec![
            track("A", 1, Some(1974)),
            track("B", 2, Some(1991)),
        ]);
        assert!(collection
            .standardize_years(AlbumYearStrategy::Ignore)
            .is_empty());
        let moves = collection.derive_layout(&Config::default(), Path::new("/out"));
        assert!(moves.iter().any(|m| m.record.year == Some(1974)));
        assert!(moves.iter().any(|m| m.record.year == Some(1991)));
    }

    #[test]
    fn layout_prefixes_album_with_year() {
        let mut collection = collect(vec![track("Ogre Battle", 3, Some(1974))]);
        collection.sort_by_track();
        let moves = collection.derive_layout(&Config::default(), Path::new("/out"));
        assert_eq!(
            moves[0].dest,
            Path::new("/out/Queen/[1974] Queen II/03 Ogre Battle.mp3")
        );
    }

    #[test]
    fn layout_omits_prefix_without_year() {
        let collection = collect(vec![track("Ogre Battle", 3, None)]);
        let moves = collection.derive_layout(&Config::default(), Path::new("/out"));
        assert_eq!(
            moves[0].dest,
            Path::new("/out/Queen/Queen II/03 Ogre Battle.mp3")
        );
    }

    #[test]
    fn sort_orders_by_track_number() {
        let mut collection = collect(vec![
            track("Nevermore", 5, None),
            track("Ogre Battle", 3, None),
        ]);
        collection.sort_by_track();
        let moves = collection.derive_layout(&Config::default(), Path::new("/out"));
        assert_eq!(moves[0].record.track, Some(3));
        assert_eq!(moves[1].record.track, Some(5));
    }

    #[test]
    fn passes_are_idempotent() {
        let mut collection = collect(vec![
            track("Ogre Battle", 3, Some(1974)),
            track("Ogre Battle", 4, Some(1974)),
            track("Nevermore", 5, Some(2001)),
        ]);
        collection.remove_duplicates();
        collection.standardize_years(AlbumYearStrategy::Majority);
        let first: Vec<_> = collection
            .derive_layout(&Config::default(), Path::new("/out"))
            .iter()
            .map(|m| m.dest.clone())
            .collect();

        assert!(collection.remove_duplicates().is_empty());
        assert!(collection
            .standardize_years(AlbumYearStrategy::Majority)
            .is_empty());
        let second: Vec<_> = collection
            .derive_layout(&Config::default(), Path::new("/out"))
            .iter()
            .map(|m| m.dest.clone())
            .collect();
        assert_eq!(first, second);
    }
}
