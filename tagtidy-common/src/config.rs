//! Program configuration.
//!
//! Loaded from an optional TOML file (`tagtidy.toml` next to the
//! invocation by default, `--config` overrides). A missing file means
//! defaults; a malformed file is a hard [`Error::Config`].

use std::fmt::Write as _;
use std::path::Path;

use serde::Deserialize;

use crate::record::TrackRecord;
use crate::{Error, Result};

/// Characters that may not appear in derived file or directory names.
pub const INVALID_FILE_CHARS: &[char] =
    &['\\', '/', ':', '*', '?', '"', '<', '>', '|', '\''];

/// Default name of the config file searched in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "tagtidy.toml";

/// Strategy for reconciling differing album years within one album.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AlbumYearStrategy {
    /// Majority vote across the album's tracks (ties prefer a known year)
    #[default]
    Majority,
    /// The greatest known year wins
    Latest,
    /// Leave the years alone
    Ignore,
}

/// Whether destructive writes are performed.
///
/// Threaded explicitly from the CLI into every write path; there is no
/// ambient "write mode" state anywhere in the program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Report what would change, touch nothing
    DryRun,
    /// Write the organized tree and rewritten tags to disk
    Commit,
}

/// `[output]` section: naming patterns and tag write options.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct OutputConfig {
    /// Artist directory naming pattern
    pub artist_name_format: String,
    /// Album directory naming pattern (a `[year] ` prefix is added
    /// separately when the album year is known)
    pub album_name_format: String,
    /// Track file naming pattern (without extension)
    pub track_name_format: String,
    /// Substituted for spaces in derived names
    pub filename_space_char: String,
    /// Null padding appended after the frames of rewritten ID3v2 tags
    pub id3v2_padding: u32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            artist_name_format: "@A".to_string(),
            album_name_format: "@L".to_string(),
            track_name_format: "@T @N".to_string(),
            filename_space_char: " ".to_string(),
            id3v2_padding: 500,
        }
    }
}

/// `[processing]` section: collection-level pass options.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct ProcessingConfig {
    /// How album year disagreements are standardized
    pub album_year_strategy: AlbumYearStrategy,
}

/// Container for all program configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
    pub output: OutputConfig,
    pub processing: ProcessingConfig,
}

impl Config {
    /// Loads configuration from `path`, or from `tagtidy.toml` in the
    /// working directory, or falls back to defaults when neither
    /// exists. An explicitly given path must exist.
    pub fn load(path: Option<&Path>) -> Result<Config> {
        let config = match path {
            Some(path) => Self::parse_file(path)?,
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.exists() {
                    Self::parse_file(default)?
                } else {
                    Config::default()
                }
            }
        };
        config.validate()?;
        Ok(config)
    }

    fn parse_file(path: &Path) -> Result<Config> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    /// Rejects naming patterns that would produce invalid file names.
    fn validate(&self) -> Result<()> {
        for (key, pattern) in [
            ("artist-name-format", &self.output.artist_name_format),
            ("album-name-format", &self.output.album_name_format),
            ("track-name-format", &self.output.track_name_format),
            ("filename-space-character", &self.output.filename_space_char),
        ] {
            if pattern.contains(INVALID_FILE_CHARS) {
                return Err(Error::Config(format!(
                    "{} '{}' contains an invalid file name character",
                    key, pattern
                )));
            }
        }
        Ok(())
    }

    /// Formatted artist directory name for a record.
    pub fn format_artist_name(&self, record: &TrackRecord) -> String {
        self.render(&self.output.artist_name_format, record)
    }

    /// Formatted album directory name for a record.
    pub fn format_album_name(&self, record: &TrackRecord) -> String {
        self.render(&self.output.album_name_format, record)
    }

    /// Formatted track file name (without extension) for a record.
    pub fn format_track_name(&self, record: &TrackRecord) -> String {
        self.render(&self.output.track_name_format, record)
    }

    /// Expands `@`-tokens in a naming pattern:
    /// `@A`/`@a` artist, `@L`/`@l` album, `@N`/`@n` title, `@Y`/`@y`
    /// year (4/2 digits), `@T`/`@t` track (padded/plain). Lowercase
    /// letter tokens render the value lowercased. Spaces are replaced
    /// with the configured space character and invalid file name
    /// characters are dropped from substituted values.
    fn render(&self, pattern: &str, record: &TrackRecord) -> String {
        let artist = record.artist.as_deref().unwrap_or("");
        let album = record.album.as_deref().unwrap_or("");
        let title = record.title.as_deref().unwrap_or("");
        let year = record.year.unwrap_or(0);
        let track = record.track.unwrap_or(0);

        let mut out = String::with_capacity(pattern.len() + 16);
        let mut chars = pattern.chars();
        while let Some(c) = chars.next() {
            if c != '@' {
                out.push(c);
                continue;
            }
            match chars.next() {
                Some('A') => out.push_str(artist),
                Some('a') => out.push_str(&artist.to_lowercase()),
                Some('L') => out.push_str(album),
                Some('l') => out.push_str(&album.to_lowercase()),
                Some('N') => out.push_str(title),
                Some('n') => out.push_str(&title.to_lowercase()),
                Some('Y') => {
                    let _ = write!(out, "{:04}", year % 10000);
                }
                Some('y') => {
                    let _ = write!(out, "{:02}", year % 100);
                }
                Some('T') => {
                    let _ = write!(out, "{:02}", track);
                }
                Some('t') => {
                    let _ = write!(out, "{}", track);
                }
                Some(other) => {
                    out.push('@');
                    out.push(other);
                }
                None => out.push('@'),
            }
        }

        let cleaned: String = out
            .chars()
            .filter(|c| !INVALID_FILE_CHARS.contains(c))
            .collect();
        if self.output.filename_space_char != " " {
            cleaned.replace(' ', &self.output.filename_space_char)
        } else {
            cleaned
        }
    }
}
