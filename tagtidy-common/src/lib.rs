//! # tagtidy common library
//!
//! Shared code for the tagtidy workspace:
//! - The canonical [`record::TrackRecord`] metadata type
//! - String cleaning and name formatting
//! - Configuration file loading
//! - Common error types

pub mod config;
pub mod error;
pub mod record;

pub use config::{AlbumYearStrategy, Config, WriteMode};
pub use error::{Error, Result};
pub use record::{clean_string, TrackRecord};
