//! tagtidy library interface
//!
//! A batch tool that tidies MP3 collections: it reads metadata from
//! the file path, the ID3v1 trailer tag and the ID3v2 tag of every
//! file, reconciles the three sources into one record per track,
//! cross-checks whole albums for consistency, then derives a
//! normalized `Artist/[Year] Album/NN Title.mp3` layout with rewritten
//! tags.

pub mod collection;
pub mod fusion;
pub mod id3v1;
pub mod id3v2;
pub mod path_parser;
pub mod pipeline;
pub mod scanner;
