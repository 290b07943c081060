//! # stagehand-parser
//!
//! Heuristic classification of media files as movies, TV episodes or music
//! tracks from their path and probed stream metadata.
//!
//! Each media type has its own parser that extracts type fields from the
//! path (and embedded tags) and scores itself with a [`Scorer`]. The
//! [`Arbitrator`] runs all three over a file and keeps the most confident.
//!
//! ## Quick Start
//!
//! ```no_run
//! use stagehand_av::FfprobeProber;
//! use stagehand_parser::{Arbitrator, ParserConfig};
//! use std::path::Path;
//!
//! let arbitrator = Arbitrator::new(FfprobeProber::default(), ParserConfig::default());
//! let path = Path::new("/uploads/movies/The.Matrix.1999.1080p.BluRay.x264-GROUP.mkv");
//! if let Some(meta) = arbitrator.arbitrate(path, Some(Path::new("/uploads/movies")))? {
//!     println!("{} ({:.2})", meta.media_type(), meta.confidence());
//! }
//! # Ok::<(), stagehand_parser::ClassifyError>(())
//! ```

pub mod arbitrate;
pub mod clean;
pub mod config;
pub mod confidence;
pub mod meta;
pub mod movie;
pub mod music;
pub mod naming;
pub mod show;

pub use arbitrate::{Arbitration, Arbitrator, ClassifyError, MediaParser};
pub use config::{MovieThresholds, MusicThresholds, ParserConfig, DEFAULT_THRESHOLD};
pub use confidence::Scorer;
pub use meta::{ExternalIds, MediaFile, MediaMeta, MovieMeta, MusicMeta, ShowMeta};
pub use movie::MovieParser;
pub use music::MusicParser;
pub use show::{ShowParser, ShowPattern, SHOW_PATTERNS};
