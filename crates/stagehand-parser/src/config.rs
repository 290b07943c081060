//! Classifier configuration.
//!
//! Every threshold the parsers score against lives here so callers can
//! override it; the defaults match what a typical library looks like.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default minimum confidence for a classification to be accepted.
pub const DEFAULT_THRESHOLD: f64 = 0.6;

const MIB: u64 = 1024 * 1024;

/// Media thresholds used when scoring a movie candidate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MovieThresholds {
    /// Feature films run at least this long.
    pub min_duration: Duration,
    /// Feature film files are at least this many bytes.
    pub min_size: u64,
    /// Look for an id in `.nfo`/`.txt` files beside the movie.
    #[serde(default)]
    pub support_files: bool,
}

impl Default for MovieThresholds {
    fn default() -> Self {
        Self {
            min_duration: Duration::from_secs(60 * 60),
            min_size: 600 * MIB,
            support_files: false,
        }
    }
}

/// Media thresholds used when scoring a music candidate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MusicThresholds {
    /// Music tracks are smaller than this many bytes.
    pub max_size: u64,
}

impl Default for MusicThresholds {
    fn default() -> Self {
        Self { max_size: 70 * MIB }
    }
}

/// Configuration for the parsers and the arbitrator.
///
/// Use the builder to override individual values:
///
/// ```
/// use stagehand_parser::config::ParserConfig;
///
/// let config = ParserConfig::builder()
///     .threshold(0.75)
///     .movie_min_size_mb(200)
///     .build();
/// assert_eq!(config.threshold, 0.75);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParserConfig {
    /// Minimum confidence for a classification to win.
    /// Default: 0.6
    pub threshold: f64,

    pub movie: MovieThresholds,

    pub music: MusicThresholds,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            movie: MovieThresholds::default(),
            music: MusicThresholds::default(),
        }
    }
}

impl ParserConfig {
    /// Create a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a configuration builder.
    pub fn builder() -> ParserConfigBuilder {
        ParserConfigBuilder::default()
    }
}

/// Builder for `ParserConfig`.
#[derive(Debug, Clone, Default)]
pub struct ParserConfigBuilder {
    threshold: Option<f64>,
    movie_min_duration: Option<Duration>,
    movie_min_size: Option<u64>,
    movie_support_files: Option<bool>,
    music_max_size: Option<u64>,
}

impl ParserConfigBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the acceptance threshold. Clamped to [0, 1].
    pub fn threshold(mut self, threshold: f64) -> Self {
        self.threshold = Some(threshold.clamp(0.0, 1.0));
        self
    }

    /// Set the minimum movie duration.
    pub fn movie_min_duration(mut self, duration: Duration) -> Self {
        self.movie_min_duration = Some(duration);
        self
    }

    /// Set the minimum movie size in MiB.
    pub fn movie_min_size_mb(mut self, mb: u64) -> Self {
        self.movie_min_size = Some(mb * MIB);
        self
    }

    /// Read movie ids from support files next to the movie.
    pub fn movie_support_files(mut self, enabled: bool) -> Self {
        self.movie_support_files = Some(enabled);
        self
    }

    /// Set the maximum music track size in MiB.
    pub fn music_max_size_mb(mut self, mb: u64) -> Self {
        self.music_max_size = Some(mb * MIB);
        self
    }

    /// Build the configuration.
    pub fn build(self) -> ParserConfig {
        let defaults = ParserConfig::default();
        ParserConfig {
            threshold: self.threshold.unwrap_or(defaults.threshold),
            movie: MovieThresholds {
                min_duration: self
                    .movie_min_duration
                    .unwrap_or(defaults.movie.min_duration),
                min_size: self.movie_min_size.unwrap_or(defaults.movie.min_size),
                support_files: self
                    .movie_support_files
                    .unwrap_or(defaults.movie.support_files),
            },
            music: MusicThresholds {
                max_size: self.music_max_size.unwrap_or(defaults.music.max_size),
            },
        }
    }
}
