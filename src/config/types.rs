use serde::{Deserialize, Serialize};
use stagehand_av::FfprobeOptions;
use stagehand_common::MediaType;
use stagehand_parser::{ParserConfig, DEFAULT_THRESHOLD};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub probe: ProbeConfig,

    #[serde(default)]
    pub classifier: ClassifierConfig,

    #[serde(default)]
    pub movies: Option<LibraryConfig>,

    #[serde(default)]
    pub shows: Option<LibraryConfig>,

    #[serde(default)]
    pub music: Option<LibraryConfig>,
}

impl Config {
    /// Settings for `media_type`, if configured and enabled.
    pub fn library(&self, media_type: MediaType) -> Option<&LibraryConfig> {
        let library = match media_type {
            MediaType::Movies => self.movies.as_ref(),
            MediaType::Shows => self.shows.as_ref(),
            MediaType::Music => self.music.as_ref(),
        };
        library.filter(|l| l.enabled)
    }

    /// Enabled media types, in arbitration order.
    pub fn enabled_types(&self) -> Vec<MediaType> {
        MediaType::ALL
            .into_iter()
            .filter(|t| self.library(*t).is_some())
            .collect()
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("stagehand.db")
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProbeConfig {
    /// Explicit ffprobe binary; looked up on PATH when unset.
    #[serde(default)]
    pub ffprobe: Option<PathBuf>,

    /// Frames read per file to detect interlacing (0 disables).
    #[serde(default = "default_frame_sample")]
    pub frame_sample: u32,
}

fn default_frame_sample() -> u32 {
    200
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            ffprobe: None,
            frame_sample: default_frame_sample(),
        }
    }
}

impl ProbeConfig {
    pub fn ffprobe_options(&self) -> FfprobeOptions {
        let mut options = FfprobeOptions::default();
        if let Some(ref binary) = self.ffprobe {
            options.binary = binary.clone();
        }
        options.frame_sample = self.frame_sample;
        options
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClassifierConfig {
    #[serde(default = "default_threshold")]
    pub threshold: f64,

    #[serde(default)]
    pub movie: MovieClassifierConfig,

    #[serde(default)]
    pub music: MusicClassifierConfig,
}

fn default_threshold() -> f64 {
    DEFAULT_THRESHOLD
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            movie: MovieClassifierConfig::default(),
            music: MusicClassifierConfig::default(),
        }
    }
}

impl ClassifierConfig {
    pub fn parser_config(&self) -> ParserConfig {
        ParserConfig::builder()
            .threshold(self.threshold)
            .movie_min_duration(Duration::from_secs(self.movie.min_duration_mins * 60))
            .movie_min_size_mb(self.movie.min_size_mb)
            .movie_support_files(self.movie.support_files)
            .music_max_size_mb(self.music.max_size_mb)
            .build()
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MovieClassifierConfig {
    #[serde(default = "default_min_duration_mins")]
    pub min_duration_mins: u64,

    #[serde(default = "default_min_size_mb")]
    pub min_size_mb: u64,

    /// Read IMDb/TMDB ids from `.nfo` and `.txt` files in a movie's folder.
    #[serde(default)]
    pub support_files: bool,
}

fn default_min_duration_mins() -> u64 {
    60
}

fn default_min_size_mb() -> u64 {
    600
}

impl Default for MovieClassifierConfig {
    fn default() -> Self {
        Self {
            min_duration_mins: default_min_duration_mins(),
            min_size_mb: default_min_size_mb(),
            support_files: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MusicClassifierConfig {
    #[serde(default = "default_max_size_mb")]
    pub max_size_mb: u64,
}

fn default_max_size_mb() -> u64 {
    70
}

impl Default for MusicClassifierConfig {
    fn default() -> Self {
        Self {
            max_size_mb: default_max_size_mb(),
        }
    }
}

/// Per-type scan settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LibraryConfig {
    /// Directory scanned for new files.
    pub upload_dir: PathBuf,

    /// Organised library, used for duplicate and upgrade detection.
    #[serde(default)]
    pub library_dir: Option<PathBuf>,

    /// Metadata provider key; refinement is skipped without one.
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}
