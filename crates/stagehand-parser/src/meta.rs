//! Classified media records.

use serde::{Deserialize, Serialize};
use stagehand_av::ProbeResult;
use stagehand_common::paths::{lowercase_extension, relative_to};
use stagehand_common::MediaType;
use std::path::{Path, PathBuf};

use crate::naming;

/// The file a record was built from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaFile {
    /// Absolute path as scanned.
    pub path: PathBuf,
    /// Path relative to the scanned base directory.
    pub relative_path: PathBuf,
    /// Size in bytes.
    pub size: u64,
    /// Lower-case extension, preferring the one implied by the container.
    pub extension: Option<String>,
}

impl MediaFile {
    /// Describe `path` for classification.
    pub fn new(path: impl Into<PathBuf>, base_dir: Option<&Path>, size: u64, probe: &ProbeResult) -> Self {
        let path = path.into();
        let relative_path = relative_to(&path, base_dir);
        let extension = probe
            .extension()
            .map(str::to_string)
            .or_else(|| lowercase_extension(&path));
        Self {
            path,
            relative_path,
            size,
            extension,
        }
    }
}

/// Identifiers assigned by a metadata provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalIds {
    pub movie_id: Option<String>,
    pub show_id: Option<String>,
    pub episode_id: Option<String>,
    pub artist_id: Option<String>,
    pub album_id: Option<String>,
    pub track_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieMeta {
    pub file: MediaFile,
    pub confidence: f64,
    pub external_ids: ExternalIds,
    /// Resolution label of the best video stream.
    pub video_format: Option<String>,
    pub title: Option<String>,
    pub year: Option<u16>,
    pub part: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShowMeta {
    pub file: MediaFile,
    pub confidence: f64,
    pub external_ids: ExternalIds,
    pub video_format: Option<String>,
    pub show_name: Option<String>,
    pub season: Option<u32>,
    pub episode: Option<u32>,
    /// Last episode of a multi-episode file; equals `episode` otherwise.
    pub episode_last: Option<u32>,
    pub episode_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MusicMeta {
    pub file: MediaFile,
    pub confidence: f64,
    pub external_ids: ExternalIds,
    pub video_format: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub year: Option<u16>,
    pub track: Option<u32>,
    pub title: Option<String>,
}

/// A classified media file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MediaMeta {
    Movie(MovieMeta),
    Show(ShowMeta),
    Music(MusicMeta),
}

impl MediaMeta {
    pub fn media_type(&self) -> MediaType {
        match self {
            Self::Movie(_) => MediaType::Movies,
            Self::Show(_) => MediaType::Shows,
            Self::Music(_) => MediaType::Music,
        }
    }

    /// Display title: movie title, show name, or track title.
    pub fn title(&self) -> Option<&str> {
        match self {
            Self::Movie(m) => m.title.as_deref(),
            Self::Show(s) => s.show_name.as_deref(),
            Self::Music(m) => m.title.as_deref(),
        }
    }

    pub fn confidence(&self) -> f64 {
        match self {
            Self::Movie(m) => m.confidence,
            Self::Show(s) => s.confidence,
            Self::Music(m) => m.confidence,
        }
    }

    pub fn file(&self) -> &MediaFile {
        match self {
            Self::Movie(m) => &m.file,
            Self::Show(s) => &s.file,
            Self::Music(m) => &m.file,
        }
    }

    /// Release year; shows carry none.
    pub fn year(&self) -> Option<u16> {
        match self {
            Self::Movie(m) => m.year,
            Self::Show(_) => None,
            Self::Music(m) => m.year,
        }
    }

    pub fn video_format(&self) -> Option<&str> {
        match self {
            Self::Movie(m) => m.video_format.as_deref(),
            Self::Show(s) => s.video_format.as_deref(),
            Self::Music(m) => m.video_format.as_deref(),
        }
    }

    pub fn external_ids(&self) -> &ExternalIds {
        match self {
            Self::Movie(m) => &m.external_ids,
            Self::Show(s) => &s.external_ids,
            Self::Music(m) => &m.external_ids,
        }
    }

    pub fn external_ids_mut(&mut self) -> &mut ExternalIds {
        match self {
            Self::Movie(m) => &mut m.external_ids,
            Self::Show(s) => &mut s.external_ids,
            Self::Music(m) => &mut m.external_ids,
        }
    }

    /// Destination directory, relative to a library root.
    pub fn dir_name(&self) -> Option<PathBuf> {
        match self {
            Self::Movie(m) => naming::movie_dir(m),
            Self::Show(s) => naming::show_dir(s),
            Self::Music(m) => naming::music_dir(m),
        }
    }

    /// Destination file name.
    pub fn file_name(&self) -> Option<String> {
        match self {
            Self::Movie(m) => naming::movie_file(m),
            Self::Show(s) => naming::show_file(s),
            Self::Music(m) => naming::music_file(m),
        }
    }

    /// Full destination path under `root`.
    pub fn destination(&self, root: &Path) -> Option<PathBuf> {
        Some(root.join(self.dir_name()?).join(self.file_name()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stagehand_av::{FormatInfo, Stream};

    fn file(name: &str) -> MediaFile {
        MediaFile {
            path: PathBuf::from("/up").join(name),
            relative_path: PathBuf::from(name),
            size: 1,
            extension: lowercase_extension(Path::new(name)),
        }
    }

    #[test]
    fn test_media_file_prefers_container_extension() {
        let probe = ProbeResult::from_streams(
            FormatInfo::new("matroska,webm"),
            vec![Stream::video(0, "h264", 1920)],
        );
        let f = MediaFile::new("/up/movies/Heat/heat.AVI", Some(Path::new("/up/movies")), 10, &probe);
        assert_eq!(f.relative_path, PathBuf::from("Heat/heat.AVI"));
        assert_eq!(f.extension.as_deref(), Some("mkv"));

        let f = MediaFile::new("/up/heat.AVI", None, 10, &ProbeResult::empty());
        assert_eq!(f.extension.as_deref(), Some("avi"));
    }

    #[test]
    fn test_capabilities() {
        let meta = MediaMeta::Movie(MovieMeta {
            file: file("Heat.1995.mkv"),
            confidence: 0.8,
            external_ids: ExternalIds::default(),
            video_format: Some("1080p".to_string()),
            title: Some("Heat".to_string()),
            year: Some(1995),
            part: None,
        });
        assert_eq!(meta.media_type(), MediaType::Movies);
        assert_eq!(meta.title(), Some("Heat"));
        assert_eq!(meta.year(), Some(1995));
        assert_eq!(meta.confidence(), 0.8);
        assert_eq!(meta.video_format(), Some("1080p"));
        assert_eq!(
            meta.destination(Path::new("/lib/movies")),
            Some(PathBuf::from("/lib/movies/Heat (1995)/Heat (1995) 1080p.mkv"))
        );
    }

    #[test]
    fn test_serializes_with_type_tag() {
        let meta = MediaMeta::Show(ShowMeta {
            file: file("Show S01E02.mkv"),
            confidence: 1.0,
            external_ids: ExternalIds::default(),
            video_format: None,
            show_name: Some("Show".to_string()),
            season: Some(1),
            episode: Some(2),
            episode_last: Some(2),
            episode_name: None,
        });
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["type"], "show");
        assert_eq!(json["season"], 1);
    }
}
