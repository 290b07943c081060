//! Catalog row models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use stagehand_common::MediaType;

/// Type-specific columns of a catalog row.
///
/// Marker rows written for low-confidence files leave every field `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CatalogFields {
    Movie {
        title: Option<String>,
        year: Option<u16>,
        part: Option<u32>,
        movie_id: Option<String>,
    },
    Show {
        show_name: Option<String>,
        season: Option<u32>,
        episode: Option<u32>,
        episode_last: Option<u32>,
        episode_name: Option<String>,
        show_id: Option<String>,
        episode_id: Option<String>,
    },
    Music {
        artist: Option<String>,
        album: Option<String>,
        year: Option<u16>,
        track: Option<u32>,
        title: Option<String>,
        artist_id: Option<String>,
        album_id: Option<String>,
        track_id: Option<String>,
    },
}

impl CatalogFields {
    /// All-`None` fields for `media_type`.
    pub fn empty(media_type: MediaType) -> Self {
        match media_type {
            MediaType::Movies => Self::Movie {
                title: None,
                year: None,
                part: None,
                movie_id: None,
            },
            MediaType::Shows => Self::Show {
                show_name: None,
                season: None,
                episode: None,
                episode_last: None,
                episode_name: None,
                show_id: None,
                episode_id: None,
            },
            MediaType::Music => Self::Music {
                artist: None,
                album: None,
                year: None,
                track: None,
                title: None,
                artist_id: None,
                album_id: None,
                track_id: None,
            },
        }
    }

    pub fn media_type(&self) -> MediaType {
        match self {
            Self::Movie { .. } => MediaType::Movies,
            Self::Show { .. } => MediaType::Shows,
            Self::Music { .. } => MediaType::Music,
        }
    }

    /// Display title: movie title, show name, or track title.
    pub fn title(&self) -> Option<&str> {
        match self {
            Self::Movie { title, .. } | Self::Music { title, .. } => title.as_deref(),
            Self::Show { show_name, .. } => show_name.as_deref(),
        }
    }
}

/// Processing flags stored alongside every row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryStatus {
    pub is_processed: bool,
    pub already_exists: bool,
    pub is_upgrade: bool,
}

/// A persisted catalog row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: i64,
    pub path: String,
    pub confidence: f64,
    pub status: EntryStatus,
    pub fields: CatalogFields,
    pub updated_at: DateTime<Utc>,
}

impl CatalogEntry {
    pub fn media_type(&self) -> MediaType {
        self.fields.media_type()
    }
}
