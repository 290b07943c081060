//! Core type definitions shared by the parser, catalog and manager.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of media a file is classified as.
///
/// Each kind has its own upload directory, parser and catalog table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    /// Feature films.
    Movies,
    /// TV episodes.
    Shows,
    /// Music tracks.
    Music,
}

impl MediaType {
    /// All media types, in arbitration order (music, show, movie).
    pub const ALL: [MediaType; 3] = [MediaType::Music, MediaType::Shows, MediaType::Movies];

    /// Singular label used in log lines and CLI output.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Movies => "movie",
            Self::Shows => "show",
            Self::Music => "music",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Movies => write!(f, "movies"),
            Self::Shows => write!(f, "shows"),
            Self::Music => write!(f, "music"),
        }
    }
}

impl std::str::FromStr for MediaType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "movies" | "movie" => Ok(Self::Movies),
            "shows" | "show" | "tv" => Ok(Self::Shows),
            "music" => Ok(Self::Music),
            _ => Err(format!("Invalid media type: {}", s)),
        }
    }
}
