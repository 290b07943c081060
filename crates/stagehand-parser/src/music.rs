//! Music path parser.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use stagehand_av::ProbeResult;
use stagehand_common::paths::segments_reversed;
use stagehand_common::MediaType;
use std::path::Path;

use crate::arbitrate::MediaParser;
use crate::clean::{clean_field, clean_music, current_year, first_year, years_in};
use crate::config::MusicThresholds;
use crate::confidence::Scorer;
use crate::meta::{ExternalIds, MediaFile, MediaMeta, MusicMeta};

fn rx(pattern: &str) -> Regex {
    Regex::new(pattern).expect("valid regex")
}

/// Whole-segment templates, tried in order.
static TEMPLATES: Lazy<[Regex; 3]> = Lazy::new(|| {
    [
        // <track> - <artist> - <album> - <title>
        rx(r"^(?P<track>\d{1,2})\s*-?\s*(?P<artist>[^-]+)\s*-\s*(?P<album>[^-]+)\s*-\s*(?P<title>[^-]+)$"),
        // <artist> - <album> - <track> - <title>
        rx(r"^(?P<artist>[^-]+)\s*-\s*(?P<album>[^-]+)\s*-\s*(?P<track>\d{1,2})\s*-?\s*(?P<title>[^-]+)$"),
        // <track> - <title>
        rx(r"^\s*(?P<track>\d{1,2})(?:\s*-\s*|\s+)(?P<title>[^-]+)$"),
    ]
});

static TRACK: Lazy<Regex> = Lazy::new(|| rx(r"(?:^|\D)(\d{1,2})\D"));
static ARTIST_ALBUM: Lazy<Regex> = Lazy::new(|| rx(r"^([^-]+?)\s*-\s*([^-]+)$"));
static LEADING_NUMBER: Lazy<Regex> = Lazy::new(|| rx(r"\d+"));

/// Fields recovered from a music path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MusicPath {
    pub artist: Option<String>,
    pub album: Option<String>,
    pub year: Option<u16>,
    pub track: Option<u32>,
    pub title: Option<String>,
}

impl MusicPath {
    fn is_complete(&self) -> bool {
        self.artist.is_some() && self.year.is_some() && self.track.is_some() && self.title.is_some()
    }

    fn fill_from(&mut self, other: MusicPath) {
        if self.artist.is_none() {
            self.artist = other.artist;
        }
        if self.album.is_none() {
            self.album = other.album;
        }
        if self.year.is_none() {
            self.year = other.year;
        }
        if self.track.is_none() {
            self.track = other.track;
        }
        if self.title.is_none() {
            self.title = other.title;
        }
    }
}

fn track_number(s: &str) -> Option<u32> {
    s.trim().parse().ok().filter(|n| *n > 0)
}

fn from_template(caps: &Captures<'_>) -> MusicPath {
    let field = |name: &str| caps.name(name).and_then(|m| clean_field(m.as_str()));
    MusicPath {
        artist: field("artist"),
        album: field("album"),
        year: None,
        track: caps.name("track").and_then(|m| track_number(m.as_str())),
        title: field("title"),
    }
}

/// Positional fallback when no template matches: a year and a short track
/// number split the segment into artist, album and title spans.
fn from_positions(text: &str) -> MusicPath {
    let mut parsed = MusicPath::default();

    let year = years_in(text, current_year()).into_iter().next();
    let track = TRACK.captures(text).and_then(|caps| {
        let m = caps.get(1)?;
        Some((track_number(m.as_str())?, m.range()))
    });

    if let Some((y, range)) = &year {
        parsed.year = Some(*y);
        if range.start > 2 {
            let before = clean_music_span(&text[..range.start]);
            match before.as_deref().and_then(|b| ARTIST_ALBUM.captures(b)) {
                Some(caps) => {
                    parsed.artist = clean_field(&caps[1]);
                    parsed.album = clean_field(&caps[2]);
                }
                None => parsed.album = before,
            }
        } else {
            parsed.album = clean_field(&text[range.end..]);
        }
    }

    if let Some((n, range)) = &track {
        parsed.track = Some(*n);
        parsed.title = clean_field(&text[range.end..]);
        if range.start > 1 {
            parsed.album = match &year {
                Some((_, y)) if y.start < range.start => clean_field(&text[y.end..range.start]),
                _ => clean_field(&text[..range.start]),
            };
        }
    }

    if parsed.album.is_none() && parsed.artist.is_none() {
        match &year {
            Some((_, range)) => parsed.album = clean_field(&text[range.end..]),
            None => parsed.artist = clean_field(text),
        }
    }

    parsed
}

fn clean_music_span(s: &str) -> Option<String> {
    let trimmed = s.trim_matches(|c: char| c == ' ' || c == '-');
    Some(trimmed.to_string()).filter(|s| !s.is_empty())
}

/// Parse a single path segment.
///
/// ```
/// use stagehand_parser::music::parse_segment;
///
/// let parsed = parse_segment("03 - Artist - Album - Song");
/// assert_eq!(parsed.track, Some(3));
/// assert_eq!(parsed.artist.as_deref(), Some("Artist"));
/// assert_eq!(parsed.album.as_deref(), Some("Album"));
/// assert_eq!(parsed.title.as_deref(), Some("Song"));
/// ```
pub fn parse_segment(segment: &str) -> MusicPath {
    let text = clean_music(segment);

    let mut parsed = TEMPLATES
        .iter()
        .find_map(|template| template.captures(&text))
        .map(|caps| from_template(&caps))
        .unwrap_or_else(|| from_positions(&text));

    if parsed.artist.as_ref().is_some_and(|a| a.chars().count() < 2) {
        parsed.artist = None;
    }
    parsed
}

/// Parse a relative path, file name first, until artist, year, track and
/// title resolve.
pub fn parse_path(relative: &Path) -> MusicPath {
    let mut parsed = MusicPath::default();
    for segment in segments_reversed(relative) {
        if parsed.is_complete() {
            break;
        }
        parsed.fill_from(parse_segment(&segment));
    }
    parsed
}

/// Apply embedded container tags over path-derived fields.
///
/// An album artist tag takes precedence over a plain artist tag.
fn apply_tags(parsed: &mut MusicPath, probe: &ProbeResult) {
    let mut album_artist = None;
    let mut artist = None;

    for (key, value) in probe.tags() {
        let value = value.trim();
        if value.is_empty() {
            continue;
        }
        let key: String = key
            .chars()
            .filter(|c| c.is_alphanumeric())
            .flat_map(char::to_lowercase)
            .collect();
        match key.as_str() {
            "albumartist" => album_artist = Some(value.to_string()),
            "artist" => artist = Some(value.to_string()),
            "album" => parsed.album = Some(value.to_string()),
            "date" | "year" => {
                if let Some(year) = first_year(value) {
                    parsed.year = Some(year);
                }
            }
            "track" | "tracknumber" => {
                if let Some(track) = LEADING_NUMBER
                    .find(value)
                    .and_then(|m| track_number(m.as_str()))
                {
                    parsed.track = Some(track);
                }
            }
            "title" => parsed.title = Some(value.to_string()),
            _ => {}
        }
    }

    if let Some(a) = album_artist.or(artist) {
        parsed.artist = Some(a);
    }
}

/// Music classifier.
#[derive(Debug, Clone, Default)]
pub struct MusicParser {
    thresholds: MusicThresholds,
}

impl MusicParser {
    pub fn new(thresholds: MusicThresholds) -> Self {
        Self { thresholds }
    }

    pub fn parse(&self, file: &MediaFile, probe: &ProbeResult) -> MusicMeta {
        let mut parsed = parse_path(&file.relative_path);
        apply_tags(&mut parsed, probe);

        let confidence = if probe.has_audio() {
            let path: Scorer = [
                parsed.artist.is_some(),
                parsed.album.is_some(),
                parsed.track.is_some(),
            ]
            .into_iter()
            .collect();
            let media: Scorer = [!probe.has_video(), file.size < self.thresholds.max_size]
                .into_iter()
                .collect();
            Scorer::weighted(&[(0.3, path.rate()), (0.7, media.rate())])
        } else {
            0.0
        };

        MusicMeta {
            file: file.clone(),
            confidence,
            external_ids: ExternalIds::default(),
            video_format: probe.video_format(),
            artist: parsed.artist,
            album: parsed.album,
            year: parsed.year,
            track: parsed.track,
            title: parsed.title,
        }
    }
}

impl MediaParser for MusicParser {
    fn media_type(&self) -> MediaType {
        MediaType::Music
    }

    fn classify(&self, file: &MediaFile, probe: &ProbeResult) -> MediaMeta {
        MediaMeta::Music(self.parse(file, probe))
    }
}
