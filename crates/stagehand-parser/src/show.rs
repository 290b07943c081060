//! TV show path parser.
//!
//! Segments are matched against an ordered list of [`ShowPattern`]s; the
//! first pattern that matches decides the segment. Text before the match is
//! the show name, text after it the episode name.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use stagehand_av::ProbeResult;
use stagehand_common::paths::segments_reversed;
use stagehand_common::MediaType;
use std::path::Path;

use crate::arbitrate::MediaParser;
use crate::clean::{clean_field, strip_media_tags};
use crate::confidence::Scorer;
use crate::meta::{ExternalIds, MediaFile, MediaMeta, ShowMeta};

fn rx(pattern: &str) -> Regex {
    Regex::new(pattern).expect("valid regex")
}

static SEASON_EPISODE: Lazy<Regex> = Lazy::new(|| {
    rx(r"(?i)\bs(\d{1,2})[\s._-]*(e\d{1,3}(?:(?:[\s._]*e|-e?|\+e?|&e?)\d{1,3})*)\b")
});
static NUMERIC_CROSS: Lazy<Regex> =
    Lazy::new(|| rx(r"(?i)\b(\d{1,2})(x\d{1,3}(?:\s*[x&+-]\s*\d{1,3})*)\b"));
static SEASON_ONLY: Lazy<Regex> = Lazy::new(|| rx(r"(?i)\bs(?:eason)?[\s._-]?(\d{1,2})\b"));
static LEADING_EPISODE: Lazy<Regex> =
    Lazy::new(|| rx(r"(?i)^[\s._-]*(?:p(?:ar)?t[\s._-]*)?(\d{1,3})\b"));
static MINISERIES: Lazy<Regex> =
    Lazy::new(|| rx(r"(?i)\b(\d{1,2})[\s._-]*of[\s._-]*(\d{1,2})\b"));
static NUMBER: Lazy<Regex> = Lazy::new(|| rx(r"\d{1,3}"));

/// One strategy for finding season/episode numbers in a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShowPattern {
    /// `S02E05`, `s01e01e02`, `S01E01-E03`, `S01 E01+E02`
    SeasonEpisode,
    /// `2x05`, `1x01-02`, `3x01&3x02`
    NumericCross,
    /// `S02`, `Season 2`
    SeasonOnly,
    /// `05 - Title`, `Part 3`
    LeadingEpisode,
    /// `3 of 6`; the season is taken to be 1
    Miniseries,
}

/// The cascade, in the order it is tried.
pub const SHOW_PATTERNS: [ShowPattern; 5] = [
    ShowPattern::SeasonEpisode,
    ShowPattern::NumericCross,
    ShowPattern::SeasonOnly,
    ShowPattern::LeadingEpisode,
    ShowPattern::Miniseries,
];

/// A successful pattern match over a segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShowMatch {
    pub pattern: ShowPattern,
    pub season: Option<u32>,
    pub episode: Option<u32>,
    pub episode_last: Option<u32>,
    /// Byte range of the match within the segment.
    pub start: usize,
    pub end: usize,
}

/// Season and episode numbers are positive; a zero reads as unknown.
fn number(caps: &Captures<'_>, group: usize) -> Option<u32> {
    caps.get(group)?.as_str().parse().ok().filter(|n| *n > 0)
}

/// First and last episode numbers in a multi-episode list.
fn episode_range(list: &str) -> (Option<u32>, Option<u32>) {
    let numbers: Vec<u32> = NUMBER
        .find_iter(list)
        .filter_map(|m| m.as_str().parse().ok())
        .filter(|n| *n > 0)
        .collect();
    (numbers.first().copied(), numbers.last().copied())
}

impl ShowPattern {
    pub fn name(&self) -> &'static str {
        match self {
            Self::SeasonEpisode => "season-episode",
            Self::NumericCross => "numeric-cross",
            Self::SeasonOnly => "season-only",
            Self::LeadingEpisode => "leading-episode",
            Self::Miniseries => "miniseries",
        }
    }

    /// Try this pattern against `text`.
    pub fn find(&self, text: &str) -> Option<ShowMatch> {
        let regex = match self {
            Self::SeasonEpisode => &*SEASON_EPISODE,
            Self::NumericCross => &*NUMERIC_CROSS,
            Self::SeasonOnly => &*SEASON_ONLY,
            Self::LeadingEpisode => &*LEADING_EPISODE,
            Self::Miniseries => &*MINISERIES,
        };
        let caps = regex.captures(text)?;
        let whole = caps.get(0)?;

        let (season, episode, episode_last) = match self {
            Self::SeasonEpisode | Self::NumericCross => {
                let (first, last) = episode_range(caps.get(2)?.as_str());
                (number(&caps, 1), first, last)
            }
            Self::SeasonOnly => (number(&caps, 1), None, None),
            Self::LeadingEpisode => {
                let episode = number(&caps, 1);
                (None, episode, episode)
            }
            Self::Miniseries => {
                let episode = number(&caps, 1);
                (Some(1), episode, episode)
            }
        };

        Some(ShowMatch {
            pattern: *self,
            season,
            episode,
            episode_last,
            start: whole.start(),
            end: whole.end(),
        })
    }
}

/// Fields recovered from a show path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShowPath {
    pub show_name: Option<String>,
    pub season: Option<u32>,
    pub episode: Option<u32>,
    pub episode_last: Option<u32>,
    pub episode_name: Option<String>,
}

impl ShowPath {
    fn is_complete(&self) -> bool {
        self.show_name.is_some() && self.season.is_some() && self.episode.is_some()
    }

    fn fill_from(&mut self, other: ShowPath) {
        if self.show_name.is_none() {
            self.show_name = other.show_name;
        }
        if self.season.is_none() {
            self.season = other.season;
        }
        if self.episode.is_none() && other.episode.is_some() {
            self.episode = other.episode;
            self.episode_last = other.episode_last;
        }
        if self.episode_name.is_none() {
            self.episode_name = other.episode_name;
        }
    }
}

/// Parse a single path segment with the pattern cascade.
///
/// ```
/// use stagehand_parser::show::parse_segment;
///
/// let parsed = parse_segment("Show.Name.S02E05.720p.HDTV.x264-GROUP");
/// assert_eq!(parsed.show_name.as_deref(), Some("Show Name"));
/// assert_eq!(parsed.season, Some(2));
/// assert_eq!(parsed.episode, Some(5));
/// ```
pub fn parse_segment(segment: &str) -> ShowPath {
    let text = strip_media_tags(segment);

    let Some(found) = SHOW_PATTERNS.iter().find_map(|p| p.find(&text)) else {
        return ShowPath::default();
    };

    let show_name = match found.pattern {
        ShowPattern::LeadingEpisode => None,
        _ => clean_field(&text[..found.start]),
    };
    let episode_name = match found.pattern {
        ShowPattern::SeasonOnly => None,
        _ => clean_field(&text[found.end..]),
    };

    ShowPath {
        show_name,
        season: found.season,
        episode: found.episode,
        episode_last: found.episode_last.or(found.episode),
        episode_name,
    }
}

/// Parse a relative path, file name first, until show name, season and
/// episode resolve.
///
/// A parent directory that matches no pattern is taken as the show name.
pub fn parse_path(relative: &Path) -> ShowPath {
    let mut parsed = ShowPath::default();
    for (depth, segment) in segments_reversed(relative).into_iter().enumerate() {
        if parsed.is_complete() {
            break;
        }
        let mut segment_parse = parse_segment(&segment);
        if depth > 0 && segment_parse == ShowPath::default() {
            segment_parse.show_name = clean_field(&strip_media_tags(&segment));
        }
        parsed.fill_from(segment_parse);
    }
    parsed
}

/// TV show classifier.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShowParser;

impl ShowParser {
    pub fn new() -> Self {
        Self
    }

    pub fn parse(&self, file: &MediaFile, probe: &ProbeResult) -> ShowMeta {
        let parsed = parse_path(&file.relative_path);

        let confidence = if probe.has_video() {
            let scorer: Scorer = [
                parsed.show_name.is_some(),
                parsed.season.is_some(),
                parsed.episode.is_some(),
            ]
            .into_iter()
            .collect();
            scorer.rate()
        } else {
            0.0
        };

        ShowMeta {
            file: file.clone(),
            confidence,
            external_ids: ExternalIds::default(),
            video_format: probe.video_format(),
            show_name: parsed.show_name,
            season: parsed.season,
            episode: parsed.episode,
            episode_last: parsed.episode_last,
            episode_name: parsed.episode_name,
        }
    }
}

impl MediaParser for ShowParser {
    fn media_type(&self) -> MediaType {
        MediaType::Shows
    }

    fn classify(&self, file: &MediaFile, probe: &ProbeResult) -> MediaMeta {
        MediaMeta::Show(self.parse(file, probe))
    }
}
