//! Movie path parser.
//!
//! Each path segment is cleaned of release noise, then the right-most year
//! and the first `part N` marker split it: whatever precedes the earlier of
//! the two is the title.
//!
//! When enabled, `.nfo` and `.txt` files in the movie's own folder are read
//! for an IMDb id or a TMDB movie URL.

use once_cell::sync::Lazy;
use regex::Regex;
use stagehand_av::ProbeResult;
use stagehand_common::paths::segments_reversed;
use stagehand_common::MediaType;
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::arbitrate::MediaParser;
use crate::clean::{
    clean_field, clean_media, current_year, first_year, strip_feature_tags, years_in,
};
use crate::config::MovieThresholds;
use crate::confidence::Scorer;
use crate::meta::{ExternalIds, MediaFile, MediaMeta, MovieMeta};

static PART: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:p(?:ar)?t|cd|disc)\s*(\d{1,2})\b").expect("valid regex")
});

static SUPPORT_IDS: Lazy<[Regex; 2]> = Lazy::new(|| {
    [
        Regex::new(r"\b(tt\d{7,8})\b").expect("valid regex"),
        Regex::new(r"(?i)https?://\S*themoviedb\.org/movie/(\d+)").expect("valid regex"),
    ]
});

const SUPPORT_EXTENSIONS: &[&str] = &["nfo", "txt"];

/// First movie id found in one support file's text, checked line by line.
pub fn parse_support_text(text: &str) -> Option<String> {
    text.lines().find_map(|line| {
        SUPPORT_IDS
            .iter()
            .find_map(|re| re.captures(line))
            .and_then(|caps| caps.get(1))
            .map(|id| id.as_str().to_string())
    })
}

/// Look for a movie id in support files beside `file`.
///
/// Only the movie's own folder is searched; a file sitting directly in the
/// scanned base directory has no folder of its own, so nothing is read.
/// Files are read in name order and the first id found wins.
pub fn support_file_id(file: &MediaFile) -> Option<String> {
    let in_own_folder = file
        .relative_path
        .parent()
        .is_some_and(|parent| !parent.as_os_str().is_empty());
    if !in_own_folder {
        return None;
    }
    let dir = file.path.parent()?;

    let mut candidates: Vec<_> = match fs::read_dir(dir) {
        Ok(entries) => entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .filter(|path| {
                stagehand_common::paths::lowercase_extension(path)
                    .is_some_and(|ext| SUPPORT_EXTENSIONS.contains(&ext.as_str()))
            })
            .collect(),
        Err(e) => {
            debug!(dir = %dir.display(), "Cannot list support files: {}", e);
            return None;
        }
    };
    candidates.sort();

    candidates.iter().find_map(|path| match fs::read(path) {
        Ok(bytes) => parse_support_text(&String::from_utf8_lossy(&bytes)),
        Err(e) => {
            debug!(path = %path.display(), "Cannot read support file: {}", e);
            None
        }
    })
}

/// Fields recovered from a movie path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MoviePath {
    pub title: Option<String>,
    pub year: Option<u16>,
    pub part: Option<u32>,
}

impl MoviePath {
    fn is_complete(&self) -> bool {
        self.title.is_some() && self.year.is_some()
    }

    fn fill_from(&mut self, other: MoviePath) {
        if self.title.is_none() {
            self.title = other.title;
        }
        if self.year.is_none() {
            self.year = other.year;
        }
        if self.part.is_none() {
            self.part = other.part;
        }
    }
}

/// Parse a single path segment.
///
/// ```
/// use stagehand_parser::movie::parse_segment;
///
/// let parsed = parse_segment("The.Matrix.1999.1080p.BluRay.x264-GROUP", 2024);
/// assert_eq!(parsed.title.as_deref(), Some("The Matrix"));
/// assert_eq!(parsed.year, Some(1999));
/// ```
pub fn parse_segment(segment: &str, max_year: u16) -> MoviePath {
    let cleaned = clean_media(segment);

    let year = years_in(&cleaned, max_year).pop();

    let part = PART.captures(&cleaned).and_then(|caps| {
        let number: u32 = caps.get(1)?.as_str().parse().ok()?;
        let start = caps.get(0)?.start();
        (number > 0).then_some((number, start))
    });

    let cut = [
        year.as_ref().map(|(_, range)| range.start),
        part.map(|(_, start)| start),
    ]
    .into_iter()
    .flatten()
    .min();

    let head = match cut {
        Some(pos) => &cleaned[..pos],
        None => cleaned.as_str(),
    };

    MoviePath {
        title: clean_field(&strip_feature_tags(head)),
        year: year.map(|(y, _)| y),
        part: part.map(|(n, _)| n),
    }
}

/// Parse a relative path, file name first, until title and year resolve.
pub fn parse_path(relative: &Path) -> MoviePath {
    let max_year = current_year();
    let mut parsed = MoviePath::default();
    for segment in segments_reversed(relative) {
        if parsed.is_complete() {
            break;
        }
        parsed.fill_from(parse_segment(&segment, max_year));
    }
    parsed
}

/// Movie classifier.
#[derive(Debug, Clone, Default)]
pub struct MovieParser {
    thresholds: MovieThresholds,
}

impl MovieParser {
    pub fn new(thresholds: MovieThresholds) -> Self {
        Self { thresholds }
    }

    pub fn parse(&self, file: &MediaFile, probe: &ProbeResult) -> MovieMeta {
        let mut parsed = parse_path(&file.relative_path);

        // Embedded tags only fill what the path could not; a title tag never
        // replaces a title parsed from the path.
        if parsed.title.is_none() {
            if let Some(tag_title) = probe.title() {
                parsed.fill_from(parse_segment(tag_title, current_year()));
            }
        }
        if parsed.year.is_none() {
            parsed.year = probe
                .tag("date")
                .or_else(|| probe.tag("year"))
                .and_then(first_year);
        }

        let confidence = self.confidence(&parsed, file, probe);

        let external_ids = ExternalIds {
            movie_id: self
                .thresholds
                .support_files
                .then(|| support_file_id(file))
                .flatten(),
            ..ExternalIds::default()
        };

        MovieMeta {
            file: file.clone(),
            confidence,
            external_ids,
            video_format: probe.video_format(),
            title: parsed.title,
            year: parsed.year,
            part: parsed.part,
        }
    }

    fn confidence(&self, parsed: &MoviePath, file: &MediaFile, probe: &ProbeResult) -> f64 {
        if !probe.has_video() {
            return 0.0;
        }

        let path: Scorer = [parsed.title.is_some(), parsed.year.is_some()]
            .into_iter()
            .collect();

        let long_enough = probe
            .duration()
            .is_some_and(|d| d >= self.thresholds.min_duration);
        let media: Scorer = [
            long_enough,
            probe.has_video(),
            file.size >= self.thresholds.min_size,
        ]
        .into_iter()
        .collect();

        Scorer::weighted(&[(0.5, path.rate()), (0.5, media.rate())])
    }
}

impl MediaParser for MovieParser {
    fn media_type(&self) -> MediaType {
        MediaType::Movies
    }

    fn classify(&self, file: &MediaFile, probe: &ProbeResult) -> MediaMeta {
        MediaMeta::Movie(self.parse(file, probe))
    }
}
