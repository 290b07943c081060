//! Text cleaning shared by the path parsers.
//!
//! Release names carry a lot of noise: scene groups, source and resolution
//! tags, codec names. The deletion lists below strip that noise on word
//! boundaries so that words merely containing a tag (e.g. "Shadow") survive.

use chrono::Datelike;
use once_cell::sync::Lazy;
use regex::Regex;
use std::ops::Range;

fn rx(pattern: &str) -> Regex {
    Regex::new(pattern).expect("valid regex")
}

/// `-GROUP` directly after a codec, source or resolution token.
static TRAILING_GROUP: Lazy<Regex> = Lazy::new(|| {
    rx(r"(?i)\b(?P<tok>x26[45]|h\.?26[45]|hevc|avc|xvid|divx|\d{3,4}[pi]|4k|blu-?ray|web-?dl|web-?rip|hdtv|dvd-?rip|bd-?rip|aac|ac3|dts|flac|mp3)-[a-z0-9]+\b")
});

/// Ordered deletion lists: scene groups, sources, resolutions, video codecs,
/// audio codecs.
static MEDIA_TAGS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        rx(r"(?i)-(?:2HD|aAF|AMIABLE|AVCHD|BATV|BLOW|BRMP|BTN|BTW|CiNEFiLE|CREEPSHOW|CROOKS|CULTHD|DEFLATE|DIMENSION|ehMD|EVO|EVOLVE|FGT|GECKOS|GUACAMOLE|HDB|hV|KILLERS|KiNGS|LiBRARiANS|MARS|MAXSPEED|MCH|MOROSE|MOVEE|mSD|NOGRP|NTb|PSYCHD|REMARKABLE|SADPANDA|SB|SERIOUSLY|SiNNERS|SORNY|SPARKS|SPRiNTER|RARBG|RTN|TASTETV|TiMELORDS|TrollU?HD|VoMiT|W4F)\b"),
        rx(r"(?i)\[(?:ettv|rarbg|rartv|eztv)\]|\bMVGroup(?:\.org)?\b|\bwww\.torrenting\.com\b"),
        rx(r"(?i)\b(?:hd\W?dvd(?:\W?rip)?|dvd(?:\W?rip)?|blu-?ray|bd(?:\W?rip)?|hdtv(?:\W?rip)?|tv\W?rip|web\W?(?:rip|dl))\b"),
        rx(r"(?i)\b(?:4k|2160p|1080[ip]|720p|480p|hd|sd)\b"),
        rx(r"(?i)\b(?:x26[45]|h\.?26[45]|hevc|mpe?g-?[24]?|(?:8|10)-?bit|xvid|divx)\b"),
        rx(r"(?i)\b(?:ac\W?3(?:\W?\d\.\d)?|dd\+?\W?\d\.\d|aac(?:\W?\d\.\d)?|mp3(?:\W?\d\.\d)?|dts(?:-?hd)?|truehd)\b"),
    ]
});

static FEATURE_TAGS: Lazy<Regex> = Lazy::new(|| {
    rx(r"(?i)\b(?:directors?(?:\W*cut)?|extended(?:\W*edition)?|internal|remastered|theatrical(?:\W*release)?|uncut|unrated)\b")
});

static MUSIC_FORMAT_TAGS: Lazy<Regex> = Lazy::new(|| {
    rx(r"(?i)\b(?:flac|ape|wav|(?:mp3|mp4|aac|ogg|vorbis)(?:\s?\d+\s?k(?:bps|bits?)?)?)\b")
});

static YEAR: Lazy<Regex> = Lazy::new(|| rx(r"\b(?:19|20)\d{2}\b"));

static SPACES: Lazy<Regex> = Lazy::new(|| rx(r" {2,}"));

/// The current calendar year; extracted years never exceed it.
pub fn current_year() -> u16 {
    u16::try_from(chrono::Local::now().year()).unwrap_or(u16::MAX)
}

/// Replace everything but alphanumerics, spaces and `-` with a space,
/// collapse runs of spaces, and trim separators from both ends.
///
/// ```
/// use stagehand_parser::clean::clean_string;
///
/// assert_eq!(clean_string("The.Matrix_(1999)"), "The Matrix 1999");
/// assert_eq!(clean_string(" - Song - "), "Song");
/// ```
pub fn clean_string(s: &str) -> String {
    let replaced: String = s
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == ' ' || c == '-' {
                c
            } else {
                ' '
            }
        })
        .collect();
    SPACES
        .replace_all(&replaced, " ")
        .trim_matches(|c: char| c == ' ' || c == '-')
        .to_string()
}

/// [`clean_string`], with an empty result mapped to `None`.
pub fn clean_field(s: &str) -> Option<String> {
    Some(clean_string(s)).filter(|s| !s.is_empty())
}

/// Delete release noise from `s`, keeping the original separators.
///
/// Tags are replaced by a space so byte offsets into the result stay
/// meaningful for the pattern matchers.
pub fn strip_media_tags(s: &str) -> String {
    let mut out = TRAILING_GROUP.replace_all(s, "${tok}").into_owned();
    for tag in MEDIA_TAGS.iter() {
        out = tag.replace_all(&out, " ").into_owned();
    }
    out
}

/// Delete release noise and clean the result.
///
/// ```
/// use stagehand_parser::clean::clean_media;
///
/// assert_eq!(
///     clean_media("The.Matrix.1999.1080p.BluRay.x264-GROUP"),
///     "The Matrix 1999"
/// );
/// ```
pub fn clean_media(s: &str) -> String {
    clean_string(&strip_media_tags(s))
}

/// Remove edition tags such as "Director's Cut" or "Unrated".
pub fn strip_feature_tags(s: &str) -> String {
    clean_string(&FEATURE_TAGS.replace_all(s, " "))
}

/// Normalise a music path segment.
///
/// Keeps alphanumerics and `. _ -`, turns `.`/`_` into `-`, collapses
/// repeated separators, and when more than three separators remain treats
/// them all as spaces. Audio format tags are removed.
pub fn clean_music(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        let c = match c {
            '.' | '_' => '-',
            c if c.is_alphanumeric() || c == ' ' || c == '-' => c,
            _ => ' ',
        };
        if c == '-' && out.ends_with('-') {
            continue;
        }
        out.push(c);
    }

    if out.matches('-').count() > 3 {
        out = out.replace('-', " ");
    }

    let out = MUSIC_FORMAT_TAGS.replace_all(&out, " ");
    SPACES.replace_all(out.trim(), " ").into_owned()
}

/// Make a string safe to use as a single path component.
///
/// ```
/// use stagehand_parser::clean::sanitize_path;
///
/// assert_eq!(sanitize_path("Mission: Impossible"), "Mission - Impossible");
/// assert_eq!(sanitize_path("Tom & Jerry?"), "Tom and Jerry");
/// assert_eq!(sanitize_path("AC/DC"), "AC-DC");
/// ```
pub fn sanitize_path(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '*' | '?' => {}
            '&' => {
                while out.ends_with(' ') {
                    out.pop();
                }
                out.push_str(" and ");
                while chars.peek() == Some(&' ') {
                    chars.next();
                }
            }
            ':' if chars.peek() == Some(&' ') => out.push_str(" -"),
            ':' | '\\' | '/' => out.push('-'),
            c => out.push(c),
        }
    }
    SPACES.replace_all(&out, " ").trim().to_string()
}

/// Every plausible year in `s` no later than `max_year`, with its byte range.
pub fn years_in(s: &str, max_year: u16) -> Vec<(u16, Range<usize>)> {
    YEAR.find_iter(s)
        .filter_map(|m| {
            let year: u16 = m.as_str().parse().ok()?;
            (year <= max_year).then(|| (year, m.range()))
        })
        .collect()
}

/// The first plausible year in `s`, if any.
pub fn first_year(s: &str) -> Option<u16> {
    years_in(s, current_year()).first().map(|(y, _)| *y)
}
