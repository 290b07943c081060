//! Destination names for classified files.
//!
//! | Type  | Directory              | File                                  |
//! |-------|------------------------|---------------------------------------|
//! | movie | `Title (Year)`         | `Title (Year) 1080p part2.mkv`        |
//! | show  | `Show/Season 02`       | `Show s02e05-e06 Episode Name.mkv`    |
//! | music | `Artist/Album (Year)`  | `03. Title.flac`                      |

use std::path::PathBuf;

use crate::clean::sanitize_path;
use crate::meta::{MovieMeta, MusicMeta, ShowMeta};

fn with_extension(mut name: String, extension: Option<&str>) -> String {
    if let Some(ext) = extension.filter(|e| !e.is_empty()) {
        name.push('.');
        name.push_str(ext);
    }
    name
}

fn titled(title: &str, year: Option<u16>) -> String {
    let mut out = sanitize_path(title);
    if let Some(year) = year {
        out.push_str(&format!(" ({})", year));
    }
    out
}

pub fn movie_dir(movie: &MovieMeta) -> Option<PathBuf> {
    let title = movie.title.as_deref()?;
    Some(PathBuf::from(titled(title, movie.year)))
}

pub fn movie_file(movie: &MovieMeta) -> Option<String> {
    let title = movie.title.as_deref()?;
    let mut out = titled(title, movie.year);
    if let Some(format) = &movie.video_format {
        out.push(' ');
        out.push_str(format);
    }
    if let Some(part) = movie.part {
        out.push_str(&format!(" part{}", part));
    }
    Some(with_extension(out, movie.file.extension.as_deref()))
}

pub fn show_dir(show: &ShowMeta) -> Option<PathBuf> {
    let mut dir = PathBuf::from(sanitize_path(show.show_name.as_deref()?));
    if let Some(season) = show.season {
        dir.push(format!("Season {:02}", season));
    }
    Some(dir)
}

pub fn show_file(show: &ShowMeta) -> Option<String> {
    let mut out = sanitize_path(show.show_name.as_deref()?);
    if let (Some(season), Some(episode)) = (show.season, show.episode) {
        out.push_str(&format!(" s{:02}e{:02}", season, episode));
        if let Some(last) = show.episode_last.filter(|last| *last != episode) {
            out.push_str(&format!("-e{:02}", last));
        }
    }
    if let Some(name) = &show.episode_name {
        out.push(' ');
        out.push_str(&sanitize_path(name));
    }
    Some(with_extension(out, show.file.extension.as_deref()))
}

pub fn music_dir(music: &MusicMeta) -> Option<PathBuf> {
    let mut dir = PathBuf::from(sanitize_path(music.artist.as_deref()?));
    if let Some(album) = &music.album {
        dir.push(titled(album, music.year));
    }
    Some(dir)
}

pub fn music_file(music: &MusicMeta) -> Option<String> {
    let mut out = String::new();
    if let Some(track) = music.track {
        out.push_str(&format!("{:02}.", track));
    }
    if let Some(title) = &music.title {
        out.push(' ');
        out.push_str(&sanitize_path(title));
    }
    let out = out.trim().to_string();
    if out.is_empty() {
        return None;
    }
    Some(with_extension(out, music.file.extension.as_deref()))
}
