//! Path utilities shared by the parsers and the catalog manager.
//!
//! Parsers work on the path *relative to* the scanned base directory so that
//! the upload directory's own name never leaks into a title.

use std::path::{Path, PathBuf};

/// Return the file extension of `path`, lower-cased, without the dot.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use stagehand_common::paths::lowercase_extension;
///
/// assert_eq!(lowercase_extension(Path::new("a/b/Movie.MKV")).as_deref(), Some("mkv"));
/// assert_eq!(lowercase_extension(Path::new("README")), None);
/// ```
pub fn lowercase_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty())
        .map(|ext| ext.to_lowercase())
}

/// Express `path` relative to `base_dir`.
///
/// Falls back to the path with any leading separator removed when `path`
/// does not live under `base_dir` (or no base is given).
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use stagehand_common::paths::relative_to;
///
/// let rel = relative_to(Path::new("/up/movies/Heat (1995)/heat.mkv"), Some(Path::new("/up/movies")));
/// assert_eq!(rel, Path::new("Heat (1995)/heat.mkv"));
/// ```
pub fn relative_to(path: &Path, base_dir: Option<&Path>) -> PathBuf {
    if let Some(base) = base_dir {
        if let Ok(stripped) = path.strip_prefix(base) {
            return stripped.to_path_buf();
        }
    }

    path.strip_prefix("/")
        .map(Path::to_path_buf)
        .unwrap_or_else(|_| path.to_path_buf())
}

/// Split a relative path into its segments with the final extension removed,
/// ordered from the file name backward through its parent directories.
///
/// This is the scan order every path parser uses: the file name carries the
/// most specific information, parent directories fill in what is missing.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use stagehand_common::paths::segments_reversed;
///
/// let segs = segments_reversed(Path::new("Show/Season 1/Show.S01E02.mkv"));
/// assert_eq!(segs, vec!["Show.S01E02", "Season 1", "Show"]);
/// ```
pub fn segments_reversed(relative: &Path) -> Vec<String> {
    let without_ext = match relative.extension() {
        Some(_) => relative.with_extension(""),
        None => relative.to_path_buf(),
    };

    without_ext
        .components()
        .filter_map(|c| match c {
            std::path::Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .filter(|s| !s.trim().is_empty())
        .rev()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowercase_extension() {
        assert_eq!(lowercase_extension(Path::new("movie.mkv")).as_deref(), Some("mkv"));
        assert_eq!(lowercase_extension(Path::new("movie.Mp4")).as_deref(), Some("mp4"));
        assert_eq!(
            lowercase_extension(Path::new("/path/to/song.FLAC")).as_deref(),
            Some("flac")
        );
        assert_eq!(lowercase_extension(Path::new("no_extension")), None);
        assert_eq!(lowercase_extension(Path::new("")), None);
    }

    #[test]
    fn test_relative_to_base() {
        let rel = relative_to(
            Path::new("/uploads/music/Artist/01 - Song.mp3"),
            Some(Path::new("/uploads/music")),
        );
        assert_eq!(rel, PathBuf::from("Artist/01 - Song.mp3"));
    }

    #[test]
    fn test_relative_to_outside_base() {
        let rel = relative_to(Path::new("/elsewhere/a.mkv"), Some(Path::new("/uploads")));
        assert_eq!(rel, PathBuf::from("elsewhere/a.mkv"));

        let rel = relative_to(Path::new("/a.mkv"), None);
        assert_eq!(rel, PathBuf::from("a.mkv"));
    }

    #[test]
    fn test_segments_reversed() {
        assert_eq!(
            segments_reversed(Path::new("The.Matrix.1999.1080p.BluRay.x264-GROUP.mkv")),
            vec!["The.Matrix.1999.1080p.BluRay.x264-GROUP"]
        );
        assert_eq!(
            segments_reversed(Path::new("Artist/Album (2001)/03 - Song.flac")),
            vec!["03 - Song", "Album (2001)", "Artist"]
        );
    }

    #[test]
    fn test_segments_without_extension() {
        assert_eq!(segments_reversed(Path::new("Dir/file")), vec!["file", "Dir"]);
        assert!(segments_reversed(Path::new("")).is_empty());
    }
}
