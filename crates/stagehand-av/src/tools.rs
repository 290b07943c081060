//! Locating the external prober.

use crate::{Error, Result};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Availability of one external binary.
#[derive(Debug, Clone)]
pub struct ToolInfo {
    /// Name or path the tool was looked up by.
    pub name: String,
    /// Resolved executable, when found.
    pub path: Option<PathBuf>,
    /// Version reported by `-version`, e.g. `6.1.1`.
    pub version: Option<String>,
}

impl ToolInfo {
    pub fn available(&self) -> bool {
        self.path.is_some() && self.version.is_some()
    }
}

/// Resolve `binary` to an executable path.
///
/// A bare name is searched on `PATH`; anything with a directory component
/// must exist as given.
pub fn locate(binary: &Path) -> Result<PathBuf> {
    if binary.components().count() > 1 {
        return if binary.is_file() {
            Ok(binary.to_path_buf())
        } else {
            Err(Error::prober_missing(binary))
        };
    }
    which::which(binary).map_err(|_| Error::prober_missing(binary))
}

/// Pull the version token out of ffmpeg-style `-version` output.
///
/// `"ffprobe version 6.1.1-3ubuntu5 Copyright ..."` yields `"6.1.1-3ubuntu5"`.
fn parse_version(output: &str) -> Option<String> {
    let first = output.lines().next()?;
    let mut words = first.split_whitespace();
    while let Some(word) = words.next() {
        if word == "version" {
            return words.next().map(str::to_string);
        }
    }
    let trimmed = first.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Look up `binary` and ask it for its version.
///
/// ```no_run
/// use std::path::Path;
/// use stagehand_av::check_tool;
///
/// let info = check_tool(Path::new("ffprobe"));
/// if info.available() {
///     println!("ffprobe {}", info.version.unwrap_or_default());
/// }
/// ```
pub fn check_tool(binary: &Path) -> ToolInfo {
    let name = binary.display().to_string();
    let Ok(path) = locate(binary) else {
        return ToolInfo {
            name,
            path: None,
            version: None,
        };
    };

    let version = Command::new(&path)
        .arg("-version")
        .output()
        .ok()
        .filter(|out| out.status.success())
        .and_then(|out| parse_version(&String::from_utf8_lossy(&out.stdout)));

    ToolInfo {
        name,
        path: Some(path),
        version,
    }
}

/// Check every binary the classifier shells out to.
///
/// `ffprobe` is checked at `configured` when given, else on `PATH`.
pub fn check_tools(configured: Option<&Path>) -> Vec<ToolInfo> {
    vec![check_tool(configured.unwrap_or(Path::new("ffprobe")))]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_version() {
        assert_eq!(
            parse_version("ffprobe version 6.1.1-3ubuntu5 Copyright (c) 2007-2023\nbuilt with gcc").as_deref(),
            Some("6.1.1-3ubuntu5")
        );
        assert_eq!(parse_version("custom-probe 2.0").as_deref(), Some("custom-probe 2.0"));
        assert_eq!(parse_version(""), None);
    }

    #[test]
    fn test_locate_missing_name() {
        let err = locate(Path::new("nonexistent_tool_12345")).unwrap_err();
        assert!(matches!(err, Error::ProberMissing(_)));
    }

    #[test]
    fn test_locate_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let fake = dir.path().join("ffprobe");
        std::fs::write(&fake, b"").unwrap();

        assert_eq!(locate(&fake).unwrap(), fake);
        assert!(locate(&dir.path().join("missing")).is_err());
    }

    #[test]
    fn test_check_tools_uses_configured_path() {
        let tools = check_tools(Some(Path::new("/nonexistent/ffprobe")));
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].name, "/nonexistent/ffprobe");
        assert!(!tools[0].available());
        assert!(tools[0].path.is_none());
    }
}
