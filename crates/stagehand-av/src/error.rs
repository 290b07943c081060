//! Probe errors.
//!
//! The classifiers never surface these: a failed probe degrades to an empty
//! [`ProbeResult`](crate::ProbeResult). They reach users only through the
//! `probe` command and log lines.

use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The prober binary could not be started.
    #[error("prober binary not found: {}", .0.display())]
    ProberMissing(PathBuf),

    /// The prober ran but rejected the file.
    #[error("{prober} failed: {stderr}")]
    ProbeFailed { prober: String, stderr: String },

    /// The prober's output could not be decoded.
    #[error("unreadable {prober} output: {reason}")]
    InvalidOutput { prober: String, reason: String },

    #[error("no such file: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn prober_missing(binary: impl Into<PathBuf>) -> Self {
        Self::ProberMissing(binary.into())
    }

    pub fn probe_failed(prober: impl Into<String>, stderr: impl AsRef<str>) -> Self {
        Self::ProbeFailed {
            prober: prober.into(),
            stderr: stderr.as_ref().trim().to_string(),
        }
    }

    pub fn invalid_output(prober: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidOutput {
            prober: prober.into(),
            reason: reason.into(),
        }
    }

    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound(path.into())
    }
}
