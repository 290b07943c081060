//! # stagehand-av
//!
//! Stream probing for media files.
//!
//! This crate provides:
//! - ffprobe invocation and decoding into a [`ProbeResult`]
//! - best video/audio stream selection and quality comparison
//! - English audio/subtitle detection and container extension lookup
//! - the [`Prober`] trait used by the classifiers
//!
//! ## Features
//!
//! - `tracing` - Enable tracing support
//!
//! ## Example
//!
//! ```no_run
//! use stagehand_av::probe;
//!
//! let info = probe("/path/to/video.mkv")?;
//! println!("{}", info);
//! if let Some(video) = info.best_video_stream() {
//!     println!("Best video: {}", video.video_format());
//! }
//! # Ok::<(), stagehand_av::Error>(())
//! ```

mod error;
pub mod probe;
pub mod tools;

// Re-exports
pub use error::{Error, Result};
pub use probe::{
    better_audio, better_video, FfprobeOptions, FfprobeProber, FormatInfo, ProbeResult, Prober,
    Stream, StreamKind,
};
pub use tools::{check_tool, check_tools, locate, ToolInfo};

/// Probe a media file with ffprobe on `PATH` and default options.
///
/// # Example
///
/// ```no_run
/// use stagehand_av::probe;
///
/// let info = probe("/path/to/video.mkv")?;
/// println!("Extension: {:?}", info.extension());
/// # Ok::<(), stagehand_av::Error>(())
/// ```
pub fn probe<P: AsRef<std::path::Path>>(path: P) -> Result<ProbeResult> {
    probe::probe_with_ffprobe(path.as_ref(), &FfprobeOptions::default())
}
