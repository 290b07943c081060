//! Media file probing.
//!
//! [`probe_with_ffprobe`] runs ffprobe once per file and reduces its JSON
//! output to a [`ProbeResult`]. Consumers that only need "something that
//! probes" take a [`Prober`], so tests can hand in fixed results.

mod ffprobe;
mod select;
mod types;

pub use ffprobe::{parse_ffprobe_json, probe_with_ffprobe, FfprobeOptions, DEFAULT_FRAME_SAMPLE};
pub use select::{
    audio_codec_rank, better_audio, better_video, compare_audio, compare_video,
    select_best_audio, select_best_video, video_codec_rank,
};
pub use types::*;

use crate::Result;
use std::path::Path;

/// A media file prober.
///
/// Implementations must be safe to share across threads (`Send + Sync`);
/// files of one scan are probed in parallel.
pub trait Prober: Send + Sync {
    /// Human-readable name identifying this prober implementation.
    fn name(&self) -> &'static str;

    /// Probe the file at `path`.
    fn probe(&self, path: &Path) -> Result<ProbeResult>;
}

/// [`Prober`] backed by the ffprobe binary.
#[derive(Debug, Clone, Default)]
pub struct FfprobeProber {
    options: FfprobeOptions,
}

impl FfprobeProber {
    pub fn new(options: FfprobeOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &FfprobeOptions {
        &self.options
    }
}

impl Prober for FfprobeProber {
    fn name(&self) -> &'static str {
        "ffprobe"
    }

    fn probe(&self, path: &Path) -> Result<ProbeResult> {
        #[cfg(feature = "tracing")]
        tracing::trace!(path = %path.display(), "running ffprobe");
        probe_with_ffprobe(path, &self.options)
    }
}

impl<P: Prober + ?Sized> Prober for std::sync::Arc<P> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn probe(&self, path: &Path) -> Result<ProbeResult> {
        (**self).probe(path)
    }
}
