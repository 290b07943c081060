//! FFprobe-based media probing.

use super::types::*;
use crate::{Error, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

/// Default number of frames sampled for interlace detection.
pub const DEFAULT_FRAME_SAMPLE: u32 = 200;

/// Options for invoking ffprobe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FfprobeOptions {
    /// ffprobe binary; looked up on `PATH` when relative.
    pub binary: PathBuf,
    /// Number of leading frames read for interlace detection. Zero skips
    /// frame sampling entirely.
    pub frame_sample: u32,
}

impl Default for FfprobeOptions {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("ffprobe"),
            frame_sample: DEFAULT_FRAME_SAMPLE,
        }
    }
}

impl FfprobeOptions {
    fn args(&self) -> Vec<String> {
        let mut args = vec![
            "-v".to_string(),
            "quiet".to_string(),
            "-show_format".to_string(),
            "-show_streams".to_string(),
        ];
        if self.frame_sample > 0 {
            args.push("-show_frames".to_string());
            args.push("-read_intervals".to_string());
            args.push(format!("%+#{}", self.frame_sample));
        }
        args.push("-print_format".to_string());
        args.push("json".to_string());
        args.push("-i".to_string());
        args
    }
}

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: Option<FfprobeFormat>,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
    #[serde(default)]
    frames: Vec<FfprobeFrame>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    format_name: Option<String>,
    format_long_name: Option<String>,
    duration: Option<String>,
    #[serde(default)]
    tags: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    index: u32,
    codec_type: Option<String>,
    codec_name: Option<String>,
    codec_long_name: Option<String>,
    width: Option<u32>,
    bit_rate: Option<String>,
    channels: Option<u32>,
    channel_layout: Option<String>,
    #[serde(default)]
    tags: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFrame {
    stream_index: Option<u32>,
    interlaced_frame: Option<u8>,
}

/// Probe a media file using ffprobe.
pub fn probe_with_ffprobe(path: &Path, options: &FfprobeOptions) -> Result<ProbeResult> {
    if !path.exists() {
        return Err(Error::file_not_found(path));
    }

    let output = Command::new(&options.binary)
        .args(options.args())
        .arg(path)
        .output()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::prober_missing(&options.binary)
            } else {
                Error::Io(e)
            }
        })?;

    if !output.status.success() {
        return Err(Error::probe_failed(
            "ffprobe",
            String::from_utf8_lossy(&output.stderr),
        ));
    }

    let json_str = String::from_utf8(output.stdout)
        .map_err(|e| Error::invalid_output("ffprobe", format!("invalid UTF-8: {}", e)))?;

    parse_ffprobe_json(&json_str)
}

/// Build a [`ProbeResult`] from ffprobe's JSON output.
///
/// Output without a `format` section is rejected; ffprobe prints `{}` for
/// files it cannot read.
pub fn parse_ffprobe_json(json: &str) -> Result<ProbeResult> {
    let output: FfprobeOutput = serde_json::from_str(json)?;
    parse_ffprobe_output(output)
}

fn parse_ffprobe_output(output: FfprobeOutput) -> Result<ProbeResult> {
    let raw_format = output
        .format
        .ok_or_else(|| Error::invalid_output("ffprobe", "missing format section"))?;

    let format = FormatInfo {
        format_name: raw_format.format_name,
        format_long_name: raw_format.format_long_name,
        duration: raw_format
            .duration
            .and_then(|s| s.parse::<f64>().ok())
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok()),
        tags: raw_format.tags,
    };

    let streams = output
        .streams
        .into_iter()
        .map(|raw| {
            let kind = StreamKind::from_codec_type(raw.codec_type.as_deref().unwrap_or(""));
            let progressive = if kind == StreamKind::Video {
                progressive_for(&output.frames, raw.index)
            } else {
                None
            };
            Stream {
                index: raw.index,
                kind,
                codec_name: raw.codec_name.unwrap_or_default(),
                codec_long_name: raw.codec_long_name,
                width: raw.width,
                bit_rate: raw.bit_rate.and_then(|s| s.parse().ok()),
                channels: raw.channels,
                channel_layout: raw.channel_layout,
                language: language_tag(&raw.tags),
                progressive,
            }
        })
        .collect();

    Ok(ProbeResult::from_streams(format, streams))
}

/// The first sampled frame of a stream decides its scan type.
fn progressive_for(frames: &[FfprobeFrame], stream_index: u32) -> Option<bool> {
    frames
        .iter()
        .find(|f| f.stream_index == Some(stream_index))
        .and_then(|f| f.interlaced_frame)
        .map(|interlaced| interlaced == 0)
}

fn language_tag(tags: &BTreeMap<String, String>) -> Option<String> {
    tags.iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("language") || k.eq_ignore_ascii_case("lang"))
        .map(|(_, v)| v.clone())
}
