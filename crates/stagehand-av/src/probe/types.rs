//! Probe result types.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use super::select::{select_best_audio, select_best_video};

/// Container format names mapped to the extension a file of that format
/// should carry.
const FORMAT_EXTENSIONS: &[(&str, &str)] = &[
    ("asf", "wmv"),
    ("avi", "avi"),
    ("flac", "flac"),
    ("mp3", "mp3"),
    ("mpeg", "mpg"),
    ("mpegts", "ts"),
    ("matroska,webm", "mkv"),
    ("ogg", "ogm"),
    ("mov,mp4,m4a,3gp,3g2,mj2", "mp4"),
];

/// Width thresholds for the video format label, widest first.
///
/// The first threshold a stream's width meets wins, so this must stay in
/// descending order.
const VIDEO_FORMATS: &[(u32, &str)] = &[
    (3000, "4k"),
    (1900, "1080"),
    (1200, "720"),
    (400, "480"),
    (0, "sd"),
];

/// Codecs ffprobe lists as video that are really cover art or ANSI art.
const NOT_VIDEO_CODECS: &[&str] = &["ansi", "png", "jpeg", "bmp"];

static IAS_KEY: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^IAS(\d+)$").expect("valid regex"));
static ENGLISH_VALUE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\beng(lish)?\b").expect("valid regex"));
static ENGLISH_LANGUAGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^en(g|glish)?\b").expect("valid regex"));

/// Look up the extension for an ffprobe `format_name`.
///
/// # Examples
///
/// ```
/// use stagehand_av::probe::extension_for_format;
///
/// assert_eq!(extension_for_format("matroska,webm"), Some("mkv"));
/// assert_eq!(extension_for_format("mpegts"), Some("ts"));
/// assert_eq!(extension_for_format("wav"), None);
/// ```
pub fn extension_for_format(format_name: &str) -> Option<&'static str> {
    FORMAT_EXTENSIONS
        .iter()
        .find(|(name, _)| *name == format_name)
        .map(|(_, ext)| *ext)
}

/// Kind of a container stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamKind {
    Video,
    Audio,
    Subtitle,
    Other,
}

impl StreamKind {
    /// Map an ffprobe `codec_type` onto a stream kind.
    pub fn from_codec_type(codec_type: &str) -> Self {
        match codec_type {
            "video" => Self::Video,
            "audio" => Self::Audio,
            "subtitle" => Self::Subtitle,
            _ => Self::Other,
        }
    }
}

/// A single container stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stream {
    /// Container stream index.
    pub index: u32,
    pub kind: StreamKind,
    /// Short codec name (e.g. "h264", "flac").
    pub codec_name: String,
    /// Long codec name used in descriptions.
    pub codec_long_name: Option<String>,
    /// Width in pixels (video only).
    pub width: Option<u32>,
    /// Bit rate in bits per second, when the container reports one.
    pub bit_rate: Option<u64>,
    /// Channel count (audio only).
    pub channels: Option<u32>,
    pub channel_layout: Option<String>,
    /// Language tag.
    pub language: Option<String>,
    /// Progressive scan flag from the sampled frames; `None` when no frame
    /// for this stream was sampled.
    pub progressive: Option<bool>,
}

impl Stream {
    fn new(index: u32, kind: StreamKind, codec_name: impl Into<String>) -> Self {
        Self {
            index,
            kind,
            codec_name: codec_name.into(),
            codec_long_name: None,
            width: None,
            bit_rate: None,
            channels: None,
            channel_layout: None,
            language: None,
            progressive: None,
        }
    }

    /// Create a video stream.
    pub fn video(index: u32, codec_name: impl Into<String>, width: u32) -> Self {
        let mut stream = Self::new(index, StreamKind::Video, codec_name);
        stream.width = Some(width);
        stream
    }

    /// Create an audio stream.
    pub fn audio(index: u32, codec_name: impl Into<String>, channels: u32) -> Self {
        let mut stream = Self::new(index, StreamKind::Audio, codec_name);
        stream.channels = Some(channels);
        stream
    }

    /// Create a subtitle stream.
    pub fn subtitle(index: u32, codec_name: impl Into<String>) -> Self {
        Self::new(index, StreamKind::Subtitle, codec_name)
    }

    pub fn with_bit_rate(mut self, bit_rate: u64) -> Self {
        self.bit_rate = Some(bit_rate);
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn with_long_name(mut self, name: impl Into<String>) -> Self {
        self.codec_long_name = Some(name.into());
        self
    }

    pub fn with_channel_layout(mut self, layout: impl Into<String>) -> Self {
        self.channel_layout = Some(layout.into());
        self
    }

    pub fn with_progressive(mut self, progressive: bool) -> Self {
        self.progressive = Some(progressive);
        self
    }

    /// Whether a stream listed as video really carries video.
    ///
    /// Cover art and ANSI art show up as video streams; so does a motion
    /// JPEG thumbnail, which has no bit rate.
    pub fn is_actually_video(&self) -> bool {
        if self.kind != StreamKind::Video {
            return false;
        }
        if NOT_VIDEO_CODECS.contains(&self.codec_name.as_str()) {
            return false;
        }
        !(self.codec_name == "mjpeg" && self.bit_rate.is_none())
    }

    /// Resolution label for a video stream: `4k`, `1080p`, `720i`, `sd`, ...
    ///
    /// Streams without a known scan type are treated as progressive.
    pub fn video_format(&self) -> String {
        let width = self.width.unwrap_or(0);
        let progressive = self.progressive.unwrap_or(true);

        let label = VIDEO_FORMATS
            .iter()
            .find(|(min, _)| width >= *min)
            .map(|(_, label)| *label)
            .unwrap_or("sd");

        match label {
            "4k" | "sd" => label.to_string(),
            _ if progressive => format!("{}p", label),
            _ => format!("{}i", label),
        }
    }

    fn long_name(&self) -> &str {
        self.codec_long_name.as_deref().unwrap_or(&self.codec_name)
    }

    fn kbps_suffix(&self) -> String {
        self.bit_rate
            .map(|b| format!(" {}kbps", b / 1000))
            .unwrap_or_default()
    }

    /// Human readable description, e.g. `H.264 / AVC 1080p 8000kbps`.
    pub fn description(&self) -> String {
        match self.kind {
            StreamKind::Video => {
                format!("{} {}{}", self.long_name(), self.video_format(), self.kbps_suffix())
            }
            _ => {
                let mut out = self.long_name().to_string();
                if let Some(layout) = &self.channel_layout {
                    out.push(' ');
                    out.push_str(layout);
                }
                out.push_str(&self.kbps_suffix());
                out
            }
        }
    }
}

/// Container level attributes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormatInfo {
    /// ffprobe short format name (e.g. "matroska,webm").
    pub format_name: Option<String>,
    pub format_long_name: Option<String>,
    pub duration: Option<Duration>,
    /// Container tags, keys as reported by the container.
    pub tags: BTreeMap<String, String>,
}

impl FormatInfo {
    pub fn new(format_name: impl Into<String>) -> Self {
        Self {
            format_name: Some(format_name.into()),
            ..Default::default()
        }
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }
}

/// Everything the classifiers need to know about a probed file.
///
/// Derived attributes are computed once in [`ProbeResult::from_streams`];
/// the value is read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProbeResult {
    format: FormatInfo,
    streams: Vec<Stream>,
    best_video_stream: Option<Stream>,
    best_audio_stream: Option<Stream>,
    has_video: bool,
    has_audio: bool,
    has_english_audio: bool,
    has_english_subtitles: bool,
    title: Option<String>,
    extension: Option<String>,
}

impl ProbeResult {
    /// The "no media info" result used when probing fails.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a probe result from container attributes and streams.
    pub fn from_streams(format: FormatInfo, streams: Vec<Stream>) -> Self {
        let best_video_stream =
            select_best_video(streams.iter().filter(|s| s.is_actually_video())).cloned();
        let best_audio_stream =
            select_best_audio(streams.iter().filter(|s| s.kind == StreamKind::Audio)).cloned();

        let has_video = best_video_stream.is_some();
        let has_audio = best_audio_stream.is_some();
        let has_english_audio = detect_english_audio(&format.tags, &streams);
        let has_english_subtitles = streams.iter().any(|s| {
            s.kind == StreamKind::Subtitle
                && s.language.as_deref().is_some_and(|l| ENGLISH_LANGUAGE.is_match(l))
        });

        let title = format
            .tags
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case("title"))
            .map(|(_, v)| v.trim().to_string())
            .filter(|v| !v.is_empty());

        let extension = format
            .format_name
            .as_deref()
            .and_then(extension_for_format)
            .map(str::to_string);

        Self {
            format,
            streams,
            best_video_stream,
            best_audio_stream,
            has_video,
            has_audio,
            has_english_audio,
            has_english_subtitles,
            title,
            extension,
        }
    }

    pub fn format(&self) -> &FormatInfo {
        &self.format
    }

    pub fn streams(&self) -> &[Stream] {
        &self.streams
    }

    pub fn duration(&self) -> Option<Duration> {
        self.format.duration
    }

    /// Case-insensitive container tag lookup.
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.format
            .tags
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    /// Container tags.
    pub fn tags(&self) -> impl Iterator<Item = (&str, &str)> {
        self.format.tags.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn best_video_stream(&self) -> Option<&Stream> {
        self.best_video_stream.as_ref()
    }

    pub fn best_audio_stream(&self) -> Option<&Stream> {
        self.best_audio_stream.as_ref()
    }

    pub fn has_video(&self) -> bool {
        self.has_video
    }

    pub fn has_audio(&self) -> bool {
        self.has_audio
    }

    pub fn has_english_audio(&self) -> bool {
        self.has_english_audio
    }

    pub fn has_english_subtitles(&self) -> bool {
        self.has_english_subtitles
    }

    /// Embedded container title.
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Extension implied by the container format.
    pub fn extension(&self) -> Option<&str> {
        self.extension.as_deref()
    }

    /// Resolution label of the best video stream.
    pub fn video_format(&self) -> Option<String> {
        self.best_video_stream.as_ref().map(Stream::video_format)
    }
}

/// `IAS<N>` container tags pin the Nth (1-based) audio stream as English;
/// without one, audio stream language tags decide.
fn detect_english_audio(tags: &BTreeMap<String, String>, streams: &[Stream]) -> bool {
    let pinned = tags.iter().find_map(|(k, v)| {
        let caps = IAS_KEY.captures(k)?;
        if !ENGLISH_VALUE.is_match(v) {
            return None;
        }
        caps.get(1)?.as_str().parse::<usize>().ok()
    });

    let mut audio = streams.iter().filter(|s| s.kind == StreamKind::Audio);
    match pinned {
        Some(n) => n >= 1 && audio.nth(n - 1).is_some(),
        None => audio.any(|s| {
            s.language
                .as_deref()
                .is_some_and(|l| ENGLISH_LANGUAGE.is_match(l))
        }),
    }
}

impl fmt::Display for ProbeResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let container = self
            .format
            .format_long_name
            .as_deref()
            .or(self.format.format_name.as_deref())
            .unwrap_or("unknown");
        write!(f, "{}", container)?;
        if let Some(video) = &self.best_video_stream {
            write!(f, " - {}", video.description())?;
        }
        if let Some(audio) = &self.best_audio_stream {
            write!(f, " - {}", audio.description())?;
        }
        Ok(())
    }
}
