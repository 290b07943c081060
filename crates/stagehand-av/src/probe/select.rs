//! Stream quality ordering.
//!
//! Video streams are ordered by width, then codec rank, then bit rate.
//! Audio streams are ordered by codec rank, then channel count, then bit
//! rate. A codec missing from the rank table is not compared on that axis,
//! and a bit rate is only compared when both streams report one.

use std::cmp::Ordering;

use super::types::Stream;

const VIDEO_CODEC_RANKS: &[(&str, u32)] = &[
    ("hevc", 100),
    ("h264", 90),
    ("mpeg4", 70),
    ("mpeg2video", 40),
    ("mpeg1video", 20),
];

const AUDIO_CODEC_RANKS: &[(&str, u32)] = &[
    ("flac", 100),
    ("dts", 99),
    ("ac3", 90),
    ("wmapro", 80),
    ("aac", 70),
    ("mp3", 60),
    ("vorbis", 59),
    ("wma", 50),
    ("mp2", 40),
];

fn rank(table: &[(&str, u32)], codec: &str) -> Option<u32> {
    table.iter().find(|(name, _)| *name == codec).map(|(_, r)| *r)
}

/// Rank of a video codec, if it is in the table.
pub fn video_codec_rank(codec: &str) -> Option<u32> {
    rank(VIDEO_CODEC_RANKS, codec)
}

/// Rank of an audio codec, if it is in the table.
pub fn audio_codec_rank(codec: &str) -> Option<u32> {
    rank(AUDIO_CODEC_RANKS, codec)
}

fn compare_ranked(a: Option<u32>, b: Option<u32>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        _ => Ordering::Equal,
    }
}

/// Compare two video streams by quality. `Greater` means `a` is better.
pub fn compare_video(a: &Stream, b: &Stream) -> Ordering {
    a.width
        .unwrap_or(0)
        .cmp(&b.width.unwrap_or(0))
        .then_with(|| {
            compare_ranked(
                video_codec_rank(&a.codec_name),
                video_codec_rank(&b.codec_name),
            )
        })
        .then_with(|| compare_bit_rate(a, b))
}

/// Compare two audio streams by quality. `Greater` means `a` is better.
pub fn compare_audio(a: &Stream, b: &Stream) -> Ordering {
    compare_ranked(
        audio_codec_rank(&a.codec_name),
        audio_codec_rank(&b.codec_name),
    )
    .then_with(|| a.channels.unwrap_or(0).cmp(&b.channels.unwrap_or(0)))
    .then_with(|| compare_bit_rate(a, b))
}

fn compare_bit_rate(a: &Stream, b: &Stream) -> Ordering {
    match (a.bit_rate, b.bit_rate) {
        (Some(a), Some(b)) => a.cmp(&b),
        _ => Ordering::Equal,
    }
}

/// Return `candidate` if it is strictly better than `current`, else `current`.
pub fn better_video<'a>(candidate: &'a Stream, current: &'a Stream) -> &'a Stream {
    if compare_video(candidate, current) == Ordering::Greater {
        candidate
    } else {
        current
    }
}

/// Return `candidate` if it is strictly better than `current`, else `current`.
pub fn better_audio<'a>(candidate: &'a Stream, current: &'a Stream) -> &'a Stream {
    if compare_audio(candidate, current) == Ordering::Greater {
        candidate
    } else {
        current
    }
}

/// Pick the stream no other stream beats, lowest index first.
///
/// The pairwise rules are not transitive once an unranked codec is
/// involved, so this checks every pair instead of folding with `max_by`.
/// When every stream is beaten by some other, the lowest index wins.
fn select_unbeaten<'a, I, F>(streams: I, compare: F) -> Option<&'a Stream>
where
    I: IntoIterator<Item = &'a Stream>,
    F: Fn(&Stream, &Stream) -> Ordering,
{
    let mut streams: Vec<&Stream> = streams.into_iter().collect();
    streams.sort_by_key(|s| s.index);

    streams
        .iter()
        .copied()
        .find(|s| {
            !streams
                .iter()
                .any(|other| compare(*other, *s) == Ordering::Greater)
        })
        .or_else(|| streams.first().copied())
}

/// Pick the best video stream. Equal quality goes to the lower stream index.
pub fn select_best_video<'a, I>(streams: I) -> Option<&'a Stream>
where
    I: IntoIterator<Item = &'a Stream>,
{
    select_unbeaten(streams, compare_video)
}

/// Pick the best audio stream. Equal quality goes to the lower stream index.
pub fn select_best_audio<'a, I>(streams: I) -> Option<&'a Stream>
where
    I: IntoIterator<Item = &'a Stream>,
{
    select_unbeaten(streams, compare_audio)
}
