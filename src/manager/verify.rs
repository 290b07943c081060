//! Duplicate and upgrade detection against an organised library.

use stagehand_av::probe::{compare_audio, compare_video};
use stagehand_av::{ProbeResult, Prober};
use stagehand_parser::{Arbitrator, MediaMeta};
use std::cmp::Ordering;
use std::path::Path;
use tracing::debug;

/// Outcome of comparing a new file with the library copy at its destination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpgradeCheck {
    pub already_exists: bool,
    pub is_upgrade: bool,
}

/// Whether `new` has better streams than `existing`.
///
/// Gaining a video or audio track counts, as does a best stream that
/// outranks the existing best stream of the same kind.
pub fn is_upgrade(new: &ProbeResult, existing: &ProbeResult) -> bool {
    let video = match (new.best_video_stream(), existing.best_video_stream()) {
        (Some(_), None) => true,
        (Some(n), Some(e)) => compare_video(n, e) == Ordering::Greater,
        _ => false,
    };
    let audio = match (new.best_audio_stream(), existing.best_audio_stream()) {
        (Some(_), None) => true,
        (Some(n), Some(e)) => compare_audio(n, e) == Ordering::Greater,
        _ => false,
    };
    video || audio
}

/// Look for `meta`'s destination under `library_root` and compare.
///
/// Nothing exists when the destination cannot be named (missing title or
/// year) or no file is there.
pub fn check_upgrade<P: Prober>(
    arbitrator: &Arbitrator<P>,
    meta: &MediaMeta,
    new_probe: &ProbeResult,
    library_root: &Path,
) -> UpgradeCheck {
    let Some(target) = meta.destination(library_root) else {
        return UpgradeCheck::default();
    };
    if !target.is_file() {
        return UpgradeCheck::default();
    }

    let existing = arbitrator.probe(&target);
    let is_upgrade = is_upgrade(new_probe, &existing);
    debug!(target = %target.display(), is_upgrade, "Destination already exists");

    UpgradeCheck {
        already_exists: true,
        is_upgrade,
    }
}
