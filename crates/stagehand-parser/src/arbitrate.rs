//! Choosing between competing classifications.
//!
//! The arbitrator probes a file once, lets every parser score it, and keeps
//! the most confident candidate. Ties go to whichever parser ran first:
//! music, then show, then movie.

use stagehand_av::{ProbeResult, Prober};
use stagehand_common::MediaType;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::config::ParserConfig;
use crate::meta::{MediaFile, MediaMeta};
use crate::movie::MovieParser;
use crate::music::MusicParser;
use crate::show::ShowParser;

/// Errors that abort classification of a single file.
#[derive(Debug, thiserror::Error)]
pub enum ClassifyError {
    /// The path does not exist or is not a regular file.
    #[error("missing file: {}", .0.display())]
    MissingFile(PathBuf),

    /// Reading file metadata failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A type-specific classifier.
pub trait MediaParser: Send + Sync {
    /// The type this parser recognises.
    fn media_type(&self) -> MediaType;

    /// Extract this type's fields and score them.
    fn classify(&self, file: &MediaFile, probe: &ProbeResult) -> MediaMeta;
}

/// Every candidate for one file, in evaluation order.
#[derive(Debug, Clone)]
pub struct Arbitration {
    pub probe: ProbeResult,
    pub candidates: Vec<MediaMeta>,
    pub threshold: f64,
}

impl Arbitration {
    fn winner_index(&self) -> Option<usize> {
        let mut best: Option<usize> = None;
        for (i, candidate) in self.candidates.iter().enumerate() {
            match best {
                Some(b) if candidate.confidence() <= self.candidates[b].confidence() => {}
                _ => best = Some(i),
            }
        }
        best.filter(|&b| self.candidates[b].confidence() >= self.threshold)
    }

    /// The most confident candidate, if it clears the threshold.
    pub fn winner(&self) -> Option<&MediaMeta> {
        self.winner_index().map(|i| &self.candidates[i])
    }

    pub fn into_winner(mut self) -> Option<MediaMeta> {
        let index = self.winner_index()?;
        Some(self.candidates.swap_remove(index))
    }

    /// The candidate produced for `media_type`.
    pub fn candidate(&self, media_type: MediaType) -> Option<&MediaMeta> {
        self.candidates
            .iter()
            .find(|c| c.media_type() == media_type)
    }

    /// Confidence of the `media_type` candidate; 0 when there is none.
    pub fn confidence(&self, media_type: MediaType) -> f64 {
        self.candidate(media_type)
            .map(MediaMeta::confidence)
            .unwrap_or(0.0)
    }
}

/// Runs every parser over a file and picks the winner.
pub struct Arbitrator<P> {
    prober: P,
    config: ParserConfig,
    parsers: Vec<Box<dyn MediaParser>>,
}

impl<P: Prober> Arbitrator<P> {
    pub fn new(prober: P, config: ParserConfig) -> Self {
        let parsers: Vec<Box<dyn MediaParser>> = MediaType::ALL
            .iter()
            .map(|media_type| -> Box<dyn MediaParser> {
                match media_type {
                    MediaType::Music => Box::new(MusicParser::new(config.music)),
                    MediaType::Shows => Box::new(ShowParser::new()),
                    MediaType::Movies => Box::new(MovieParser::new(config.movie)),
                }
            })
            .collect();

        Self {
            prober,
            config,
            parsers,
        }
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    pub fn prober(&self) -> &P {
        &self.prober
    }

    /// Probe `path`, degrading to an empty result when probing fails.
    pub fn probe(&self, path: &Path) -> ProbeResult {
        match self.prober.probe(path) {
            Ok(result) => result,
            Err(e) => {
                warn!(path = %path.display(), prober = self.prober.name(), "Probe failed: {}", e);
                ProbeResult::empty()
            }
        }
    }

    /// Score `path` as every media type.
    pub fn evaluate(&self, path: &Path, base_dir: Option<&Path>) -> Result<Arbitration, ClassifyError> {
        let metadata = std::fs::metadata(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ClassifyError::MissingFile(path.to_path_buf())
            } else {
                ClassifyError::Io {
                    path: path.to_path_buf(),
                    source: e,
                }
            }
        })?;
        if !metadata.is_file() {
            return Err(ClassifyError::MissingFile(path.to_path_buf()));
        }

        let probe = self.probe(path);
        let file = MediaFile::new(path, base_dir, metadata.len(), &probe);

        let candidates: Vec<MediaMeta> = self
            .parsers
            .iter()
            .map(|parser| parser.classify(&file, &probe))
            .collect();

        for candidate in &candidates {
            debug!(
                path = %path.display(),
                media_type = %candidate.media_type(),
                confidence = candidate.confidence(),
                "Scored candidate"
            );
        }

        Ok(Arbitration {
            probe,
            candidates,
            threshold: self.config.threshold,
        })
    }

    /// Classify `path`, returning `None` when no type is confident enough.
    pub fn arbitrate(&self, path: &Path, base_dir: Option<&Path>) -> Result<Option<MediaMeta>, ClassifyError> {
        Ok(self.evaluate(path, base_dir)?.into_winner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::{ExternalIds, MovieMeta, MusicMeta, ShowMeta};

    fn file() -> MediaFile {
        MediaFile {
            path: PathBuf::from("/x"),
            relative_path: PathBuf::from("x"),
            size: 0,
            extension: None,
        }
    }

    fn movie(confidence: f64) -> MediaMeta {
        MediaMeta::Movie(MovieMeta {
            file: file(),
            confidence,
            external_ids: ExternalIds::default(),
            video_format: None,
            title: None,
            year: None,
            part: None,
        })
    }

    fn show(confidence: f64) -> MediaMeta {
        MediaMeta::Show(ShowMeta {
            file: file(),
            confidence,
            external_ids: ExternalIds::default(),
            video_format: None,
            show_name: None,
            season: None,
            episode: None,
            episode_last: None,
            episode_name: None,
        })
    }

    fn music(confidence: f64) -> MediaMeta {
        MediaMeta::Music(MusicMeta {
            file: file(),
            confidence,
            external_ids: ExternalIds::default(),
            video_format: None,
            artist: None,
            album: None,
            year: None,
            track: None,
            title: None,
        })
    }

    fn arbitration(candidates: Vec<MediaMeta>) -> Arbitration {
        Arbitration {
            probe: ProbeResult::empty(),
            candidates,
            threshold: 0.6,
        }
    }

    #[test]
    fn test_highest_confidence_wins() {
        let a = arbitration(vec![music(0.2), show(0.9), movie(0.7)]);
        assert_eq!(a.winner().map(MediaMeta::media_type), Some(MediaType::Shows));
    }

    #[test]
    fn test_ties_go_to_evaluation_order() {
        let a = arbitration(vec![music(0.8), show(0.8), movie(0.8)]);
        assert_eq!(a.winner().map(MediaMeta::media_type), Some(MediaType::Music));

        let a = arbitration(vec![music(0.1), show(0.75), movie(0.75)]);
        assert_eq!(a.into_winner().map(|m| m.media_type()), Some(MediaType::Shows));
    }

    #[test]
    fn test_below_threshold_is_none() {
        let a = arbitration(vec![music(0.59), show(0.3), movie(0.0)]);
        assert!(a.winner().is_none());
        assert_eq!(a.confidence(MediaType::Music), 0.59);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let a = arbitration(vec![music(0.0), show(0.0), movie(0.6)]);
        assert_eq!(a.winner().map(MediaMeta::media_type), Some(MediaType::Movies));
    }

    #[test]
    fn test_candidate_lookup() {
        let a = arbitration(vec![music(0.1), show(0.2)]);
        assert_eq!(a.confidence(MediaType::Shows), 0.2);
        assert_eq!(a.confidence(MediaType::Movies), 0.0);
        assert!(a.candidate(MediaType::Movies).is_none());
    }
}
