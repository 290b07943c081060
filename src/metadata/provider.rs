//! Trait definition and types for metadata providers.

use std::cmp::Ordering;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A single result returned from a provider search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchCandidate {
    /// Provider-specific identifier (e.g. TMDB numeric ID).
    pub id: String,
    /// Display title.
    pub title: String,
    /// Release or first-air year, if known.
    pub year: Option<u16>,
    /// Provider popularity score; higher is more popular.
    pub popularity: f64,
}

/// Async search capability of an external metadata service.
///
/// An empty result list is a normal outcome, not an error.
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Short, lowercase identifier for this provider (e.g. `"tmdb"`).
    fn name(&self) -> &'static str;

    /// Search for movies matching `query`, optionally near `year`.
    async fn search_movie(
        &self,
        query: &str,
        year: Option<u16>,
    ) -> anyhow::Result<Vec<SearchCandidate>>;

    /// Search for TV shows matching `query`, optionally near `year`.
    async fn search_show(
        &self,
        query: &str,
        year: Option<u16>,
    ) -> anyhow::Result<Vec<SearchCandidate>>;
}

/// Order candidates best first.
///
/// With a year, candidates closest to it come first and candidates without
/// a year come last. Remaining ties go to the more popular candidate.
pub fn rank_candidates(mut candidates: Vec<SearchCandidate>, year: Option<u16>) -> Vec<SearchCandidate> {
    let distance = |c: &SearchCandidate| match (year, c.year) {
        (Some(want), Some(have)) => Some(want.abs_diff(have)),
        _ => None,
    };

    candidates.sort_by(|a, b| {
        let by_year = match (distance(a), distance(b)) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        by_year.then_with(|| b.popularity.total_cmp(&a.popularity))
    });
    candidates
}
