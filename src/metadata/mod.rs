//! Metadata provider search used to refine classified files.
//!
//! - [`provider`] -- Trait definition, search candidates and ranking.
//! - [`providers`] -- Concrete provider implementations (TMDB).

pub mod provider;
pub mod providers;

pub use provider::{rank_candidates, MetadataProvider, SearchCandidate};

use stagehand_parser::MediaMeta;
use tracing::debug;

/// Refine `meta` with the best provider match.
///
/// Movies take the match's title, year and id; shows take the show name and
/// show id. Music has no provider. Returns `true` when a match was applied.
pub async fn refine(provider: &dyn MetadataProvider, meta: &mut MediaMeta) -> anyhow::Result<bool> {
    match meta {
        MediaMeta::Movie(movie) => {
            let Some(query) = movie.title.clone() else {
                return Ok(false);
            };
            let candidates = provider.search_movie(&query, movie.year).await?;
            let Some(best) = rank_candidates(candidates, movie.year).into_iter().next() else {
                debug!(provider = provider.name(), query, "No movie match");
                return Ok(false);
            };

            if !best.title.is_empty() {
                movie.title = Some(best.title);
            }
            if best.year.is_some() {
                movie.year = best.year;
            }
            movie.external_ids.movie_id = Some(best.id);
            Ok(true)
        }
        MediaMeta::Show(show) => {
            let Some(query) = show.show_name.clone() else {
                return Ok(false);
            };
            let candidates = provider.search_show(&query, None).await?;
            let Some(best) = rank_candidates(candidates, None).into_iter().next() else {
                debug!(provider = provider.name(), query, "No show match");
                return Ok(false);
            };

            if !best.title.is_empty() {
                show.show_name = Some(best.title);
            }
            show.external_ids.show_id = Some(best.id);
            Ok(true)
        }
        MediaMeta::Music(_) => Ok(false),
    }
}
