//! TMDB (The Movie Database) metadata provider.
//!
//! Implements [`MetadataProvider`] against the TMDB v3 search endpoints.
//!
//! Features:
//! - Token-bucket rate limiting at 4 requests / second via [`governor`].
//! - Automatic retry on HTTP 429 with `Retry-After` header support (max 3 retries).
//! - 30-second request timeout.

use std::num::NonZeroU32;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use governor::{Quota, RateLimiter};
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::metadata::provider::{MetadataProvider, SearchCandidate};

const TMDB_BASE_URL: &str = "https://api.themoviedb.org/3";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_RETRIES: u32 = 3;
const REQUESTS_PER_SECOND: u32 = 4;

#[derive(Debug, Deserialize)]
struct TmdbSearchResponse<T> {
    results: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct TmdbMovieResult {
    id: u64,
    title: Option<String>,
    release_date: Option<String>,
    popularity: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct TmdbTvResult {
    id: u64,
    name: Option<String>,
    first_air_date: Option<String>,
    popularity: Option<f64>,
}

type DirectRateLimiter = RateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// TMDB search client.
///
/// ```no_run
/// use stagehand::metadata::providers::TmdbProvider;
///
/// let provider = TmdbProvider::new("your-api-key".into(), "en-US".into()).unwrap();
/// ```
pub struct TmdbProvider {
    client: reqwest::Client,
    api_key: String,
    language: String,
    base_url: String,
    rate_limiter: DirectRateLimiter,
}

impl TmdbProvider {
    /// Create a provider for the public TMDB API.
    pub fn new(api_key: String, language: String) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("failed to build HTTP client")?;

        let per_second = NonZeroU32::new(REQUESTS_PER_SECOND).unwrap_or(NonZeroU32::MIN);

        Ok(Self {
            client,
            api_key,
            language,
            base_url: TMDB_BASE_URL.to_string(),
            rate_limiter: RateLimiter::direct(Quota::per_second(per_second)),
        })
    }

    /// Point the provider at another API root (e.g. a mock server).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// GET `path` with rate limiting and 429-retry logic.
    async fn get(&self, path: &str, params: &[(&str, String)]) -> anyhow::Result<reqwest::Response> {
        let url = format!("{}{}", self.base_url, path);
        let mut retries = 0u32;
        loop {
            self.rate_limiter.until_ready().await;

            let resp = self
                .client
                .get(&url)
                .query(&[("api_key", self.api_key.as_str()), ("language", self.language.as_str())])
                .query(params)
                .send()
                .await
                .with_context(|| format!("TMDB request failed: {url}"))?;

            if resp.status() == StatusCode::TOO_MANY_REQUESTS && retries < MAX_RETRIES {
                retries += 1;
                let wait = resp
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(1);
                warn!(
                    retry = retries,
                    wait_secs = wait,
                    "TMDB returned 429, backing off"
                );
                tokio::time::sleep(Duration::from_secs(wait)).await;
                continue;
            }

            return resp
                .error_for_status()
                .with_context(|| format!("TMDB request returned error: {url}"));
        }
    }
}

/// Extract a four-digit year from a date string like `"2023-04-15"`.
fn parse_year(date: Option<&str>) -> Option<u16> {
    date.and_then(|d| d.get(..4)).and_then(|y| y.parse().ok())
}

fn search_params(query: &str, year_key: &'static str, year: Option<u16>) -> Vec<(&'static str, String)> {
    let mut params = vec![("query", query.to_string())];
    if let Some(y) = year {
        params.push((year_key, y.to_string()));
    }
    params
}

#[async_trait]
impl MetadataProvider for TmdbProvider {
    fn name(&self) -> &'static str {
        "tmdb"
    }

    async fn search_movie(
        &self,
        query: &str,
        year: Option<u16>,
    ) -> anyhow::Result<Vec<SearchCandidate>> {
        debug!(query, ?year, "TMDB search movie");

        let body: TmdbSearchResponse<TmdbMovieResult> = self
            .get("/search/movie", &search_params(query, "year", year))
            .await?
            .json()
            .await
            .context("failed to parse TMDB movie search response")?;

        Ok(body
            .results
            .into_iter()
            .map(|r| SearchCandidate {
                id: r.id.to_string(),
                year: parse_year(r.release_date.as_deref()),
                title: r.title.unwrap_or_default(),
                popularity: r.popularity.unwrap_or(0.0),
            })
            .collect())
    }

    async fn search_show(
        &self,
        query: &str,
        year: Option<u16>,
    ) -> anyhow::Result<Vec<SearchCandidate>> {
        debug!(query, ?year, "TMDB search tv");

        let body: TmdbSearchResponse<TmdbTvResult> = self
            .get("/search/tv", &search_params(query, "first_air_date_year", year))
            .await?
            .json()
            .await
            .context("failed to parse TMDB tv search response")?;

        Ok(body
            .results
            .into_iter()
            .map(|r| SearchCandidate {
                id: r.id.to_string(),
                year: parse_year(r.first_air_date.as_deref()),
                title: r.name.unwrap_or_default(),
                popularity: r.popularity.unwrap_or(0.0),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn year_parsing() {
        assert_eq!(parse_year(Some("2023-04-15")), Some(2023));
        assert_eq!(parse_year(Some("1999")), Some(1999));
        assert_eq!(parse_year(None), None);
        assert_eq!(parse_year(Some("")), None);
    }

    #[test]
    fn search_params_include_year() {
        let params = search_params("Heat", "year", Some(1995));
        assert_eq!(
            params,
            vec![("query", "Heat".to_string()), ("year", "1995".to_string())]
        );
        assert_eq!(search_params("Heat", "year", None).len(), 1);
    }

    #[test]
    fn base_url_override() {
        let provider = TmdbProvider::new("key".into(), "en-US".into())
            .unwrap()
            .with_base_url("http://127.0.0.1:9999/");
        assert_eq!(provider.base_url, "http://127.0.0.1:9999");
        assert_eq!(provider.name(), "tmdb");
    }
}
