//! TMDB provider tests against a mock HTTP server.

use stagehand::metadata::providers::TmdbProvider;
use stagehand::metadata::{self, MetadataProvider};
use stagehand_parser::{ExternalIds, MediaFile, MediaMeta, MovieMeta};
use std::path::PathBuf;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn provider(server: &MockServer) -> TmdbProvider {
    TmdbProvider::new("test-key".to_string(), "en-US".to_string())
        .unwrap()
        .with_base_url(server.uri())
}

fn matrix_results() -> serde_json::Value {
    serde_json::json!({
        "page": 1,
        "results": [
            {"id": 603, "title": "The Matrix", "release_date": "1999-03-30", "popularity": 85.2},
            {"id": 55931, "title": "The Matrix Revisited", "release_date": "2001-11-19", "popularity": 9.1}
        ]
    })
}

#[tokio::test]
async fn test_search_movie_sends_query_and_maps_results() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/movie"))
        .and(query_param("api_key", "test-key"))
        .and(query_param("language", "en-US"))
        .and(query_param("query", "The Matrix"))
        .and(query_param("year", "1999"))
        .respond_with(ResponseTemplate::new(200).set_body_json(matrix_results()))
        .expect(1)
        .mount(&server)
        .await;

    let results = provider(&server)
        .search_movie("The Matrix", Some(1999))
        .await
        .unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].id, "603");
    assert_eq!(results[0].title, "The Matrix");
    assert_eq!(results[0].year, Some(1999));
    assert_eq!(results[1].year, Some(2001));
}

#[tokio::test]
async fn test_search_show_uses_tv_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/tv"))
        .and(query_param("query", "Show Name"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "results": [
                {"id": 1399, "name": "Show Name", "first_air_date": "2011-04-17", "popularity": 40.0},
                {"id": 77, "name": "Show Name (Unaired)", "first_air_date": "", "popularity": null}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let results = provider(&server).search_show("Show Name", None).await.unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].id, "1399");
    assert_eq!(results[0].title, "Show Name");
    assert_eq!(results[0].year, Some(2011));
    assert_eq!(results[1].year, None);
    assert_eq!(results[1].popularity, 0.0);
}

#[tokio::test]
async fn test_empty_results_are_not_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/movie"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"results": []})))
        .mount(&server)
        .await;

    let results = provider(&server).search_movie("Nothing", None).await.unwrap();
    assert!(results.is_empty());
}

#[tokio::test]
async fn test_rate_limited_request_is_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/movie"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/search/movie"))
        .respond_with(ResponseTemplate::new(200).set_body_json(matrix_results()))
        .expect(1)
        .mount(&server)
        .await;

    let results = provider(&server)
        .search_movie("The Matrix", None)
        .await
        .unwrap();
    assert_eq!(results[0].id, "603");
}

#[tokio::test]
async fn test_server_error_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/movie"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = provider(&server)
        .search_movie("The Matrix", None)
        .await
        .unwrap_err();
    assert!(format!("{:#}", err).contains("TMDB request returned error"));
}

#[tokio::test]
async fn test_refine_movie_through_tmdb() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/movie"))
        .and(query_param("query", "the matrix"))
        .respond_with(ResponseTemplate::new(200).set_body_json(matrix_results()))
        .mount(&server)
        .await;

    let mut meta = MediaMeta::Movie(MovieMeta {
        file: MediaFile {
            path: PathBuf::from("/up/the.matrix.1999.mkv"),
            relative_path: PathBuf::from("the.matrix.1999.mkv"),
            size: 0,
            extension: Some("mkv".to_string()),
        },
        confidence: 0.8,
        external_ids: ExternalIds::default(),
        video_format: Some("1080p".to_string()),
        title: Some("the matrix".to_string()),
        year: Some(1999),
        part: None,
    });

    let refined = metadata::refine(&provider(&server), &mut meta).await.unwrap();
    assert!(refined);

    let MediaMeta::Movie(movie) = &meta else {
        unreachable!();
    };
    assert_eq!(movie.title.as_deref(), Some("The Matrix"));
    assert_eq!(movie.year, Some(1999));
    assert_eq!(movie.external_ids.movie_id.as_deref(), Some("603"));
}
