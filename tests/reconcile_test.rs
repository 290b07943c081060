//! Catalog reconciliation tests.
//!
//! Upload directories are temp directories of small placeholder files;
//! stream data comes from a fixed prober keyed by file name, and the
//! catalog is an in-memory SQLite pool.

use assert_matches::assert_matches;
use async_trait::async_trait;
use stagehand::config::{Config, LibraryConfig};
use stagehand::manager::MediaManager;
use stagehand::metadata::{MetadataProvider, SearchCandidate};
use stagehand_av::{FormatInfo, ProbeResult, Prober, Stream};
use stagehand_common::MediaType;
use stagehand_db::pool::{get_conn, init_memory_pool, init_pool};
use stagehand_db::queries::catalog;
use stagehand_db::{CatalogFields, DbPool};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

#[derive(Default, Clone)]
struct FixedProber {
    results: HashMap<String, ProbeResult>,
}

impl FixedProber {
    fn with(mut self, file_name: &str, result: ProbeResult) -> Self {
        self.results.insert(file_name.to_string(), result);
        self
    }
}

impl Prober for FixedProber {
    fn name(&self) -> &'static str {
        "fixed"
    }

    fn probe(&self, path: &Path) -> stagehand_av::Result<ProbeResult> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.results
            .get(&name)
            .cloned()
            .ok_or_else(|| stagehand_av::Error::invalid_output("fixed", "no fixture"))
    }
}

struct StaticProvider {
    movies: Vec<SearchCandidate>,
}

#[async_trait]
impl MetadataProvider for StaticProvider {
    fn name(&self) -> &'static str {
        "static"
    }

    async fn search_movie(&self, _query: &str, _year: Option<u16>) -> anyhow::Result<Vec<SearchCandidate>> {
        Ok(self.movies.clone())
    }

    async fn search_show(&self, _query: &str, _year: Option<u16>) -> anyhow::Result<Vec<SearchCandidate>> {
        Ok(Vec::new())
    }
}

const MATRIX: &str = "The.Matrix.1999.1080p.BluRay.x264-GROUP.mkv";
const EPISODE: &str = "Show Name S02E05.mkv";
const TRACK: &str = "03 - Artist - Album - Song.mp3";

fn video(minutes: u64, width: u32) -> ProbeResult {
    ProbeResult::from_streams(
        FormatInfo::new("matroska,webm").with_duration(Duration::from_secs(minutes * 60)),
        vec![
            Stream::video(0, "h264", width),
            Stream::audio(1, "ac3", 6).with_language("eng"),
        ],
    )
}

fn audio_only() -> ProbeResult {
    ProbeResult::from_streams(
        FormatInfo::new("mp3").with_duration(Duration::from_secs(240)),
        vec![Stream::audio(0, "mp3", 2).with_bit_rate(320_000)],
    )
}

fn prober() -> FixedProber {
    FixedProber::default()
        .with(MATRIX, video(136, 1920))
        .with(EPISODE, video(40, 1280))
        .with(TRACK, audio_only())
        .with("The Matrix (1999) 1080p.mkv", video(136, 1280))
}

fn touch(dir: &Path, relative: &str) -> PathBuf {
    let path = dir.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, b"placeholder").unwrap();
    path
}

fn library(upload_dir: &Path) -> LibraryConfig {
    LibraryConfig {
        upload_dir: upload_dir.to_path_buf(),
        library_dir: None,
        api_key: None,
        enabled: true,
    }
}

fn manager(config: Config) -> (MediaManager<FixedProber>, DbPool) {
    let pool = init_memory_pool().unwrap();
    (MediaManager::new(config, pool.clone(), prober()), pool)
}

fn movies_config(upload_dir: &Path) -> Config {
    Config {
        movies: Some(library(upload_dir)),
        ..Config::default()
    }
}

fn canonical(path: &Path) -> String {
    fs::canonicalize(path).unwrap().to_string_lossy().into_owned()
}

#[test]
fn test_first_scan_catalogues_new_file() {
    let uploads = TempDir::new().unwrap();
    let path = touch(uploads.path(), MATRIX);
    let (manager, pool) = manager(movies_config(uploads.path()));

    let report = manager.process(MediaType::Movies).unwrap();
    assert_eq!(report.discovered, 1);
    assert_eq!(report.inserted, 1);
    assert_eq!(report.markers, 0);
    assert_eq!(report.failed, 0);

    let conn = get_conn(&pool).unwrap();
    let entry = catalog::get_entry_by_path(&conn, MediaType::Movies, &canonical(&path))
        .unwrap()
        .expect("entry catalogued");
    assert!(entry.confidence >= 0.6);
    assert!(!entry.status.is_processed);
    assert!(!entry.status.already_exists);
    match entry.fields {
        CatalogFields::Movie { title, year, movie_id, .. } => {
            assert_eq!(title.as_deref(), Some("The Matrix"));
            assert_eq!(year, Some(1999));
            assert_eq!(movie_id, None);
        }
        other => panic!("expected movie fields, got {:?}", other),
    }
}

#[test]
fn test_rescan_of_unchanged_directory_writes_nothing() {
    let uploads = TempDir::new().unwrap();
    touch(uploads.path(), MATRIX);
    touch(uploads.path(), EPISODE);
    let (manager, pool) = manager(movies_config(uploads.path()));

    let first = manager.process(MediaType::Movies).unwrap();
    assert_eq!(first.writes(), 2);

    let second = manager.process(MediaType::Movies).unwrap();
    assert_eq!(second.discovered, 2);
    assert_eq!(second.skipped, 2);
    assert_eq!(second.writes(), 0);

    let conn = get_conn(&pool).unwrap();
    assert_eq!(catalog::count_entries(&conn, MediaType::Movies).unwrap(), 2);
}

#[test]
fn test_deleted_file_is_swept() {
    let uploads = TempDir::new().unwrap();
    let kept = touch(uploads.path(), MATRIX);
    let gone = touch(uploads.path(), "Heat.1995.mkv");
    let (manager, pool) = manager(movies_config(uploads.path()));

    manager.process(MediaType::Movies).unwrap();
    fs::remove_file(&gone).unwrap();

    let report = manager.process(MediaType::Movies).unwrap();
    assert_eq!(report.removed, 1);
    assert_eq!(report.inserted, 0);

    let conn = get_conn(&pool).unwrap();
    let paths: Vec<String> = catalog::list_paths(&conn, MediaType::Movies)
        .unwrap()
        .into_iter()
        .map(|(_, p)| p)
        .collect();
    assert_eq!(paths, vec![canonical(&kept)]);
}

#[test]
fn test_wrong_type_file_gets_marker() {
    let uploads = TempDir::new().unwrap();
    let path = touch(uploads.path(), EPISODE);
    let (manager, pool) = manager(movies_config(uploads.path()));

    let report = manager.process(MediaType::Movies).unwrap();
    assert_eq!(report.inserted, 0);
    assert_eq!(report.markers, 1);

    let conn = get_conn(&pool).unwrap();
    let entry = catalog::get_entry_by_path(&conn, MediaType::Movies, &canonical(&path))
        .unwrap()
        .expect("marker recorded");
    assert!(entry.status.is_processed);
    assert!(entry.confidence < 0.6);
    assert_eq!(entry.fields.title(), None);

    // The marker keeps the file from being classified again.
    let again = manager.process(MediaType::Movies).unwrap();
    assert_eq!(again.writes(), 0);
}

#[test]
fn test_unprobeable_file_gets_marker() {
    let uploads = TempDir::new().unwrap();
    touch(uploads.path(), "notes.txt");
    let (manager, _pool) = manager(movies_config(uploads.path()));

    let report = manager.process(MediaType::Movies).unwrap();
    assert_eq!(report.discovered, 1);
    assert_eq!(report.markers, 1);
    assert_eq!(report.failed, 0);
}

#[test]
fn test_existing_library_copy_is_compared() {
    let uploads = TempDir::new().unwrap();
    let library_root = TempDir::new().unwrap();
    let path = touch(uploads.path(), MATRIX);
    touch(library_root.path(), "The Matrix (1999)/The Matrix (1999) 1080p.mkv");

    let mut config = movies_config(uploads.path());
    if let Some(movies) = config.movies.as_mut() {
        movies.library_dir = Some(library_root.path().to_path_buf());
    }
    let (manager, pool) = manager(config);

    let report = manager.process(MediaType::Movies).unwrap();
    assert_eq!(report.inserted, 1);

    let conn = get_conn(&pool).unwrap();
    let entry = catalog::get_entry_by_path(&conn, MediaType::Movies, &canonical(&path))
        .unwrap()
        .unwrap();
    assert!(entry.status.already_exists);
    assert!(entry.status.is_upgrade);
}

#[test]
fn test_missing_library_copy_is_not_flagged() {
    let uploads = TempDir::new().unwrap();
    let library_root = TempDir::new().unwrap();
    let path = touch(uploads.path(), MATRIX);

    let mut config = movies_config(uploads.path());
    if let Some(movies) = config.movies.as_mut() {
        movies.library_dir = Some(library_root.path().to_path_buf());
    }
    let (manager, pool) = manager(config);
    manager.process(MediaType::Movies).unwrap();

    let conn = get_conn(&pool).unwrap();
    let entry = catalog::get_entry_by_path(&conn, MediaType::Movies, &canonical(&path))
        .unwrap()
        .unwrap();
    assert!(!entry.status.already_exists);
    assert!(!entry.status.is_upgrade);
}

#[test]
fn test_provider_match_marks_processed() {
    let uploads = TempDir::new().unwrap();
    let path = touch(uploads.path(), MATRIX);
    let provider = StaticProvider {
        movies: vec![SearchCandidate {
            id: "603".to_string(),
            title: "The Matrix".to_string(),
            year: Some(1999),
            popularity: 80.0,
        }],
    };
    let (manager, pool) = manager(movies_config(uploads.path()));
    let manager = manager.with_provider(MediaType::Movies, Arc::new(provider));

    manager.process(MediaType::Movies).unwrap();

    let conn = get_conn(&pool).unwrap();
    let entry = catalog::get_entry_by_path(&conn, MediaType::Movies, &canonical(&path))
        .unwrap()
        .unwrap();
    assert!(entry.status.is_processed);
    assert_matches!(
        entry.fields,
        CatalogFields::Movie { movie_id: Some(ref id), .. } if id == "603"
    );
}

#[test]
fn test_missing_upload_dir_still_sweeps() {
    let uploads = TempDir::new().unwrap();
    touch(uploads.path(), MATRIX);
    let (manager, pool) = manager(movies_config(uploads.path()));
    manager.process(MediaType::Movies).unwrap();

    let root = uploads.path().to_path_buf();
    drop(uploads);
    assert!(!root.exists());

    let report = manager.process(MediaType::Movies).unwrap();
    assert_eq!(report.removed, 1);
    assert_eq!(report.discovered, 0);

    let conn = get_conn(&pool).unwrap();
    assert_eq!(catalog::count_entries(&conn, MediaType::Movies).unwrap(), 0);
}

#[test]
fn test_unconfigured_type_is_an_error() {
    let uploads = TempDir::new().unwrap();
    let (manager, _pool) = manager(movies_config(uploads.path()));
    assert_matches!(manager.process(MediaType::Music), Err(_));
}

#[test]
fn test_concurrent_scans_of_one_type_do_not_duplicate() {
    let uploads = TempDir::new().unwrap();
    touch(uploads.path(), MATRIX);
    let (manager, pool) = manager(movies_config(uploads.path()));

    let reports: Vec<_> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..2)
            .map(|_| s.spawn(|| manager.process(MediaType::Movies).unwrap()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(reports.iter().map(|r| r.inserted).sum::<usize>(), 1);
    assert_eq!(reports.iter().map(|r| r.skipped).sum::<usize>(), 1);

    let conn = get_conn(&pool).unwrap();
    assert_eq!(catalog::count_entries(&conn, MediaType::Movies).unwrap(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_process_all_covers_every_enabled_type() {
    let movie_uploads = TempDir::new().unwrap();
    let show_uploads = TempDir::new().unwrap();
    let music_uploads = TempDir::new().unwrap();
    touch(movie_uploads.path(), MATRIX);
    touch(show_uploads.path(), EPISODE);
    touch(music_uploads.path(), TRACK);

    let config = Config {
        movies: Some(library(movie_uploads.path())),
        shows: Some(library(show_uploads.path())),
        music: Some(library(music_uploads.path())),
        ..Config::default()
    };
    // Scans of different types write concurrently; a file database lets
    // them wait on each other's locks.
    let db_dir = TempDir::new().unwrap();
    let db_path = db_dir.path().join("catalog.db");
    let pool = init_pool(db_path.to_str().unwrap()).unwrap();
    let manager = MediaManager::new(config, pool.clone(), prober());

    let reports = Arc::new(manager).process_all().await;
    let reports: Vec<_> = reports.into_iter().map(|r| r.unwrap()).collect();

    let types: Vec<MediaType> = reports.iter().map(|r| r.media_type).collect();
    assert_eq!(types, MediaType::ALL.to_vec());
    for report in &reports {
        assert_eq!(report.inserted, 1, "{} should catalogue its file", report.media_type);
    }

    let conn = get_conn(&pool).unwrap();
    for media_type in MediaType::ALL {
        assert_eq!(catalog::count_entries(&conn, media_type).unwrap(), 1);
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_process_all_skips_disabled_types() {
    let uploads = TempDir::new().unwrap();
    let mut shows = library(uploads.path());
    shows.enabled = false;
    let config = Config {
        movies: Some(library(uploads.path())),
        shows: Some(shows),
        ..Config::default()
    };
    let (manager, _pool) = manager(config);

    let reports = Arc::new(manager).process_all().await;
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].as_ref().unwrap().media_type, MediaType::Movies);
}

fn matrix_provider() -> Arc<StaticProvider> {
    Arc::new(StaticProvider {
        movies: vec![SearchCandidate {
            id: "603".to_string(),
            title: "The Matrix".to_string(),
            year: Some(1999),
            popularity: 80.0,
        }],
    })
}

#[tokio::test(flavor = "multi_thread")]
async fn test_process_with_provider_from_async_worker() {
    let uploads = TempDir::new().unwrap();
    let path = touch(uploads.path(), MATRIX);
    let (manager, pool) = manager(movies_config(uploads.path()));
    let manager = manager.with_provider(MediaType::Movies, matrix_provider());

    // Called from async code, without spawn_blocking.
    let report = manager.process(MediaType::Movies).unwrap();
    assert_eq!(report.inserted, 1);

    let conn = get_conn(&pool).unwrap();
    let entry = catalog::get_entry_by_path(&conn, MediaType::Movies, &canonical(&path))
        .unwrap()
        .unwrap();
    assert!(entry.status.is_processed);
    assert_matches!(
        entry.fields,
        CatalogFields::Movie { movie_id: Some(ref id), .. } if id == "603"
    );
}

#[tokio::test]
async fn test_process_on_current_thread_runtime_skips_lookup() {
    let uploads = TempDir::new().unwrap();
    let path = touch(uploads.path(), MATRIX);
    let (manager, pool) = manager(movies_config(uploads.path()));
    let manager = manager.with_provider(MediaType::Movies, matrix_provider());

    let report = manager.process(MediaType::Movies).unwrap();
    assert_eq!(report.inserted, 1);

    let conn = get_conn(&pool).unwrap();
    let entry = catalog::get_entry_by_path(&conn, MediaType::Movies, &canonical(&path))
        .unwrap()
        .unwrap();
    assert!(!entry.status.is_processed);
    assert_matches!(entry.fields, CatalogFields::Movie { movie_id: None, .. });
}
