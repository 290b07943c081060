//! Catalog reconciliation.
//!
//! [`MediaManager::process`] brings one media type's catalog table in line
//! with its upload directory: rows whose file disappeared are swept, and
//! files not yet catalogued are classified and recorded. A path that is
//! already catalogued is never classified again, so scanning an unchanged
//! directory writes nothing.

pub mod reconcile;
pub mod verify;

use anyhow::{Context, Result};
use parking_lot::Mutex;
use rayon::prelude::*;
use serde::Serialize;
use stagehand_av::{FfprobeProber, Prober};
use stagehand_common::MediaType;
use stagehand_db::pool::{get_conn, DbPool};
use stagehand_db::queries::catalog;
use stagehand_db::EntryStatus;
use stagehand_parser::{Arbitration, Arbitrator, ClassifyError, MediaMeta};
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::{Config, LibraryConfig};
use crate::metadata::{self, providers::TmdbProvider, MetadataProvider};

pub use verify::{check_upgrade, is_upgrade, UpgradeCheck};

const PROVIDER_LANGUAGE: &str = "en-US";

/// Counts from one pass over a media type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    pub media_type: MediaType,
    /// Regular files found under the upload directory.
    pub discovered: usize,
    /// Files already in the catalog.
    pub skipped: usize,
    /// Full rows written.
    pub inserted: usize,
    /// Low-confidence marker rows written.
    pub markers: usize,
    /// Rows swept because their file is gone.
    pub removed: usize,
    pub failed: usize,
}

impl ScanReport {
    fn new(media_type: MediaType) -> Self {
        Self {
            media_type,
            discovered: 0,
            skipped: 0,
            inserted: 0,
            markers: 0,
            removed: 0,
            failed: 0,
        }
    }

    /// Catalog writes made by the pass.
    pub fn writes(&self) -> usize {
        self.inserted + self.markers + self.removed
    }
}

/// One lock per media type; a type's scans never overlap.
#[derive(Default)]
struct ScanLocks {
    movies: Mutex<()>,
    shows: Mutex<()>,
    music: Mutex<()>,
}

impl ScanLocks {
    fn get(&self, media_type: MediaType) -> &Mutex<()> {
        match media_type {
            MediaType::Movies => &self.movies,
            MediaType::Shows => &self.shows,
            MediaType::Music => &self.music,
        }
    }
}

/// Owns everything a scan needs: catalog pool, arbitrator, providers.
pub struct MediaManager<P = FfprobeProber> {
    config: Config,
    pool: DbPool,
    arbitrator: Arbitrator<P>,
    providers: HashMap<MediaType, Arc<dyn MetadataProvider>>,
    locks: ScanLocks,
}

impl MediaManager<FfprobeProber> {
    /// Build a manager that probes with ffprobe and refines movies and
    /// shows through TMDB when an API key is configured.
    pub fn from_config(config: Config, pool: DbPool) -> Result<Self> {
        let prober = FfprobeProber::new(config.probe.ffprobe_options());
        let mut manager = Self::new(config, pool, prober);

        for media_type in [MediaType::Movies, MediaType::Shows] {
            let key = manager
                .config
                .library(media_type)
                .and_then(|l| l.api_key.clone())
                .filter(|k| !k.is_empty());
            if let Some(key) = key {
                let provider = TmdbProvider::new(key, PROVIDER_LANGUAGE.to_string())?;
                manager = manager.with_provider(media_type, Arc::new(provider));
            }
        }

        Ok(manager)
    }
}

impl<P: Prober> MediaManager<P> {
    pub fn new(config: Config, pool: DbPool, prober: P) -> Self {
        let arbitrator = Arbitrator::new(prober, config.classifier.parser_config());
        Self {
            config,
            pool,
            arbitrator,
            providers: HashMap::new(),
            locks: ScanLocks::default(),
        }
    }

    /// Refine `media_type` classifications through `provider`.
    pub fn with_provider(mut self, media_type: MediaType, provider: Arc<dyn MetadataProvider>) -> Self {
        self.providers.insert(media_type, provider);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    pub fn arbitrator(&self) -> &Arbitrator<P> {
        &self.arbitrator
    }

    /// Reconcile one media type's catalog with its upload directory.
    ///
    /// Fails only when the type is not configured or its catalog cannot be
    /// read; individual file failures are counted in the report.
    pub fn process(&self, media_type: MediaType) -> Result<ScanReport> {
        let library = self
            .config
            .library(media_type)
            .with_context(|| format!("no {} library configured", media_type))?;

        let _guard = self.locks.get(media_type).lock();
        let mut report = ScanReport::new(media_type);

        let conn = get_conn(&self.pool)?;
        let known = catalog::list_paths(&conn, media_type)
            .with_context(|| format!("failed to read {} catalog", media_type))?;

        report.removed = reconcile::sweep(&conn, media_type, &known);

        let upload_dir = match std::fs::canonicalize(&library.upload_dir) {
            Ok(dir) => dir,
            Err(e) => {
                warn!(%media_type, "Upload directory {:?} unavailable: {}", library.upload_dir, e);
                return Ok(report);
            }
        };

        let known_paths: HashSet<&str> = known.iter().map(|(_, p)| p.as_str()).collect();
        let (fresh, skipped) = reconcile::discover(&upload_dir, &known_paths);
        report.skipped = skipped;
        report.discovered = skipped + fresh.len();

        let evaluated: Vec<(PathBuf, std::result::Result<Arbitration, ClassifyError>)> = fresh
            .into_par_iter()
            .map(|path| {
                let result = self.arbitrator.evaluate(&path, Some(&upload_dir));
                (path, result)
            })
            .collect();

        for (path, result) in evaluated {
            match result {
                Ok(arbitration) => self.record(&conn, media_type, library, &path, arbitration, &mut report),
                Err(e) => {
                    warn!(path = %path.display(), "Skipping file: {}", e);
                    report.failed += 1;
                }
            }
        }

        info!(
            %media_type,
            discovered = report.discovered,
            skipped = report.skipped,
            inserted = report.inserted,
            markers = report.markers,
            removed = report.removed,
            failed = report.failed,
            "Scan complete"
        );

        Ok(report)
    }

    fn record(
        &self,
        conn: &rusqlite::Connection,
        media_type: MediaType,
        library: &LibraryConfig,
        path: &Path,
        arbitration: Arbitration,
        report: &mut ScanReport,
    ) {
        let path_str = path.to_string_lossy();
        let type_confidence = arbitration.confidence(media_type);
        let probe = arbitration.probe.clone();

        let mut meta = match arbitration.into_winner() {
            Some(meta) if meta.media_type() == media_type => meta,
            other => {
                debug!(
                    path = %path.display(),
                    winner = ?other.as_ref().map(MediaMeta::media_type),
                    confidence = type_confidence,
                    "Recording low-confidence marker"
                );
                match catalog::upsert_marker(conn, media_type, &path_str, type_confidence) {
                    Ok(_) => report.markers += 1,
                    Err(e) => {
                        warn!(path = %path.display(), "Failed to record marker: {}", e);
                        report.failed += 1;
                    }
                }
                return;
            }
        };

        let is_processed = self.refine(media_type, &mut meta);

        let check = library
            .library_dir
            .as_deref()
            .map(|root| check_upgrade(&self.arbitrator, &meta, &probe, root))
            .unwrap_or_default();

        let status = EntryStatus {
            is_processed,
            already_exists: check.already_exists,
            is_upgrade: check.is_upgrade,
        };

        match catalog::upsert_entry(
            conn,
            &path_str,
            meta.confidence(),
            status,
            &reconcile::catalog_fields(&meta),
        ) {
            Ok(id) => {
                debug!(id, path = %path.display(), title = ?meta.title(), "Catalogued");
                report.inserted += 1;
            }
            Err(e) => {
                warn!(path = %path.display(), "Failed to catalogue: {}", e);
                report.failed += 1;
            }
        }
    }

    /// Run provider refinement, returning whether a match was applied.
    fn refine(&self, media_type: MediaType, meta: &mut MediaMeta) -> bool {
        let Some(provider) = self.providers.get(&media_type) else {
            return false;
        };

        match block_on(metadata::refine(provider.as_ref(), meta)) {
            Ok(Ok(refined)) => refined,
            Ok(Err(e)) | Err(e) => {
                warn!(provider = provider.name(), "Metadata lookup failed: {:#}", e);
                false
            }
        }
    }
}

impl<P: Prober + 'static> MediaManager<P> {
    /// Process every configured media type concurrently.
    pub async fn process_all(self: Arc<Self>) -> Vec<Result<ScanReport>> {
        let types = self.config.enabled_types();
        self.process_types(types).await
    }

    /// Process `types` concurrently, one blocking task per type.
    ///
    /// Results come back in the order of `types`.
    pub async fn process_types(self: Arc<Self>, types: Vec<MediaType>) -> Vec<Result<ScanReport>> {
        let handles: Vec<_> = types
            .into_iter()
            .map(|media_type| {
                let manager = Arc::clone(&self);
                tokio::task::spawn_blocking(move || manager.process(media_type))
            })
            .collect();

        let mut reports = Vec::with_capacity(handles.len());
        for handle in handles {
            reports.push(match handle.await {
                Ok(result) => result,
                Err(e) => Err(anyhow::anyhow!("scan task failed: {}", e)),
            });
        }
        reports
    }
}

/// Drive `future` from synchronous scan code.
///
/// Scans normally run on blocking threads of an existing runtime. Called
/// straight from a multi-thread runtime worker, the worker is handed over
/// with `block_in_place` first. A current-thread runtime cannot be blocked
/// from its own thread, so lookups there fail instead of panicking. With no
/// runtime at all a throwaway current-thread runtime is used.
fn block_on<F: Future>(future: F) -> Result<F::Output> {
    use tokio::runtime::{Handle, RuntimeFlavor};

    match Handle::try_current() {
        Ok(handle) => match handle.runtime_flavor() {
            RuntimeFlavor::CurrentThread => Err(anyhow::anyhow!(
                "metadata lookup cannot block a current-thread runtime; run the scan with spawn_blocking"
            )),
            _ => Ok(tokio::task::block_in_place(|| handle.block_on(future))),
        },
        Err(_) => {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .context("failed to start runtime for metadata lookup")?;
            Ok(runtime.block_on(future))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_writes() {
        let mut report = ScanReport::new(MediaType::Music);
        assert_eq!(report.writes(), 0);
        report.skipped = 10;
        report.failed = 2;
        assert_eq!(report.writes(), 0);
        report.inserted = 1;
        report.markers = 2;
        report.removed = 3;
        assert_eq!(report.writes(), 6);
    }

    #[test]
    fn test_locks_are_per_type() {
        let locks = ScanLocks::default();
        let _movies = locks.get(MediaType::Movies).lock();
        assert!(locks.get(MediaType::Movies).try_lock().is_none());
        assert!(locks.get(MediaType::Shows).try_lock().is_some());
    }
}
