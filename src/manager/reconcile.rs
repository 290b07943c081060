//! Catalog sweep, upload discovery, and row projection.

use rusqlite::Connection;
use stagehand_common::MediaType;
use stagehand_db::queries::catalog;
use stagehand_db::CatalogFields;
use stagehand_parser::MediaMeta;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Delete rows whose file is gone, returning how many were removed.
///
/// `known` is the `(id, path)` listing of the type's table. A failed delete
/// is logged and reported as zero removals.
pub fn sweep(conn: &Connection, media_type: MediaType, known: &[(i64, String)]) -> usize {
    let missing: Vec<i64> = known
        .iter()
        .filter(|(_, path)| !Path::new(path).is_file())
        .map(|(id, _)| *id)
        .collect();

    if missing.is_empty() {
        return 0;
    }

    match catalog::delete_ids(conn, media_type, &missing) {
        Ok(removed) => {
            debug!(%media_type, removed, "Swept missing files");
            removed
        }
        Err(e) => {
            warn!(%media_type, "Failed to sweep {} missing files: {}", missing.len(), e);
            0
        }
    }
}

/// Files under `upload_dir`, split into new and already-catalogued.
pub fn discover(upload_dir: &Path, known: &HashSet<&str>) -> (Vec<PathBuf>, usize) {
    let mut fresh = Vec::new();
    let mut skipped = 0;

    for entry in WalkDir::new(upload_dir)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| match e {
            Ok(entry) => Some(entry),
            Err(err) => {
                warn!("Skipping unreadable entry under {:?}: {}", upload_dir, err);
                None
            }
        })
    {
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.into_path();
        if known.contains(path.to_string_lossy().as_ref()) {
            skipped += 1;
        } else {
            fresh.push(path);
        }
    }

    (fresh, skipped)
}

/// Project a classification onto its catalog columns.
pub fn catalog_fields(meta: &MediaMeta) -> CatalogFields {
    match meta {
        MediaMeta::Movie(m) => CatalogFields::Movie {
            title: m.title.clone(),
            year: m.year,
            part: m.part,
            movie_id: m.external_ids.movie_id.clone(),
        },
        MediaMeta::Show(s) => CatalogFields::Show {
            show_name: s.show_name.clone(),
            season: s.season,
            episode: s.episode,
            episode_last: s.episode_last,
            episode_name: s.episode_name.clone(),
            show_id: s.external_ids.show_id.clone(),
            episode_id: s.external_ids.episode_id.clone(),
        },
        MediaMeta::Music(m) => CatalogFields::Music {
            artist: m.artist.clone(),
            album: m.album.clone(),
            year: m.year,
            track: m.track,
            title: m.title.clone(),
            artist_id: m.external_ids.artist_id.clone(),
            album_id: m.external_ids.album_id.clone(),
            track_id: m.external_ids.track_id.clone(),
        },
    }
}
