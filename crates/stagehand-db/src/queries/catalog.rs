//! Catalog queries.
//!
//! Every operation is scoped to one media type's table. Rows are keyed by
//! absolute path: upserts insert when the path is absent and update in
//! place otherwise.

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{named_params, Connection, Row};
use stagehand_common::{Error, MediaType, Result};

use crate::models::{CatalogEntry, CatalogFields, EntryStatus};

/// Upper bound on ids bound into one `DELETE ... IN (...)` statement.
const DELETE_CHUNK: usize = 500;

const COMMON_COLUMNS: &str =
    "id, path, confidence, is_processed, already_exists, is_upgrade, updated_at";

/// Catalog table backing `media_type`.
pub fn table_name(media_type: MediaType) -> &'static str {
    match media_type {
        MediaType::Movies => "mm_movies",
        MediaType::Shows => "mm_shows",
        MediaType::Music => "mm_music",
    }
}

fn type_columns(media_type: MediaType) -> &'static str {
    match media_type {
        MediaType::Movies => "title, year, part, movie_id",
        MediaType::Shows => {
            "show_name, season, episode, episode_last, episode_name, show_id, episode_id"
        }
        MediaType::Music => {
            "artist, album, year, track, title, artist_id, album_id, track_id"
        }
    }
}

fn select_sql(media_type: MediaType) -> String {
    format!(
        "SELECT {}, {} FROM {}",
        COMMON_COLUMNS,
        type_columns(media_type),
        table_name(media_type)
    )
}

fn parse_timestamp(index: usize, raw: String) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(e)))
}

fn row_to_fields(media_type: MediaType, row: &Row<'_>) -> rusqlite::Result<CatalogFields> {
    Ok(match media_type {
        MediaType::Movies => CatalogFields::Movie {
            title: row.get("title")?,
            year: row.get("year")?,
            part: row.get("part")?,
            movie_id: row.get("movie_id")?,
        },
        MediaType::Shows => CatalogFields::Show {
            show_name: row.get("show_name")?,
            season: row.get("season")?,
            episode: row.get("episode")?,
            episode_last: row.get("episode_last")?,
            episode_name: row.get("episode_name")?,
            show_id: row.get("show_id")?,
            episode_id: row.get("episode_id")?,
        },
        MediaType::Music => CatalogFields::Music {
            artist: row.get("artist")?,
            album: row.get("album")?,
            year: row.get("year")?,
            track: row.get("track")?,
            title: row.get("title")?,
            artist_id: row.get("artist_id")?,
            album_id: row.get("album_id")?,
            track_id: row.get("track_id")?,
        },
    })
}

fn row_to_entry(media_type: MediaType, row: &Row<'_>) -> rusqlite::Result<CatalogEntry> {
    Ok(CatalogEntry {
        id: row.get(0)?,
        path: row.get(1)?,
        confidence: row.get(2)?,
        status: EntryStatus {
            is_processed: row.get(3)?,
            already_exists: row.get(4)?,
            is_upgrade: row.get(5)?,
        },
        updated_at: parse_timestamp(6, row.get(6)?)?,
        fields: row_to_fields(media_type, row)?,
    })
}

/// List `(id, path)` for every row of `media_type`.
pub fn list_paths(conn: &Connection, media_type: MediaType) -> Result<Vec<(i64, String)>> {
    let sql = format!("SELECT id, path FROM {} ORDER BY id", table_name(media_type));
    let mut stmt = conn
        .prepare(&sql)
        .map_err(|e| Error::database(e.to_string()))?;

    let rows = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;

    Ok(rows)
}

/// List every row of `media_type`, ordered by path.
pub fn list_entries(conn: &Connection, media_type: MediaType) -> Result<Vec<CatalogEntry>> {
    let sql = format!("{} ORDER BY path", select_sql(media_type));
    let mut stmt = conn
        .prepare(&sql)
        .map_err(|e| Error::database(e.to_string()))?;

    let entries = stmt
        .query_map([], |row| row_to_entry(media_type, row))
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;

    Ok(entries)
}

/// Get the row for `path`.
///
/// # Returns
///
/// * `Ok(Some(CatalogEntry))` - The row if found
/// * `Ok(None)` - If the path is not catalogued
/// * `Err(Error)` - If a database error occurs
pub fn get_entry_by_path(
    conn: &Connection,
    media_type: MediaType,
    path: &str,
) -> Result<Option<CatalogEntry>> {
    let sql = format!("{} WHERE path = :path", select_sql(media_type));
    let result = conn.query_row(&sql, named_params! { ":path": path }, |row| {
        row_to_entry(media_type, row)
    });

    match result {
        Ok(entry) => Ok(Some(entry)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(Error::database(e.to_string())),
    }
}

/// Count rows of `media_type`.
pub fn count_entries(conn: &Connection, media_type: MediaType) -> Result<i64> {
    let sql = format!("SELECT COUNT(*) FROM {}", table_name(media_type));
    conn.query_row(&sql, [], |row| row.get(0))
        .map_err(|e| Error::database(e.to_string()))
}

/// Insert or update a fully classified row, returning its id.
pub fn upsert_entry(
    conn: &Connection,
    path: &str,
    confidence: f64,
    status: EntryStatus,
    fields: &CatalogFields,
) -> Result<i64> {
    let now = Utc::now().to_rfc3339();

    let result = match fields {
        CatalogFields::Movie {
            title,
            year,
            part,
            movie_id,
        } => conn.query_row(
            "INSERT INTO mm_movies
                (path, title, year, part, movie_id,
                 confidence, is_processed, already_exists, is_upgrade, updated_at)
             VALUES
                (:path, :title, :year, :part, :movie_id,
                 :confidence, :is_processed, :already_exists, :is_upgrade, :updated_at)
             ON CONFLICT(path) DO UPDATE SET
                title = excluded.title,
                year = excluded.year,
                part = excluded.part,
                movie_id = excluded.movie_id,
                confidence = excluded.confidence,
                is_processed = excluded.is_processed,
                already_exists = excluded.already_exists,
                is_upgrade = excluded.is_upgrade,
                updated_at = excluded.updated_at
             RETURNING id",
            named_params! {
                ":path": path,
                ":title": title,
                ":year": year,
                ":part": part,
                ":movie_id": movie_id,
                ":confidence": confidence,
                ":is_processed": status.is_processed,
                ":already_exists": status.already_exists,
                ":is_upgrade": status.is_upgrade,
                ":updated_at": now,
            },
            |row| row.get(0),
        ),
        CatalogFields::Show {
            show_name,
            season,
            episode,
            episode_last,
            episode_name,
            show_id,
            episode_id,
        } => conn.query_row(
            "INSERT INTO mm_shows
                (path, show_name, season, episode, episode_last, episode_name, show_id, episode_id,
                 confidence, is_processed, already_exists, is_upgrade, updated_at)
             VALUES
                (:path, :show_name, :season, :episode, :episode_last, :episode_name, :show_id, :episode_id,
                 :confidence, :is_processed, :already_exists, :is_upgrade, :updated_at)
             ON CONFLICT(path) DO UPDATE SET
                show_name = excluded.show_name,
                season = excluded.season,
                episode = excluded.episode,
                episode_last = excluded.episode_last,
                episode_name = excluded.episode_name,
                show_id = excluded.show_id,
                episode_id = excluded.episode_id,
                confidence = excluded.confidence,
                is_processed = excluded.is_processed,
                already_exists = excluded.already_exists,
                is_upgrade = excluded.is_upgrade,
                updated_at = excluded.updated_at
             RETURNING id",
            named_params! {
                ":path": path,
                ":show_name": show_name,
                ":season": season,
                ":episode": episode,
                ":episode_last": episode_last,
                ":episode_name": episode_name,
                ":show_id": show_id,
                ":episode_id": episode_id,
                ":confidence": confidence,
                ":is_processed": status.is_processed,
                ":already_exists": status.already_exists,
                ":is_upgrade": status.is_upgrade,
                ":updated_at": now,
            },
            |row| row.get(0),
        ),
        CatalogFields::Music {
            artist,
            album,
            year,
            track,
            title,
            artist_id,
            album_id,
            track_id,
        } => conn.query_row(
            "INSERT INTO mm_music
                (path, artist, album, year, track, title, artist_id, album_id, track_id,
                 confidence, is_processed, already_exists, is_upgrade, updated_at)
             VALUES
                (:path, :artist, :album, :year, :track, :title, :artist_id, :album_id, :track_id,
                 :confidence, :is_processed, :already_exists, :is_upgrade, :updated_at)
             ON CONFLICT(path) DO UPDATE SET
                artist = excluded.artist,
                album = excluded.album,
                year = excluded.year,
                track = excluded.track,
                title = excluded.title,
                artist_id = excluded.artist_id,
                album_id = excluded.album_id,
                track_id = excluded.track_id,
                confidence = excluded.confidence,
                is_processed = excluded.is_processed,
                already_exists = excluded.already_exists,
                is_upgrade = excluded.is_upgrade,
                updated_at = excluded.updated_at
             RETURNING id",
            named_params! {
                ":path": path,
                ":artist": artist,
                ":album": album,
                ":year": year,
                ":track": track,
                ":title": title,
                ":artist_id": artist_id,
                ":album_id": album_id,
                ":track_id": track_id,
                ":confidence": confidence,
                ":is_processed": status.is_processed,
                ":already_exists": status.already_exists,
                ":is_upgrade": status.is_upgrade,
                ":updated_at": now,
            },
            |row| row.get(0),
        ),
    };

    result.map_err(|e| Error::database(e.to_string()))
}

/// Record a file that did not classify confidently as `media_type`.
///
/// Only the confidence is kept and the row is marked processed, so the
/// path is skipped by later scans.
pub fn upsert_marker(
    conn: &Connection,
    media_type: MediaType,
    path: &str,
    confidence: f64,
) -> Result<i64> {
    let sql = format!(
        "INSERT INTO {} (path, confidence, is_processed, updated_at)
         VALUES (:path, :confidence, 1, :updated_at)
         ON CONFLICT(path) DO UPDATE SET
            confidence = excluded.confidence,
            is_processed = 1,
            updated_at = excluded.updated_at
         RETURNING id",
        table_name(media_type)
    );

    conn.query_row(
        &sql,
        named_params! {
            ":path": path,
            ":confidence": confidence,
            ":updated_at": Utc::now().to_rfc3339(),
        },
        |row| row.get(0),
    )
    .map_err(|e| Error::database(e.to_string()))
}

/// Delete rows by id in one transaction, returning the number removed.
pub fn delete_ids(conn: &Connection, media_type: MediaType, ids: &[i64]) -> Result<usize> {
    if ids.is_empty() {
        return Ok(0);
    }

    let tx = conn
        .unchecked_transaction()
        .map_err(|e| Error::database(e.to_string()))?;

    let mut deleted = 0;
    for chunk in ids.chunks(DELETE_CHUNK) {
        let placeholders = vec!["?"; chunk.len()].join(", ");
        let sql = format!(
            "DELETE FROM {} WHERE id IN ({})",
            table_name(media_type),
            placeholders
        );
        deleted += tx
            .execute(&sql, rusqlite::params_from_iter(chunk.iter()))
            .map_err(|e| Error::database(e.to_string()))?;
    }

    tx.commit().map_err(|e| Error::database(e.to_string()))?;
    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{get_conn, init_memory_pool};

    fn movie(title: &str, year: u16) -> CatalogFields {
        CatalogFields::Movie {
            title: Some(title.to_string()),
            year: Some(year),
            part: None,
            movie_id: None,
        }
    }

    #[test]
    fn test_upsert_inserts_then_updates() {
        let pool = init_memory_pool().unwrap();
        let conn = get_conn(&pool).unwrap();

        let status = EntryStatus {
            is_processed: false,
            ..Default::default()
        };
        let id = upsert_entry(&conn, "/up/matrix.mkv", 0.8, status, &movie("The Matrix", 1999)).unwrap();

        let entry = get_entry_by_path(&conn, MediaType::Movies, "/up/matrix.mkv")
            .unwrap()
            .unwrap();
        assert_eq!(entry.id, id);
        assert_eq!(entry.fields.title(), Some("The Matrix"));
        assert!(!entry.status.is_processed);

        let status = EntryStatus {
            is_processed: true,
            already_exists: true,
            is_upgrade: true,
        };
        let fields = CatalogFields::Movie {
            title: Some("The Matrix".to_string()),
            year: Some(1999),
            part: None,
            movie_id: Some("603".to_string()),
        };
        let again = upsert_entry(&conn, "/up/matrix.mkv", 0.9, status, &fields).unwrap();
        assert_eq!(again, id);
        assert_eq!(count_entries(&conn, MediaType::Movies).unwrap(), 1);

        let entry = get_entry_by_path(&conn, MediaType::Movies, "/up/matrix.mkv")
            .unwrap()
            .unwrap();
        assert_eq!(entry.status, status);
        assert_eq!(entry.confidence, 0.9);
        assert_eq!(entry.fields, fields);
    }

    #[test]
    fn test_unknown_fields_round_trip_as_null() {
        let pool = init_memory_pool().unwrap();
        let conn = get_conn(&pool).unwrap();

        let fields = CatalogFields::Show {
            show_name: Some("Firefly".to_string()),
            season: Some(1),
            episode: None,
            episode_last: None,
            episode_name: None,
            show_id: None,
            episode_id: None,
        };
        upsert_entry(&conn, "/up/firefly.mkv", 0.66, EntryStatus::default(), &fields).unwrap();

        let null_episodes: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM mm_shows WHERE episode IS NULL",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(null_episodes, 1);

        let entries = list_entries(&conn, MediaType::Shows).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].fields, fields);
    }

    #[test]
    fn test_marker_rows() {
        let pool = init_memory_pool().unwrap();
        let conn = get_conn(&pool).unwrap();

        upsert_marker(&conn, MediaType::Music, "/up/video.mkv", 0.35).unwrap();

        let entry = get_entry_by_path(&conn, MediaType::Music, "/up/video.mkv")
            .unwrap()
            .unwrap();
        assert!(entry.status.is_processed);
        assert_eq!(entry.confidence, 0.35);
        assert_eq!(entry.fields, CatalogFields::empty(MediaType::Music));
    }

    #[test]
    fn test_tables_are_per_type() {
        let pool = init_memory_pool().unwrap();
        let conn = get_conn(&pool).unwrap();

        upsert_marker(&conn, MediaType::Shows, "/up/a.mkv", 0.1).unwrap();
        upsert_entry(&conn, "/up/a.mkv", 0.9, EntryStatus::default(), &movie("A", 2001)).unwrap();

        assert_eq!(count_entries(&conn, MediaType::Shows).unwrap(), 1);
        assert_eq!(count_entries(&conn, MediaType::Movies).unwrap(), 1);
        assert_eq!(count_entries(&conn, MediaType::Music).unwrap(), 0);
        assert!(get_entry_by_path(&conn, MediaType::Music, "/up/a.mkv")
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_list_paths_and_delete() {
        let pool = init_memory_pool().unwrap();
        let conn = get_conn(&pool).unwrap();

        let a = upsert_marker(&conn, MediaType::Movies, "/up/a.mkv", 0.1).unwrap();
        let b = upsert_marker(&conn, MediaType::Movies, "/up/b.mkv", 0.1).unwrap();
        let c = upsert_marker(&conn, MediaType::Movies, "/up/c.mkv", 0.1).unwrap();

        let paths = list_paths(&conn, MediaType::Movies).unwrap();
        assert_eq!(
            paths,
            vec![
                (a, "/up/a.mkv".to_string()),
                (b, "/up/b.mkv".to_string()),
                (c, "/up/c.mkv".to_string()),
            ]
        );

        assert_eq!(delete_ids(&conn, MediaType::Movies, &[a, c]).unwrap(), 2);
        assert_eq!(delete_ids(&conn, MediaType::Movies, &[]).unwrap(), 0);
        assert_eq!(
            list_paths(&conn, MediaType::Movies).unwrap(),
            vec![(b, "/up/b.mkv".to_string())]
        );
    }

    #[test]
    fn test_delete_many_ids() {
        let pool = init_memory_pool().unwrap();
        let conn = get_conn(&pool).unwrap();

        let ids: Vec<i64> = (0..1200)
            .map(|i| upsert_marker(&conn, MediaType::Music, &format!("/up/{i}.mp3"), 0.0).unwrap())
            .collect();
        assert_eq!(delete_ids(&conn, MediaType::Music, &ids).unwrap(), 1200);
        assert_eq!(count_entries(&conn, MediaType::Music).unwrap(), 0);
    }
}
