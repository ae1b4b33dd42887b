//! SQLite-backed catalog store.

use super::filter::CatalogFilter;
use super::models::*;
use super::schema::CATALOG_VERSIONED_SCHEMAS;
use super::trait_def::{CatalogStore, WritableCatalogStore};
use crate::sqlite_persistence::bootstrap_schema;
use anyhow::{Context, Result};
use rusqlite::{params, params_from_iter, types::Type, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

const SONG_COLUMNS: &str =
    "s.id, s.title, s.artists, s.media_ref, s.duration_secs, s.release_year, s.region, s.difficulty";

/// SQLite-backed song catalog.
///
/// Writes go through a single connection; reads are spread round-robin over a
/// pool of read-only connections.
#[derive(Clone)]
pub struct SqliteCatalogStore {
    read_pool: Vec<Arc<Mutex<Connection>>>,
    write_conn: Arc<Mutex<Connection>>,
    read_index: Arc<AtomicUsize>,
}

impl SqliteCatalogStore {
    /// Opens (or creates) the catalog at `db_path`.
    ///
    /// `read_pool_size` is clamped to at least one connection.
    pub fn new<P: AsRef<Path>>(db_path: P, read_pool_size: usize) -> Result<Self> {
        let db_path_ref = db_path.as_ref();

        let mut write_conn = Connection::open_with_flags(
            db_path_ref,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI
                | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .with_context(|| format!("Failed to open catalog database {:?}", db_path_ref))?;

        bootstrap_schema(&mut write_conn, CATALOG_VERSIONED_SCHEMAS, "catalog")?;
        write_conn.pragma_update(None, "journal_mode", "WAL")?;

        let song_count: i64 = write_conn.query_row("SELECT COUNT(*) FROM songs", [], |r| r.get(0))?;
        let category_count: i64 =
            write_conn.query_row("SELECT COUNT(*) FROM categories", [], |r| r.get(0))?;
        info!(
            "Opened song catalog: {} songs, {} categories",
            song_count, category_count
        );

        let mut read_pool = Vec::with_capacity(read_pool_size.max(1));
        for _ in 0..read_pool_size.max(1) {
            let read_conn = Connection::open_with_flags(
                db_path_ref,
                rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY
                    | rusqlite::OpenFlags::SQLITE_OPEN_URI
                    | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )?;
            read_pool.push(Arc::new(Mutex::new(read_conn)));
        }

        Ok(SqliteCatalogStore {
            write_conn: Arc::new(Mutex::new(write_conn)),
            read_pool,
            read_index: Arc::new(AtomicUsize::new(0)),
        })
    }

    pub(super) fn get_read_conn(&self) -> Arc<Mutex<Connection>> {
        let index = self.read_index.fetch_add(1, Ordering::SeqCst) % self.read_pool.len();
        self.read_pool[index].clone()
    }

    fn song_from_row(row: &Row) -> rusqlite::Result<Song> {
        let artists_json: String = row.get(2)?;
        let artists: Vec<String> = serde_json::from_str(&artists_json)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(e)))?;
        Ok(Song {
            id: row.get(0)?,
            title: row.get(1)?,
            artists,
            media_ref: row.get(3)?,
            duration_secs: row.get(4)?,
            release_year: row.get(5)?,
            region: row.get(6)?,
            difficulty: row.get(7)?,
        })
    }

    fn get_song_rowid(conn: &Connection, id: &str) -> Result<Option<i64>> {
        Ok(conn
            .query_row("SELECT rowid FROM songs WHERE id = ?1", params![id], |r| {
                r.get(0)
            })
            .optional()?)
    }

    fn get_song_in(conn: &Connection, id: &str) -> Result<Option<Song>> {
        Ok(conn
            .prepare_cached(&format!("SELECT {} FROM songs s WHERE s.id = ?1", SONG_COLUMNS))?
            .query_row(params![id], Self::song_from_row)
            .optional()?)
    }

    fn get_category_rowid(conn: &Connection, id: &str) -> Result<Option<i64>> {
        Ok(conn
            .query_row(
                "SELECT rowid FROM categories WHERE id = ?1",
                params![id],
                |r| r.get(0),
            )
            .optional()?)
    }
}

impl CatalogStore for SqliteCatalogStore {
    fn count(&self, filter: &CatalogFilter) -> Result<usize> {
        let (where_sql, values) = filter.to_sql();
        let read_conn = self.get_read_conn();
        let conn = read_conn.lock().unwrap();
        let count: i64 = conn
            .prepare_cached(&format!("SELECT COUNT(*) FROM songs s WHERE {}", where_sql))?
            .query_row(params_from_iter(values.iter()), |r| r.get(0))
            .context("Failed to count songs")?;
        Ok(count as usize)
    }

    fn find_random(&self, filter: &CatalogFilter) -> Result<Option<Song>> {
        let (where_sql, values) = filter.to_sql();
        let read_conn = self.get_read_conn();
        let conn = read_conn.lock().unwrap();
        let song = conn
            .prepare_cached(&format!(
                "SELECT {} FROM songs s WHERE {} ORDER BY RANDOM() LIMIT 1",
                SONG_COLUMNS, where_sql
            ))?
            .query_row(params_from_iter(values.iter()), Self::song_from_row)
            .optional()
            .context("Failed to sample a song")?;
        Ok(song)
    }

    fn list_categories(&self) -> Result<Vec<Category>> {
        let read_conn = self.get_read_conn();
        let conn = read_conn.lock().unwrap();
        let mut stmt = conn.prepare_cached("SELECT id, name FROM categories ORDER BY name")?;
        let categories = stmt
            .query_map([], |row| {
                Ok(Category {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(categories)
    }

    fn get_song(&self, id: &str) -> Result<Option<Song>> {
        let read_conn = self.get_read_conn();
        let conn = read_conn.lock().unwrap();
        let song = conn
            .prepare_cached(&format!("SELECT {} FROM songs s WHERE s.id = ?1", SONG_COLUMNS))?
            .query_row(params![id], Self::song_from_row)
            .optional()?;
        Ok(song)
    }

    fn songs_count(&self) -> Result<usize> {
        let read_conn = self.get_read_conn();
        let conn = read_conn.lock().unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM songs", [], |r| r.get(0))
            .context("Failed to count catalog songs")?;
        Ok(count as usize)
    }

    fn ping(&self) -> Result<()> {
        let read_conn = self.get_read_conn();
        let conn = read_conn.lock().unwrap();
        conn.query_row("SELECT 1", [], |_| Ok(()))
            .context("Catalog database did not answer")
    }
}

impl WritableCatalogStore for SqliteCatalogStore {
    fn upsert_category(&self, name: &str) -> Result<Category> {
        let conn = self.write_conn.lock().unwrap();
        let existing = conn
            .query_row(
                "SELECT id FROM categories WHERE name = ?1",
                params![name],
                |r| r.get::<_, String>(0),
            )
            .optional()?;
        let id = match existing {
            Some(id) => id,
            None => {
                let id = uuid::Uuid::new_v4().to_string();
                conn.execute(
                    "INSERT INTO categories (id, name) VALUES (?1, ?2)",
                    params![id, name],
                )?;
                debug!("Created category {} ({})", name, id);
                id
            }
        };
        Ok(Category {
            id,
            name: name.to_string(),
        })
    }

    fn find_song_by_media_ref(&self, media_ref: &str) -> Result<Option<Song>> {
        let conn = self.write_conn.lock().unwrap();
        let song = conn
            .prepare_cached(&format!(
                "SELECT {} FROM songs s WHERE s.media_ref = ?1",
                SONG_COLUMNS
            ))?
            .query_row(params![media_ref], Self::song_from_row)
            .optional()?;
        Ok(song)
    }

    fn insert_song(&self, song: &NewSong, category_ids: &[String]) -> Result<Song> {
        let mut conn = self.write_conn.lock().unwrap();
        let tx = conn.transaction()?;

        let id = uuid::Uuid::new_v4().to_string();
        tx.execute(
            "INSERT INTO songs (id, title, artists, media_ref, duration_secs, release_year, region, difficulty)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                id,
                song.title,
                serde_json::to_string(&song.artists)?,
                song.media_ref,
                song.duration_secs,
                song.release_year,
                song.region,
                song.difficulty,
            ],
        )
        .with_context(|| format!("Failed to insert song {}", song.media_ref))?;
        let song_rowid = tx.last_insert_rowid();

        for category_id in category_ids {
            let category_rowid = Self::get_category_rowid(&tx, category_id)?
                .with_context(|| format!("Unknown category {}", category_id))?;
            tx.execute(
                "INSERT OR IGNORE INTO song_categories (song_rowid, category_rowid) VALUES (?1, ?2)",
                params![song_rowid, category_rowid],
            )?;
        }
        tx.commit()?;

        Ok(Song {
            id,
            title: song.title.clone(),
            artists: song.artists.clone(),
            media_ref: song.media_ref.clone(),
            duration_secs: song.duration_secs,
            release_year: song.release_year,
            region: song.region.clone(),
            difficulty: song.difficulty,
        })
    }

    fn add_song_category(&self, song_id: &str, category_id: &str) -> Result<bool> {
        let conn = self.write_conn.lock().unwrap();
        let song_rowid = Self::get_song_rowid(&conn, song_id)?
            .with_context(|| format!("Unknown song {}", song_id))?;
        let category_rowid = Self::get_category_rowid(&conn, category_id)?
            .with_context(|| format!("Unknown category {}", category_id))?;
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO song_categories (song_rowid, category_rowid) VALUES (?1, ?2)",
            params![song_rowid, category_rowid],
        )?;
        Ok(inserted > 0)
    }

    fn delete_songs(&self, song_ids: &[String]) -> Result<SongDeletion> {
        let mut conn = self.write_conn.lock().unwrap();
        let tx = conn.transaction()?;
        let mut outcome = SongDeletion::default();
        let mut seen = std::collections::HashSet::new();
        for id in song_ids.iter().filter(|id| seen.insert(id.as_str())) {
            match Self::get_song_in(&tx, id)? {
                Some(song) => {
                    tx.execute("DELETE FROM songs WHERE id = ?1", params![id])
                        .with_context(|| format!("Failed to delete song {}", id))?;
                    outcome.deleted.push(song);
                }
                None => outcome.not_found.push(id.clone()),
            }
        }
        tx.commit()?;
        info!(
            "Deleted {} songs ({} ids not found)",
            outcome.deleted.len(),
            outcome.not_found.len()
        );
        Ok(outcome)
    }

    fn remove_song_category(
        &self,
        song_ids: &[String],
        category_name: &str,
    ) -> Result<Option<CategoryRemoval>> {
        let mut conn = self.write_conn.lock().unwrap();
        let tx = conn.transaction()?;
        let Some(category_rowid) = tx
            .query_row(
                "SELECT rowid FROM categories WHERE name = ?1",
                params![category_name],
                |r| r.get::<_, i64>(0),
            )
            .optional()?
        else {
            return Ok(None);
        };

        let mut outcome = CategoryRemoval::default();
        let mut seen = std::collections::HashSet::new();
        for id in song_ids.iter().filter(|id| seen.insert(id.as_str())) {
            let (Some(song_rowid), Some(song)) =
                (Self::get_song_rowid(&tx, id)?, Self::get_song_in(&tx, id)?)
            else {
                outcome.not_found.push(id.clone());
                continue;
            };
            let removed = tx.execute(
                "DELETE FROM song_categories WHERE song_rowid = ?1 AND category_rowid = ?2",
                params![song_rowid, category_rowid],
            )?;
            if removed > 0 {
                outcome.removed.push(song);
            } else {
                outcome.without_category.push(song);
            }
        }
        tx.commit()?;
        info!(
            "Removed category {} from {} songs",
            category_name,
            outcome.removed.len()
        );
        Ok(Some(outcome))
    }

    fn create_report(
        &self,
        song_id: &str,
        category: ReportCategory,
        message: &str,
    ) -> Result<Option<SongReport>> {
        let conn = self.write_conn.lock().unwrap();
        let Some(song_rowid) = Self::get_song_rowid(&conn, song_id)? else {
            return Ok(None);
        };
        let id = uuid::Uuid::new_v4().to_string();
        let created_at = chrono::Utc::now().timestamp();
        conn.execute(
            "INSERT INTO song_reports (id, song_rowid, category, message, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![id, song_rowid, category.to_db_str(), message, created_at],
        )?;
        info!(
            "Song {} reported as {}",
            song_id,
            category.to_db_str()
        );
        Ok(Some(SongReport {
            id,
            song_id: song_id.to_string(),
            category,
            message: message.to_string(),
            created_at,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog_store::filter::{CategoryClause, RatingRange, YearBound};
    use std::collections::BTreeSet;
    use tempfile::TempDir;

    fn new_song(media_ref: &str, difficulty: i64, year: i32, region: &str) -> NewSong {
        NewSong {
            title: format!("Title {}", media_ref),
            artists: vec!["Artist".to_string()],
            media_ref: media_ref.to_string(),
            duration_secs: 200,
            release_year: year,
            region: region.to_string(),
            difficulty,
        }
    }

    fn open_store() -> (TempDir, SqliteCatalogStore) {
        let dir = TempDir::new().unwrap();
        let store = SqliteCatalogStore::new(dir.path().join("catalog.db"), 2).unwrap();
        (dir, store)
    }

    #[test]
    fn test_insert_and_get_song() {
        let (_dir, store) = open_store();
        let rock = store.upsert_category("rock").unwrap();
        let inserted = store
            .insert_song(&new_song("m1", 2, 1991, "international"), &[rock.id.clone()])
            .unwrap();

        let fetched = store.get_song(&inserted.id).unwrap().unwrap();
        assert_eq!(fetched, inserted);
        assert_eq!(store.songs_count().unwrap(), 1);
        assert!(store.get_song("missing").unwrap().is_none());
    }

    #[test]
    fn test_upsert_category_is_idempotent() {
        let (_dir, store) = open_store();
        let first = store.upsert_category("disco").unwrap();
        let second = store.upsert_category("disco").unwrap();
        assert_eq!(first, second);
        assert_eq!(store.list_categories().unwrap().len(), 1);
    }

    #[test]
    fn test_count_and_find_random_respect_filter() {
        let (_dir, store) = open_store();
        let rock = store.upsert_category("rock").unwrap();
        let rap = store.upsert_category("rap").unwrap();
        store
            .insert_song(&new_song("a", 1, 1985, "local"), &[rock.id.clone()])
            .unwrap();
        store
            .insert_song(&new_song("b", 4, 2010, "local"), &[rap.id.clone()])
            .unwrap();
        store
            .insert_song(&new_song("c", 5, 2020, "international"), &[rap.id.clone()])
            .unwrap();

        let filter = CatalogFilter {
            difficulty: Some(RatingRange::new(3, 5)),
            region: Some("local".to_string()),
            era: Some(YearBound::Between {
                from: 2000,
                to: 2015,
            }),
            categories: Some(CategoryClause {
                include: BTreeSet::from([rap.id.clone()]),
                exclude: BTreeSet::new(),
            }),
        };
        assert_eq!(store.count(&filter).unwrap(), 1);
        assert_eq!(store.find_random(&filter).unwrap().unwrap().media_ref, "b");

        assert_eq!(store.count(&CatalogFilter::default()).unwrap(), 3);
    }

    #[test]
    fn test_exclude_clause_drops_overlapping_songs() {
        let (_dir, store) = open_store();
        let rock = store.upsert_category("rock").unwrap();
        let misc = store.upsert_category("misc").unwrap();
        store
            .insert_song(
                &new_song("both", 3, 2001, "local"),
                &[rock.id.clone(), misc.id.clone()],
            )
            .unwrap();
        store
            .insert_song(&new_song("only-misc", 3, 2001, "local"), &[misc.id.clone()])
            .unwrap();

        let filter = CatalogFilter {
            categories: Some(CategoryClause {
                include: BTreeSet::from([misc.id.clone()]),
                exclude: BTreeSet::from([rock.id.clone()]),
            }),
            ..Default::default()
        };
        assert_eq!(store.count(&filter).unwrap(), 1);
        assert_eq!(
            store.find_random(&filter).unwrap().unwrap().media_ref,
            "only-misc"
        );
    }

    #[test]
    fn test_find_random_on_empty_match_returns_none() {
        let (_dir, store) = open_store();
        let filter = CatalogFilter {
            categories: Some(CategoryClause::default()),
            ..Default::default()
        };
        assert!(store.find_random(&filter).unwrap().is_none());
        assert_eq!(store.count(&filter).unwrap(), 0);
    }

    #[test]
    fn test_add_song_category_reports_duplicates() {
        let (_dir, store) = open_store();
        let pop = store.upsert_category("pop").unwrap();
        let song = store
            .insert_song(&new_song("x", 2, 2005, "local"), &[])
            .unwrap();

        assert!(store.add_song_category(&song.id, &pop.id).unwrap());
        assert!(!store.add_song_category(&song.id, &pop.id).unwrap());
        assert!(store.add_song_category("nope", &pop.id).is_err());
    }

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_delete_songs_cascades_memberships_and_reports() {
        let (_dir, store) = open_store();
        let rock = store.upsert_category("rock").unwrap();
        let gone = store
            .insert_song(&new_song("gone", 3, 2001, "local"), &[rock.id.clone()])
            .unwrap();
        let kept = store
            .insert_song(&new_song("kept", 3, 2001, "local"), &[rock.id.clone()])
            .unwrap();
        store
            .create_report(&gone.id, ReportCategory::SongIssue, "broken")
            .unwrap()
            .unwrap();

        let outcome = store
            .delete_songs(&ids(&[gone.id.as_str(), "missing", gone.id.as_str()]))
            .unwrap();
        assert_eq!(outcome.deleted, vec![gone.clone()]);
        assert_eq!(outcome.not_found, ids(&["missing"]));

        assert!(store.get_song(&gone.id).unwrap().is_none());
        assert_eq!(store.get_song(&kept.id).unwrap(), Some(kept));
        assert_eq!(store.songs_count().unwrap(), 1);
        let filter = CatalogFilter {
            categories: Some(CategoryClause {
                include: BTreeSet::from([rock.id.clone()]),
                exclude: BTreeSet::new(),
            }),
            ..Default::default()
        };
        assert_eq!(store.count(&filter).unwrap(), 1);

        let conn = store.write_conn.lock().unwrap();
        let memberships: i64 = conn
            .query_row("SELECT COUNT(*) FROM song_categories", [], |r| r.get(0))
            .unwrap();
        let reports: i64 = conn
            .query_row("SELECT COUNT(*) FROM song_reports", [], |r| r.get(0))
            .unwrap();
        assert_eq!(memberships, 1);
        assert_eq!(reports, 0);
    }

    #[test]
    fn test_delete_songs_with_unknown_ids_changes_nothing() {
        let (_dir, store) = open_store();
        store
            .insert_song(&new_song("a", 3, 2001, "local"), &[])
            .unwrap();

        let outcome = store.delete_songs(&ids(&["x", "y"])).unwrap();
        assert!(outcome.deleted.is_empty());
        assert_eq!(outcome.not_found, ids(&["x", "y"]));
        assert_eq!(store.songs_count().unwrap(), 1);
    }

    #[test]
    fn test_remove_song_category_splits_songs() {
        let (_dir, store) = open_store();
        let rock = store.upsert_category("rock").unwrap();
        let pop = store.upsert_category("pop").unwrap();
        let tagged = store
            .insert_song(
                &new_song("tagged", 3, 2001, "local"),
                &[rock.id.clone(), pop.id.clone()],
            )
            .unwrap();
        let untagged = store
            .insert_song(&new_song("untagged", 3, 2001, "local"), &[pop.id.clone()])
            .unwrap();

        let outcome = store
            .remove_song_category(&ids(&[tagged.id.as_str(), untagged.id.as_str(), "missing"]), "rock")
            .unwrap()
            .unwrap();
        assert_eq!(outcome.removed, vec![tagged.clone()]);
        assert_eq!(outcome.without_category, vec![untagged]);
        assert_eq!(outcome.not_found, ids(&["missing"]));

        let only = |id: &str| CatalogFilter {
            categories: Some(CategoryClause {
                include: BTreeSet::from([id.to_string()]),
                exclude: BTreeSet::new(),
            }),
            ..Default::default()
        };
        assert_eq!(store.count(&only(&rock.id)).unwrap(), 0);
        assert_eq!(store.count(&only(&pop.id)).unwrap(), 2);
        assert!(store.get_song(&tagged.id).unwrap().is_some());
    }

    #[test]
    fn test_remove_unknown_category_returns_none() {
        let (_dir, store) = open_store();
        let song = store
            .insert_song(&new_song("s", 3, 2001, "local"), &[])
            .unwrap();
        assert!(store
            .remove_song_category(&ids(&[song.id.as_str()]), "jazz")
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_create_report_for_unknown_song_returns_none() {
        let (_dir, store) = open_store();
        let song = store
            .insert_song(&new_song("r", 2, 2005, "local"), &[])
            .unwrap();

        let report = store
            .create_report(&song.id, ReportCategory::SongIssue, "video removed")
            .unwrap()
            .unwrap();
        assert_eq!(report.song_id, song.id);
        assert!(store
            .create_report("unknown", ReportCategory::Other, "")
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_reopen_keeps_data() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("catalog.db");
        {
            let store = SqliteCatalogStore::new(&path, 1).unwrap();
            store
                .insert_song(&new_song("keep", 2, 1999, "local"), &[])
                .unwrap();
        }
        let store = SqliteCatalogStore::new(&path, 1).unwrap();
        assert!(store.find_song_by_media_ref("keep").unwrap().is_some());
        store.ping().unwrap();
    }
}
