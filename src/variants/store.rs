//! SQLite persistence for published variant tables.

use super::predicate::GroupReference;
use super::schema::VARIANTS_VERSIONED_SCHEMAS;
use super::table::{Variant, VariantTable};
use crate::groups::GroupName;
use crate::sqlite_persistence::bootstrap_schema;
use anyhow::{anyhow, Context, Result};
use rusqlite::{params, types::Type, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::info;

/// Holds the latest published variant table in `variants.db`.
#[derive(Clone)]
pub struct SqliteVariantStore {
    conn: Arc<Mutex<Connection>>,
}

fn json_column<T: serde::de::DeserializeOwned>(index: usize, raw: &str) -> rusqlite::Result<T> {
    serde_json::from_str(raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(e)))
}

impl SqliteVariantStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let db_path = db_path.as_ref();
        let mut conn = Connection::open(db_path)
            .with_context(|| format!("Failed to open variants database {:?}", db_path))?;
        bootstrap_schema(&mut conn, VARIANTS_VERSIONED_SCHEMAS, "variants")?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Ok(SqliteVariantStore {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Replaces the published table with `table`.
    ///
    /// Runs in a single transaction: readers see either the previous table or
    /// the new one, and a failure leaves the previous one in place.
    pub fn publish(&self, table: &VariantTable) -> Result<()> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        tx.execute("DELETE FROM variant_builds", [])?;
        tx.execute(
            "INSERT INTO variant_builds (build_id, built_at, catalog_songs, variant_count)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                table.build_id(),
                table.built_at(),
                table.catalog_songs() as i64,
                table.len() as i64
            ],
        )?;
        let build_rowid = tx.last_insert_rowid();

        {
            let mut stmt = tx.prepare(
                "INSERT INTO variants (build_rowid, key, predicate, genre_group_ref, match_count, rank)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for variant in table.ranked() {
                stmt.execute(params![
                    build_rowid,
                    variant.key.to_string(),
                    serde_json::to_string(&variant.predicate)?,
                    variant.genre_group_ref.map(|GroupReference(g)| g.token()),
                    variant.match_count as i64,
                    variant.rank as i64,
                ])?;
            }
        }
        tx.commit().context("Failed to commit variant table")?;

        info!(
            "Published variant table {} ({} variants)",
            table.build_id(),
            table.len()
        );
        Ok(())
    }

    pub fn latest_build_id(&self) -> Result<Option<String>> {
        let conn = self.conn.lock().unwrap();
        Ok(conn
            .query_row(
                "SELECT build_id FROM variant_builds ORDER BY rowid DESC LIMIT 1",
                [],
                |r| r.get(0),
            )
            .optional()?)
    }

    /// Loads the published table, or `None` if nothing was published yet.
    pub fn load_latest(&self) -> Result<Option<VariantTable>> {
        let conn = self.conn.lock().unwrap();
        let build = conn
            .query_row(
                "SELECT rowid, build_id, built_at, catalog_songs
                   FROM variant_builds ORDER BY rowid DESC LIMIT 1",
                [],
                |r| {
                    Ok((
                        r.get::<_, i64>(0)?,
                        r.get::<_, String>(1)?,
                        r.get::<_, i64>(2)?,
                        r.get::<_, i64>(3)?,
                    ))
                },
            )
            .optional()?;
        let Some((build_rowid, build_id, built_at, catalog_songs)) = build else {
            return Ok(None);
        };

        let mut stmt = conn.prepare(
            "SELECT key, predicate, genre_group_ref, match_count, rank
               FROM variants WHERE build_rowid = ?1 ORDER BY rank",
        )?;
        let variants = stmt
            .query_map(params![build_rowid], |row| {
                let key: String = row.get(0)?;
                let predicate: String = row.get(1)?;
                let group: Option<String> = row.get(2)?;
                Ok(Variant {
                    key: key.parse().map_err(|e| {
                        rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(e))
                    })?,
                    predicate: json_column(1, &predicate)?,
                    genre_group_ref: group
                        .map(|g| {
                            GroupName::from_token(&g).map(GroupReference).ok_or_else(|| {
                                rusqlite::Error::InvalidColumnType(2, g, Type::Text)
                            })
                        })
                        .transpose()?,
                    match_count: row.get::<_, i64>(3)? as usize,
                    rank: row.get::<_, i64>(4)? as usize,
                })
            })?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to read variants")?;

        let table = VariantTable::from_ranked(build_id, built_at, catalog_songs as usize, variants)
            .map_err(|reason| anyhow!("Stored variant table is inconsistent: {}", reason))?;
        Ok(Some(table))
    }
}
