//! Read-only catalog statistics, printed by `cli-catalog stats`.

use super::models::{CatalogStats, CategoryStats};
use super::store::SqliteCatalogStore;
use anyhow::Result;
use std::collections::BTreeMap;

impl SqliteCatalogStore {
    pub fn stats(&self) -> Result<CatalogStats> {
        let read_conn = self.get_read_conn();
        let conn = read_conn.lock().unwrap();

        let total_songs: i64 = conn.query_row("SELECT COUNT(*) FROM songs", [], |r| r.get(0))?;

        // (category, difficulty) -> songs
        let mut per_category: BTreeMap<String, BTreeMap<i64, usize>> = BTreeMap::new();
        let mut stmt = conn.prepare(
            "SELECT c.name, s.difficulty, COUNT(*)
               FROM categories c
               LEFT JOIN song_categories sc ON sc.category_rowid = c.rowid
               LEFT JOIN songs s ON s.rowid = sc.song_rowid
              GROUP BY c.name, s.difficulty",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, Option<i64>>(1)?,
                row.get::<_, i64>(2)?,
            ))
        })?;
        for row in rows {
            let (name, difficulty, count) = row?;
            let breakdown = per_category.entry(name).or_default();
            if let Some(difficulty) = difficulty {
                breakdown.insert(difficulty, count as usize);
            }
        }
        let mut categories: Vec<CategoryStats> = per_category
            .into_iter()
            .map(|(name, breakdown)| CategoryStats {
                name,
                songs: breakdown.values().sum(),
                difficulty_breakdown: breakdown.into_iter().collect(),
            })
            .collect();
        categories.sort_by(|a, b| b.songs.cmp(&a.songs).then_with(|| a.name.cmp(&b.name)));

        let mut stmt = conn.prepare(
            "SELECT difficulty, COUNT(*) FROM songs GROUP BY difficulty ORDER BY difficulty",
        )?;
        let difficulty_distribution = stmt
            .query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)? as usize)))?
            .collect::<Result<Vec<_>, _>>()?;

        let (oldest_release_year, newest_release_year): (Option<i32>, Option<i32>) = conn
            .query_row(
                "SELECT MIN(release_year), MAX(release_year) FROM songs",
                [],
                |r| Ok((r.get(0)?, r.get(1)?)),
            )?;

        let mut stmt = conn.prepare(
            "SELECT region, COUNT(*) AS n FROM songs GROUP BY region ORDER BY n DESC, region",
        )?;
        let regions = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as usize))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(CatalogStats {
            total_songs: total_songs as usize,
            categories,
            difficulty_distribution,
            oldest_release_year,
            newest_release_year,
            regions,
        })
    }
}
