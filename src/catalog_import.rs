//! Import of song lists exported as JSON into the catalog.
//!
//! A file holds one category and its songs:
//!
//! ```json
//! { "category": "Rock", "yearRange": { "start": 1960, "end": 1969 },
//!   "songs": [ { "mediaRef": "dQw4w9WgXcQ", "title": "...", "artists": ["..."],
//!                "durationSecs": 212 } ] }
//! ```
//!
//! Songs already in the catalog (same media ref) only gain the category.

use crate::catalog_store::{NewSong, WritableCatalogStore};
use anyhow::{Context, Result};
use rand::Rng;
use serde::Deserialize;
use std::fmt;
use std::path::Path;
use tracing::{debug, info, warn};

const DEFAULT_RELEASE_YEAR: i32 = 2000;
const DEFAULT_REGION: &str = "international";
const MIN_DIFFICULTY: i64 = 1;
const MAX_DIFFICULTY: i64 = 5;

#[derive(Debug, Deserialize, Clone, Copy)]
pub struct YearRange {
    pub start: i32,
    pub end: i32,
}

impl YearRange {
    fn midpoint(&self) -> i32 {
        (self.start + self.end).div_euclid(2)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportedSong {
    #[serde(alias = "videoId")]
    pub media_ref: String,
    #[serde(alias = "name")]
    pub title: String,
    #[serde(default)]
    pub artists: Vec<String>,
    /// Single-artist form found in older exports.
    #[serde(default)]
    pub artist: Option<String>,
    pub duration_secs: Option<u32>,
    pub difficulty: Option<i64>,
    pub release_year: Option<i32>,
    pub region: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportFile {
    pub category: String,
    #[serde(default)]
    pub year_range: Option<YearRange>,
    pub songs: Vec<ImportedSong>,
}

impl ImportFile {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read import file {:?}", path))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse import file {:?}", path))
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ImportStats {
    /// New songs inserted.
    pub added: usize,
    /// Existing songs that gained the category.
    pub updated: usize,
    /// Songs already in the category or unusable.
    pub skipped: usize,
}

impl fmt::Display for ImportStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Added:   {} new songs", self.added)?;
        writeln!(f, "Updated: {} songs (added category)", self.updated)?;
        write!(f, "Skipped: {} songs", self.skipped)
    }
}

enum SongOutcome {
    Added,
    Updated,
    Skipped(&'static str),
}

/// Imports every song of `file` into `store`. `category_override` replaces
/// the category named in the file.
pub fn import_file<R: Rng>(
    store: &dyn WritableCatalogStore,
    file: &ImportFile,
    category_override: Option<&str>,
    rng: &mut R,
) -> Result<ImportStats> {
    let category_name = category_override
        .unwrap_or(&file.category)
        .trim()
        .to_lowercase();
    if category_name.is_empty() {
        anyhow::bail!("Import file has no category");
    }
    let category = store.upsert_category(&category_name)?;
    let default_year = file
        .year_range
        .map(|range| range.midpoint())
        .unwrap_or(DEFAULT_RELEASE_YEAR);
    info!(
        "Importing {} songs into {} (default release year {})",
        file.songs.len(),
        category.name,
        default_year
    );

    let mut stats = ImportStats::default();
    for song in &file.songs {
        match import_song(store, song, &category.id, default_year, rng)
            .with_context(|| format!("Failed to import {:?}", song.media_ref))?
        {
            SongOutcome::Added => {
                stats.added += 1;
                if stats.added % 50 == 0 {
                    info!("Added {} songs...", stats.added);
                }
            }
            SongOutcome::Updated => {
                debug!("{:?} added to {}", song.title, category.name);
                stats.updated += 1;
            }
            SongOutcome::Skipped(reason) => {
                debug!("Skipped {:?}: {}", song.title, reason);
                stats.skipped += 1;
            }
        }
    }
    info!("Import into {} finished\n{}", category.name, stats);
    Ok(stats)
}

fn import_song<R: Rng>(
    store: &dyn WritableCatalogStore,
    song: &ImportedSong,
    category_id: &str,
    default_year: i32,
    rng: &mut R,
) -> Result<SongOutcome> {
    let media_ref = song.media_ref.trim();
    if media_ref.is_empty() {
        return Ok(SongOutcome::Skipped("no media ref"));
    }

    if let Some(existing) = store.find_song_by_media_ref(media_ref)? {
        return Ok(if store.add_song_category(&existing.id, category_id)? {
            SongOutcome::Updated
        } else {
            SongOutcome::Skipped("already in category")
        });
    }

    let duration_secs = match song.duration_secs {
        Some(secs) if secs > 0 => secs,
        _ => return Ok(SongOutcome::Skipped("unknown duration")),
    };
    let difficulty = match song.difficulty {
        Some(d) if (MIN_DIFFICULTY..=MAX_DIFFICULTY).contains(&d) => d,
        Some(d) => {
            warn!("{:?} has difficulty {} outside 1..=5", song.title, d);
            return Ok(SongOutcome::Skipped("difficulty out of range"));
        }
        None => rng.random_range(MIN_DIFFICULTY..=MAX_DIFFICULTY),
    };

    let mut artists: Vec<String> = song
        .artists
        .iter()
        .map(|a| a.trim().to_string())
        .filter(|a| !a.is_empty())
        .collect();
    if let Some(artist) = song.artist.as_deref().map(str::trim) {
        if !artist.is_empty() && !artists.iter().any(|a| a == artist) {
            artists.push(artist.to_string());
        }
    }
    if artists.is_empty() {
        return Ok(SongOutcome::Skipped("no artist"));
    }

    let new_song = NewSong {
        title: song.title.trim().to_string(),
        artists,
        media_ref: media_ref.to_string(),
        duration_secs,
        release_year: song.release_year.unwrap_or(default_year),
        region: song
            .region
            .clone()
            .unwrap_or_else(|| DEFAULT_REGION.to_string()),
        difficulty,
    };
    store.insert_song(&new_song, &[category_id.to_string()])?;
    Ok(SongOutcome::Added)
}
