//! Catalog models for the SQLite-backed song catalog.

use serde::{Deserialize, Serialize};

/// A playable song, as stored in the catalog.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Song {
    pub id: String,
    pub title: String,
    pub artists: Vec<String>,
    /// Reference to the media on the external platform the client plays from.
    pub media_ref: String,
    pub duration_secs: u32,
    pub release_year: i32,
    /// Region-of-origin tag, e.g. "local" or "international".
    pub region: String,
    /// Difficulty rating, 1 (well known) to 5 (obscure).
    pub difficulty: i64,
}

/// A category (fine-grained genre) that songs are tagged with.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
}

/// Data needed to insert a new song; the id is assigned by the store.
#[derive(Clone, Debug)]
pub struct NewSong {
    pub title: String,
    pub artists: Vec<String>,
    pub media_ref: String,
    pub duration_secs: u32,
    pub release_year: i32,
    pub region: String,
    pub difficulty: i64,
}

/// Result of deleting songs by id.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SongDeletion {
    /// Songs as they were before deletion.
    pub deleted: Vec<Song>,
    /// Requested ids with no song.
    pub not_found: Vec<String>,
}

/// Result of removing one category from a list of songs.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CategoryRemoval {
    pub removed: Vec<Song>,
    /// Songs that did not carry the category.
    pub without_category: Vec<Song>,
    pub not_found: Vec<String>,
}

/// Reason a player flagged a song.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportCategory {
    WrongSongData,
    SongIssue,
    Other,
}

impl ReportCategory {
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "WRONG_SONG_DATA" => Some(ReportCategory::WrongSongData),
            "SONG_ISSUE" => Some(ReportCategory::SongIssue),
            "OTHER" => Some(ReportCategory::Other),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            ReportCategory::WrongSongData => "WRONG_SONG_DATA",
            ReportCategory::SongIssue => "SONG_ISSUE",
            ReportCategory::Other => "OTHER",
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct SongReport {
    pub id: String,
    pub song_id: String,
    pub category: ReportCategory,
    pub message: String,
    pub created_at: i64,
}

// =============================================================================
// Statistics
// =============================================================================

#[derive(Clone, Debug, Default, Serialize)]
pub struct CategoryStats {
    pub name: String,
    pub songs: usize,
    /// (difficulty rating, songs) sorted by rating
    pub difficulty_breakdown: Vec<(i64, usize)>,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct CatalogStats {
    pub total_songs: usize,
    pub categories: Vec<CategoryStats>,
    pub difficulty_distribution: Vec<(i64, usize)>,
    pub oldest_release_year: Option<i32>,
    pub newest_release_year: Option<i32>,
    /// (region tag, songs) sorted by count descending
    pub regions: Vec<(String, usize)>,
}
