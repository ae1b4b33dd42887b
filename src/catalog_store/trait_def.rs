//! Catalog store traits.
//!
//! The variant builder and the play service only need the read side; import,
//! reporting and tests use the write side on top of it.

use super::filter::CatalogFilter;
use super::models::{
    Category, CategoryRemoval, NewSong, ReportCategory, Song, SongDeletion, SongReport,
};
use anyhow::Result;

#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
pub trait CatalogStore: Send + Sync {
    /// Number of songs matching `filter`.
    fn count(&self, filter: &CatalogFilter) -> Result<usize>;

    /// One song drawn uniformly among the songs currently matching `filter`,
    /// or `None` when nothing matches.
    fn find_random(&self, filter: &CatalogFilter) -> Result<Option<Song>>;

    /// Every category in the catalog.
    fn list_categories(&self) -> Result<Vec<Category>>;

    fn get_song(&self, id: &str) -> Result<Option<Song>>;

    /// Total number of songs (for metrics and build metadata).
    fn songs_count(&self) -> Result<usize>;

    /// Cheap round-trip to the database, used by the health check.
    fn ping(&self) -> Result<()>;
}

pub trait WritableCatalogStore: CatalogStore {
    /// Returns the category named `name`, creating it if needed.
    fn upsert_category(&self, name: &str) -> Result<Category>;

    fn find_song_by_media_ref(&self, media_ref: &str) -> Result<Option<Song>>;

    /// Inserts a song and its memberships in one transaction.
    fn insert_song(&self, song: &NewSong, category_ids: &[String]) -> Result<Song>;

    /// Adds a membership; returns false if it already existed.
    fn add_song_category(&self, song_id: &str, category_id: &str) -> Result<bool>;

    /// Deletes songs by id in one transaction. Memberships and reports go
    /// with them.
    fn delete_songs(&self, song_ids: &[String]) -> Result<SongDeletion>;

    /// Removes the category named `category_name` from the given songs.
    /// Returns `None` if no category has that name.
    fn remove_song_category(
        &self,
        song_ids: &[String],
        category_name: &str,
    ) -> Result<Option<CategoryRemoval>>;

    /// Records a player report. Returns `None` if the song does not exist.
    fn create_report(
        &self,
        song_id: &str,
        category: ReportCategory,
        message: &str,
    ) -> Result<Option<SongReport>>;
}
