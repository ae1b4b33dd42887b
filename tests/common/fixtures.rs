//! Test fixture creation for the catalog

use super::constants::*;
use anyhow::Result;
use songclip_server::catalog_store::{NewSong, SqliteCatalogStore, WritableCatalogStore};
use songclip_server::groups::GroupConfig;
use std::collections::BTreeSet;

struct FixtureSong {
    media_ref: &'static str,
    category: &'static str,
    difficulty: i64,
    release_year: i32,
    region: &'static str,
    duration_secs: u32,
}

const SONGS: [FixtureSong; CATALOG_SIZE] = [
    FixtureSong {
        media_ref: ROCK_85_REF,
        category: ROCK_CATEGORY,
        difficulty: 2,
        release_year: 1985,
        region: "local",
        duration_secs: 240,
    },
    FixtureSong {
        media_ref: ROCK_10_REF,
        category: ROCK_CATEGORY,
        difficulty: 4,
        release_year: 2010,
        region: "international",
        duration_secs: 200,
    },
    FixtureSong {
        media_ref: RAP_18_REF,
        category: RAP_CATEGORY,
        difficulty: 3,
        release_year: 2018,
        region: "international",
        duration_secs: 180,
    },
    FixtureSong {
        media_ref: POP_01_REF,
        category: POP_CATEGORY,
        difficulty: 1,
        release_year: 2001,
        region: "local",
        duration_secs: 210,
    },
    FixtureSong {
        media_ref: JAZZ_60_REF,
        category: JAZZ_CATEGORY,
        difficulty: 5,
        release_year: 1960,
        region: "international",
        duration_secs: 300,
    },
    FixtureSong {
        media_ref: JAZZ_95_SHORT_REF,
        category: JAZZ_CATEGORY,
        difficulty: 3,
        release_year: 1995,
        region: "local",
        duration_secs: 20,
    },
];

/// Fills `store` with the fixture songs.
pub fn populate_catalog(store: &SqliteCatalogStore) -> Result<()> {
    for song in SONGS.iter() {
        let category = store.upsert_category(song.category)?;
        store.insert_song(
            &NewSong {
                title: format!("Song {}", song.media_ref),
                artists: vec!["Fixture Artist".to_string()],
                media_ref: song.media_ref.to_string(),
                duration_secs: song.duration_secs,
                release_year: song.release_year,
                region: song.region.to_string(),
                difficulty: song.difficulty,
            },
            &[category.id],
        )?;
    }
    Ok(())
}

/// Groups by category name; OTHER is left to be derived.
pub fn group_config() -> GroupConfig {
    let set = |name: &str| BTreeSet::from([name.to_string()]);
    GroupConfig {
        rock: set(ROCK_CATEGORY),
        rap: set(RAP_CATEGORY),
        pop: set(POP_CATEGORY),
        other: BTreeSet::new(),
    }
}
