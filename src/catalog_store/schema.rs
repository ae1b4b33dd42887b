//! SQLite schema for the song catalog.
//!
//! Songs and categories use integer rowids as primary keys with a unique text
//! id for lookups; memberships live in the `song_categories` junction table.

use crate::sqlite_column;
use crate::sqlite_persistence::{
    Column, ForeignKey, ForeignKeyOnChange, SqlType, Table, VersionedSchema, DEFAULT_TIMESTAMP,
};

const CATEGORIES_TABLE: Table = Table {
    name: "categories",
    columns: &[
        sqlite_column!("rowid", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("id", &SqlType::Text, non_null = true),
        sqlite_column!("name", &SqlType::Text, non_null = true),
    ],
    indices: &[("idx_categories_name", "name")],
    unique_constraints: &[&["id"], &["name"]],
};

const SONGS_TABLE: Table = Table {
    name: "songs",
    columns: &[
        sqlite_column!("rowid", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("id", &SqlType::Text, non_null = true),
        sqlite_column!("title", &SqlType::Text, non_null = true),
        sqlite_column!("artists", &SqlType::Text, non_null = true), // JSON array of names
        sqlite_column!("media_ref", &SqlType::Text, non_null = true),
        sqlite_column!("duration_secs", &SqlType::Integer, non_null = true),
        sqlite_column!("release_year", &SqlType::Integer, non_null = true),
        sqlite_column!("region", &SqlType::Text, non_null = true),
        sqlite_column!("difficulty", &SqlType::Integer, non_null = true), // 1..=5
        sqlite_column!(
            "created_at",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[
        ("idx_songs_id", "id"),
        ("idx_songs_difficulty", "difficulty"),
        ("idx_songs_release_year", "release_year"),
        ("idx_songs_region", "region"),
    ],
    unique_constraints: &[&["id"], &["media_ref"]],
};

const SONG_FK: ForeignKey = ForeignKey {
    foreign_table: "songs",
    foreign_column: "rowid",
    on_delete: ForeignKeyOnChange::Cascade,
};

const CATEGORY_FK: ForeignKey = ForeignKey {
    foreign_table: "categories",
    foreign_column: "rowid",
    on_delete: ForeignKeyOnChange::Cascade,
};

/// Song <-> Category membership
const SONG_CATEGORIES_TABLE: Table = Table {
    name: "song_categories",
    columns: &[
        sqlite_column!(
            "song_rowid",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&SONG_FK)
        ),
        sqlite_column!(
            "category_rowid",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&CATEGORY_FK)
        ),
    ],
    indices: &[
        ("idx_song_categories_song", "song_rowid"),
        ("idx_song_categories_category", "category_rowid"),
    ],
    unique_constraints: &[&["song_rowid", "category_rowid"]],
};

/// Player reports about broken or mislabeled songs
const SONG_REPORTS_TABLE: Table = Table {
    name: "song_reports",
    columns: &[
        sqlite_column!("rowid", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("id", &SqlType::Text, non_null = true),
        sqlite_column!(
            "song_rowid",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&SONG_FK)
        ),
        sqlite_column!("category", &SqlType::Text, non_null = true), // WRONG_SONG_DATA, SONG_ISSUE, OTHER
        sqlite_column!("message", &SqlType::Text, non_null = true),
        sqlite_column!(
            "created_at",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[("idx_song_reports_song", "song_rowid")],
    unique_constraints: &[&["id"]],
};

pub const CATALOG_VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 0,
    tables: &[
        CATEGORIES_TABLE,
        SONGS_TABLE,
        SONG_CATEGORIES_TABLE,
        SONG_REPORTS_TABLE,
    ],
    migration: None,
}];
