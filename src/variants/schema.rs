use crate::sqlite_column;
use crate::sqlite_persistence::{
    Column, ForeignKey, ForeignKeyOnChange, SqlType, Table, VersionedSchema,
};

const VARIANT_BUILDS_TABLE: Table = Table {
    name: "variant_builds",
    columns: &[
        sqlite_column!("rowid", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("build_id", &SqlType::Text, non_null = true),
        sqlite_column!("built_at", &SqlType::Integer, non_null = true),
        sqlite_column!("catalog_songs", &SqlType::Integer, non_null = true),
        sqlite_column!("variant_count", &SqlType::Integer, non_null = true),
    ],
    indices: &[],
    unique_constraints: &[&["build_id"]],
};

const VARIANTS_TABLE: Table = Table {
    name: "variants",
    columns: &[
        sqlite_column!(
            "build_rowid",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&ForeignKey {
                foreign_table: "variant_builds",
                foreign_column: "rowid",
                on_delete: ForeignKeyOnChange::Cascade,
            })
        ),
        sqlite_column!("key", &SqlType::Text, non_null = true),
        sqlite_column!("predicate", &SqlType::Text, non_null = true), // JSON
        sqlite_column!("genre_group_ref", &SqlType::Text), // NULL for RANDOM genre
        sqlite_column!("match_count", &SqlType::Integer, non_null = true),
        sqlite_column!("rank", &SqlType::Integer, non_null = true),
    ],
    indices: &[("idx_variants_build", "build_rowid")],
    unique_constraints: &[&["build_rowid", "key"], &["build_rowid", "rank"]],
};

pub const VARIANTS_VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 0,
    tables: &[VARIANT_BUILDS_TABLE, VARIANTS_TABLE],
    migration: None,
}];
