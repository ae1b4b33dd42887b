mod versioned_schema;

pub use versioned_schema::{
    bootstrap_schema, Column, ForeignKey, ForeignKeyOnChange, SqlType, Table, VersionedSchema,
    BASE_DB_VERSION, DEFAULT_TIMESTAMP,
};
