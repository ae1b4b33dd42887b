//! Songclip server library
//!
//! Builds the variant table from the song catalog offline, and serves play
//! requests against it. The binaries and the end-to-end tests use the
//! modules exposed here.

pub mod catalog_import;
pub mod catalog_store;
pub mod cli_style;
pub mod config;
pub mod groups;
pub mod logging;
pub mod play;
pub mod server;
pub mod sqlite_persistence;
pub mod variants;

pub use server::{run_server, RequestsLoggingLevel};
