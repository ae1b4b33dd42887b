//! Song catalog storage.

mod filter;
mod models;
mod schema;
mod stats;
mod store;
mod trait_def;

pub use filter::{CatalogFilter, CategoryClause, RatingRange, YearBound};
pub use models::*;
pub use store::SqliteCatalogStore;
#[cfg(any(test, feature = "mock"))]
pub use trait_def::MockCatalogStore;
pub use trait_def::{CatalogStore, WritableCatalogStore};
