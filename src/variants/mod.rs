//! Game variants: the dimensions, their keys, and the ranked table built
//! offline from the catalog.

mod builder;
pub mod dimensions;
mod key;
mod predicate;
pub mod qr;
mod report;
mod schema;
mod store;
mod subsets;
mod table;

pub use builder::{BuildError, VariantBuilder};
pub use dimensions::{Difficulty, Dimension, Era, Genre, Region, RegionTags};
pub use key::{KeyParseError, VariantKey};
pub use predicate::{group_reference_for, GroupReference, ResolvedPredicate};
pub use report::VariantReport;
pub use store::SqliteVariantStore;
pub use subsets::{SubsetEntry, SubsetExport, VariantSubset};
pub use table::{check_consistency, Variant, VariantTable};

#[cfg(test)]
pub(crate) use table::tests::ranked_variants;
