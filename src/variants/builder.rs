//! Offline construction of the variant table.

use super::dimensions::RegionTags;
use super::key::VariantKey;
use super::predicate::{group_reference_for, ResolvedPredicate};
use super::store::SqliteVariantStore;
use super::table::{Variant, VariantTable};
use crate::catalog_store::CatalogStore;
use crate::groups::ResolvedGroups;
use rayon::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;
use tracing::{debug, info};

const PROGRESS_EVERY: usize = 50;

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("catalog unavailable: {0:#}")]
    CatalogUnavailable(anyhow::Error),
    #[error("inconsistent variant table: {0}")]
    Inconsistency(String),
    #[error("failed to publish variant table: {0:#}")]
    Publish(anyhow::Error),
}

pub struct VariantBuilder<'a> {
    store: &'a dyn CatalogStore,
    regions: RegionTags,
    parallelism: usize,
}

impl<'a> VariantBuilder<'a> {
    pub fn new(store: &'a dyn CatalogStore, regions: RegionTags, parallelism: usize) -> Self {
        VariantBuilder {
            store,
            regions,
            parallelism: parallelism.max(1),
        }
    }

    /// Counts every variant against the catalog and returns the ranked table.
    ///
    /// Any failed count aborts the whole build.
    pub fn build(&self, groups: &ResolvedGroups) -> Result<VariantTable, BuildError> {
        let start = Instant::now();
        let keys = VariantKey::all();
        let total = keys.len();
        info!(
            "Building variant table: {} variants on {} threads",
            total, self.parallelism
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.parallelism)
            .thread_name(|i| format!("variant-builder-{}", i))
            .build()
            .map_err(|e| BuildError::CatalogUnavailable(e.into()))?;

        let catalog_songs = self
            .store
            .songs_count()
            .map_err(BuildError::CatalogUnavailable)?;

        let done = AtomicUsize::new(0);
        let counted: Result<Vec<Variant>, BuildError> = pool.install(|| {
            keys.par_iter()
                .map(|key| {
                    let predicate = ResolvedPredicate::for_key(key, &self.regions);
                    let genre_group_ref = group_reference_for(key);
                    let filter = predicate.bind(genre_group_ref, groups);
                    let match_count = self
                        .store
                        .count(&filter)
                        .map_err(BuildError::CatalogUnavailable)?;

                    let finished = done.fetch_add(1, Ordering::Relaxed) + 1;
                    if finished % PROGRESS_EVERY == 0 || finished == total {
                        info!("Counted {}/{} variants", finished, total);
                    }
                    debug!("{} -> {} songs", key, match_count);

                    Ok(Variant {
                        key: *key,
                        predicate,
                        genre_group_ref,
                        match_count,
                        rank: 0,
                    })
                })
                .collect()
        });
        let mut variants = counted?;

        variants.sort_by(|a, b| {
            b.match_count
                .cmp(&a.match_count)
                .then_with(|| a.key.to_string().cmp(&b.key.to_string()))
        });
        for (index, variant) in variants.iter_mut().enumerate() {
            variant.rank = index + 1;
        }

        let table = VariantTable::from_ranked(
            uuid::Uuid::new_v4().to_string(),
            chrono::Utc::now().timestamp(),
            catalog_songs,
            variants,
        )
        .map_err(BuildError::Inconsistency)?;

        let empty = table.ranked().iter().filter(|v| v.match_count == 0).count();
        info!(
            "Variant table {} built in {:?}: {} variants, {} without songs",
            table.build_id(),
            start.elapsed(),
            table.len(),
            empty
        );
        Ok(table)
    }

    /// Builds and publishes; nothing is written unless the build succeeded.
    pub fn build_and_publish(
        &self,
        groups: &ResolvedGroups,
        variant_store: &SqliteVariantStore,
    ) -> Result<VariantTable, BuildError> {
        let table = self.build(groups)?;
        variant_store
            .publish(&table)
            .map_err(BuildError::Publish)?;
        Ok(table)
    }
}
