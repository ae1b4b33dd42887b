//! Variant resolution and clip sampling.

use super::clip::{compute_window, ClipTiers};
use super::error::PlayError;
use crate::catalog_store::{CatalogStore, Song};
use crate::groups::{GroupConfig, ResolvedGroups};
use crate::server::metrics;
use crate::variants::{SqliteVariantStore, Variant, VariantKey, VariantTable};
use anyhow::Result;
use serde::Serialize;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// What a play request is resolved against: the published table plus the
/// genre groups as they were last resolved.
#[derive(Debug)]
pub struct PlaySnapshot {
    pub table: VariantTable,
    pub groups: ResolvedGroups,
}

/// Shared, atomically swappable snapshot. Readers keep the `Arc` they got
/// for the whole request.
pub struct SnapshotHandle {
    current: RwLock<Arc<PlaySnapshot>>,
}

impl SnapshotHandle {
    pub fn new(snapshot: PlaySnapshot) -> Self {
        SnapshotHandle {
            current: RwLock::new(Arc::new(snapshot)),
        }
    }

    pub fn current(&self) -> Arc<PlaySnapshot> {
        self.current.read().unwrap().clone()
    }

    pub fn replace(&self, snapshot: PlaySnapshot) {
        *self.current.write().unwrap() = Arc::new(snapshot);
    }
}

/// Reloads the snapshot from the variant store and the catalog.
pub struct SnapshotRefresher {
    variant_store: SqliteVariantStore,
    catalog: Arc<dyn CatalogStore>,
    group_config: GroupConfig,
}

impl SnapshotRefresher {
    pub fn new(
        variant_store: SqliteVariantStore,
        catalog: Arc<dyn CatalogStore>,
        group_config: GroupConfig,
    ) -> Self {
        SnapshotRefresher {
            variant_store,
            catalog,
            group_config,
        }
    }

    /// Builds a snapshot from scratch; an unpublished table yields an empty
    /// one.
    pub fn load(&self) -> Result<PlaySnapshot> {
        let table = self.variant_store.load_latest()?.unwrap_or_else(|| {
            warn!("No variant table published yet, every variant is unknown");
            VariantTable::empty()
        });
        let groups = ResolvedGroups::load(&self.group_config, self.catalog.as_ref())?;
        metrics::set_variant_table_size(table.len());
        Ok(PlaySnapshot { table, groups })
    }

    /// Re-resolves the groups, and reloads the table if a newer build was
    /// published. Returns whether the table changed.
    pub fn refresh(&self, handle: &SnapshotHandle) -> Result<bool> {
        let current = handle.current();
        let latest_build = self.variant_store.latest_build_id()?;
        let table_changed = latest_build
            .as_deref()
            .is_some_and(|id| id != current.table.build_id());

        let groups = ResolvedGroups::load(&self.group_config, self.catalog.as_ref())?;
        if table_changed {
            let snapshot = self.load()?;
            info!(
                "Switching to variant table {} ({} variants)",
                snapshot.table.build_id(),
                snapshot.table.len()
            );
            handle.replace(snapshot);
        } else if groups != current.groups {
            debug!("Genre groups changed, updating snapshot");
            handle.replace(PlaySnapshot {
                table: current.table.clone(),
                groups,
            });
        }
        Ok(table_changed)
    }
}

/// A sampled song and the part of it the player should hear.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClipResult {
    pub id: String,
    pub title: String,
    pub artists: Vec<String>,
    pub media_ref: String,
    pub clip_duration: u32,
    pub clip_start_time: u32,
    pub release_year: i32,
    pub match_count: usize,
    pub difficulty: i64,
}

pub struct PlayService {
    catalog: Arc<dyn CatalogStore>,
    snapshot: Arc<SnapshotHandle>,
    clip_tiers: ClipTiers,
    catalog_timeout: Duration,
}

impl PlayService {
    pub fn new(
        catalog: Arc<dyn CatalogStore>,
        snapshot: Arc<SnapshotHandle>,
        clip_tiers: ClipTiers,
        catalog_timeout: Duration,
    ) -> Self {
        PlayService {
            catalog,
            snapshot,
            clip_tiers,
            catalog_timeout,
        }
    }

    pub fn snapshot(&self) -> Arc<PlaySnapshot> {
        self.snapshot.current()
    }

    /// Looks `key` up in the published table. Never touches the catalog.
    pub fn resolve(&self, key: &str) -> Result<Variant, PlayError> {
        let parsed: VariantKey = key
            .parse()
            .map_err(|e: crate::variants::KeyParseError| PlayError::InvalidKeyFormat(e.to_string()))?;
        self.snapshot
            .current()
            .table
            .get(&parsed)
            .cloned()
            .ok_or_else(|| PlayError::UnknownVariant(parsed.to_string()))
    }

    /// Draws one song for `variant` and computes its playback window.
    pub async fn sample_clip(&self, variant: &Variant) -> Result<ClipResult, PlayError> {
        if variant.match_count == 0 {
            return Err(PlayError::NoContent(variant.key.to_string()));
        }

        let filter = {
            let snapshot = self.snapshot.current();
            variant
                .predicate
                .bind(variant.genre_group_ref, &snapshot.groups)
        };

        let catalog = self.catalog.clone();
        let start = Instant::now();
        let sampled = tokio::time::timeout(
            self.catalog_timeout,
            tokio::task::spawn_blocking(move || catalog.find_random(&filter)),
        )
        .await;
        metrics::record_catalog_query("find_random", start.elapsed());

        let song: Song = match sampled {
            Err(_) => {
                return Err(PlayError::CatalogUnavailable(format!(
                    "no answer within {:?}",
                    self.catalog_timeout
                )))
            }
            Ok(Err(join_error)) => {
                return Err(PlayError::CatalogUnavailable(join_error.to_string()));
            }
            Ok(Ok(Err(e))) => {
                warn!("Catalog query for {} failed: {:#}", variant.key, e);
                return Err(PlayError::CatalogUnavailable(e.to_string()));
            }
            // Counted at build time but gone since
            Ok(Ok(Ok(None))) => return Err(PlayError::NoContent(variant.key.to_string())),
            Ok(Ok(Ok(Some(song)))) => song,
        };

        let window = compute_window(
            &self.clip_tiers,
            variant.key.difficulty,
            song.duration_secs,
            &mut rand::rng(),
        );
        debug!(
            "{} -> {} ({}s from {}s, {} tier)",
            variant.key, song.id, window.duration_secs, window.start_secs, window.tier
        );

        Ok(ClipResult {
            id: song.id,
            title: song.title,
            artists: song.artists,
            media_ref: song.media_ref,
            clip_duration: window.duration_secs,
            clip_start_time: window.start_secs,
            release_year: song.release_year,
            match_count: variant.match_count,
            difficulty: song.difficulty,
        })
    }

    /// Resolves `key` and samples a clip for it.
    pub async fn play(&self, key: &str) -> Result<ClipResult, PlayError> {
        let outcome = match self.resolve(key) {
            Ok(variant) => self.sample_clip(&variant).await,
            Err(e) => Err(e),
        };
        metrics::record_play_outcome(match &outcome {
            Ok(_) => "OK",
            Err(e) => e.code(),
        });
        outcome
    }
}
