use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

use crate::groups::GroupConfig;
use crate::variants::RegionTags;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    // Core settings (can override CLI)
    pub db_dir: Option<String>,
    pub port: Option<u16>,
    pub metrics_port: Option<u16>,
    pub logging_level: Option<String>,

    // Play and build tuning
    pub catalog_timeout_ms: Option<u64>,
    pub table_refresh_interval_secs: Option<u64>,
    pub build_parallelism: Option<usize>,
    pub read_pool_size: Option<usize>,

    // Feature configs
    pub groups: Option<GroupConfig>,
    pub regions: Option<RegionTags>,
    /// Keyed by difficulty token, e.g. `[clip_tiers.very_hard]`.
    pub clip_tiers: BTreeMap<String, ClipTierConfig>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct ClipTierConfig {
    pub min_secs: Option<u32>,
    pub max_secs: Option<u32>,
    pub start_from_beginning_chance: Option<f64>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}
