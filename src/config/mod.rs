mod file_config;

pub use file_config::{ClipTierConfig, FileConfig};

use crate::groups::GroupConfig;
use crate::play::{ClipTier, ClipTiers};
use crate::server::RequestsLoggingLevel;
use crate::variants::{Difficulty, Dimension, RegionTags};
use anyhow::{anyhow, bail, Result};
use clap::ValueEnum;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_CATALOG_TIMEOUT_MS: u64 = 2000;
pub const DEFAULT_TABLE_REFRESH_INTERVAL_SECS: u64 = 60;
pub const DEFAULT_BUILD_PARALLELISM: usize = 4;
pub const DEFAULT_READ_POOL_SIZE: usize = 4;

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub db_dir: Option<PathBuf>,
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    // Core settings
    pub db_dir: PathBuf,
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,

    pub catalog_timeout: Duration,
    pub table_refresh_interval: Duration,
    pub build_parallelism: usize,
    pub read_pool_size: usize,

    pub groups: GroupConfig,
    pub regions: RegionTags,
    pub clip_tiers: ClipTiers,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let db_dir = file
            .db_dir
            .map(PathBuf::from)
            .or_else(|| cli.db_dir.clone())
            .ok_or_else(|| anyhow!("db_dir must be specified via --db-dir or in config file"))?;

        if !db_dir.exists() {
            bail!("Database directory does not exist: {:?}", db_dir);
        }
        if !db_dir.is_dir() {
            bail!("db_dir is not a directory: {:?}", db_dir);
        }

        let port = file.port.unwrap_or(cli.port);
        let metrics_port = file.metrics_port.unwrap_or(cli.metrics_port);

        let logging_level = file
            .logging_level
            .and_then(|s| parse_logging_level(&s))
            .unwrap_or_else(|| cli.logging_level.clone());

        let catalog_timeout_ms = file
            .catalog_timeout_ms
            .unwrap_or(DEFAULT_CATALOG_TIMEOUT_MS);
        if catalog_timeout_ms == 0 {
            bail!("catalog_timeout_ms must be positive");
        }
        let table_refresh_interval_secs = file
            .table_refresh_interval_secs
            .unwrap_or(DEFAULT_TABLE_REFRESH_INTERVAL_SECS);
        if table_refresh_interval_secs == 0 {
            bail!("table_refresh_interval_secs must be positive");
        }
        let build_parallelism = file
            .build_parallelism
            .unwrap_or(DEFAULT_BUILD_PARALLELISM)
            .max(1);
        let read_pool_size = file.read_pool_size.unwrap_or(DEFAULT_READ_POOL_SIZE).max(1);

        let mut clip_tiers = ClipTiers::default();
        for (name, tier_config) in &file.clip_tiers {
            let difficulty = parse_difficulty(name)
                .ok_or_else(|| anyhow!("Unknown difficulty in [clip_tiers.{}]", name))?;
            let base = clip_tiers
                .get(difficulty)
                .copied()
                .ok_or_else(|| anyhow!("No default clip tier for {}", difficulty))?;
            clip_tiers.set(difficulty, merge_tier(base, tier_config))?;
        }

        Ok(Self {
            db_dir,
            port,
            metrics_port,
            logging_level,
            catalog_timeout: Duration::from_millis(catalog_timeout_ms),
            table_refresh_interval: Duration::from_secs(table_refresh_interval_secs),
            build_parallelism,
            read_pool_size,
            groups: file.groups.unwrap_or_default(),
            regions: file.regions.unwrap_or_default(),
            clip_tiers,
        })
    }

    pub fn catalog_db_path(&self) -> PathBuf {
        self.db_dir.join("catalog.db")
    }

    pub fn variants_db_path(&self) -> PathBuf {
        self.db_dir.join("variants.db")
    }
}

fn merge_tier(base: ClipTier, config: &ClipTierConfig) -> ClipTier {
    ClipTier {
        min_secs: config.min_secs.unwrap_or(base.min_secs),
        max_secs: config.max_secs.unwrap_or(base.max_secs),
        start_from_beginning_chance: config
            .start_from_beginning_chance
            .unwrap_or(base.start_from_beginning_chance),
    }
}

/// Accepts `very_hard`, `very-hard` and `VERYHARD` alike.
fn parse_difficulty(name: &str) -> Option<Difficulty> {
    let token: String = name
        .chars()
        .filter(|c| *c != '_' && *c != '-')
        .collect::<String>()
        .to_uppercase();
    Difficulty::from_token(&token)
}

/// Parses a logging level string into RequestsLoggingLevel.
/// Uses clap's ValueEnum trait for parsing.
fn parse_logging_level(s: &str) -> Option<RequestsLoggingLevel> {
    RequestsLoggingLevel::from_str(s, true).ok()
}
