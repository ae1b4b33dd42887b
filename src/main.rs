use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

use songclip_server::catalog_store::{CatalogStore, SqliteCatalogStore};
use songclip_server::cli_style::get_styles;
use songclip_server::config::{AppConfig, CliConfig, FileConfig};
use songclip_server::logging::init_tracing;
use songclip_server::play::{PlayService, SnapshotHandle, SnapshotRefresher};
use songclip_server::server::{metrics, ServerConfig};
use songclip_server::variants::SqliteVariantStore;
use songclip_server::{run_server, RequestsLoggingLevel};

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(msg).with_context(|| format!("Error resolving path: {}", s));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
#[command(styles = get_styles())]
struct CliArgs {
    /// Directory holding catalog.db and variants.db.
    #[clap(long, value_parser = parse_path)]
    pub db_dir: Option<PathBuf>,

    /// Optional TOML config file, its values override the command line.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// The port to listen on.
    #[clap(short, long, default_value_t = 3001)]
    pub port: u16,

    /// The port for the metrics server (Prometheus scraping).
    #[clap(long, default_value_t = 9091)]
    pub metrics_port: u16,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,
}

/// Polls for newly published tables and re-resolves the genre groups.
fn spawn_refresher(refresher: SnapshotRefresher, handle: Arc<SnapshotHandle>, config: &AppConfig) {
    let interval = config.table_refresh_interval;
    let refresher = Arc::new(refresher);
    info!("Refreshing the variant table every {:?}", interval);

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // The first tick fires immediately, the snapshot was just loaded
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let refresher = refresher.clone();
            let handle = handle.clone();
            let outcome = tokio::task::spawn_blocking(move || refresher.refresh(&handle)).await;
            match outcome {
                Ok(Ok(true)) => metrics::record_snapshot_refresh("reloaded"),
                Ok(Ok(false)) => metrics::record_snapshot_refresh("unchanged"),
                Ok(Err(err)) => {
                    metrics::record_snapshot_refresh("failed");
                    warn!("Snapshot refresh failed, keeping the current one: {:#}", err);
                }
                Err(err) => {
                    metrics::record_snapshot_refresh("failed");
                    error!("Snapshot refresh task panicked: {}", err);
                }
            }
        }
    });
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();
    init_tracing();

    let file_config = cli_args
        .config
        .as_deref()
        .map(FileConfig::load)
        .transpose()?;
    let cli_config = CliConfig {
        db_dir: cli_args.db_dir,
        port: cli_args.port,
        metrics_port: cli_args.metrics_port,
        logging_level: cli_args.logging_level,
    };
    let app_config = AppConfig::resolve(&cli_config, file_config)?;

    info!(
        "Opening SQLite catalog database at {:?}...",
        app_config.catalog_db_path()
    );
    let catalog_store = Arc::new(SqliteCatalogStore::new(
        app_config.catalog_db_path(),
        app_config.read_pool_size,
    )?);

    info!("Initializing metrics...");
    metrics::init_metrics();
    metrics::set_catalog_songs(catalog_store.songs_count()?);

    let variant_store = SqliteVariantStore::new(app_config.variants_db_path())?;
    let refresher = SnapshotRefresher::new(
        variant_store,
        catalog_store.clone(),
        app_config.groups.clone(),
    );
    let snapshot = refresher.load()?;
    info!(
        "Serving variant table {:?} with {} variants",
        snapshot.table.build_id(),
        snapshot.table.len()
    );
    let handle = Arc::new(SnapshotHandle::new(snapshot));
    spawn_refresher(refresher, handle.clone(), &app_config);

    let play_service = Arc::new(PlayService::new(
        catalog_store.clone(),
        handle,
        app_config.clip_tiers.clone(),
        app_config.catalog_timeout,
    ));

    let server_config = ServerConfig {
        requests_logging_level: app_config.logging_level.clone(),
        port: app_config.port,
    };

    info!("Ready to serve at port {}!", app_config.port);
    info!("Metrics available at port {}!", app_config.metrics_port);
    run_server(
        catalog_store,
        play_service,
        server_config,
        app_config.metrics_port,
    )
    .await
}
