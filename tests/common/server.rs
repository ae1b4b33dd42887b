//! Test server lifecycle management
//!
//! Each test gets an isolated server with its own catalog, a freshly built
//! variant table, and its own temp directory.

use super::constants::*;
use super::fixtures::{group_config, populate_catalog};
use songclip_server::catalog_store::{CatalogStore, SqliteCatalogStore, WritableCatalogStore};
use songclip_server::groups::ResolvedGroups;
use songclip_server::play::{ClipTiers, PlayService, SnapshotHandle, SnapshotRefresher};
use songclip_server::server::{server::make_app, RequestsLoggingLevel, ServerConfig};
use songclip_server::variants::{RegionTags, SqliteVariantStore, VariantBuilder};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;

/// Test server instance with isolated catalog and variant table
///
/// When dropped, the server gracefully shuts down and temp resources are cleaned up.
pub struct TestServer {
    /// Base URL for making requests (e.g., "http://127.0.0.1:12345")
    pub base_url: String,

    /// The port the server is listening on
    pub port: u16,

    /// Catalog store for direct database access in tests
    pub catalog_store: Arc<SqliteCatalogStore>,

    snapshot: Arc<SnapshotHandle>,
    refresher: SnapshotRefresher,
    variants_db_path: PathBuf,

    // Keep resources alive until drop
    _temp_dir: TempDir,
    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestServer {
    /// Spawns a server over the fixture catalog with a published variant table.
    pub async fn spawn() -> Self {
        Self::spawn_with(true).await
    }

    /// Spawns a server whose variant table was never published.
    pub async fn spawn_unpublished() -> Self {
        Self::spawn_with(false).await
    }

    async fn spawn_with(publish: bool) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let catalog_store = Arc::new(
            SqliteCatalogStore::new(temp_dir.path().join("catalog.db"), 2)
                .expect("Failed to open catalog store"),
        );
        populate_catalog(&catalog_store).expect("Failed to populate catalog");

        let variants_db_path = temp_dir.path().join("variants.db");
        if publish {
            build_and_publish(catalog_store.as_ref(), &variants_db_path);
        }

        let refresher = SnapshotRefresher::new(
            SqliteVariantStore::new(&variants_db_path).expect("Failed to open variant store"),
            catalog_store.clone() as Arc<dyn CatalogStore>,
            group_config(),
        );
        let snapshot = Arc::new(SnapshotHandle::new(
            refresher.load().expect("Failed to load snapshot"),
        ));
        let play_service = Arc::new(PlayService::new(
            catalog_store.clone() as Arc<dyn CatalogStore>,
            snapshot.clone(),
            ClipTiers::default(),
            Duration::from_secs(2),
        ));

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let port = listener
            .local_addr()
            .expect("Failed to get local address")
            .port();
        let base_url = format!("http://127.0.0.1:{}", port);

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        let config = ServerConfig {
            port,
            requests_logging_level: RequestsLoggingLevel::None,
        };
        let app = make_app(
            config,
            catalog_store.clone() as Arc<dyn WritableCatalogStore>,
            play_service,
        )
        .expect("Failed to build app");

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .expect("Server failed");
        });

        let server = Self {
            base_url,
            port,
            catalog_store,
            snapshot,
            refresher,
            variants_db_path,
            _temp_dir: temp_dir,
            _shutdown_tx: Some(shutdown_tx),
        };

        server.wait_for_ready().await;

        server
    }

    /// Rebuilds the variant table from the current catalog, publishes it and
    /// lets the running server pick it up. Returns whether the table changed.
    pub fn rebuild_and_refresh(&self) -> bool {
        build_and_publish(self.catalog_store.as_ref(), &self.variants_db_path);
        self.refresher
            .refresh(&self.snapshot)
            .expect("Failed to refresh snapshot")
    }

    /// Waits for the server to become ready by polling the home endpoint
    async fn wait_for_ready(&self) {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .expect("Failed to build reqwest client");

        let start = std::time::Instant::now();
        let timeout = Duration::from_millis(SERVER_READY_TIMEOUT_MS);

        loop {
            if start.elapsed() > timeout {
                panic!(
                    "Server did not become ready within {}ms",
                    SERVER_READY_TIMEOUT_MS
                );
            }

            match client.get(format!("{}/", self.base_url)).send().await {
                Ok(response) if response.status().is_success() => return,
                _ => {
                    tokio::time::sleep(Duration::from_millis(SERVER_READY_POLL_INTERVAL_MS)).await;
                }
            }
        }
    }
}

fn build_and_publish(catalog_store: &SqliteCatalogStore, variants_db_path: &Path) {
    let groups =
        ResolvedGroups::load(&group_config(), catalog_store).expect("Failed to resolve groups");
    let variant_store =
        SqliteVariantStore::new(variants_db_path).expect("Failed to open variant store");
    VariantBuilder::new(catalog_store, RegionTags::default(), 2)
        .build_and_publish(&groups, &variant_store)
        .expect("Failed to build variant table");
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self._shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
