//! Tracing setup shared by the server and the command line tools.

use tracing::level_filters::LevelFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Environment variable holding the log filter, e.g. `LOG_LEVEL=debug`.
pub const LOG_LEVEL_ENV: &str = "LOG_LEVEL";

/// Filter read from `LOG_LEVEL`, INFO when unset or unparsable.
pub fn env_filter() -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .with_env_var(LOG_LEVEL_ENV)
        .from_env_lossy()
}

pub fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(env_filter())
        .try_init();
}
