use crate::config::AppConfig;
use tracing::Level;

/// Parses a config log level, defaulting to INFO for unknown values.
pub fn parse_level(level: &str) -> Level {
    level.trim().parse().unwrap_or(Level::INFO)
}

/// Installs the global fmt subscriber at the configured level.
///
/// Fails if a global subscriber is already set, which embedders may ignore.
pub fn init(config: &AppConfig) -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(parse_level(&config.log_level))
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install tracing subscriber: {}", e))
}
