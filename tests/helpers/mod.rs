#![allow(dead_code)]

use std::path::Path;

use recipebox::config::{
    AssemblerConfig, BusConfig, Config, DatabaseConfig, ObservabilityConfig, PhotoConfig,
    RatingConfig, RecentConfig,
};
use recipebox_recipe::ProviderConfig;

pub fn test_config(path: &Path) -> Config {
    Config {
        database: DatabaseConfig {
            url: format!("sqlite:{}", path.to_str().unwrap()),
            max_connections: 2,
        },
        observability: ObservabilityConfig::default(),
        photo: PhotoConfig::default(),
        assembler: AssemblerConfig::default(),
        rating: RatingConfig::default(),
        bus: BusConfig::default(),
        recent: RecentConfig::default(),
        provider: ProviderConfig::default(),
    }
}

/// Polls `check` until it holds or about a second went by.
pub async fn eventually<F, Fut>(mut check: F) -> anyhow::Result<bool>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = anyhow::Result<bool>>,
{
    for _ in 0..100 {
        if check().await? {
            return Ok(true);
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }

    Ok(false)
}
