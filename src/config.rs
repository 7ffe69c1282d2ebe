use config::{Config as ConfigBuilder, ConfigError, Environment, File};
use recipebox_recipe::ProviderConfig;
use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
    #[serde(default)]
    pub photo: PhotoConfig,
    #[serde(default)]
    pub assembler: AssemblerConfig,
    #[serde(default)]
    pub rating: RatingConfig,
    #[serde(default)]
    pub bus: BusConfig,
    #[serde(default)]
    pub recent: RecentConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub json: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct PhotoConfig {
    #[serde(default = "default_photo_base_url")]
    pub base_url: String,
    #[serde(default = "default_photo_prefix")]
    pub prefix: String,
}

impl Default for PhotoConfig {
    fn default() -> Self {
        Self {
            base_url: default_photo_base_url(),
            prefix: default_photo_prefix(),
        }
    }
}

fn default_photo_base_url() -> String {
    "http://localhost:4000".to_string()
}

fn default_photo_prefix() -> String {
    "/photos/".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct AssemblerConfig {
    /// Deadline for every collaborator call made while assembling.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
        }
    }
}

fn default_timeout_ms() -> u64 {
    5000
}

#[derive(Debug, Deserialize, Clone)]
pub struct RatingConfig {
    /// Attempts of a contended read-modify-write before giving up.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

impl Default for RatingConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
        }
    }
}

fn default_max_attempts() -> u32 {
    recipebox_rating::DEFAULT_MAX_ATTEMPTS
}

#[derive(Debug, Deserialize, Clone)]
pub struct BusConfig {
    #[serde(default = "default_bus_capacity")]
    pub capacity: usize,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            capacity: default_bus_capacity(),
        }
    }
}

fn default_bus_capacity() -> usize {
    1024
}

#[derive(Debug, Deserialize, Clone)]
pub struct RecentConfig {
    #[serde(default = "default_recent_size")]
    pub size: usize,
}

impl Default for RecentConfig {
    fn default() -> Self {
        Self {
            size: default_recent_size(),
        }
    }
}

fn default_recent_size() -> usize {
    recipebox_user::list::DEFAULT_RECENTS_SIZE
}

impl Config {
    /// Load configuration from file and environment variables
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (RECIPEBOX__DATABASE__URL, etc.)
    /// 2. Config file specified by path
    /// 3. Hardcoded defaults
    pub fn load(config_path: Option<String>) -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::builder()
            .set_default("database.url", "sqlite:recipebox.db")?
            .set_default("database.max_connections", 5)?;

        let config_file_path = config_path
            .or_else(|| env::var("CONFIG_PATH").ok())
            .unwrap_or_else(|| "config/default.toml".to_string());

        if std::path::Path::new(&config_file_path).exists() {
            builder = builder.add_source(File::with_name(&config_file_path));
        }

        builder = builder.add_source(
            Environment::with_prefix("RECIPEBOX")
                .separator("__")
                .try_parsing(true),
        );

        if let Ok(database_url) = env::var("DATABASE_URL") {
            builder = builder.set_override("database.url", database_url)?;
        }

        builder.build()?.try_deserialize()
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.database.url.is_empty() {
            return Err("Database url must not be empty".to_string());
        }
        if self.database.max_connections < 1 {
            return Err("Database max_connections must be at least 1".to_string());
        }
        if self.assembler.timeout_ms == 0 {
            return Err("Assembler timeout_ms must be greater than 0".to_string());
        }
        if self.rating.max_attempts < 1 {
            return Err("Rating max_attempts must be at least 1".to_string());
        }
        if self.bus.capacity < 1 {
            return Err("Bus capacity must be at least 1".to_string());
        }
        if self.recent.size < 1 {
            return Err("Recent size must be at least 1".to_string());
        }
        if self.provider.page_size < 1 || self.provider.featured_limit < 1 {
            return Err("Provider page_size and featured_limit must be at least 1".to_string());
        }
        if self.provider.max_page_size < self.provider.page_size {
            return Err("Provider max_page_size must not be below page_size".to_string());
        }
        Ok(())
    }
}
