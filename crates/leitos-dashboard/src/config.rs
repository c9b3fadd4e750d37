use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::pcp::PcpSettings;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config build error: {0}")]
    Build(#[source] ::config::ConfigError),
    #[error("config deserialize error: {0}")]
    Deserialize(#[source] ::config::ConfigError),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub audit: AuditConfig,
    /// Hospital layout the rules depend on (ICU sector, PCP sectors)
    #[serde(default)]
    pub hospital: HospitalConfig,
    #[serde(default)]
    pub icu_board: IcuBoardConfig,
    /// Initial data for the in-memory store
    #[serde(default)]
    pub seed: SeedConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::Invalid(msg.to_string()));

        // Logging validation
        let lvl = self.logging.level.to_ascii_lowercase();
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&lvl.as_str()) {
            return Err(ConfigError::Invalid(format!(
                "logging.level must be one of {valid_levels:?}"
            )));
        }
        if self.cache.default_ttl_ms == 0 {
            return invalid("cache.default_ttl_ms must be > 0");
        }
        if self.icu_board.refresh_secs == 0 {
            return invalid("icu_board.refresh_secs must be > 0");
        }
        if self.audit.actor.trim().is_empty() {
            return invalid("audit.actor must not be empty");
        }
        if self.hospital.icu_sector_id.trim().is_empty() {
            return invalid("hospital.icu_sector_id must not be empty");
        }
        let pcp = &self.hospital.pcp;
        if pcp.decision_sectors.is_empty() {
            return invalid("hospital.pcp.decision_sectors must not be empty");
        }
        if pcp.surgical_sector.trim().is_empty() {
            return invalid("hospital.pcp.surgical_sector must not be empty");
        }
        Ok(())
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_millis(self.cache.default_ttl_ms)
    }

    pub fn icu_refresh(&self) -> Duration {
        Duration::from_secs(self.icu_board.refresh_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Age after which a cached collection read is refreshed
    #[serde(default = "default_cache_ttl_ms")]
    pub default_ttl_ms: u64,
}

fn default_cache_ttl_ms() -> u64 {
    5 * 60 * 1000
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl_ms: default_cache_ttl_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Record an entry for every collection read that reached the store
    #[serde(default = "default_true")]
    pub log_collection_reads: bool,
    /// User recorded on entries written by this process
    #[serde(default = "default_actor")]
    pub actor: String,
}

fn default_true() -> bool {
    true
}

fn default_actor() -> String {
    "sistema".to_string()
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            log_collection_reads: true,
            actor: default_actor(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HospitalConfig {
    /// Sector every confirmed ICU transfer lands in
    #[serde(default = "default_icu_sector_id")]
    pub icu_sector_id: String,
    #[serde(default)]
    pub pcp: PcpSettings,
}

fn default_icu_sector_id() -> String {
    "UTI".to_string()
}

impl Default for HospitalConfig {
    fn default() -> Self {
        Self {
            icu_sector_id: default_icu_sector_id(),
            pcp: PcpSettings::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IcuBoardConfig {
    #[serde(default = "default_icu_refresh_secs")]
    pub refresh_secs: u64,
}

fn default_icu_refresh_secs() -> u64 {
    60
}

impl Default for IcuBoardConfig {
    fn default() -> Self {
        Self {
            refresh_secs: default_icu_refresh_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SeedConfig {
    /// JSON file with documents per collection
    #[serde(default)]
    pub path: Option<String>,
}

pub mod loader {
    use super::{AppConfig, ConfigError};
    use ::config::{Config, Environment, File};
    use std::path::PathBuf;

    pub const DEFAULT_CONFIG_PATH: &str = "leitos.toml";

    pub fn load_config(path: Option<&str>) -> Result<AppConfig, ConfigError> {
        let mut builder = Config::builder();
        let pathbuf = PathBuf::from(path.unwrap_or(DEFAULT_CONFIG_PATH));
        if pathbuf.exists() {
            builder = builder.add_source(File::from(pathbuf));
        }
        // Environment variable overrides, e.g., LEITOS__ICU_BOARD__REFRESH_SECS=30
        builder = builder.add_source(
            Environment::with_prefix("LEITOS")
                .try_parsing(true)
                .separator("__"),
        );
        let cfg = builder.build().map_err(ConfigError::Build)?;
        let merged: AppConfig = cfg.try_deserialize().map_err(ConfigError::Deserialize)?;
        merged.validate()?;
        Ok(merged)
    }
}
