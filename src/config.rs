use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::pipeline::policy::FreshnessPolicy;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub ingestion: FreshnessPolicy,
    pub source: SourceConfig,
    pub enrichment: EnrichmentConfig,
    pub scrape: ScrapeConfig,
    pub database: DatabaseConfig,
    pub monitoring: MonitoringConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EnrichmentConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScrapeConfig {
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub path: String,
}

impl DatabaseConfig {
    pub fn url(&self) -> String {
        format!("sqlite:{}", self.path)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MonitoringConfig {
    pub log_level: String,
    pub json_logs: bool,
}

/// Secrets loaded exclusively from environment variables.
/// Not serializable, not stored in config files.
pub struct Secrets {
    pub news_api_key: Option<String>,
    pub enrichment_base_url: Option<String>,
}

impl Secrets {
    pub fn from_env() -> Self {
        Self {
            news_api_key: std::env::var("NEWS_API_KEY").ok(),
            enrichment_base_url: std::env::var("ENRICHMENT_BASE_URL").ok(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a toml file, overlaying environment
    /// variables for secrets.
    pub fn load(config_path: &Path) -> Result<(Self, Secrets)> {
        dotenvy::dotenv().ok();

        let contents = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let config: AppConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse {}", config_path.display()))?;

        let secrets = Secrets::from_env();

        Ok((config, secrets))
    }

    /// Base url of the enrichment service, with the env override applied.
    pub fn enrichment_base_url(&self, secrets: &Secrets) -> String {
        secrets
            .enrichment_base_url
            .clone()
            .unwrap_or_else(|| self.enrichment.base_url.clone())
    }
}
