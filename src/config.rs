use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use jobless_core::query::QueryParams;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    pub server: ServerConfig,
    #[serde(default)]
    pub query: QueryConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub bind: String,
}

/// Read-path tuning. The over-fetch bounds are the documented ceilings on
/// how many records the snapshot-paginated modes can ever reach; raise
/// them here rather than patching the query layer.
#[derive(Debug, Deserialize, Clone)]
pub struct QueryConfig {
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default = "default_category_overfetch")]
    pub category_overfetch: usize,
    #[serde(default = "default_batch_overfetch")]
    pub batch_overfetch: usize,
    #[serde(default = "default_location_factor")]
    pub location_overfetch_factor: usize,
    #[serde(default = "default_fallback_scan_limit")]
    pub fallback_scan_limit: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        QueryConfig {
            page_size: default_page_size(),
            category_overfetch: default_category_overfetch(),
            batch_overfetch: default_batch_overfetch(),
            location_overfetch_factor: default_location_factor(),
            fallback_scan_limit: default_fallback_scan_limit(),
        }
    }
}

fn default_page_size() -> usize {
    9
}
fn default_category_overfetch() -> usize {
    50
}
fn default_batch_overfetch() -> usize {
    100
}
fn default_location_factor() -> usize {
    3
}
fn default_fallback_scan_limit() -> usize {
    100
}

impl QueryConfig {
    pub fn params(&self) -> QueryParams {
        QueryParams {
            page_size: self.page_size,
            category_overfetch: self.category_overfetch,
            batch_overfetch: self.batch_overfetch,
            location_overfetch_factor: self.location_overfetch_factor,
            fallback_scan_limit: self.fallback_scan_limit,
        }
    }
}

/// Outbound notification settings. Disabled unless a provider is set; the
/// Telegram half activates only when both bot token and chat id are present.
#[derive(Debug, Deserialize, Clone)]
pub struct NotifyConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub mail_api_url: Option<String>,
    #[serde(default)]
    pub mail_api_key: Option<String>,
    #[serde(default)]
    pub from_email: Option<String>,
    #[serde(default = "default_from_name")]
    pub from_name: String,
    #[serde(default)]
    pub telegram_bot_token: Option<String>,
    #[serde(default)]
    pub telegram_chat_id: Option<String>,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        NotifyConfig {
            provider: default_provider(),
            mail_api_url: None,
            mail_api_key: None,
            from_email: None,
            from_name: default_from_name(),
            telegram_bot_token: None,
            telegram_chat_id: None,
        }
    }
}

fn default_provider() -> String {
    "disabled".to_string()
}

fn default_from_name() -> String {
    "JoBless".to_string()
}

impl NotifyConfig {
    pub fn mail_enabled(&self) -> bool {
        self.provider == "api"
    }

    pub fn telegram_enabled(&self) -> bool {
        self.telegram_bot_token.is_some() && self.telegram_chat_id.is_some()
    }

    pub fn is_enabled(&self) -> bool {
        self.mail_enabled() || self.telegram_enabled()
    }
}

impl Config {
    /// Minimal config for tests: default tuning, notifications disabled.
    pub fn minimal() -> Config {
        Config {
            db: DbConfig {
                path: PathBuf::from("./data/jobless.sqlite"),
            },
            server: ServerConfig {
                bind: "127.0.0.1:7878".to_string(),
            },
            query: QueryConfig::default(),
            notify: NotifyConfig::default(),
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if config.query.page_size == 0 {
        anyhow::bail!("query.page_size must be >= 1");
    }
    if config.query.location_overfetch_factor == 0 {
        anyhow::bail!("query.location_overfetch_factor must be >= 1");
    }
    if config.query.fallback_scan_limit == 0 {
        anyhow::bail!("query.fallback_scan_limit must be >= 1");
    }
    if config.query.category_overfetch < config.query.page_size {
        anyhow::bail!("query.category_overfetch must be >= query.page_size");
    }

    match config.notify.provider.as_str() {
        "disabled" | "api" => {}
        other => anyhow::bail!(
            "Unknown notify provider: '{}'. Must be disabled or api.",
            other
        ),
    }
    if config.notify.mail_enabled() {
        if config.notify.mail_api_url.is_none() || config.notify.mail_api_key.is_none() {
            anyhow::bail!(
                "notify.mail_api_url and notify.mail_api_key are required when provider is 'api'"
            );
        }
        if config.notify.from_email.is_none() {
            anyhow::bail!("notify.from_email is required when provider is 'api'");
        }
    }
    if config.notify.telegram_bot_token.is_some() != config.notify.telegram_chat_id.is_some() {
        anyhow::bail!("notify.telegram_bot_token and notify.telegram_chat_id must be set together");
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_defaults() {
        let config = Config::minimal();
        assert_eq!(config.query.page_size, 9);
        assert_eq!(config.query.category_overfetch, 50);
        assert_eq!(config.query.batch_overfetch, 100);
        assert!(!config.notify.is_enabled());
    }

    #[test]
    fn test_load_rejects_overfetch_below_page_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jobless.toml");
        std::fs::write(
            &path,
            r#"
[db]
path = "./data/jobless.sqlite"

[server]
bind = "127.0.0.1:7878"

[query]
page_size = 20
category_overfetch = 10
"#,
        )
        .unwrap();
        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("category_overfetch"));
    }

    #[test]
    fn test_load_rejects_half_configured_telegram() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jobless.toml");
        std::fs::write(
            &path,
            r#"
[db]
path = "./data/jobless.sqlite"

[server]
bind = "127.0.0.1:7878"

[notify]
telegram_bot_token = "123:abc"
"#,
        )
        .unwrap();
        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("telegram"));
    }
}
