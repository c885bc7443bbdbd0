use crate::cli::Cli;
use config::{Config, ConfigError, Environment, File};
use directories::ProjectDirs;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub application_name: String,
    /// `host:port` of the IDE server. A bare `:port` means localhost.
    pub address: String,
    pub item_list_path: String,
    pub ping_path: String,
    pub ping_interval_ms: u64,
    pub request_timeout_secs: u64,
    pub debug_logging: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            application_name: "DCPU IDE".to_string(),
            address: "127.0.0.1:7070".to_string(),
            item_list_path: "/dashboard/itemlist.js".to_string(),
            ping_path: "/api/ping".to_string(),
            ping_interval_ms: 5000,
            request_timeout_secs: 15,
            debug_logging: false,
        }
    }
}

#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("invalid server address {address:?}: {source}")]
    Address {
        address: String,
        source: url::ParseError,
    },
}

impl AppConfig {
    pub fn load(cli: &Cli) -> Result<Self, AppConfigError> {
        let defaults = Self::default();
        let mut builder = Config::builder()
            .set_default("application_name", defaults.application_name.clone())?
            .set_default("address", defaults.address.clone())?
            .set_default("item_list_path", defaults.item_list_path.clone())?
            .set_default("ping_path", defaults.ping_path.clone())?
            .set_default("ping_interval_ms", defaults.ping_interval_ms)?
            .set_default("request_timeout_secs", defaults.request_timeout_secs)?
            .set_default("debug_logging", defaults.debug_logging)?;

        if let Some(profile) = &cli.profile {
            let profile_file_name = format!("dcpu-ide.{profile}.toml");
            if let Some(path) = Self::profile_path(&profile_file_name) {
                builder = builder.add_source(File::from(path).required(false));
            }
        }

        if let Some(config_path) = &cli.config {
            builder = builder.add_source(File::from(config_path.clone()).required(true));
        } else if let Some(path) = Self::default_config_path() {
            builder = builder.add_source(File::from(path).required(false));
        }

        builder = builder.add_source(
            Environment::with_prefix("DCPU_IDE")
                .prefix_separator("_")
                .separator("__"),
        );

        let built = builder.build()?;
        let config = built.try_deserialize::<AppConfig>()?;
        config.server_url()?;
        Ok(config)
    }

    /// Base URL every request path is joined onto.
    pub fn server_url(&self) -> Result<url::Url, AppConfigError> {
        let address = self.address.trim();
        let host_port = if address.starts_with(':') {
            format!("127.0.0.1{address}")
        } else {
            address.to_string()
        };
        let base = if host_port.contains("://") {
            host_port
        } else {
            format!("http://{host_port}/")
        };
        url::Url::parse(&base).map_err(|source| AppConfigError::Address {
            address: self.address.clone(),
            source,
        })
    }

    pub fn ping_interval(&self) -> Duration {
        Duration::from_millis(self.ping_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    fn default_config_path() -> Option<PathBuf> {
        ProjectDirs::from("org", "dcpu", "dcpu-ide")
            .map(|dirs| dirs.config_dir().join("dcpu-ide.toml"))
    }

    fn profile_path(file_name: &str) -> Option<PathBuf> {
        ProjectDirs::from("org", "dcpu", "dcpu-ide")
            .map(|dirs| dirs.config_dir().join(file_name))
    }
}
