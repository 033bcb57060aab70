//! Connection settings for the CLI
//!
//! Settings come from an optional TOML file, overridden by flags and
//! environment variables.

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, File};
use serde::Deserialize;

use metrics_lib::api::AuthScheme;
use metrics_lib::{ClientConfig, MetricsError};

/// Values from `~/.config/dtm/config.toml`, flags and environment
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    pub url: Option<String>,
    pub api_token: Option<String>,
    #[serde(default)]
    pub auth_scheme: AuthScheme,
    pub timeout_secs: Option<u64>,
}

impl Settings {
    /// Layer `url` and `api_token` overrides on top of the settings file
    pub fn load(
        path: Option<&Path>,
        url: Option<String>,
        api_token: Option<String>,
    ) -> Result<Self, MetricsError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(false));
        }

        builder
            .set_override_option("url", url)
            .and_then(|b| b.set_override_option("api_token", api_token))
            .and_then(|b| b.build())
            .and_then(|c| c.try_deserialize())
            .map_err(|e| MetricsError::Configuration(format!("Invalid settings: {}", e)))
    }

    /// Validated client configuration
    pub fn client_config(&self) -> Result<ClientConfig, MetricsError> {
        let mut config = ClientConfig::new(
            self.url.as_deref().unwrap_or_default(),
            self.api_token.as_deref().unwrap_or_default(),
        )?
        .with_auth_scheme(self.auth_scheme);

        if let Some(secs) = self.timeout_secs {
            config = config.with_timeout(Duration::from_secs(secs));
        }
        Ok(config)
    }
}

/// Default settings file location
pub fn default_config_path() -> Option<PathBuf> {
    dirs_next::home_dir().map(|home| home.join(".config").join("dtm").join("config.toml"))
}
