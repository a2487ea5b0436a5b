//! Connection settings for the command-line tool

use plex_client::ClientConfig;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Config file read from the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "plex-playlist.toml";

const TOKEN_HELP: &str = "https://support.plex.tv/articles/204059436-finding-an-authentication-token-x-plex-token/";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error(
        "PLEX_TOKEN is required (set it in the environment or in {}). You can find your token at: {}",
        DEFAULT_CONFIG_FILE,
        TOKEN_HELP
    )]
    MissingToken,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default = "default_server_url")]
    pub server_url: String,

    #[serde(default)]
    pub token: String,

    /// Request timeout in milliseconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,

    /// Base backoff delay in milliseconds
    #[serde(default = "default_retry_delay")]
    pub retry_delay: u64,

    #[serde(default)]
    pub retry_writes: bool,
}

impl Settings {
    /// Load from the config file (if present) and `PLEX_*` environment variables.
    pub fn load(config_path: Option<&Path>) -> Result<Self, SettingsError> {
        Self::load_from(config_path, None)
    }

    /// Like [`Settings::load`], with an explicit environment for tests.
    pub fn load_from(
        config_path: Option<&Path>,
        env: Option<HashMap<String, String>>,
    ) -> Result<Self, SettingsError> {
        let mut builder = config::Config::builder();

        let path = config_path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
        // An explicit path must exist; the default one is optional.
        builder = builder.add_source(config::File::from(path).required(config_path.is_some()));

        builder = builder.add_source(
            config::Environment::with_prefix("PLEX")
                .try_parsing(true)
                .source(env),
        );

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.token.trim().is_empty() {
            return Err(SettingsError::MissingToken);
        }
        Ok(())
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::new(&self.server_url, &self.token)
            .with_timeout(Duration::from_millis(self.timeout))
            .with_retry_attempts(self.retry_attempts)
            .with_retry_delay(Duration::from_millis(self.retry_delay))
            .with_retry_writes(self.retry_writes)
    }
}

fn default_server_url() -> String {
    "http://localhost:32400".to_string()
}

fn default_timeout() -> u64 {
    10_000
}

fn default_retry_attempts() -> u32 {
    3
}

fn default_retry_delay() -> u64 {
    2_000
}
