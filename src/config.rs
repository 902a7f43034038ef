//! Gateway configuration.
//!
//! Sources, highest priority first:
//! 1. Environment variables (`TRELLIS_*`, e.g. `TRELLIS_BASE_URL`, `TRELLIS_TOKEN`)
//! 2. Project-level `.trellis/config.toml`
//! 3. User-level `<config dir>/trellis/config.toml`
//! 4. Built-in defaults

use crate::error::{Result, TrellisError};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::{path::Path, path::PathBuf, time::Duration};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Root URL of the board service, without a trailing slash
    pub base_url: String,
    /// Bearer credential sent with every board request
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            token: None,
            timeout_secs: 30,
            user_agent: format!("trellis-core/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl GatewayConfig {
    const PROJECT_CONFIG: &'static str = ".trellis/config.toml";

    /// Loads configuration from every source
    pub fn load() -> Result<Self> {
        Self::validated(Self::figment().extract()?)
    }

    /// Loads a single TOML file layered over the defaults
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(TrellisError::ConfigError(format!(
                "config file not found: {}",
                path.display()
            )));
        }
        let config = Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(path))
            .extract()?;
        Self::validated(config)
    }

    /// The provider chain used by [`GatewayConfig::load`]
    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(global) = Self::global_config_path() {
            if global.exists() {
                figment = figment.merge(Toml::file(global));
            }
        }

        let local = PathBuf::from(Self::PROJECT_CONFIG);
        if local.exists() {
            figment = figment.merge(Toml::file(local));
        }

        figment.merge(Env::prefixed("TRELLIS_"))
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("trellis").join("config.toml"))
    }

    fn validated(mut config: Self) -> Result<Self> {
        let trimmed = config.base_url.trim_end_matches('/');
        if trimmed.is_empty() {
            return Err(TrellisError::ConfigError("base_url must not be empty".to_string()));
        }
        config.base_url = trimmed.to_string();
        if config.timeout_secs == 0 {
            return Err(TrellisError::ConfigError(
                "timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(config)
    }

    /// Sets the bearer credential, e.g. after a successful login
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Joins an API path onto the base URL
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}
