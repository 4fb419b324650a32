//! Service configuration

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{OnboardError, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub forms: FormsConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP listen address
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Directory served under /static
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormsConfig {
    /// Directory holding `<step>.json` form documents
    #[serde(default = "default_forms_dir")]
    pub dir: PathBuf,

    /// Step that `/join` sends signed-in members to
    #[serde(default = "default_first_step")]
    pub first_step: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// SQLite database file
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HS256 signing secret, at least 32 characters
    #[serde(default)]
    pub jwt_secret: String,

    /// Session lifetime in seconds
    #[serde(default = "default_lifetime")]
    pub lifetime_secs: u64,

    /// How long after login a sudo session may use the admin API
    #[serde(default = "default_sudo_lifetime")]
    pub sudo_lifetime_secs: u64,

    /// Where pages send visitors without a session
    #[serde(default = "default_login_url")]
    pub login_url: String,
}

// Defaults
fn default_listen() -> String { "0.0.0.0:8000".to_string() }
fn default_static_dir() -> PathBuf { PathBuf::from("static") }
fn default_forms_dir() -> PathBuf { PathBuf::from("forms") }
fn default_first_step() -> String { "2".to_string() }
fn default_db_path() -> PathBuf { PathBuf::from("onboard.db") }
fn default_lifetime() -> u64 { 15 * 7 * 24 * 60 * 60 } // 15 weeks
fn default_sudo_lifetime() -> u64 { crate::auth::DEFAULT_SUDO_LIFETIME }
fn default_login_url() -> String { "/discord/new".to_string() }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            static_dir: default_static_dir(),
        }
    }
}

impl Default for FormsConfig {
    fn default() -> Self {
        Self {
            dir: default_forms_dir(),
            first_step: default_first_step(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            lifetime_secs: default_lifetime(),
            sudo_lifetime_secs: default_sudo_lifetime(),
            login_url: default_login_url(),
        }
    }
}

impl Config {
    /// Read `path`, falling back to defaults when it does not exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            info!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| OnboardError::Config(format!("{}: {}", path.display(), e)))
    }
}
