//! Tool settings
//!
//! Settings control how the fetcher talks to the network, how deep the
//! resolver may walk, and which version-control program performs checkouts.
//! They are stored in TOML at `~/.o3de/o3de_fetch.toml`; every field has a
//! default so a missing file is equivalent to an empty one.
//!
//! # Examples
//!
//! ```no_run
//! use o3de_fetch::Settings;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = Settings::load()?;
//! println!("Network timeout: {}s", settings.network.timeout_seconds);
//! println!("Max repository depth: {}", settings.resolver.max_depth);
//! # Ok(())
//! # }
//! ```

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Settings file name inside the config directory
pub const SETTINGS_FILE_NAME: &str = "o3de_fetch.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// HTTP transport settings
    #[serde(default)]
    pub network: NetworkConfig,

    /// Repository graph traversal settings
    #[serde(default)]
    pub resolver: ResolverConfig,

    /// Version control settings
    #[serde(default)]
    pub checkout: CheckoutConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Per-request timeout in seconds (0 = no timeout)
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// User agent sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("o3de-fetch/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout_seconds(),
            user_agent: default_user_agent(),
        }
    }
}

/// Repository graph traversal settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Maximum nesting of repository indices followed (default: 100)
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Deadline for one resolution pass in seconds (0 = no deadline)
    #[serde(default)]
    pub resolution_timeout_seconds: u64,
}

fn default_max_depth() -> usize {
    100
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            resolution_timeout_seconds: 0,
        }
    }
}

impl ResolverConfig {
    /// Time budget of one resolution pass, or None when unbounded
    pub fn deadline(&self) -> Option<std::time::Duration> {
        match self.resolution_timeout_seconds {
            0 => None,
            secs => Some(std::time::Duration::from_secs(secs)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutConfig {
    /// Version control executable
    #[serde(default = "default_checkout_program")]
    pub program: String,
}

fn default_checkout_program() -> String {
    "git".to_string()
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            program: default_checkout_program(),
        }
    }
}

impl Settings {
    /// Get the default settings file path
    ///
    /// Uses O3DE_FETCH_CONFIG_DIR if set, otherwise ~/.o3de/o3de_fetch.toml
    pub fn default_path() -> Result<PathBuf> {
        if let Ok(config_dir) = std::env::var("O3DE_FETCH_CONFIG_DIR") {
            let expanded = shellexpand::tilde(&config_dir).into_owned();
            return Ok(PathBuf::from(expanded).join(SETTINGS_FILE_NAME));
        }

        let home = dirs::home_dir()
            .ok_or_else(|| Error::Config("Could not find home directory".to_string()))?;

        Ok(home.join(".o3de").join(SETTINGS_FILE_NAME))
    }

    /// Load settings from the default path, or defaults if the file doesn't exist
    pub fn load() -> Result<Self> {
        let path = Self::default_path()?;
        Self::load_from(&path)
    }

    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn request_timeout(&self) -> Option<std::time::Duration> {
        match self.network.timeout_seconds {
            0 => None,
            secs => Some(std::time::Duration::from_secs(secs)),
        }
    }

    pub fn resolution_deadline(&self) -> Option<std::time::Duration> {
        self.resolver.deadline()
    }
}
