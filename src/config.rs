//! Configuration file support for plex-remote.
//!
//! Settings are read from a TOML file and then overridden by environment
//! variables, so a deployment can pin the server identifier or the player
//! address without touching the file.

use crate::error::{AppError, Result};
use crate::matching::CONFIRM_THRESHOLD;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Server base URL.
pub const ENV_SERVER_URL: &str = "PMS_URL";
/// Plex authentication token.
pub const ENV_TOKEN: &str = "PLEX_TOKEN";
/// Server machine identifier, skips the `/` lookup.
pub const ENV_MACHINE_IDENTIFIER: &str = "PMS_IDENTIFIER";
/// Player address, skips the `/clients` lookup.
pub const ENV_PLAYER_ADDRESS: &str = "PLEXPLAYER_IP";

/// User configuration settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the Plex Media Server
    #[serde(default = "default_server_url")]
    pub server_url: String,

    /// X-Plex-Token sent with every request
    #[serde(default)]
    pub token: Option<String>,

    /// Library section holding TV shows
    #[serde(default = "default_tv_section")]
    pub tv_section: u32,

    /// Match confidence (0-100) needed to play without confirming
    #[serde(default = "default_confirm_threshold")]
    pub confirm_threshold: u8,

    #[serde(default)]
    pub machine_identifier: Option<String>,

    #[serde(default)]
    pub player_address: Option<String>,

    /// Player used when none is named on the command line
    #[serde(default)]
    pub default_player: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

fn default_server_url() -> String {
    "http://127.0.0.1:32400".to_string()
}

fn default_tv_section() -> u32 {
    1
}

fn default_confirm_threshold() -> u8 {
    CONFIRM_THRESHOLD
}

impl Config {
    /// Create a new config with default values.
    pub fn new() -> Self {
        Self {
            server_url: default_server_url(),
            token: None,
            tv_section: default_tv_section(),
            confirm_threshold: default_confirm_threshold(),
            machine_identifier: None,
            player_address: None,
            default_player: None,
        }
    }

    /// Get the path to the config file.
    ///
    /// Returns ~/.config/plex-remote/config.toml on Linux,
    /// or a platform-appropriate location on other systems.
    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| AppError::Config("Could not find config directory".to_string()))?
            .join("plex-remote");

        Ok(config_dir.join("config.toml"))
    }

    /// Load config from disk, then apply environment overrides.
    ///
    /// Missing files yield the defaults.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::get_config_path()?)?;
        config.apply_env(|key| env::var(key).ok());
        Ok(config)
    }

    /// Read the file at `path` without environment overrides.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Override settings from environment variables looked up through `var`.
    ///
    /// Empty values are ignored.
    pub fn apply_env<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| var(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = lookup(ENV_SERVER_URL) {
            self.server_url = url;
        }
        if let Some(token) = lookup(ENV_TOKEN) {
            self.token = Some(token);
        }
        if let Some(id) = lookup(ENV_MACHINE_IDENTIFIER) {
            self.machine_identifier = Some(id);
        }
        if let Some(address) = lookup(ENV_PLAYER_ADDRESS) {
            self.player_address = Some(address);
        }
    }

    /// Save config to disk.
    ///
    /// Creates the config directory if it doesn't exist.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Create a default config file if one doesn't exist.
    ///
    /// Returns the path to the config file.
    pub fn create_default_if_missing() -> Result<PathBuf> {
        let path = Self::get_config_path()?;
        Self::create_default_at(&path)?;
        Ok(path)
    }

    /// Write the defaults to `path` unless a file is already there.
    /// Returns whether a file was written.
    pub fn create_default_at(path: &Path) -> Result<bool> {
        if path.exists() {
            return Ok(false);
        }
        Self::new().save_to(path)?;
        Ok(true)
    }
}
