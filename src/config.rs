// SPDX-License-Identifier: GPL-3.0-only
//! Agent configuration
//!
//! Loaded once at startup from a TOML file; any problem here is fatal and
//! happens before the hotplug watcher is installed.
//!
//! ```toml
//! target_device = "Elgato"      # name substring, or exact "vvvv:pppp" id
//! target_input = "Hdmi1"        # DisplayPort1 | DisplayPort2 | Hdmi1 | Hdmi2
//! on_connect_execute = "notify-send 'Switched displays'"   # optional
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::input_source::InputSource;

/// Overrides the config file location
pub const CONFIG_FILE_ENV: &str = "DISPLAY_SWITCH_CONFIG_FILE";
const TARGET_DEVICE_ENV: &str = "DISPLAY_SWITCH_TARGET_DEVICE";
const TARGET_INPUT_ENV: &str = "DISPLAY_SWITCH_TARGET_INPUT";

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Name substring or exact stable id of the USB device to watch for
    #[serde(alias = "usb_device")]
    pub target_device: String,
    /// Input every display is switched to when the device shows up
    #[serde(alias = "on_usb_connect")]
    pub target_input: InputSource,
    /// Shell command run after each switch
    #[serde(default, alias = "on_usb_connect_execute")]
    pub on_connect_execute: Option<String>,
}

impl Config {
    /// Load from `path`, or from the default location when `None`
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_file_name()?,
        };

        let mut config = Self::load_from_path(&path)?;
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        info!("Configuration loaded ({:?}): {:?}", path, config);
        Ok(config)
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|source| AppError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&contents).map_err(|source| AppError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    fn from_toml(contents: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    /// Environment variables win over the file
    fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(device) = lookup(TARGET_DEVICE_ENV) {
            self.target_device = device;
        }
        if let Some(input) = lookup(TARGET_INPUT_ENV) {
            self.target_input = input
                .parse()
                .map_err(|err| AppError::Config(format!("{TARGET_INPUT_ENV}: {err}")))?;
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.target_device.trim().is_empty() {
            return Err(AppError::Config("target_device must not be empty".to_string()));
        }
        if let Some(command) = &self.on_connect_execute
            && command.trim().is_empty()
        {
            return Err(AppError::Config(
                "on_connect_execute must not be empty when set".to_string(),
            ));
        }
        Ok(())
    }

    pub fn config_file_name() -> Result<PathBuf> {
        Self::config_file_name_with(std::env::var_os(CONFIG_FILE_ENV).map(PathBuf::from), dirs::config_dir())
    }

    fn config_file_name_with(env_path: Option<PathBuf>, config_dir: Option<PathBuf>) -> Result<PathBuf> {
        if let Some(path) = env_path {
            return Ok(path);
        }
        let dir = config_dir
            .ok_or_else(|| AppError::Config("Config directory not found".to_string()))?
            .join("display-switch");
        Ok(dir.join("display-switch.toml"))
    }
}
