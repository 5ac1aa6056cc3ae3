use crate::config::Config;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const SETTINGS_FILE: &str = "multisender_settings.json";

/// User settings that persist between sessions
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserSettings {
    /// Last selected network chain ID
    pub selected_chain_id: u64,
    /// Custom RPC overrides per chain ID
    #[serde(default)]
    pub custom_rpcs: HashMap<u64, String>,
    /// Multisender contract override (None = deployed default)
    #[serde(default)]
    pub multisender_override: Option<String>,
    #[serde(default)]
    pub estimate_timeout_secs: Option<u64>,
    #[serde(default)]
    pub submit_timeout_secs: Option<u64>,
    /// Directory for exported review files
    #[serde(default)]
    pub export_directory: Option<String>,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            selected_chain_id: 1, // Ethereum Mainnet
            custom_rpcs: HashMap::new(),
            multisender_override: None,
            estimate_timeout_secs: None,
            submit_timeout_secs: None,
            export_directory: None,
        }
    }
}

impl UserSettings {
    /// Get the settings file path
    fn settings_path() -> PathBuf {
        if let Some(config_dir) = dirs::config_dir() {
            let app_dir = config_dir.join("multisender");
            if !app_dir.exists() {
                let _ = fs::create_dir_all(&app_dir);
            }
            app_dir.join(SETTINGS_FILE)
        } else {
            PathBuf::from(SETTINGS_FILE)
        }
    }

    /// Load settings from disk, or return defaults if not found
    pub fn load() -> Self {
        Self::load_from(&Self::settings_path())
    }

    pub fn load_from(path: &Path) -> Self {
        if path.exists() {
            match fs::read_to_string(path) {
                Ok(content) => match serde_json::from_str(&content) {
                    Ok(settings) => {
                        tracing::info!("Loaded settings from {:?}", path);
                        return settings;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to parse settings file: {}", e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read settings file: {}", e);
                }
            }
        }
        tracing::info!("Using default settings");
        Self::default()
    }

    /// Save settings to disk
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::settings_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        tracing::info!("Saved settings to {:?}", path);
        Ok(())
    }

    /// Get custom RPC for a chain, or None if using default
    pub fn get_custom_rpc(&self, chain_id: u64) -> Option<&String> {
        self.custom_rpcs.get(&chain_id).filter(|s| !s.is_empty())
    }

    /// Set custom RPC for a chain (empty string removes the override)
    pub fn set_custom_rpc(&mut self, chain_id: u64, rpc: String) {
        if rpc.trim().is_empty() {
            self.custom_rpcs.remove(&chain_id);
        } else {
            self.custom_rpcs.insert(chain_id, rpc.trim().to_string());
        }
    }

    /// Fill in whatever the environment left at its default
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(rpc) = self.get_custom_rpc(config.chain_id) {
            config.rpc_url = rpc.clone();
        }
        if config.multisender_override.is_none() {
            config.multisender_override = self.multisender_override.clone();
        }
        if let Some(secs) = self.estimate_timeout_secs {
            config.estimate_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = self.submit_timeout_secs {
            config.submit_timeout = Duration::from_secs(secs);
        }
        if let Some(dir) = &self.export_directory {
            config.export_directory = dir.clone();
        }
    }
}
