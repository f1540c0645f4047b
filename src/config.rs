// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::profile::DeviceProfile;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub profiles: Vec<DeviceProfile>,
    #[serde(default)]
    pub client: ClientSettings,
    #[serde(default)]
    pub player: PlayerConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientSettings {
    pub request_timeout_secs: u64,
    /// Accept self-signed or expired portal certificates. Off unless set.
    pub accept_invalid_certs: bool,
    pub handshake_delay_ms: u64,
    pub keepalive_interval_secs: u64,
    /// Page ceiling for full VOD listings.
    pub vod_page_limit: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerConfig {
    pub command: String,
    pub args: Vec<String>,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            request_timeout_secs: 30,
            accept_invalid_certs: false,
            handshake_delay_ms: 500,
            keepalive_interval_secs: 60,
            vod_page_limit: Some(10),
        }
    }
}

impl ClientSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn handshake_delay(&self) -> Duration {
        Duration::from_millis(self.handshake_delay_ms)
    }

    pub fn keepalive_interval(&self) -> Duration {
        Duration::from_secs(self.keepalive_interval_secs.max(1))
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            command: "mpv".to_string(),
            args: vec!["--fs".to_string(), "--quiet".to_string()],
        }
    }
}

impl Config {
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .map(|p| p.join("stbportal").join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Config =
            toml::from_str(&content).with_context(|| "Failed to parse TOML configuration")?;

        Ok(config)
    }

    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Config {
        Self::load(&path).unwrap_or_else(|e| {
            tracing::warn!("Could not load config file, using defaults: {:#}", e);
            Self::default()
        })
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content =
            toml::to_string_pretty(self).with_context(|| "Failed to serialize config to TOML")?;

        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create config directory: {}", parent.display())
                })?;
            }
        }

        fs::write(&path, content)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        Ok(())
    }

    /// Profile by name (case-insensitive).
    pub fn find_profile(&self, name: &str) -> Option<&DeviceProfile> {
        self.profiles.iter().find(|p| {
            p.name
                .as_ref()
                .map(|n| n.eq_ignore_ascii_case(name))
                .unwrap_or(false)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_keep_tls_verification_on() {
        let settings = ClientSettings::default();
        assert!(!settings.accept_invalid_certs);
        assert_eq!(settings.request_timeout(), Duration::from_secs(30));
        assert_eq!(settings.handshake_delay(), Duration::from_millis(500));
        assert_eq!(settings.vod_page_limit, Some(10));
    }

    #[test]
    fn test_partial_client_section_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [client]
            accept_invalid_certs = true

            [[profiles]]
            name = "Home"
            portal_url = "http://portal.example.com/c/"
            mac_address = "00:1A:79:12:34:56"
            serial_number = "0123456789ABC"
            "#,
        )
        .unwrap();

        assert!(config.client.accept_invalid_certs);
        assert_eq!(config.client.keepalive_interval_secs, 60);
        assert_eq!(config.player.command, "mpv");
        assert_eq!(config.profiles.len(), 1);
        assert!(config.find_profile("home").is_some());
        assert!(config.find_profile("work").is_none());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        let mut profile = DeviceProfile::new("http://portal.example.com", "00:1A:79:00:00:01");
        profile.name = Some("Living room".into());
        config.profiles.push(profile);
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.profiles, config.profiles);
        assert_eq!(loaded.client, config.client);
    }

    #[test]
    fn test_load_or_default_on_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_default(dir.path().join("missing.toml"));
        assert!(config.profiles.is_empty());
    }
}
