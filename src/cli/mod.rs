// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use inquire::Select;
use std::time::Duration;

use stb_portal::{ClientError, ClientSettings, Config, DeviceProfile, PortalClient};

pub mod list;
pub mod play;
pub mod profiles;

pub use list::ListCommand;
pub use play::{PlayCommand, ResolveCommand};
pub use profiles::ProfilesCommand;

/// Output format for command results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => anyhow::bail!("Invalid format: {}. Use 'text' or 'json'", s),
        }
    }
}

/// Context for command execution with profile selection
pub struct CommandContext {
    pub config: Config,
    pub selected_profile: Option<String>,
}

impl CommandContext {
    pub fn new(config: Config, selected_profile: Option<String>) -> Self {
        Self {
            config,
            selected_profile,
        }
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.config.client
    }

    /// Pick the profile to connect with: by name, the only one, or by prompt.
    pub fn select_profile(&self) -> Result<DeviceProfile> {
        let profiles = &self.config.profiles;
        if profiles.is_empty() {
            anyhow::bail!(
                "No profiles configured. Add one with 'stbportal profiles add' or edit {}",
                Config::default_path().display()
            );
        }

        if let Some(name) = &self.selected_profile {
            return self
                .config
                .find_profile(name)
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("Profile '{}' not found", name));
        }

        if profiles.len() == 1 {
            return Ok(profiles[0].clone());
        }

        let names: Vec<String> = profiles.iter().map(|p| p.display_name()).collect();
        let selection = Select::new("Select profile:", names).prompt()?;

        profiles
            .iter()
            .find(|p| p.display_name() == selection)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("Profile not found"))
    }

    /// Build a client and authenticate it against the selected profile.
    pub async fn connect(&self) -> Result<PortalClient> {
        let profile = self.select_profile()?;
        let client = PortalClient::new(self.settings().clone())
            .context("Failed to create HTTP client")?;

        let spinner = spinner(format!("Authenticating {}...", profile.display_name()));
        let result = client.authenticate(profile).await;
        spinner.finish_and_clear();

        if let Err(e) = result {
            anyhow::bail!("{}", connect_error_message(&e));
        }

        Ok(client)
    }
}

/// Authentication failures get a hint about the profile; anything else is
/// reported as is.
fn connect_error_message(error: &ClientError) -> String {
    if error.is_auth_failure() {
        format!(
            "{}\nCheck the profile's MAC address and portal URL with 'stbportal auth'.",
            error.user_message()
        )
    } else {
        error.user_message()
    }
}

pub fn spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} {msg} [{elapsed_precise}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_error_message_hints_only_for_auth_failures() {
        let rejected = connect_error_message(&ClientError::NoToken);
        assert!(rejected.starts_with("No token received"));
        assert!(rejected.contains("stbportal auth"));

        let network = connect_error_message(&ClientError::Network("refused".into()));
        assert_eq!(network, "Network error: refused");
    }
}
