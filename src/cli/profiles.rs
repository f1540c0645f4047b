// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use anyhow::Result;
use serde_json::json;
use std::path::PathBuf;

use super::{CommandContext, OutputFormat};
use stb_portal::DeviceProfile;

pub enum ProfilesCommand {
    List,
    Add {
        name: String,
        portal_url: String,
        mac: Option<String>,
        serial_number: Option<String>,
        stb_type: Option<String>,
        timezone: Option<String>,
        config_path: PathBuf,
    },
    Auth,
}

impl ProfilesCommand {
    pub async fn execute(self, context: CommandContext, format: OutputFormat) -> Result<()> {
        match self {
            Self::List => list_profiles(&context, format),
            Self::Add {
                name,
                portal_url,
                mac,
                serial_number,
                stb_type,
                timezone,
                config_path,
            } => {
                let mut profile = DeviceProfile::new(
                    portal_url,
                    mac.unwrap_or_else(DeviceProfile::generate_mac),
                );
                profile.name = Some(name);
                profile.serial_number = serial_number;
                if let Some(stb_type) = stb_type {
                    profile.stb_type = stb_type;
                }
                if let Some(timezone) = timezone {
                    profile.timezone = timezone;
                }
                profile.validate()?;

                let mut config = context.config;
                if let Some(existing) = profile.name.as_deref().and_then(|n| config.find_profile(n)) {
                    anyhow::bail!("Profile '{}' already exists", existing.display_name());
                }
                println!("Added profile {} (MAC {})", profile.display_name(), profile.mac_address);
                config.profiles.push(profile);
                config.save(&config_path)?;
                println!("Configuration saved to {}", config_path.display());
                Ok(())
            }
            Self::Auth => {
                let client = context.connect().await?;
                let profile = client.profile();
                client.logout().await;
                if let Some(profile) = profile {
                    println!("✓ Authenticated {}", profile.display_name());
                }
                Ok(())
            }
        }
    }
}

fn list_profiles(context: &CommandContext, format: OutputFormat) -> Result<()> {
    let profiles = &context.config.profiles;

    match format {
        OutputFormat::Json => {
            let info: Vec<_> = profiles
                .iter()
                .map(|p| {
                    json!({
                        "name": p.display_name(),
                        "portal_url": p.portal_url,
                        "mac_address": p.mac_address,
                        "stb_type": p.stb_type,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&info)?);
        }
        OutputFormat::Text => {
            if profiles.is_empty() {
                println!("No profiles configured");
            } else {
                println!("Configured profiles:");
                for (i, p) in profiles.iter().enumerate() {
                    println!("  {}. {} ({}, {})", i + 1, p.display_name(), p.portal_url, p.mac_address);
                }
            }
        }
    }

    Ok(())
}
