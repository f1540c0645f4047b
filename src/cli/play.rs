// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

use super::{CommandContext, OutputFormat};
use stb_portal::config::PlayerConfig;
use stb_portal::spawn_keepalive;

pub struct ResolveCommand {
    pub cmd: String,
    pub vod: bool,
}

impl ResolveCommand {
    pub async fn execute(self, context: CommandContext, format: OutputFormat) -> Result<()> {
        let client = context.connect().await?;
        let result = client.resolve_stream(&self.cmd, self.vod).await;
        client.logout().await;

        let url = result.map_err(|e| anyhow::anyhow!(e.user_message()))?;
        match format {
            OutputFormat::Json => println!("{}", serde_json::json!({ "url": url })),
            OutputFormat::Text => println!("{}", url),
        }
        Ok(())
    }
}

pub struct PlayCommand {
    pub cmd: String,
    pub vod: bool,
}

impl PlayCommand {
    /// Resolve the stream, hand it to the external player and keep the
    /// portal session alive until the player exits.
    pub async fn execute(self, context: CommandContext) -> Result<()> {
        let player = context.config.player.clone();
        let interval = context.settings().keepalive_interval();
        let client = Arc::new(context.connect().await?);

        let url = match client.resolve_stream(&self.cmd, self.vod).await {
            Ok(url) => url,
            Err(e) => {
                client.logout().await;
                anyhow::bail!("{}", e.user_message());
            }
        };

        let cancel = CancellationToken::new();
        let keepalive = spawn_keepalive(client.clone(), interval, cancel.clone());

        let result = run_player(&player, &url).await;

        cancel.cancel();
        if let Err(e) = keepalive.await {
            tracing::warn!("Keepalive task failed: {}", e);
        }
        client.logout().await;

        result
    }
}

async fn run_player(player: &PlayerConfig, url: &str) -> Result<()> {
    println!("Starting player: {} {}", player.command, url);

    let status = Command::new(&player.command)
        .args(&player.args)
        .arg(url)
        .status()
        .await
        .with_context(|| format!("Failed to execute player command: {}", player.command))?;

    if !status.success() {
        anyhow::bail!("Player process failed with exit code: {}", status);
    }

    println!("Player exited successfully");
    Ok(())
}
