// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use tracing::debug;

use crate::client::PortalClient;
use crate::error::{ClientError, Result};
use crate::model::value_text;
use crate::transport::Transport;
use crate::url_builder::Resource;

/// Player tokens portals put in front of the stream URL.
const PLAYER_PREFIXES: &[&str] = &["ffmpeg", "ffrt", "ffrt2", "ffrt3", "auto"];

/// Turns a `create_link` command into a bare URL: drops a leading player
/// token and surrounding quotes.
pub fn clean_stream_command(raw: &str) -> Option<String> {
    let mut cmd = raw.trim();

    if let Some((head, rest)) = cmd.split_once(char::is_whitespace) {
        if PLAYER_PREFIXES.iter().any(|p| head.eq_ignore_ascii_case(p)) {
            cmd = rest.trim();
        }
    }

    let cleaned = cmd.trim_matches(|c| c == '"' || c == '\'').trim();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned.to_string())
    }
}

impl<T: Transport> PortalClient<T> {
    /// Exchanges a channel or VOD command for a playable stream URL.
    pub async fn resolve_stream(&self, command: &str, is_vod: bool) -> Result<String> {
        let resource = if is_vod { Resource::Vod } else { Resource::Itv };
        let params = [
            ("cmd", command.to_string()),
            ("series", String::new()),
            ("forced_storage", "undefined".to_string()),
            ("disable_ad", "0".to_string()),
            ("download", "0".to_string()),
        ];

        let js = self.call(resource, "create_link", &params).await?;

        let raw = js
            .get("cmd")
            .and_then(value_text)
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| ClientError::Resolve("portal returned no cmd".into()))?;

        let url = clean_stream_command(&raw)
            .ok_or_else(|| ClientError::Resolve(format!("unusable stream command: {}", raw)))?;

        debug!("Resolved stream URL: {}", url);
        Ok(url)
    }
}
