// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::client::PortalClient;
use crate::error::{ClientError, Result};
use crate::model::value_text;
use crate::profile::DeviceProfile;
use crate::transport::{PortalRequest, Transport};
use crate::url_builder::{Resource, build_url};

/// User agent of a MAG200 set-top box.
pub const STB_USER_AGENT: &str = "Mozilla/5.0 (QtEmbedded; U; Linux; C) AppleWebKit/533.3 (KHTML, like Gecko) MAG200 stbapp ver:2 rev:250 Safari/533.3";

/// State of one portal session: the profile it was created from, the bearer
/// token once the handshake succeeded, and the request counter.
#[derive(Debug, Clone)]
pub struct Session {
    profile: DeviceProfile,
    token: Option<String>,
    request_id: u64,
}

impl Session {
    pub fn new(profile: DeviceProfile) -> Self {
        Self {
            profile,
            token: None,
            request_id: 1,
        }
    }

    pub fn profile(&self) -> &DeviceProfile {
        &self.profile
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Counter value the next request will carry.
    pub fn request_id(&self) -> u64 {
        self.request_id
    }

    pub fn next_url(&mut self, resource: Resource, action: &str, params: &[(&str, String)]) -> String {
        let id = self.request_id;
        self.request_id += 1;
        build_url(&self.profile.portal_url, resource, action, params, id)
    }

    pub fn request(
        &mut self,
        resource: Resource,
        action: &str,
        params: &[(&str, String)],
    ) -> PortalRequest {
        let url = self.next_url(resource, action, params);
        PortalRequest {
            url,
            headers: self.headers(),
        }
    }

    /// Identity headers sent with every request, plus the bearer token once
    /// one is held.
    pub fn headers(&self) -> Vec<(&'static str, String)> {
        let mut headers = vec![
            ("User-Agent", STB_USER_AGENT.to_string()),
            (
                "X-User-Agent",
                format!("Model: {}; Link: Ethernet", self.profile.stb_type),
            ),
            (
                "Cookie",
                format!(
                    "mac={}; stb_lang=en; timezone={}",
                    self.profile.mac_address, self.profile.timezone
                ),
            ),
        ];

        if let Some(token) = &self.token {
            headers.push(("Authorization", format!("Bearer {}", token)));
        }

        headers
    }
}

impl<T: Transport> PortalClient<T> {
    /// Runs the handshake and profile verification for `profile`.
    ///
    /// Any previous session and all cached listings are dropped before the
    /// first request goes out, whether or not authentication then succeeds.
    pub async fn authenticate(&self, profile: DeviceProfile) -> Result<()> {
        let _guard = self.auth_lock.lock().await;

        info!("Authenticating {}", profile.display_name());
        self.cache.clear();
        *self.lock_session() = None;

        profile.validate()?;
        *self.lock_session() = Some(Session::new(profile.clone()));

        let delay = self.handshake_delay();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let js = self.call(Resource::Stb, "handshake", &[]).await?;
        let token = parse_handshake(&js)?;
        debug!("Token received");
        self.set_token(Some(token));

        let params = profile.device_params();
        let verified = match self.call(Resource::Stb, "get_profile", &params).await {
            Ok(js) => verify_profile(&js),
            Err(e) => Err(e),
        };

        match verified {
            Ok(user_id) => {
                info!("Profile loaded successfully - User ID: {}", user_id);
                Ok(())
            }
            Err(e) => {
                warn!("Profile verification failed: {}", e);
                self.set_token(None);
                Err(e)
            }
        }
    }

    /// Ends the session. Never fails: portal errors are only logged, and the
    /// local session and caches are dropped regardless.
    pub async fn logout(&self) {
        let _guard = self.auth_lock.lock().await;

        let request = match self.prepare(Resource::Stb, "logout", &[]) {
            Ok(request) => request,
            Err(_) => return,
        };

        match self.send(request).await {
            Ok(_) => info!("Logout successful"),
            Err(e) => warn!("Logout error (non-critical): {}", e),
        }

        *self.lock_session() = None;
        self.cache.clear();
    }

    pub fn is_authenticated(&self) -> bool {
        self.lock_session()
            .as_ref()
            .map(|s| s.token.is_some())
            .unwrap_or(false)
    }

    pub fn token(&self) -> Option<String> {
        self.lock_session()
            .as_ref()
            .and_then(|s| s.token.clone())
    }

    pub fn profile(&self) -> Option<DeviceProfile> {
        self.lock_session().as_ref().map(|s| s.profile.clone())
    }

    fn set_token(&self, token: Option<String>) {
        if let Some(session) = self.lock_session().as_mut() {
            session.token = token;
        }
    }
}

fn non_empty_field(js: &Value, key: &str) -> Option<String> {
    js.get(key)
        .and_then(value_text)
        .filter(|s| !s.is_empty())
}

/// Token from a handshake payload.
pub(crate) fn parse_handshake(js: &Value) -> Result<String> {
    if js.is_array() {
        warn!("Portal returned js as array instead of object - authentication rejected");
        return Err(ClientError::PortalRejected);
    }

    if let Some(error) = non_empty_field(js, "error") {
        let message = non_empty_field(js, "msg").unwrap_or(error);
        return Err(ClientError::Portal(message));
    }

    non_empty_field(js, "token").ok_or(ClientError::NoToken)
}

/// User id from a `get_profile` payload.
pub(crate) fn verify_profile(js: &Value) -> Result<String> {
    if let Some(msg) = non_empty_field(js, "msg") {
        let lower = msg.to_lowercase();
        if lower.contains("conflict") || lower.contains("mismatch") {
            return Err(ClientError::DeviceConflict(msg));
        }
    }

    non_empty_field(js, "id").ok_or(ClientError::InvalidProfileResponse)
}
