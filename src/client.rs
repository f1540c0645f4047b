// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use serde_json::Value;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, warn};

use crate::cache::ContentCache;
use crate::config::ClientSettings;
use crate::error::{ClientError, Result};
use crate::session::Session;
use crate::transport::{HttpTransport, PortalRequest, Transport};
use crate::url_builder::Resource;

/// Client for one portal session.
///
/// Token and request counter live in a [`Session`] behind a mutex that is
/// never held across a network call. `authenticate` and `logout` are
/// serialized through `auth_lock` so token resets never interleave.
#[derive(Debug)]
pub struct PortalClient<T: Transport = HttpTransport> {
    pub(crate) transport: T,
    pub(crate) session: Mutex<Option<Session>>,
    pub(crate) auth_lock: tokio::sync::Mutex<()>,
    pub(crate) cache: ContentCache,
    pub(crate) settings: ClientSettings,
}

impl PortalClient<HttpTransport> {
    pub fn new(settings: ClientSettings) -> Result<Self> {
        let transport = HttpTransport::new(&settings)?;
        Ok(Self::with_transport(transport, settings))
    }
}

impl<T: Transport> PortalClient<T> {
    pub fn with_transport(transport: T, settings: ClientSettings) -> Self {
        Self {
            transport,
            session: Mutex::new(None),
            auth_lock: tokio::sync::Mutex::new(()),
            cache: ContentCache::default(),
            settings,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    pub fn cache(&self) -> &ContentCache {
        &self.cache
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    pub(crate) fn lock_session(&self) -> MutexGuard<'_, Option<Session>> {
        self.session
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Builds the next request, consuming one request id.
    pub(crate) fn prepare(
        &self,
        resource: Resource,
        action: &str,
        params: &[(&str, String)],
    ) -> Result<PortalRequest> {
        self.lock_session()
            .as_mut()
            .map(|session| session.request(resource, action, params))
            .ok_or(ClientError::NoActiveProfile)
    }

    /// Sends a request under the per-call deadline and unwraps the `js`
    /// envelope.
    pub(crate) async fn send(&self, request: PortalRequest) -> Result<Value> {
        let timeout = self.settings.request_timeout();
        let body = match tokio::time::timeout(timeout, self.transport.get(request)).await {
            Ok(result) => result?,
            Err(_) => {
                warn!("Portal request timed out after {:?}", timeout);
                return Err(ClientError::Network(format!(
                    "request timed out after {}s",
                    timeout.as_secs()
                )));
            }
        };

        parse_envelope(&body)
    }

    pub(crate) async fn call(
        &self,
        resource: Resource,
        action: &str,
        params: &[(&str, String)],
    ) -> Result<Value> {
        let request = self.prepare(resource, action, params)?;
        debug!("{} {}: {}", resource, action, request.url);
        self.send(request).await
    }

    pub(crate) fn handshake_delay(&self) -> Duration {
        self.settings.handshake_delay()
    }
}

/// Extracts the payload of a `{"js": ...}` response. A missing `js` is null.
pub fn parse_envelope(body: &str) -> Result<Value> {
    if body.trim().is_empty() {
        return Err(ClientError::Protocol("empty response from server".into()));
    }

    match serde_json::from_str::<Value>(body)? {
        Value::Object(mut map) => Ok(map.remove("js").unwrap_or(Value::Null)),
        other => Err(ClientError::Protocol(format!(
            "expected a JSON object envelope, got {}",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::DeviceProfile;
    use crate::transport::testing::ScriptedTransport;
    use serde_json::json;

    #[test]
    fn test_parse_envelope() {
        assert_eq!(
            parse_envelope(r#"{"js":{"token":"T"}}"#).unwrap(),
            json!({"token": "T"})
        );
        assert_eq!(parse_envelope(r#"{"text":"x"}"#).unwrap(), Value::Null);
        assert!(matches!(
            parse_envelope("<html>blocked</html>"),
            Err(ClientError::Protocol(_))
        ));
        assert!(matches!(parse_envelope("[1]"), Err(ClientError::Protocol(_))));
        assert!(matches!(parse_envelope("  "), Err(ClientError::Protocol(_))));
    }

    #[test]
    fn test_prepare_without_session_fails() {
        let client = PortalClient::with_transport(ScriptedTransport::new(), ClientSettings::default());
        assert_eq!(
            client.prepare(Resource::Itv, "get_genres", &[]),
            Err(ClientError::NoActiveProfile)
        );
    }

    #[test]
    fn test_prepare_increments_counter_once_per_call() {
        let client = PortalClient::with_transport(ScriptedTransport::new(), ClientSettings::default());
        *client.lock_session() = Some(Session::new(DeviceProfile::new(
            "http://p.example.com",
            "00:1A:79:00:00:01",
        )));

        for n in 1..=5u64 {
            let request = client.prepare(Resource::Itv, "get_genres", &[]).unwrap();
            let marker = format!("JsHttpRequest={}-xml", n);
            assert_eq!(request.url.matches(&marker).count(), 1, "{}", request.url);
            assert_eq!(request.url.matches("JsHttpRequest=").count(), 1);
        }
        assert_eq!(client.lock_session().as_ref().unwrap().request_id(), 6);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_prepare_ids_are_unique_and_contiguous() {
        let client = std::sync::Arc::new(PortalClient::with_transport(
            ScriptedTransport::new(),
            ClientSettings::default(),
        ));
        *client.lock_session() = Some(Session::new(DeviceProfile::new(
            "http://p.example.com",
            "00:1A:79:00:00:01",
        )));

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let client = client.clone();
                tokio::spawn(async move {
                    (0..25)
                        .map(|_| {
                            let url = client.prepare(Resource::Itv, "get_genres", &[]).unwrap().url;
                            let id = url
                                .split("JsHttpRequest=")
                                .nth(1)
                                .and_then(|rest| rest.strip_suffix("-xml"))
                                .unwrap()
                                .to_string();
                            id.parse::<u64>().unwrap()
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut ids = Vec::new();
        for task in tasks {
            ids.extend(task.await.unwrap());
        }
        ids.sort_unstable();

        assert_eq!(ids, (1..=200).collect::<Vec<u64>>());
        assert_eq!(client.lock_session().as_ref().unwrap().request_id(), 201);
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_applies_deadline() {
        struct Stalled;

        #[async_trait::async_trait]
        impl Transport for Stalled {
            async fn get(&self, _request: PortalRequest) -> Result<String> {
                std::future::pending().await
            }
        }

        let client = PortalClient::with_transport(Stalled, ClientSettings::default());
        let request = PortalRequest {
            url: "http://p.example.com".into(),
            headers: Vec::new(),
        };

        let err = client.send(request).await.unwrap_err();
        assert!(matches!(err, ClientError::Network(_)));
    }
}
