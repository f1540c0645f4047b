// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

use crate::config::ClientSettings;
use crate::error::Result;

/// A fully built GET request against the portal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortalRequest {
    pub url: String,
    pub headers: Vec<(&'static str, String)>,
}

impl PortalRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Executes portal requests and returns the raw response body.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, request: PortalRequest) -> Result<String>;
}

#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(settings: &ClientSettings) -> Result<Self> {
        let mut builder = Client::builder().timeout(settings.request_timeout());

        if settings.accept_invalid_certs {
            warn!("TLS certificate verification is disabled for portal requests");
            builder = builder.danger_accept_invalid_certs(true);
        }

        Ok(Self {
            client: builder.build()?,
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, request: PortalRequest) -> Result<String> {
        debug!("GET {}", request.url);

        let mut builder = self.client.get(&request.url);
        for (name, value) in &request.headers {
            builder = builder.header(*name, value);
        }

        let response = builder.send().await?.error_for_status()?;
        let body = response.text().await?;

        debug!("Response size: {} bytes", body.len());
        Ok(body)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::error::ClientError;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays canned bodies in order and records every request.
    #[derive(Debug, Default)]
    pub(crate) struct ScriptedTransport {
        responses: Mutex<VecDeque<Result<String>>>,
        requests: Mutex<Vec<PortalRequest>>,
    }

    impl ScriptedTransport {
        pub(crate) fn new() -> Self {
            Self::default()
        }

        pub(crate) fn push(&self, body: impl Into<String>) -> &Self {
            self.responses.lock().unwrap().push_back(Ok(body.into()));
            self
        }

        pub(crate) fn push_err(&self, err: ClientError) -> &Self {
            self.responses.lock().unwrap().push_back(Err(err));
            self
        }

        pub(crate) fn requests(&self) -> Vec<PortalRequest> {
            self.requests.lock().unwrap().clone()
        }

        pub(crate) fn urls(&self) -> Vec<String> {
            self.requests().into_iter().map(|r| r.url).collect()
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn get(&self, request: PortalRequest) -> Result<String> {
            self.requests.lock().unwrap().push(request);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(ClientError::Network("no scripted response".into())))
        }
    }
}
