// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors surfaced by the portal client.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClientError {
    /// Connection failure, timeout or non-success HTTP status
    #[error("Network error: {0}")]
    Network(String),

    /// Response body was not the expected JSON envelope
    #[error("Invalid response format: {0}")]
    Protocol(String),

    /// Handshake answered with a list instead of an object
    #[error("Portal rejected the handshake")]
    PortalRejected,

    /// Explicit `js.error` in the handshake response
    #[error("Portal error: {0}")]
    Portal(String),

    #[error("No token received from portal")]
    NoToken,

    /// `get_profile` reported a device conflict or mismatch
    #[error("Device registration issue: {0}")]
    DeviceConflict(String),

    #[error("Invalid profile response - no user ID returned")]
    InvalidProfileResponse,

    /// An operation that needs a profile was attempted before `authenticate`
    #[error("No active profile; authenticate first")]
    NoActiveProfile,

    #[error("Could not resolve stream link: {0}")]
    Resolve(String),

    /// Device profile failed validation
    #[error("Invalid device profile: {0}")]
    Config(String),
}

impl ClientError {
    /// True for failures produced by the authentication handshake itself.
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            Self::PortalRejected
                | Self::Portal(_)
                | Self::NoToken
                | Self::DeviceConflict(_)
                | Self::InvalidProfileResponse
        )
    }

    /// Text suitable for showing to an end user.
    pub fn user_message(&self) -> String {
        match self {
            Self::PortalRejected => "Portal authentication failed. This could be due to:\n\
                 - MAC address already in use\n\
                 - Portal blocking automated access\n\
                 - Invalid MAC address format\n\
                 - Server rate limiting\n\n\
                 Try waiting 30 seconds and authenticate again."
                .to_string(),
            Self::NoToken => "No token received from portal. Response may be invalid.".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        Self::Network(e.to_string())
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(e: serde_json::Error) -> Self {
        Self::Protocol(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_failure_classification() {
        assert!(ClientError::PortalRejected.is_auth_failure());
        assert!(ClientError::DeviceConflict("x".into()).is_auth_failure());
        assert!(!ClientError::Network("down".into()).is_auth_failure());
        assert!(!ClientError::NoActiveProfile.is_auth_failure());
    }

    #[test]
    fn test_rejected_message_mentions_mac_conflict() {
        let msg = ClientError::PortalRejected.user_message();
        assert!(msg.contains("MAC address already in use"));
        assert!(msg.contains("rate limiting"));
    }

    #[test]
    fn test_json_error_maps_to_protocol() {
        let err: ClientError = serde_json::from_str::<serde_json::Value>("{oops")
            .unwrap_err()
            .into();
        assert!(matches!(err, ClientError::Protocol(_)));
    }
}
