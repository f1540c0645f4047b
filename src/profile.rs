// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{ClientError, Result};

pub const DEFAULT_STB_TYPE: &str = "MAG254";
pub const DEFAULT_TIMEZONE: &str = "UTC";

/// MAC prefix registered to Infomir, the vendor of MAG set-top boxes.
const MAG_MAC_PREFIX: &str = "00:1A:79";

/// Identity a portal session is created from. Owned by the profile store,
/// borrowed by the client for the lifetime of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceProfile {
    #[serde(default)]
    pub name: Option<String>,
    pub portal_url: String,
    pub mac_address: String,
    #[serde(default)]
    pub serial_number: Option<String>,
    #[serde(default)]
    pub device_id: Option<String>,
    #[serde(default)]
    pub device_id2: Option<String>,
    #[serde(default)]
    pub signature: Option<String>,
    #[serde(default = "default_stb_type")]
    pub stb_type: String,
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

fn default_stb_type() -> String {
    DEFAULT_STB_TYPE.to_string()
}

fn default_timezone() -> String {
    DEFAULT_TIMEZONE.to_string()
}

impl DeviceProfile {
    pub fn new(portal_url: impl Into<String>, mac_address: impl Into<String>) -> Self {
        Self {
            name: None,
            portal_url: portal_url.into(),
            mac_address: mac_address.into(),
            serial_number: None,
            device_id: None,
            device_id2: None,
            signature: None,
            stb_type: default_stb_type(),
            timezone: default_timezone(),
        }
    }

    /// Random MAC in the MAG range, e.g. `00:1A:79:3F:08:C2`.
    pub fn generate_mac() -> String {
        let mut rng = rand::rng();
        format!(
            "{}:{:02X}:{:02X}:{:02X}",
            MAG_MAC_PREFIX,
            rng.random::<u8>(),
            rng.random::<u8>(),
            rng.random::<u8>()
        )
    }

    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("{}@{}", self.mac_address, self.portal_url))
    }

    pub fn validate(&self) -> Result<()> {
        if !is_valid_mac(&self.mac_address) {
            return Err(ClientError::Config(format!(
                "MAC address '{}' must look like XX:XX:XX:XX:XX:XX",
                self.mac_address
            )));
        }

        match url::Url::parse(self.portal_url.trim()) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(()),
            _ => Err(ClientError::Config(format!(
                "portal URL '{}' must be an absolute http(s) URL",
                self.portal_url
            ))),
        }
    }

    /// Optional `get_profile` parameters, in protocol order, skipping empty ones.
    pub(crate) fn device_params(&self) -> Vec<(&'static str, String)> {
        [
            ("sn", &self.serial_number),
            ("device_id", &self.device_id),
            ("device_id2", &self.device_id2),
            ("signature", &self.signature),
        ]
        .into_iter()
        .filter_map(|(key, value)| match value.as_deref().map(str::trim) {
            Some(v) if !v.is_empty() => Some((key, v.to_string())),
            _ => None,
        })
        .collect()
    }
}

fn is_valid_mac(mac: &str) -> bool {
    let octets: Vec<&str> = mac.split(':').collect();
    octets.len() == 6
        && octets
            .iter()
            .all(|o| o.len() == 2 && o.chars().all(|c| c.is_ascii_hexdigit()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_mac_is_valid() {
        for _ in 0..20 {
            let mac = DeviceProfile::generate_mac();
            assert!(mac.starts_with("00:1A:79:"));
            assert!(is_valid_mac(&mac), "{mac}");
        }
    }

    #[test]
    fn test_validate() {
        let profile = DeviceProfile::new("http://portal.example.com/c/", "00:1A:79:00:00:01");
        assert!(profile.validate().is_ok());

        let bad_mac = DeviceProfile::new("http://portal.example.com", "00-1A-79-00-00-01");
        assert!(matches!(bad_mac.validate(), Err(ClientError::Config(_))));

        let bad_url = DeviceProfile::new("portal.example.com", "00:1A:79:00:00:01");
        assert!(matches!(bad_url.validate(), Err(ClientError::Config(_))));
    }

    #[test]
    fn test_device_params_skip_empty() {
        let mut profile = DeviceProfile::new("http://p", "00:1A:79:00:00:01");
        profile.serial_number = Some("SN1".into());
        profile.device_id = Some("  ".into());
        profile.signature = Some("sig".into());

        assert_eq!(
            profile.device_params(),
            vec![("sn", "SN1".to_string()), ("signature", "sig".to_string())]
        );
    }

    #[test]
    fn test_deserialize_defaults() {
        let profile: DeviceProfile = toml::from_str(
            r#"
            portal_url = "http://portal.example.com"
            mac_address = "00:1A:79:AA:BB:CC"
            "#,
        )
        .unwrap();
        assert_eq!(profile.stb_type, "MAG254");
        assert_eq!(profile.timezone, "UTC");
        assert_eq!(profile.serial_number, None);
    }
}
