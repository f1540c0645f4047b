// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

/// Path segment every portal API lives under.
pub const PORTAL_SEGMENT: &str = "stalker_portal";
pub const LOAD_PATH: &str = "server/load.php";

/// The `type` query parameter of a portal request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Stb,
    Itv,
    Vod,
    Watchdog,
}

impl Resource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stb => "stb",
            Self::Itv => "itv",
            Self::Vod => "vod",
            Self::Watchdog => "watchdog",
        }
    }
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Portal root for a configured URL: trailing slashes removed and the
/// portal segment appended unless already present.
pub fn portal_base(portal_url: &str) -> String {
    let base = portal_url.trim().trim_end_matches('/');
    if base
        .to_ascii_lowercase()
        .ends_with(&PORTAL_SEGMENT.to_ascii_lowercase())
    {
        base.to_string()
    } else {
        format!("{}/{}", base, PORTAL_SEGMENT)
    }
}

/// Full `load.php` URL for one request. `request_id` is the session counter
/// value this request consumes.
pub fn build_url(
    portal_url: &str,
    resource: Resource,
    action: &str,
    params: &[(&str, String)],
    request_id: u64,
) -> String {
    let mut url = format!(
        "{}/{}?type={}&action={}&JsHttpRequest={}-xml",
        portal_base(portal_url),
        LOAD_PATH,
        resource,
        action,
        request_id
    );

    for (key, value) in params {
        url.push_str(&format!("&{}={}", key, urlencoding::encode(value)));
    }

    url
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_portal_base() {
        assert_eq!(
            portal_base("http://p.example.com/"),
            "http://p.example.com/stalker_portal"
        );
        assert_eq!(
            portal_base("http://p.example.com/Stalker_Portal//"),
            "http://p.example.com/Stalker_Portal"
        );
        assert_eq!(
            portal_base("http://p.example.com:8080/stalker_portal"),
            "http://p.example.com:8080/stalker_portal"
        );
    }

    #[test]
    fn test_build_url_fixed_params() {
        let url = build_url("http://p.example.com", Resource::Stb, "handshake", &[], 1);
        assert_eq!(
            url,
            "http://p.example.com/stalker_portal/server/load.php?type=stb&action=handshake&JsHttpRequest=1-xml"
        );
    }

    #[test]
    fn test_build_url_encodes_params_in_order() {
        let params = vec![
            ("cmd", "ffmpeg http://x/y.ts?a=1&b=2".to_string()),
            ("series", String::new()),
            ("forced_storage", "undefined".to_string()),
        ];
        let url = build_url("http://p.example.com", Resource::Itv, "create_link", &params, 7);
        assert!(url.ends_with(
            "&JsHttpRequest=7-xml&cmd=ffmpeg%20http%3A%2F%2Fx%2Fy.ts%3Fa%3D1%26b%3D2&series=&forced_storage=undefined"
        ));
        assert_eq!(url.matches("JsHttpRequest=").count(), 1);
    }
}
