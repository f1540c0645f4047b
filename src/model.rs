// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

//! Records returned by the portal and the normalization applied to them.
//!
//! Portals disagree on JSON types for the same field (`"1"` vs `1`, `true`
//! vs `1`), so every field goes through a lenient deserializer that never
//! fails on an unexpected kind. Flags stay tri-state: `None` when the portal
//! omitted them.
//!
//! Fields renamed for output read only the portal's key; a same-named key
//! sent alongside it is ignored.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::warn;

/// Live-TV genre or VOD category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genre {
    #[serde(default, deserialize_with = "deserialize_text")]
    pub id: String,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub title: String,
}

impl std::fmt::Display for Genre {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.title)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    #[serde(default, deserialize_with = "deserialize_text")]
    pub id: String,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub name: String,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub number: String,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub cmd: String,
    #[serde(default, deserialize_with = "deserialize_media_url")]
    pub logo: Option<String>,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub hd: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub lock: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub fav: Option<i64>,
    #[serde(default, rename(deserialize = "tv_genre_title"), deserialize_with = "deserialize_text")]
    pub genre_title: String,
    #[serde(default, deserialize_with = "deserialize_optional_bool")]
    pub has_archive: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VodItem {
    #[serde(default, deserialize_with = "deserialize_text")]
    pub id: String,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub name: String,
    #[serde(default, rename(deserialize = "o_name"), deserialize_with = "deserialize_text")]
    pub original_name: String,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub description: String,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub cmd: String,
    #[serde(default, rename(deserialize = "screenshot_uri"), deserialize_with = "deserialize_media_url")]
    pub screenshot: Option<String>,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub year: String,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub director: String,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub actors: String,
    #[serde(default, rename(deserialize = "rating_imdb"), deserialize_with = "deserialize_text")]
    pub rating: String,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub duration: String,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub hd: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub fav: Option<i64>,
    #[serde(default, rename(deserialize = "category_title"), deserialize_with = "deserialize_text")]
    pub category: String,
}

/// Keeps a media URL only if it is an absolute http(s) URI.
///
/// Relative paths, other schemes and unparseable strings become `None`.
pub fn sanitize_media_url(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    match url::Url::parse(trimmed) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => {
            Some(trimmed.to_string())
        }
        _ => None,
    }
}

/// Item objects of a listing payload, in document order.
///
/// `js.data` is either an array or an object keyed by arbitrary strings; both
/// shapes yield the same flat sequence. Non-object entries are skipped and a
/// missing `data` yields nothing.
pub fn data_items(js: &Value) -> Vec<&Value> {
    let items: Vec<&Value> = match js.get("data") {
        Some(Value::Array(arr)) => arr.iter().collect(),
        Some(Value::Object(map)) => map.values().collect(),
        _ => Vec::new(),
    };

    items.into_iter().filter(|v| v.is_object()).collect()
}

/// Converts raw item objects into records, dropping any the portal mangled
/// beyond recognition.
pub fn parse_items<T>(items: &[&Value]) -> Vec<T>
where
    T: for<'de> Deserialize<'de>,
{
    items
        .iter()
        .filter_map(|item| match T::deserialize(*item) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("Skipping malformed item: {}", e);
                None
            }
        })
        .collect()
}

/// Textual form of a scalar JSON value; `None` for null.
pub(crate) fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn deserialize_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Value = Deserialize::deserialize(deserializer)?;

    Ok(match value {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    })
}

fn deserialize_media_url<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Value = Deserialize::deserialize(deserializer)?;

    Ok(match value {
        Value::String(s) => sanitize_media_url(&s),
        _ => None,
    })
}

fn deserialize_flag<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Value = Deserialize::deserialize(deserializer)?;

    Ok(match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        Value::Bool(b) => Some(i64::from(b)),
        _ => None,
    })
}

fn deserialize_optional_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Value = Deserialize::deserialize(deserializer)?;

    Ok(match value {
        Value::Bool(b) => Some(b),
        Value::Number(n) => n.as_i64().map(|i| i != 0),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "1" | "true" => Some(true),
            "0" | "false" => Some(false),
            _ => None,
        },
        _ => None,
    })
}
