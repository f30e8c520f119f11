//! Response envelopes returned by the admin API.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::Setting;

/// Body of `GET /admin/cnc/settings/spindle/{id}`.
///
/// The API has been seen to return `settings: null` or an object here, so any
/// non-array value decodes as an empty list rather than an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpindleSettingsResponse {
    #[serde(default, deserialize_with = "array_or_empty")]
    pub settings: Vec<Setting>,
}

impl SpindleSettingsResponse {
    /// Decode a body of any shape. Rows come only from an object whose
    /// `settings` is an array; a bare array or any other value is empty.
    pub fn from_body(mut body: Value) -> Result<Self, serde_json::Error> {
        let settings = match body.get_mut("settings").map(Value::take) {
            Some(rows @ Value::Array(_)) => serde_json::from_value(rows)?,
            _ => Vec::new(),
        };
        Ok(Self { settings })
    }
}

fn array_or_empty<'de, D>(deserializer: D) -> Result<Vec<Setting>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    if value.is_array() {
        serde_json::from_value(value).map_err(serde::de::Error::custom)
    } else {
        Ok(Vec::new())
    }
}

/// JSON error/ack body. Different endpoints use `message` or `error`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ApiMessage {
    pub fn text(&self) -> Option<&str> {
        self.message
            .as_deref()
            .or(self.error.as_deref())
            .filter(|s| !s.trim().is_empty())
    }
}

/// Body of `GET /videos/faq`: the video embedded on the FAQ page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaqVideo {
    #[serde(rename = "type")]
    pub kind: String,
    pub url: String,
    #[serde(default)]
    pub updated_at: String,
}

impl FaqVideo {
    /// Embeddable player URL for YouTube watch or short links; any other URL
    /// is returned unchanged.
    pub fn embed_url(&self) -> String {
        let id = ["youtube.com/watch?v=", "youtu.be/"]
            .iter()
            .find_map(|marker| self.url.split_once(marker).map(|(_, rest)| rest))
            .map(|rest| rest.split(['&', '\n', '?', '#']).next().unwrap_or_default())
            .filter(|id| !id.is_empty());
        match id {
            Some(id) => format!("https://www.youtube.com/embed/{}", id),
            None => self.url.clone(),
        }
    }
}
