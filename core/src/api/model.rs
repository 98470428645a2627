//! Wire representation of Bynder media assets.
//!
//! Records are transient: fetched fresh each sync pass, read, discarded.
//! Bynder encodes its status flags as 0/1 integers, hence the lenient
//! boolean deserialisation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

/// One media asset as returned by the Bynder API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub copyright: String,
    pub date_modified: DateTime<Utc>,
    #[serde(default, deserialize_with = "bool_from_int")]
    pub archive: bool,
    #[serde(default, deserialize_with = "bool_from_int")]
    pub limited: bool,
    #[serde(default, deserialize_with = "bool_from_int")]
    pub is_public: bool,
    #[serde(default)]
    pub file_size: Option<i64>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    /// Named derivative URLs (thumbnails, previews, custom derivatives)
    #[serde(default)]
    pub thumbnails: HashMap<String, String>,
    /// URL of the original upload; absent for assets marked private
    #[serde(default)]
    pub original: Option<String>,
    #[serde(default, rename = "videoPreviewURLs")]
    pub video_preview_urls: Vec<String>,
    #[serde(default)]
    pub active_original_focus_point: Option<FocusPoint>,
}

/// Focus point against the original upload, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FocusPoint {
    pub x: f64,
    pub y: f64,
}

impl Asset {
    /// `videoPreviewURLs` keyed by derivative name: the second-to-last
    /// path segment of each URL, which is how Bynder encodes the name.
    #[must_use]
    pub fn video_derivatives(&self) -> HashMap<String, String> {
        self.video_preview_urls
            .iter()
            .filter_map(|url| {
                let path = url.split(['?', '#']).next().unwrap_or(url);
                let mut segments = path.rsplit('/');
                segments.next()?; // filename
                let name = segments.next()?;
                Some((name.to_owned(), url.clone()))
            })
            .collect()
    }
}

fn bool_from_int<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Bool(b) => b,
        serde_json::Value::Number(n) => n.as_i64().unwrap_or(0) != 0,
        _ => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn deserializes_a_listing_record() {
        let asset: Asset = serde_json::from_value(json!({
            "id": "1A7BA172-97B9-44A4-8C0AA41D9E8AE6A2",
            "name": "Test asset",
            "description": "A test",
            "copyright": "© Example",
            "dateModified": "2023-10-10T09:52:05Z",
            "archive": 0,
            "limited": 0,
            "isPublic": 1,
            "fileSize": 18_096_064,
            "width": 3000,
            "height": 2008,
            "orientation": "landscape",
            "thumbnails": {
                "mini": "https://org.bynder.com/m/abc/mini-test-asset.png",
                "thul": "https://org.bynder.com/m/abc/thul-test-asset.png",
                "webimage": "https://org.bynder.com/m/abc/webimage-test-asset.png"
            },
            "original": "https://org.bynder.com/m/abc/original/test-asset.tif",
            "activeOriginalFocusPoint": {"x": 541, "y": 550}
        }))
        .unwrap();

        assert_eq!(asset.id, "1A7BA172-97B9-44A4-8C0AA41D9E8AE6A2");
        assert!(!asset.archive);
        assert!(asset.is_public);
        assert_eq!(asset.file_size, Some(18_096_064));
        assert_eq!((asset.width, asset.height), (Some(3000), Some(2008)));
        assert_eq!(asset.thumbnails.len(), 3);
        let point = asset.active_original_focus_point.unwrap();
        assert_eq!((point.x, point.y), (541.0, 550.0));
    }

    #[test]
    fn tolerates_missing_optional_fields() {
        let asset: Asset = serde_json::from_value(json!({
            "id": "abc",
            "dateModified": "2024-01-01T00:00:00Z"
        }))
        .unwrap();
        assert_eq!(asset.name, "");
        assert_eq!(asset.file_size, None);
        assert!(asset.thumbnails.is_empty());
        assert!(asset.active_original_focus_point.is_none());
    }

    #[test]
    fn video_derivatives_are_keyed_by_path_segment() {
        let asset: Asset = serde_json::from_value(json!({
            "id": "abc",
            "dateModified": "2024-01-01T00:00:00Z",
            "videoPreviewURLs": [
                "https://org.bynder.com/asset/abc/WebPrimary/WebPrimary-clip.webm",
                "https://org.bynder.com/asset/abc/WebFallback/WebFallback-clip.mp4"
            ]
        }))
        .unwrap();

        let derivatives = asset.video_derivatives();
        assert_eq!(
            derivatives.get("WebPrimary").map(String::as_str),
            Some("https://org.bynder.com/asset/abc/WebPrimary/WebPrimary-clip.webm")
        );
        assert_eq!(derivatives.len(), 2);
    }
}
