//! Shared types for backend communication

use serde::{Deserialize, Deserializer, Serialize};

/// Shown when neither the image nor its thumbnail can be loaded
pub const PLACEHOLDER_IMAGE: &str = "https://picsum.photos/800/600?blur=2";

/// Image metadata attached to a search hit
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImageMeta {
    pub context_link: Option<String>,
    pub height: Option<u32>,
    pub width: Option<u32>,
    pub byte_size: Option<u64>,
    pub thumbnail_link: Option<String>,
    pub thumbnail_height: Option<u32>,
    pub thumbnail_width: Option<u32>,
}

/// Search result from backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    /// Position assigned by the backend (1-based), not an identity
    #[serde(default)]
    pub id: Option<u64>,
    pub link: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub title: String,
    #[serde(default)]
    pub image: Option<ImageMeta>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub display_link: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub mime: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub file_format: String,
}

/// The backend forwards absent upstream fields as `null`
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl SearchResult {
    /// Page the image was found on, falling back to the image itself
    pub fn page_link(&self) -> &str {
        self.image
            .as_ref()
            .and_then(|meta| meta.context_link.as_deref())
            .filter(|link| !link.is_empty())
            .unwrap_or(&self.link)
    }

    pub fn dimensions(&self) -> Option<(u32, u32)> {
        let meta = self.image.as_ref()?;
        match (meta.width, meta.height) {
            (Some(w), Some(h)) if w > 0 && h > 0 => Some((w, h)),
            _ => None,
        }
    }

    /// Ordered sources to try when rendering a preview.
    ///
    /// Full image first, then the thumbnail, always ending in the placeholder.
    pub fn preview_sources(&self) -> Vec<String> {
        let mut sources = Vec::with_capacity(3);
        if !self.link.is_empty() {
            sources.push(self.link.clone());
        }
        if let Some(thumb) = self
            .image
            .as_ref()
            .and_then(|meta| meta.thumbnail_link.as_ref())
            .filter(|thumb| !thumb.is_empty() && **thumb != self.link)
        {
            sources.push(thumb.clone());
        }
        sources.push(PLACEHOLDER_IMAGE.to_string());
        sources
    }
}

/// Body of `POST /download`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadRequest {
    pub id: u64,
    pub image_url: String,
    pub query: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DownloadResponse {
    pub status: String,
    #[serde(default)]
    pub path: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(link: &str, thumb: Option<&str>) -> SearchResult {
        SearchResult {
            id: Some(1),
            link: link.to_string(),
            title: "A cat".to_string(),
            image: thumb.map(|t| ImageMeta {
                thumbnail_link: Some(t.to_string()),
                ..Default::default()
            }),
            display_link: "example.com".to_string(),
            mime: "image/jpeg".to_string(),
            file_format: "image/jpeg".to_string(),
        }
    }

    #[test]
    fn test_preview_sources_fall_back_to_placeholder() {
        let r = result("https://a/cat.jpg", Some("https://t/cat.jpg"));
        assert_eq!(
            r.preview_sources(),
            vec!["https://a/cat.jpg", "https://t/cat.jpg", PLACEHOLDER_IMAGE]
        );

        let same = result("https://a/cat.jpg", Some("https://a/cat.jpg"));
        assert_eq!(same.preview_sources(), vec!["https://a/cat.jpg", PLACEHOLDER_IMAGE]);

        let bare = result("https://a/cat.jpg", None);
        assert_eq!(bare.preview_sources().last().map(String::as_str), Some(PLACEHOLDER_IMAGE));
    }

    #[test]
    fn test_decode_backend_item() {
        let json = serde_json::json!({
            "id": 3,
            "link": "https://a/cat.jpg",
            "title": "Cat",
            "image": {
                "contextLink": "https://a/page",
                "width": 640,
                "height": 480,
                "byteSize": 1234,
                "thumbnailLink": "https://t/cat.jpg"
            },
            "displayLink": "a",
            "mime": "image/jpeg",
            "fileFormat": "image/jpeg"
        });
        let r: SearchResult = serde_json::from_value(json).unwrap();
        assert_eq!(r.page_link(), "https://a/page");
        assert_eq!(r.dimensions(), Some((640, 480)));
        assert_eq!(r.display_link, "a");
    }

    #[test]
    fn test_decode_null_fields_as_empty() {
        let json = serde_json::json!({
            "id": 1,
            "link": "https://a/cat.jpg",
            "title": null,
            "image": null,
            "displayLink": null,
            "mime": null,
            "fileFormat": null
        });
        let r: SearchResult = serde_json::from_value(json).unwrap();
        assert_eq!(r.link, "https://a/cat.jpg");
        assert_eq!(r.title, "");
        assert_eq!(r.display_link, "");
        assert_eq!(r.mime, "");
        assert!(r.image.is_none());
    }

    #[test]
    fn test_page_link_without_metadata() {
        let r = result("https://a/cat.jpg", None);
        assert_eq!(r.page_link(), "https://a/cat.jpg");
        assert_eq!(r.dimensions(), None);
    }
}
