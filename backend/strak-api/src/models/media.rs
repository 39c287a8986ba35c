use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct MediaRecord {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub post_id: Option<Uuid>,
    pub position: i32,
    pub storage_key: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub created_at: DateTime<Utc>,
}

/// Media as rendered to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaItem {
    pub id: Uuid,
    pub url: String,
    pub content_type: String,
    pub size_bytes: i64,
}

impl MediaItem {
    pub fn from_record(record: &MediaRecord, public_base_url: &str) -> Self {
        Self {
            id: record.id,
            url: format!("{}/{}", public_base_url, record.id),
            content_type: record.content_type.clone(),
            size_bytes: record.size_bytes,
        }
    }
}

/// Accepted upload formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Jpeg,
    Png,
    Webp,
    Gif,
}

impl ImageKind {
    pub fn from_mime(mime: &mime::Mime) -> Option<Self> {
        if mime.type_() != mime::IMAGE {
            return None;
        }
        match mime.subtype().as_str() {
            "jpeg" | "jpg" | "pjpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "webp" => Some(Self::Webp),
            "gif" => Some(Self::Gif),
            _ => None,
        }
    }

    /// Detect the format from the leading magic bytes.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(Self::Jpeg)
        } else if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
            Some(Self::Png)
        } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
            Some(Self::Gif)
        } else if bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
            Some(Self::Webp)
        } else {
            None
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Webp => "image/webp",
            Self::Gif => "image/gif",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::Webp => "webp",
            Self::Gif => "gif",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mime_mapping() {
        assert_eq!(ImageKind::from_mime(&mime::IMAGE_JPEG), Some(ImageKind::Jpeg));
        assert_eq!(ImageKind::from_mime(&mime::IMAGE_PNG), Some(ImageKind::Png));
        assert_eq!(
            ImageKind::from_mime(&"image/webp".parse().unwrap()),
            Some(ImageKind::Webp)
        );
        assert_eq!(ImageKind::from_mime(&mime::IMAGE_SVG), None);
        assert_eq!(ImageKind::from_mime(&mime::APPLICATION_PDF), None);
    }

    #[test]
    fn magic_bytes() {
        assert_eq!(ImageKind::sniff(&[0xFF, 0xD8, 0xFF, 0xE0, 0]), Some(ImageKind::Jpeg));
        assert_eq!(ImageKind::sniff(b"\x89PNG\r\n\x1a\n...."), Some(ImageKind::Png));
        assert_eq!(ImageKind::sniff(b"GIF89a......"), Some(ImageKind::Gif));
        assert_eq!(ImageKind::sniff(b"RIFF\x00\x00\x00\x00WEBPVP8 "), Some(ImageKind::Webp));
        assert_eq!(ImageKind::sniff(b"RIFF\x00\x00\x00\x00WAVE"), None);
        assert_eq!(ImageKind::sniff(b"<svg xmlns="), None);
        assert_eq!(ImageKind::sniff(&[]), None);
    }

    #[test]
    fn url_uses_base() {
        let record = MediaRecord {
            id: Uuid::nil(),
            owner_id: Uuid::nil(),
            post_id: None,
            position: 0,
            storage_key: "k.png".into(),
            content_type: "image/png".into(),
            size_bytes: 10,
            created_at: Utc::now(),
        };
        let item = MediaItem::from_record(&record, "/api/v1/media");
        assert_eq!(item.url, format!("/api/v1/media/{}", Uuid::nil()));
    }
}
