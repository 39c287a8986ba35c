/// Media service - image upload validation, storage and retrieval
use sqlx::PgPool;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::config::MediaConfig;
use crate::db::media_repo;
use crate::error::{AppError, Result};
use crate::models::{ImageKind, MediaItem};

/// Files on local disk under a single root directory.
#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
    max_bytes: usize,
    public_base_url: String,
}

impl MediaStore {
    pub fn new(config: &MediaConfig) -> Self {
        Self {
            root: config.root.clone(),
            max_bytes: config.max_bytes,
            public_base_url: config.public_base_url.clone(),
        }
    }

    pub async fn ensure_root(&self) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.root).await
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    pub fn public_base_url(&self) -> &str {
        &self.public_base_url
    }

    pub fn too_large(&self) -> AppError {
        AppError::PayloadTooLarge(format!(
            "File exceeds the {} limit",
            human_size(self.max_bytes)
        ))
    }

    /// Storage keys are server generated and never contain path separators.
    fn path_for(&self, storage_key: &str) -> Option<PathBuf> {
        let valid = !storage_key.is_empty()
            && storage_key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.')
            && !storage_key.starts_with('.');
        valid.then(|| self.root.join(storage_key))
    }

    async fn write(&self, storage_key: &str, bytes: &[u8]) -> Result<PathBuf> {
        let path = self
            .path_for(storage_key)
            .ok_or_else(|| AppError::Internal(format!("invalid storage key {storage_key}")))?;
        tokio::fs::write(&path, bytes).await?;
        Ok(path)
    }

    async fn read(&self, storage_key: &str) -> Result<Option<Vec<u8>>> {
        let Some(path) = self.path_for(storage_key) else {
            return Ok(None);
        };
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }
}

/// `5 MB`, `512 KB`, `100 bytes`
fn human_size(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = 1024 * 1024;
    if bytes >= MB && bytes % MB == 0 {
        format!("{} MB", bytes / MB)
    } else if bytes >= KB && bytes % KB == 0 {
        format!("{} KB", bytes / KB)
    } else {
        format!("{bytes} bytes")
    }
}

/// Resolve the image format from the declared content type and confirm it
/// against the file's magic bytes.
pub fn detect_image(declared: Option<&mime::Mime>, bytes: &[u8]) -> Result<ImageKind> {
    let unsupported = || {
        AppError::UnsupportedMediaType(
            "Only JPEG, PNG, WebP and GIF images are accepted".to_string(),
        )
    };

    let declared_kind = declared.and_then(ImageKind::from_mime).ok_or_else(unsupported)?;
    match ImageKind::sniff(bytes) {
        Some(actual) if actual == declared_kind => Ok(actual),
        Some(_) => Err(AppError::UnsupportedMediaType(
            "File content does not match its declared type".to_string(),
        )),
        None => Err(unsupported()),
    }
}

pub struct MediaService {
    pool: PgPool,
    store: MediaStore,
}

impl MediaService {
    pub fn new(pool: PgPool, store: MediaStore) -> Self {
        Self { pool, store }
    }

    pub async fn upload(
        &self,
        owner_id: Uuid,
        declared: Option<&mime::Mime>,
        bytes: &[u8],
    ) -> Result<MediaItem> {
        if bytes.is_empty() {
            return Err(AppError::Validation("Uploaded file is empty".to_string()));
        }
        if bytes.len() > self.store.max_bytes() {
            return Err(self.store.too_large());
        }

        let kind = detect_image(declared, bytes)?;
        let media_id = Uuid::new_v4();
        let storage_key = format!("{}.{}", media_id, kind.extension());

        let path = self.store.write(&storage_key, bytes).await?;

        let record = match media_repo::insert(
            &self.pool,
            media_id,
            owner_id,
            &storage_key,
            kind.content_type(),
            bytes.len() as i64,
        )
        .await
        {
            Ok(record) => record,
            Err(err) => {
                remove_orphan(&path).await;
                return Err(err.into());
            }
        };

        tracing::info!(%owner_id, media_id = %record.id, size = bytes.len(), content_type = kind.content_type(), "media uploaded");
        Ok(MediaItem::from_record(&record, self.store.public_base_url()))
    }

    /// Content type and bytes of a media file the viewer may see.
    pub async fn open(&self, viewer: Option<Uuid>, media_id: Uuid) -> Result<(String, Vec<u8>)> {
        let not_found = || AppError::NotFound("Media not found".to_string());

        if !media_repo::is_servable(&self.pool, viewer, media_id).await? {
            return Err(not_found());
        }
        let record = media_repo::find(&self.pool, media_id)
            .await?
            .ok_or_else(not_found)?;

        match self.store.read(&record.storage_key).await? {
            Some(bytes) => Ok((record.content_type, bytes)),
            None => {
                tracing::warn!(%media_id, storage_key = %record.storage_key, "media file missing on disk");
                Err(not_found())
            }
        }
    }
}

async fn remove_orphan(path: &Path) {
    if let Err(err) = tokio::fs::remove_file(path).await {
        tracing::warn!(path = %path.display(), "failed to remove orphaned media file: {}", err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\x00\x00\x00\x0dIHDR";
    const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10];

    fn store(root: PathBuf) -> MediaStore {
        MediaStore::new(&MediaConfig {
            root,
            max_bytes: 5 * 1024 * 1024,
            public_base_url: "/api/v1/media".into(),
        })
    }

    #[test]
    fn declared_and_actual_type_must_agree() {
        assert_eq!(detect_image(Some(&mime::IMAGE_PNG), PNG).unwrap(), ImageKind::Png);
        assert!(matches!(
            detect_image(Some(&mime::IMAGE_PNG), JPEG),
            Err(AppError::UnsupportedMediaType(_))
        ));
        assert!(matches!(
            detect_image(None, PNG),
            Err(AppError::UnsupportedMediaType(_))
        ));
        assert!(matches!(
            detect_image(Some(&mime::TEXT_PLAIN), b"hello"),
            Err(AppError::UnsupportedMediaType(_))
        ));
    }

    #[test]
    fn limit_message_is_readable() {
        assert_eq!(human_size(5 * 1024 * 1024), "5 MB");
        assert_eq!(human_size(512 * 1024), "512 KB");
        assert_eq!(human_size(100), "100 bytes");

        let err = store(PathBuf::from("/tmp")).too_large();
        assert_eq!(err.to_string(), "File exceeds the 5 MB limit");
    }

    #[test]
    fn storage_keys_cannot_escape_root() {
        let store = store(PathBuf::from("/srv/media"));
        assert_eq!(
            store.path_for("abc-123.png"),
            Some(PathBuf::from("/srv/media/abc-123.png"))
        );
        assert_eq!(store.path_for("../etc/passwd"), None);
        assert_eq!(store.path_for(".hidden"), None);
        assert_eq!(store.path_for("a/b.png"), None);
        assert_eq!(store.path_for(""), None);
    }

    #[tokio::test]
    async fn write_then_read() {
        let root = std::env::temp_dir().join(format!("strak-media-{}", Uuid::new_v4()));
        let store = store(root.clone());
        store.ensure_root().await.unwrap();

        store.write("one.png", PNG).await.unwrap();
        assert_eq!(store.read("one.png").await.unwrap().as_deref(), Some(PNG));
        assert_eq!(store.read("missing.png").await.unwrap(), None);

        tokio::fs::remove_dir_all(root).await.unwrap();
    }
}
