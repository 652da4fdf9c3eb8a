//! Media store: content-addressed uploads returning durable URLs.

use std::collections::HashMap;

use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

use fieldnote_core::{Error, Result};

use crate::backend::StorageBackend;

/// The two media kinds a note can carry, each with its own key prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Image,
    Audio,
}

impl MediaKind {
    /// Storage prefix for this kind.
    pub fn prefix(&self) -> &'static str {
        match self {
            MediaKind::Image => "images",
            MediaKind::Audio => "audio",
        }
    }

    /// Extension used when magic-byte sniffing fails.
    fn fallback_extension(&self) -> &'static str {
        match self {
            MediaKind::Image => "jpg",
            MediaKind::Audio => "wav",
        }
    }
}

/// Compute BLAKE3 hash of data with "blake3:" prefix.
///
/// Returns a string in the format: `blake3:{64-char-hex}`
pub fn compute_content_hash(data: &[u8]) -> String {
    let hash = blake3::hash(data);
    format!("blake3:{}", hash.to_hex())
}

/// Media store over a pluggable [`StorageBackend`].
///
/// Each upload sniffs the content type, generates a unique UUIDv7 key under
/// the kind's prefix, deduplicates by content hash, and returns a durable
/// download URL joined from the configured public base URL.
pub struct MediaStore {
    backend: Box<dyn StorageBackend>,
    public_base_url: String,
    // Content hash → existing storage key, so re-uploading the same bytes
    // reuses the stored object.
    by_hash: Mutex<HashMap<String, String>>,
}

impl MediaStore {
    /// Create a media store publishing URLs under `public_base_url`.
    pub fn new(backend: impl StorageBackend + 'static, public_base_url: impl Into<String>) -> Self {
        Self {
            backend: Box::new(backend),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
            by_hash: Mutex::new(HashMap::new()),
        }
    }

    /// Upload an image blob, returning its durable download URL.
    pub async fn upload_image(&self, data: &[u8]) -> Result<String> {
        self.upload(MediaKind::Image, data).await
    }

    /// Upload an audio blob, returning its durable download URL.
    pub async fn upload_audio(&self, data: &[u8]) -> Result<String> {
        self.upload(MediaKind::Audio, data).await
    }

    /// Fetch a previously uploaded blob back by its download URL.
    pub async fn download(&self, url: &str) -> Result<Vec<u8>> {
        let key = self.key_for_url(url).ok_or_else(|| {
            Error::NotFound(format!("URL {} is not served by this media store", url))
        })?;
        self.backend.read(&key).await
    }

    /// Generate a unique storage key for a blob of the given kind.
    ///
    /// Key format: `{prefix}/{uuidv7}.{ext}` — time-ordered and collision
    /// free without coordination.
    pub fn generate_key(&self, kind: MediaKind, data: &[u8]) -> String {
        let ext = infer::get(data)
            .map(|t| t.extension())
            .unwrap_or_else(|| kind.fallback_extension());
        format!("{}/{}.{}", kind.prefix(), Uuid::now_v7(), ext)
    }

    async fn upload(&self, kind: MediaKind, data: &[u8]) -> Result<String> {
        if data.is_empty() {
            return Err(Error::Upload("empty blob".into()));
        }

        let content_hash = compute_content_hash(data);

        let mut by_hash = self.by_hash.lock().await;
        if let Some(existing) = by_hash.get(&content_hash) {
            debug!(
                subsystem = "media",
                component = "store",
                op = "upload",
                storage_key = %existing,
                "Reusing existing blob for identical content"
            );
            return Ok(self.url_for_key(existing));
        }

        let key = self.generate_key(kind, data);
        self.backend
            .write(&key, data)
            .await
            .map_err(|e| Error::Upload(format!("failed to store {}: {}", key, e)))?;
        by_hash.insert(content_hash, key.clone());
        drop(by_hash);

        info!(
            subsystem = "media",
            component = "store",
            op = "upload",
            storage_key = %key,
            size_bytes = data.len(),
            "Uploaded media blob"
        );
        Ok(self.url_for_key(&key))
    }

    fn url_for_key(&self, key: &str) -> String {
        format!("{}/{}", self.public_base_url, key)
    }

    fn key_for_url(&self, url: &str) -> Option<String> {
        url.strip_prefix(&self.public_base_url)
            .map(|rest| rest.trim_start_matches('/').to_string())
            .filter(|key| !key.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::FilesystemBackend;

    fn store(dir: &std::path::Path) -> MediaStore {
        MediaStore::new(FilesystemBackend::new(dir), "https://media.test")
    }

    #[test]
    fn test_compute_content_hash() {
        let hash = compute_content_hash(b"test");
        assert!(hash.starts_with("blake3:"));
        assert_eq!(hash.len(), 7 + 64); // "blake3:" + 64 hex chars
    }

    #[tokio::test]
    async fn test_upload_returns_nonempty_url_and_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());

        let url = store.upload_audio(b"RIFFdata").await.unwrap();
        assert!(!url.is_empty());
        assert!(url.starts_with("https://media.test/audio/"));

        let data = store.download(&url).await.unwrap();
        assert_eq!(data, b"RIFFdata");
    }

    #[tokio::test]
    async fn test_image_and_audio_use_distinct_prefixes() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());

        let image_url = store.upload_image(b"img-bytes").await.unwrap();
        let audio_url = store.upload_audio(b"aud-bytes").await.unwrap();
        assert!(image_url.contains("/images/"));
        assert!(audio_url.contains("/audio/"));
    }

    #[tokio::test]
    async fn test_identical_content_is_deduplicated() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());

        let first = store.upload_image(b"same").await.unwrap();
        let second = store.upload_image(b"same").await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_empty_blob_is_upload_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());

        let err = store.upload_image(b"").await.unwrap_err();
        assert!(matches!(err, fieldnote_core::Error::Upload(_)));
    }

    #[tokio::test]
    async fn test_sniffed_extension_for_real_magic_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());

        // Minimal PNG magic prefix.
        let png: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0];
        let url = store.upload_image(png).await.unwrap();
        assert!(url.ends_with(".png"), "got {}", url);
    }

    #[tokio::test]
    async fn test_foreign_url_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        let err = store
            .download("https://elsewhere.test/images/x.jpg")
            .await
            .unwrap_err();
        assert!(matches!(err, fieldnote_core::Error::NotFound(_)));
    }
}
