//! Local image store for card and equipment photos.
//!
//! Uploaded bytes land under the app data directory with a UUID filename;
//! entities reference them by the `/api/images/{name}` URL. Entity delete
//! paths call back into this service for cascade cleanup.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

/// URL prefix under which stored images are served.
pub const IMAGE_URL_PREFIX: &str = "/api/images/";

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("invalid image filename")]
    InvalidFilename,
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A stored image and the URL entities reference it by.
#[derive(Debug, Clone)]
pub struct StoredImage {
    pub filename: String,
    pub url: String,
}

#[derive(Clone)]
pub struct ImageService {
    dir: PathBuf,
}

impl ImageService {
    pub fn new() -> Self {
        Self::with_dir(utils::assets::image_dir())
    }

    pub fn with_dir(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Persist uploaded bytes, keeping the original extension when present.
    pub async fn save(
        &self,
        data: &[u8],
        original_name: Option<&str>,
    ) -> Result<StoredImage, ImageError> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let extension = original_name
            .and_then(|name| Path::new(name).extension())
            .and_then(|ext| ext.to_str())
            .filter(|ext| ext.chars().all(|c| c.is_ascii_alphanumeric()))
            .unwrap_or("bin");
        let filename = format!("{}.{extension}", Uuid::new_v4());

        tokio::fs::write(self.dir.join(&filename), data).await?;

        let url = format!("{IMAGE_URL_PREFIX}{filename}");
        Ok(StoredImage { filename, url })
    }

    /// Filesystem path for a stored filename. Rejects anything that could
    /// escape the image directory.
    pub fn path_for(&self, filename: &str) -> Result<PathBuf, ImageError> {
        if filename.is_empty()
            || filename.contains(['/', '\\'])
            || filename.starts_with('.')
        {
            return Err(ImageError::InvalidFilename);
        }
        Ok(self.dir.join(filename))
    }

    /// Delete the file backing a stored-image URL. URLs outside our prefix
    /// (external images) are ignored. Returns whether a file was removed.
    pub async fn delete_by_url(&self, url: &str) -> Result<bool, ImageError> {
        let Some(filename) = url.strip_prefix(IMAGE_URL_PREFIX) else {
            return Ok(false);
        };
        let path = self.path_for(filename)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Cascade helper: best-effort removal of every URL an entity owned.
    pub async fn delete_all(&self, urls: &[String]) {
        for url in urls {
            if let Err(error) = self.delete_by_url(url).await {
                warn!(?error, url, "failed to delete stored image");
            }
        }
    }
}

impl Default for ImageService {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn service() -> (ImageService, TempDir) {
        let dir = TempDir::new().unwrap();
        (ImageService::with_dir(dir.path().to_path_buf()), dir)
    }

    #[tokio::test]
    async fn save_and_delete_roundtrip() {
        let (images, _dir) = service();

        let stored = images.save(b"png-bytes", Some("photo.PNG")).await.unwrap();
        assert!(stored.url.starts_with(IMAGE_URL_PREFIX));
        assert!(stored.filename.ends_with(".PNG"));
        assert!(images.path_for(&stored.filename).unwrap().exists());

        assert!(images.delete_by_url(&stored.url).await.unwrap());
        assert!(!images.delete_by_url(&stored.url).await.unwrap());
    }

    #[tokio::test]
    async fn unknown_extensions_fall_back_to_bin() {
        let (images, _dir) = service();
        let stored = images.save(b"data", None).await.unwrap();
        assert!(stored.filename.ends_with(".bin"));

        let stored = images.save(b"data", Some("weird.na me")).await.unwrap();
        assert!(stored.filename.ends_with(".bin"));
    }

    #[tokio::test]
    async fn external_urls_are_ignored() {
        let (images, _dir) = service();
        assert!(
            !images
                .delete_by_url("https://example.com/pic.png")
                .await
                .unwrap()
        );
    }

    #[test]
    fn path_traversal_is_rejected() {
        let (images, _dir) = service();
        assert!(images.path_for("../secrets.txt").is_err());
        assert!(images.path_for(".hidden").is_err());
        assert!(images.path_for("").is_err());
        assert!(images.path_for("ok.png").is_ok());
    }
}
