//! Rendered image storage under the media directory.
//!
//! Files are served back by the `/uploads` static route, so a stored file at
//! `<media_dir>/creations/<uuid>.png` is reachable at
//! `<base_url>/uploads/creations/<uuid>.png`. Fallback cards are the same
//! image for every (failure kind, preset) pair, so they are written under a
//! fixed name and overwritten instead of piling up.

use std::path::{Path, PathBuf};

use adburst_core::AspectRatio;
use tracing::instrument;
use uuid::Uuid;

use crate::render::FailureKind;

/// Subdirectory an image is filed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaFolder {
    /// Persisted creations.
    Creations,
    /// Error cards; never referenced from the database.
    Fallbacks,
}

impl MediaFolder {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Creations => "creations",
            Self::Fallbacks => "fallbacks",
        }
    }
}

/// A file written by [`MediaStore::save_png`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    pub path: PathBuf,
    pub url: String,
}

/// Writes images below a root directory and builds their public URLs.
#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
    base_url: String,
}

impl MediaStore {
    /// `base_url` must not end in `/`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, base_url: &str) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Directory served at `/uploads`.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write PNG bytes to a fresh file in `folder`.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the directory or file cannot be written.
    #[instrument(skip(self, png), fields(bytes = png.len()))]
    pub async fn save_png(&self, folder: MediaFolder, png: &[u8]) -> std::io::Result<StoredImage> {
        let file_name = format!("{}.png", Uuid::new_v4());
        self.write(folder, &file_name, png).await
    }

    /// Write the error card for `kind` at `aspect_ratio`, replacing any
    /// previous copy.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the directory or file cannot be written.
    #[instrument(skip(self, png), fields(kind = kind.as_str(), %aspect_ratio))]
    pub async fn save_fallback(
        &self,
        kind: FailureKind,
        aspect_ratio: AspectRatio,
        png: &[u8],
    ) -> std::io::Result<StoredImage> {
        self.write(MediaFolder::Fallbacks, &fallback_file_name(kind, aspect_ratio), png)
            .await
    }

    /// Write through a temp name and rename, so readers never see a
    /// half-written file when an existing one is replaced.
    async fn write(&self, folder: MediaFolder, file_name: &str, png: &[u8]) -> std::io::Result<StoredImage> {
        let dir = self.root.join(folder.as_str());
        tokio::fs::create_dir_all(&dir).await?;

        let path = dir.join(file_name);
        let staging = dir.join(format!(".{file_name}.{}", Uuid::new_v4()));
        tokio::fs::write(&staging, png).await?;
        if let Err(e) = tokio::fs::rename(&staging, &path).await {
            let _ = tokio::fs::remove_file(&staging).await;
            return Err(e);
        }

        let url = format!("{}/uploads/{}/{file_name}", self.base_url, folder.as_str());
        tracing::debug!(path = %path.display(), "Stored image");
        Ok(StoredImage { path, url })
    }

    /// Remove a stored image, logging rather than failing.
    pub async fn discard(&self, image: &StoredImage) {
        if let Err(e) = tokio::fs::remove_file(&image.path).await {
            tracing::warn!(error = %e, path = %image.path.display(), "Failed to remove image");
        }
    }
}

/// `generic-1080x1350.png` and so on; one file per card.
fn fallback_file_name(kind: FailureKind, aspect_ratio: AspectRatio) -> String {
    let viewport = aspect_ratio.viewport();
    format!("{}-{}x{}.png", kind.as_str(), viewport.width, viewport.height)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_save_and_discard() {
        let dir = tempfile::tempdir().unwrap();
        let store = MediaStore::new(dir.path(), "https://adburst.example.com/");

        let image = store
            .save_png(MediaFolder::Creations, b"\x89PNG fake")
            .await
            .unwrap();

        assert!(image.url.starts_with("https://adburst.example.com/uploads/creations/"));
        assert!(image.url.ends_with(".png"));
        assert_eq!(tokio::fs::read(&image.path).await.unwrap(), b"\x89PNG fake");

        store.discard(&image).await;
        assert!(!image.path.exists());
    }

    #[tokio::test]
    async fn test_fallback_cards_are_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let store = MediaStore::new(dir.path(), "http://localhost:3000");

        let first = store
            .save_fallback(FailureKind::Quota, AspectRatio::Story, b"first")
            .await
            .unwrap();
        let second = store
            .save_fallback(FailureKind::Quota, AspectRatio::Story, b"second")
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(
            second.url,
            "http://localhost:3000/uploads/fallbacks/quota-1080x1920.png"
        );
        assert_eq!(tokio::fs::read(&second.path).await.unwrap(), b"second");

        let mut entries = tokio::fs::read_dir(dir.path().join("fallbacks")).await.unwrap();
        let mut count = 0;
        while entries.next_entry().await.unwrap().is_some() {
            count += 1;
        }
        assert_eq!(count, 1);
    }

    #[test]
    fn test_fallback_names_differ_per_kind_and_ratio() {
        assert_eq!(
            fallback_file_name(FailureKind::Generic, AspectRatio::Square),
            "generic-1080x1080.png"
        );
        assert_ne!(
            fallback_file_name(FailureKind::Generic, AspectRatio::Square),
            fallback_file_name(FailureKind::Network, AspectRatio::Square)
        );
        assert_ne!(
            fallback_file_name(FailureKind::Generic, AspectRatio::Portrait),
            fallback_file_name(FailureKind::Generic, AspectRatio::Flyer)
        );
    }
}
