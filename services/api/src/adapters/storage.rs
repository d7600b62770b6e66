//! services/api/src/adapters/storage.rs
//!
//! Local-disk implementation of the `FileStorageService` port. Uploaded files are kept
//! under the configured upload directory as `<millis>-<nonce>-<sanitized original name>`.

use async_trait::async_trait;
use chrono::Utc;
use std::path::{Path, PathBuf};
use study_assistant_core::{
    domain::StoredFile,
    ports::{FileStorageService, PortError, PortResult},
};
use tracing::warn;
use uuid::Uuid;

#[derive(Clone, Debug)]
pub struct LocalFileStorage {
    root: PathBuf,
}

impl LocalFileStorage {
    /// Creates the upload directory if needed.
    pub async fn new(root: PathBuf) -> std::io::Result<Self> {
        tokio::fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }
}

/// Reduces a client-supplied name to a safe single path component.
fn sanitize_file_name(original_name: &str) -> String {
    let base = Path::new(original_name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned.to_string()
    }
}

#[async_trait]
impl FileStorageService for LocalFileStorage {
    async fn store(&self, original_name: &str, data: &[u8]) -> PortResult<StoredFile> {
        let nonce = Uuid::new_v4().simple().to_string();
        let filename = format!(
            "{}-{}-{}",
            Utc::now().timestamp_millis(),
            &nonce[..8],
            sanitize_file_name(original_name)
        );
        let path = self.root.join(&filename);

        tokio::fs::write(&path, data)
            .await
            .map_err(|e| PortError::Unexpected(format!("Failed to store upload: {}", e)))?;

        Ok(StoredFile {
            filename,
            path: path.to_string_lossy().into_owned(),
        })
    }

    async fn remove(&self, file: &StoredFile) -> PortResult<()> {
        match tokio::fs::remove_file(&file.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Upload {} was already gone", file.path);
                Ok(())
            }
            Err(e) => Err(PortError::Unexpected(format!(
                "Failed to remove upload {}: {}",
                file.path, e
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_strips_directories_and_odd_characters() {
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("my notes (v2).pdf"), "my_notes__v2_.pdf");
        assert_eq!(sanitize_file_name(".hidden"), "hidden");
        assert_eq!(sanitize_file_name(""), "upload");
    }

    #[tokio::test]
    async fn store_then_remove_round_trips_on_disk() {
        let root = tempfile::tempdir().unwrap();
        let storage = LocalFileStorage::new(root.path().join("uploads")).await.unwrap();

        let stored = storage.store("chapter 1.txt", b"cell biology").await.unwrap();
        assert!(stored.filename.ends_with("-chapter_1.txt"));
        assert_eq!(tokio::fs::read(&stored.path).await.unwrap(), b"cell biology");

        storage.remove(&stored).await.unwrap();
        assert!(!Path::new(&stored.path).exists());
        // Removing twice is not an error.
        storage.remove(&stored).await.unwrap();
    }
}
