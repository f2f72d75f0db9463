// File-backed watermark persistence
//
// The watermark survives restarts as a small JSON document. Writes go to a
// sibling temp file first and are renamed into place, so a crash mid-write
// leaves the previous watermark intact.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use woonveilig_core::{CoreError, Watermark, WatermarkStore};

#[derive(Debug, Serialize, Deserialize)]
struct Persisted {
    watermark: Watermark,
}

/// Stores the watermark as JSON at a fixed path.
#[derive(Debug, Clone)]
pub struct FileWatermarkStore {
    path: PathBuf,
}

impl FileWatermarkStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn error(&self, action: &str, err: impl std::fmt::Display) -> CoreError {
        CoreError::Persistence {
            message: format!("cannot {action} {}: {err}", self.path.display()),
        }
    }
}

impl WatermarkStore for FileWatermarkStore {
    async fn load(&self) -> Result<Watermark, CoreError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no stored watermark, starting fresh");
                return Ok(Watermark::default());
            }
            Err(e) => return Err(self.error("read", e)),
        };

        let persisted: Persisted =
            serde_json::from_slice(&bytes).map_err(|e| self.error("parse", e))?;
        Ok(persisted.watermark)
    }

    async fn store(&self, watermark: Watermark) -> Result<(), CoreError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.error("create directory for", e))?;
        }

        let json = serde_json::to_vec_pretty(&Persisted { watermark })
            .map_err(|e| self.error("serialize", e))?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|e| self.error("write", e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| self.error("replace", e))?;

        debug!(%watermark, "stored watermark");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    use super::*;

    fn mark() -> Watermark {
        Watermark::new(
            NaiveDate::from_ymd_opt(2024, 10, 14)
                .unwrap()
                .and_hms_opt(21, 3, 0)
                .unwrap(),
        )
    }

    #[tokio::test]
    async fn missing_file_loads_default() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileWatermarkStore::new(dir.path().join("watermark.json"));

        assert_eq!(store.load().await.unwrap(), Watermark::default());
    }

    #[tokio::test]
    async fn stored_watermark_is_loaded_back() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileWatermarkStore::new(dir.path().join("state").join("watermark.json"));

        store.store(mark()).await.unwrap();

        assert_eq!(store.load().await.unwrap(), mark());
        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert!(raw.contains("2024-10-14T21:03:00"), "raw: {raw}");
    }

    #[tokio::test]
    async fn corrupt_file_is_a_persistence_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("watermark.json");
        std::fs::write(&path, "not json").unwrap();

        let result = FileWatermarkStore::new(&path).load().await;

        assert!(
            matches!(result, Err(CoreError::Persistence { .. })),
            "got: {result:?}"
        );
    }
}
