use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use teamgrid_core::{GridError, GridResult};
use tokio::sync::Mutex;

use crate::traits::SettingsStore;

type SettingsDocument = HashMap<String, HashMap<String, serde_json::Value>>;

/// Durable settings backend over one JSON document on disk, organized as
/// scope -> key -> value. Writes go to a temp file in the same directory and
/// are renamed into place, so a crash mid-write leaves the previous document
/// intact. A missing file reads as an empty document.
pub struct JsonSettingsStore {
    path: PathBuf,
    // Serializes read-modify-write cycles between concurrent set() calls.
    write_lock: Mutex<()>,
}

impl JsonSettingsStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load_document(&self) -> GridResult<SettingsDocument> {
        if !self.path.exists() {
            return Ok(SettingsDocument::new());
        }
        let bytes = tokio::fs::read(&self.path).await?;
        serde_json::from_slice(&bytes)
            .map_err(|e| GridError::Serialization(e.to_string()))
    }

    async fn save_document(&self, document: &SettingsDocument) -> GridResult<()> {
        let bytes = serde_json::to_vec_pretty(document)
            .map_err(|e| GridError::Serialization(e.to_string()))?;

        // The temp file must live next to the target so the rename stays on
        // one filesystem.
        let parent = self.path.parent().unwrap_or_else(|| Path::new("."));
        let temp = tempfile::NamedTempFile::new_in(parent)?;
        let temp_path = temp.path().to_path_buf();
        tokio::fs::write(&temp_path, &bytes).await?;
        tokio::fs::rename(&temp_path, &self.path).await?;

        tracing::debug!("Wrote {} bytes to {}", bytes.len(), self.path.display());
        Ok(())
    }
}

#[async_trait]
impl SettingsStore for JsonSettingsStore {
    async fn get(&self, scope: &str, key: &str) -> GridResult<Option<serde_json::Value>> {
        let document = self.load_document().await?;
        Ok(document
            .get(scope)
            .and_then(|entries| entries.get(key))
            .cloned())
    }

    async fn set(&self, scope: &str, key: &str, value: serde_json::Value) -> GridResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut document = self.load_document().await?;
        document
            .entry(scope.to_string())
            .or_default()
            .insert(key.to_string(), value);
        self.save_document(&document).await?;
        tracing::info!("Saved setting {scope}/{key} to {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_missing_file_reads_as_empty() {
        let dir = tempdir().unwrap();
        let store = JsonSettingsStore::new(dir.path().join("settings.json"));
        assert!(store.get("grid", "quarter_window").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_set_get_round_trip() {
        let dir = tempdir().unwrap();
        let store = JsonSettingsStore::new(dir.path().join("settings.json"));

        store
            .set("grid", "quarter_window", json!([{"year": 2025, "number": 2}]))
            .await
            .unwrap();
        store.set("grid", "roster_order", json!(["anna"])).await.unwrap();

        let window = store.get("grid", "quarter_window").await.unwrap().unwrap();
        assert_eq!(window[0]["year"], 2025);
        assert_eq!(
            store.get("grid", "roster_order").await.unwrap().unwrap(),
            json!(["anna"])
        );
    }

    #[tokio::test]
    async fn test_values_survive_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");

        JsonSettingsStore::new(&path)
            .set("grid", "roster_order", json!(["anna", "bo"]))
            .await
            .unwrap();

        let reopened = JsonSettingsStore::new(&path);
        assert_eq!(
            reopened.get("grid", "roster_order").await.unwrap().unwrap(),
            json!(["anna", "bo"])
        );
    }

    #[tokio::test]
    async fn test_overwrite_replaces_value() {
        let dir = tempdir().unwrap();
        let store = JsonSettingsStore::new(dir.path().join("settings.json"));

        store.set("grid", "roster_order", json!(["anna"])).await.unwrap();
        store
            .set("grid", "roster_order", json!(["bo", "anna"]))
            .await
            .unwrap();
        assert_eq!(
            store.get("grid", "roster_order").await.unwrap().unwrap(),
            json!(["bo", "anna"])
        );
    }
}
