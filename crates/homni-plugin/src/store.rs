//! Manifest store, the read-only source of plugin manifests.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::PluginError;
use crate::manifest::PluginManifest;

/// Source of plugin manifests.
///
/// In production this is a database table; the loader only ever reads.
#[async_trait]
pub trait ManifestStore: Send + Sync + std::fmt::Debug {
    /// Returns all manifests flagged enabled, in store order.
    async fn list_enabled_plugins(&self) -> Result<Vec<PluginManifest>, PluginError>;

    /// Looks up an enabled manifest by id or name.
    async fn get_manifest_by_name(&self, name: &str)
    -> Result<Option<PluginManifest>, PluginError>;
}

/// Manifest store held in memory.
#[derive(Debug, Default)]
pub struct InMemoryManifestStore {
    /// Manifests in insertion order.
    manifests: RwLock<Vec<PluginManifest>>,
}

impl InMemoryManifestStore {
    /// Creates a store from a list of manifests.
    pub fn new(manifests: Vec<PluginManifest>) -> Self {
        Self {
            manifests: RwLock::new(manifests),
        }
    }

    /// Inserts a manifest, replacing any existing entry with the same id.
    pub async fn upsert(&self, manifest: PluginManifest) {
        let mut manifests = self.manifests.write().await;
        match manifests.iter_mut().find(|m| m.id == manifest.id) {
            Some(existing) => *existing = manifest,
            None => manifests.push(manifest),
        }
    }

    /// Flips the enabled flag of a manifest. Returns `false` if the id is unknown.
    pub async fn set_enabled(&self, id: &str, enabled: bool) -> bool {
        let mut manifests = self.manifests.write().await;
        match manifests.iter_mut().find(|m| m.id == id) {
            Some(manifest) => {
                manifest.enabled = enabled;
                true
            }
            None => false,
        }
    }

    /// Removes a manifest by id.
    pub async fn remove(&self, id: &str) -> Option<PluginManifest> {
        let mut manifests = self.manifests.write().await;
        let index = manifests.iter().position(|m| m.id == id)?;
        Some(manifests.remove(index))
    }
}

#[async_trait]
impl ManifestStore for InMemoryManifestStore {
    async fn list_enabled_plugins(&self) -> Result<Vec<PluginManifest>, PluginError> {
        let manifests = self.manifests.read().await;
        Ok(manifests.iter().filter(|m| m.enabled).cloned().collect())
    }

    async fn get_manifest_by_name(
        &self,
        name: &str,
    ) -> Result<Option<PluginManifest>, PluginError> {
        let manifests = self.manifests.read().await;
        Ok(find_enabled(&manifests, name))
    }
}

/// Manifest store backed by a JSON file containing an array of manifests.
///
/// The file is re-read on every query so edits are picked up without restart.
#[derive(Debug, Clone)]
pub struct JsonFileManifestStore {
    /// Path to the JSON file.
    path: PathBuf,
}

impl JsonFileManifestStore {
    /// Creates a store reading from the given path.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Returns the backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> Result<Vec<PluginManifest>, PluginError> {
        let raw = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            PluginError::ManifestStore(format!("cannot read '{}': {e}", self.path.display()))
        })?;

        let manifests: Vec<PluginManifest> = serde_json::from_str(&raw).map_err(|e| {
            PluginError::ManifestStore(format!("cannot parse '{}': {e}", self.path.display()))
        })?;

        debug!(
            path = %self.path.display(),
            count = manifests.len(),
            "Manifest file read"
        );

        Ok(manifests)
    }
}

#[async_trait]
impl ManifestStore for JsonFileManifestStore {
    async fn list_enabled_plugins(&self) -> Result<Vec<PluginManifest>, PluginError> {
        let manifests = self.read_all().await?;
        Ok(manifests.into_iter().filter(|m| m.enabled).collect())
    }

    async fn get_manifest_by_name(
        &self,
        name: &str,
    ) -> Result<Option<PluginManifest>, PluginError> {
        let manifests = self.read_all().await?;
        Ok(find_enabled(&manifests, name))
    }
}

/// Id matches win over name matches.
fn find_enabled(manifests: &[PluginManifest], key: &str) -> Option<PluginManifest> {
    manifests
        .iter()
        .filter(|m| m.enabled)
        .find(|m| m.id == key)
        .or_else(|| manifests.iter().filter(|m| m.enabled).find(|m| m.name == key))
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<PluginManifest> {
        vec![
            PluginManifest::new("crm", "CRM Sync", "1.0.0", "./crm"),
            PluginManifest::new("bi", "Insights", "0.3.0", "./bi").with_enabled(false),
        ]
    }

    #[tokio::test]
    async fn test_in_memory_lists_only_enabled() {
        let store = InMemoryManifestStore::new(sample());
        let enabled = store.list_enabled_plugins().await.unwrap();
        assert_eq!(enabled.len(), 1);
        assert_eq!(enabled[0].id, "crm");
    }

    #[tokio::test]
    async fn test_lookup_by_id_or_name() {
        let store = InMemoryManifestStore::new(sample());
        assert!(store.get_manifest_by_name("crm").await.unwrap().is_some());
        assert!(store.get_manifest_by_name("CRM Sync").await.unwrap().is_some());
        assert!(store.get_manifest_by_name("bi").await.unwrap().is_none());

        assert!(store.set_enabled("bi", true).await);
        assert!(store.get_manifest_by_name("Insights").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_json_file_store_missing_file_is_store_error() {
        let store = JsonFileManifestStore::new("/nonexistent/plugins.json");
        let err = store.list_enabled_plugins().await.unwrap_err();
        assert!(matches!(err, PluginError::ManifestStore(_)));
    }

    #[tokio::test]
    async fn test_json_file_store_reads_array() {
        let path = std::env::temp_dir().join(format!("homni-manifests-{}.json", uuid::Uuid::new_v4()));
        tokio::fs::write(&path, serde_json::to_string(&sample()).unwrap())
            .await
            .unwrap();

        let store = JsonFileManifestStore::new(&path);
        let enabled = store.list_enabled_plugins().await.unwrap();
        assert_eq!(enabled.len(), 1);
        assert_eq!(
            store.get_manifest_by_name("CRM Sync").await.unwrap().unwrap().id,
            "crm"
        );

        let _ = tokio::fs::remove_file(&path).await;
    }
}
