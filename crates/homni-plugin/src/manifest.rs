//! Plugin manifests as stored in the manifest store.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::PluginError;

/// Declarative metadata describing a plugin.
///
/// Manifests are read-only from the loader's perspective. Deserialization is
/// lenient the way store rows are: a `null` description becomes empty,
/// non-string dependency entries are dropped and a non-object `metadata`
/// becomes an empty map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginManifest {
    /// Unique plugin identifier.
    pub id: String,
    /// Human-readable plugin name.
    pub name: String,
    /// Semver version string.
    pub version: String,
    /// Plugin description.
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: String,
    /// Module locator handed to the `ModuleResolver`.
    pub entry_point: String,
    /// Ids or names of plugins that must be loaded first, in order.
    #[serde(default, deserialize_with = "lenient_dependencies")]
    pub dependencies: Vec<String>,
    /// Opaque key-value metadata.
    #[serde(default, deserialize_with = "lenient_metadata")]
    pub metadata: Map<String, Value>,
    /// Whether the store reports this plugin as enabled.
    #[serde(default = "default_true", alias = "is_enabled")]
    pub enabled: bool,
}

impl PluginManifest {
    /// Creates an enabled manifest with no dependencies.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
        entry_point: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            version: version.into(),
            description: String::new(),
            entry_point: entry_point.into(),
            dependencies: Vec::new(),
            metadata: Map::new(),
            enabled: true,
        }
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the dependency list.
    pub fn with_dependencies<I, S>(mut self, dependencies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies = dependencies.into_iter().map(Into::into).collect();
        self
    }

    /// Inserts a metadata entry.
    pub fn with_metadata(mut self, key: &str, value: Value) -> Self {
        self.metadata.insert(key.to_string(), value);
        self
    }

    /// Sets the enabled flag.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Whether a dependency reference (id or name) points at this manifest.
    pub fn matches(&self, key: &str) -> bool {
        self.id == key || self.name == key
    }

    /// Checks the invariants the loader relies on.
    pub fn validate(&self) -> Result<(), PluginError> {
        let invalid = |reason: &str| PluginError::InvalidManifest {
            id: self.id.clone(),
            reason: reason.to_string(),
        };

        if self.id.trim().is_empty() {
            return Err(invalid("id must not be empty"));
        }
        if self.entry_point.trim().is_empty() {
            return Err(invalid("entry_point must not be empty"));
        }
        if self.dependencies.iter().any(|dep| self.matches(dep)) {
            return Err(PluginError::CyclicDependency {
                cycle: format!("{} -> {}", self.id, self.id),
            });
        }
        Ok(())
    }

    /// Whether `version` is `MAJOR.MINOR.PATCH`. Other versions still load.
    pub fn has_semver_version(&self) -> bool {
        is_semver(&self.version)
    }
}

/// `MAJOR.MINOR.PATCH` with optional `-pre` / `+build` suffixes.
fn is_semver(version: &str) -> bool {
    let core = version
        .split(['-', '+'])
        .next()
        .unwrap_or_default();
    let parts: Vec<&str> = core.split('.').collect();
    parts.len() == 3
        && parts
            .iter()
            .all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()))
}

fn default_true() -> bool {
    true
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn lenient_dependencies<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    })
}

fn lenient_metadata<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Object(map)) => map,
        _ => Map::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lenient_row_mapping() {
        let manifest: PluginManifest = serde_json::from_value(json!({
            "id": "lead-export",
            "name": "Lead Export",
            "version": "1.2.0",
            "description": null,
            "entry_point": "builtin://lead-export",
            "dependencies": ["leads", 42, null, "auth"],
            "metadata": "not-an-object",
            "is_enabled": false
        }))
        .unwrap();

        assert_eq!(manifest.description, "");
        assert_eq!(manifest.dependencies, vec!["leads", "auth"]);
        assert!(manifest.metadata.is_empty());
        assert!(!manifest.enabled);
    }

    #[test]
    fn test_validate() {
        let ok = PluginManifest::new("a", "A", "1.0.0-beta.1", "./a");
        assert!(ok.validate().is_ok());

        assert!(ok.has_semver_version());

        let short_version = PluginManifest::new("a", "A", "1.0", "./a");
        assert!(short_version.validate().is_ok());
        assert!(!short_version.has_semver_version());

        let no_entry = PluginManifest::new("a", "A", "1.0.0", " ");
        assert!(matches!(
            no_entry.validate(),
            Err(PluginError::InvalidManifest { .. })
        ));

        let self_dep = PluginManifest::new("a", "A", "1.0.0", "./a").with_dependencies(["A"]);
        assert!(matches!(
            self_dep.validate(),
            Err(PluginError::CyclicDependency { .. })
        ));
    }
}
