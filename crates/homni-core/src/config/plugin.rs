//! Plugin system configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Plugin system configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginConfig {
    /// JSON file holding the plugin manifest store.
    #[serde(default = "default_manifest_file")]
    pub manifest_file: String,
    /// Whether to load every enabled plugin when the manager initializes.
    #[serde(default = "default_true")]
    pub auto_load: bool,
    /// Upper bound for a single module resolution. `None` waits indefinitely.
    #[serde(default)]
    pub module_load_timeout_seconds: Option<u64>,
    /// Upper bound for a single hook handler invocation. `None` waits indefinitely.
    #[serde(default = "default_hook_timeout")]
    pub hook_timeout_seconds: Option<u64>,
}

impl PluginConfig {
    /// Module load timeout as a `Duration`.
    pub fn module_load_timeout(&self) -> Option<Duration> {
        self.module_load_timeout_seconds.map(Duration::from_secs)
    }

    /// Hook handler timeout as a `Duration`.
    pub fn hook_timeout(&self) -> Option<Duration> {
        self.hook_timeout_seconds.map(Duration::from_secs)
    }
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            manifest_file: default_manifest_file(),
            auto_load: true,
            module_load_timeout_seconds: None,
            hook_timeout_seconds: default_hook_timeout(),
        }
    }
}

fn default_manifest_file() -> String {
    "config/plugins.json".to_string()
}

fn default_true() -> bool {
    true
}

fn default_hook_timeout() -> Option<u64> {
    Some(30)
}
