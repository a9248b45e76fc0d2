//! Error type for plugin loading, dispatch, and invocation.
//!
//! Environmental failures (store unreachable, module missing, init failure)
//! are logged and swallowed by the bulk loader. Programming-error failures
//! (`NotActive`, `FunctionNotFound`) are surfaced to the immediate caller.
//! Everything maps into `homni_core::AppError` at the crate boundary.

use homni_core::error::{AppError, ErrorKind};
use thiserror::Error;

/// Unified error type for plugin operations.
#[derive(Debug, Error)]
pub enum PluginError {
    /// The manifest store could not be queried.
    #[error("Manifest store unavailable: {0}")]
    ManifestStore(String),

    /// A manifest failed validation.
    #[error("Invalid manifest '{id}': {reason}")]
    InvalidManifest {
        /// Manifest id (possibly empty).
        id: String,
        /// What was wrong with it.
        reason: String,
    },

    /// A declared dependency does not exist in the manifest store.
    #[error("Plugin '{plugin}' depends on '{dependency}', which is not in the manifest store")]
    MissingDependency {
        /// The dependent plugin.
        plugin: String,
        /// The dependency that could not be found.
        dependency: String,
    },

    /// The dependency graph contains a cycle.
    #[error("Cyclic plugin dependency: {cycle}")]
    CyclicDependency {
        /// The cycle, rendered as `a -> b -> a`.
        cycle: String,
    },

    /// A dependency was found but failed to load.
    #[error("Plugin '{plugin}' dependency '{dependency}' failed to load: {source}")]
    DependencyFailed {
        /// The dependent plugin.
        plugin: String,
        /// The failing dependency.
        dependency: String,
        /// Why the dependency failed.
        #[source]
        source: Box<PluginError>,
    },

    /// The resolver does not know the locator.
    #[error("No module registered for entry point '{locator}'")]
    ModuleNotFound {
        /// The entry point that was requested.
        locator: String,
    },

    /// The resolver failed while loading a module.
    #[error("Failed to load module '{locator}': {reason}")]
    ModuleLoad {
        /// The entry point that was requested.
        locator: String,
        /// Resolver-provided reason.
        reason: String,
    },

    /// Module resolution exceeded the configured timeout.
    #[error("Loading module '{locator}' timed out after {timeout_ms}ms")]
    ModuleLoadTimeout {
        /// The entry point that was requested.
        locator: String,
        /// The timeout that was exceeded.
        timeout_ms: u128,
    },

    /// The plugin's `init` returned an error.
    #[error("Plugin '{plugin}' init failed: {reason}")]
    InitFailed {
        /// The plugin id.
        plugin: String,
        /// Reason returned by the plugin.
        reason: String,
    },

    /// The plugin is not loaded or not active.
    #[error("Plugin '{plugin}' is not loaded or active")]
    NotActive {
        /// The plugin id.
        plugin: String,
    },

    /// The plugin does not export the requested function.
    #[error("Function '{function}' not found in plugin '{plugin}'")]
    FunctionNotFound {
        /// The plugin id.
        plugin: String,
        /// The requested function.
        function: String,
    },

    /// The exported function returned an error.
    #[error("Function '{function}' in plugin '{plugin}' failed: {reason}")]
    FunctionFailed {
        /// The plugin id.
        plugin: String,
        /// The invoked function.
        function: String,
        /// Reason returned by the plugin.
        reason: String,
    },
}

impl From<PluginError> for AppError {
    fn from(err: PluginError) -> Self {
        let kind = match &err {
            PluginError::NotActive { .. }
            | PluginError::FunctionNotFound { .. }
            | PluginError::MissingDependency { .. }
            | PluginError::ModuleNotFound { .. } => ErrorKind::NotFound,
            PluginError::InvalidManifest { .. } => ErrorKind::Validation,
            PluginError::ManifestStore(_) => ErrorKind::ExternalService,
            PluginError::ModuleLoadTimeout { .. } => ErrorKind::Timeout,
            _ => ErrorKind::Plugin,
        };
        AppError::with_source(kind, err.to_string(), err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_active_maps_to_not_found() {
        let err: AppError = PluginError::NotActive {
            plugin: "crm".to_string(),
        }
        .into();
        assert_eq!(err.kind, ErrorKind::NotFound);
        assert!(err.message.contains("crm"));
    }

    #[test]
    fn test_dependency_failure_names_root_cause() {
        let err = PluginError::DependencyFailed {
            plugin: "a".to_string(),
            dependency: "b".to_string(),
            source: Box::new(PluginError::ModuleNotFound {
                locator: "./b".to_string(),
            }),
        };
        assert_eq!(
            err.to_string(),
            "Plugin 'a' dependency 'b' failed to load: No module registered for entry point './b'"
        );
    }
}
