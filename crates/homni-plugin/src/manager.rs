//! Plugin manager, the facade the application talks to.
//!
//! Owns the shared [`PluginContext`], the loader, the hook registry and the
//! dispatcher. Context changes made by hook handlers are committed here.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use homni_core::config::PluginConfig;
use homni_core::error::AppError;
use homni_core::result::AppResult;

use crate::api::context::{CompanyProfile, PluginContext, SharedContext, UserProfile};
use crate::hooks::dispatcher::{DEFAULT_HANDLER_TIMEOUT, DispatchResult, HookDispatcher};
use crate::hooks::registry::HookRegistry;
use crate::loader::{LoadReport, LoadedPlugin, PluginLoader};
use crate::manifest::PluginManifest;
use crate::resolver::ModuleResolver;
use crate::store::ManifestStore;

/// Runtime knobs for the manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginSettings {
    /// Load enabled plugins during `initialize`.
    pub auto_load: bool,
    /// Limit for resolving one module.
    pub module_load_timeout: Option<Duration>,
    /// Limit for one hook handler invocation.
    pub hook_timeout: Option<Duration>,
}

impl Default for PluginSettings {
    fn default() -> Self {
        Self {
            auto_load: true,
            module_load_timeout: None,
            hook_timeout: Some(DEFAULT_HANDLER_TIMEOUT),
        }
    }
}

impl From<&PluginConfig> for PluginSettings {
    fn from(config: &PluginConfig) -> Self {
        Self {
            auto_load: config.auto_load,
            module_load_timeout: config.module_load_timeout(),
            hook_timeout: config.hook_timeout(),
        }
    }
}

/// Serializable view of a loaded plugin.
#[derive(Debug, Clone, Serialize)]
pub struct PluginSummary {
    /// Plugin id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Version.
    pub version: String,
    /// Description.
    pub description: String,
    /// Whether the plugin is active.
    pub is_active: bool,
    /// Hook names the plugin contributes to.
    pub hooks: Vec<String>,
    /// Load timestamp.
    pub loaded_at: DateTime<Utc>,
}

impl From<&LoadedPlugin> for PluginSummary {
    fn from(plugin: &LoadedPlugin) -> Self {
        Self {
            id: plugin.manifest.id.clone(),
            name: plugin.manifest.name.clone(),
            version: plugin.manifest.version.clone(),
            description: plugin.manifest.description.clone(),
            is_active: plugin.is_active,
            hooks: plugin.hook_names(),
            loaded_at: plugin.loaded_at,
        }
    }
}

/// Manages the plugin lifecycle and the context plugins observe.
#[derive(Debug)]
pub struct PluginManager {
    /// Plugin loader.
    loader: Arc<PluginLoader>,
    /// Hook registry.
    hook_registry: Arc<HookRegistry>,
    /// Hook dispatcher.
    hook_dispatcher: Arc<HookDispatcher>,
    /// Shared plugin context.
    context: SharedContext,
    /// Settings.
    settings: PluginSettings,
}

impl PluginManager {
    /// Creates a new plugin manager.
    pub fn new(
        store: Arc<dyn ManifestStore>,
        resolver: Arc<dyn ModuleResolver>,
        settings: PluginSettings,
    ) -> Self {
        let hook_registry = Arc::new(HookRegistry::new());
        let hook_dispatcher = Arc::new(HookDispatcher::with_timeout(
            hook_registry.clone(),
            settings.hook_timeout,
        ));
        let context: SharedContext = Arc::new(RwLock::new(PluginContext::default()));
        let loader = Arc::new(
            PluginLoader::new(store, resolver, hook_registry.clone(), context.clone())
                .with_module_load_timeout(settings.module_load_timeout),
        );

        Self {
            loader,
            hook_registry,
            hook_dispatcher,
            context,
            settings,
        }
    }

    /// Sets the user and company, then loads enabled plugins when `auto_load`.
    pub async fn initialize(
        &self,
        user: UserProfile,
        company: Option<CompanyProfile>,
    ) -> LoadReport {
        self.update_context(user, company).await;

        if !self.settings.auto_load {
            info!("Plugin auto-load disabled");
            return LoadReport::default();
        }

        self.loader.load_enabled_plugins().await
    }

    /// Replaces the user and company in the context.
    pub async fn update_context(&self, user: UserProfile, company: Option<CompanyProfile>) {
        let mut context = self.context.write().await;
        debug!(user_id = %user.id, role = %user.role, "Plugin context updated");
        context.user = user;
        context.company = company;
    }

    /// Replaces the enabled feature names.
    pub async fn set_features(&self, features: Vec<String>) {
        self.context.write().await.features = features;
    }

    /// Replaces the enabled module names.
    pub async fn set_modules(&self, modules: Vec<String>) {
        self.context.write().await.modules = modules;
    }

    /// Sets one configuration value.
    pub async fn set_config_value(&self, key: impl Into<String>, value: Value) {
        self.context.write().await.config.insert(key.into(), value);
    }

    /// Returns a snapshot of the context.
    pub async fn context(&self) -> PluginContext {
        self.context.read().await.clone()
    }

    /// Runs a hook and returns one result slot per handler.
    pub async fn execute_hooks(&self, hook_name: &str, args: &[Value]) -> Vec<Option<Value>> {
        self.dispatch_hook(hook_name, args).await.results
    }

    /// Runs a hook and returns the full dispatch outcome.
    ///
    /// Context updates returned by handlers are committed to the shared
    /// context so later dispatches observe them.
    pub async fn dispatch_hook(&self, hook_name: &str, args: &[Value]) -> DispatchResult {
        let snapshot = self.context().await;
        let result = self.hook_dispatcher.dispatch(hook_name, snapshot, args).await;

        if result.changed_context() {
            let mut context = self.context.write().await;
            for update in &result.updates {
                update.apply(&mut context);
            }
            debug!(
                hook = %hook_name,
                updates = result.updates.len(),
                "Hook context updates committed"
            );
        }

        result
    }

    /// Loads one plugin (and its dependencies).
    pub async fn load_plugin(&self, manifest: PluginManifest) -> AppResult<()> {
        self.loader.load_plugin(manifest).await.map_err(AppError::from)
    }

    /// Unloads a plugin. Returns `false` when it was not loaded.
    pub async fn unload_plugin(&self, id: &str) -> bool {
        self.loader.unload_plugin(id).await
    }

    /// Enables or disables a plugin at runtime.
    ///
    /// Enabling fetches the manifest from the store and loads it. Disabling
    /// fully unloads it and is refused while active plugins depend on it.
    pub async fn toggle_plugin(&self, id: &str, enabled: bool) -> AppResult<()> {
        if enabled {
            if self.loader.is_plugin_active(id).await {
                return Ok(());
            }
            let manifest = self
                .loader
                .store()
                .get_manifest_by_name(id)
                .await
                .map_err(AppError::from)?
                .ok_or_else(|| {
                    AppError::not_found(format!("Plugin '{id}' is not enabled in the manifest store"))
                })?;
            return self.load_plugin(manifest).await;
        }

        let dependents = self.loader.active_dependents(id).await;
        if !dependents.is_empty() {
            warn!(
                plugin_id = %id,
                dependents = ?dependents,
                "Refusing to disable plugin with active dependents"
            );
            return Err(AppError::conflict(format!(
                "Plugin '{id}' is required by active plugins: {}",
                dependents.join(", ")
            )));
        }

        self.loader.unload_plugin(id).await;
        Ok(())
    }

    /// Calls an exported function of an active plugin.
    pub async fn execute_plugin_function(
        &self,
        id: &str,
        function: &str,
        args: Vec<Value>,
    ) -> AppResult<Value> {
        self.loader
            .execute_plugin_function(id, function, args)
            .await
            .map_err(AppError::from)
    }

    /// Whether the plugin is loaded and active.
    pub async fn is_plugin_active(&self, id: &str) -> bool {
        self.loader.is_plugin_active(id).await
    }

    /// Returns a loaded plugin.
    pub async fn get_plugin(&self, id: &str) -> Option<LoadedPlugin> {
        self.loader.get_plugin(id).await
    }

    /// Lists all loaded plugins, sorted by id.
    pub async fn list_plugins(&self) -> Vec<PluginSummary> {
        self.loader
            .loaded_plugins()
            .await
            .iter()
            .map(PluginSummary::from)
            .collect()
    }

    /// Unloads every plugin and resets the context.
    pub async fn cleanup(&self) {
        self.loader.unload_all().await;
        *self.context.write().await = PluginContext::default();
        info!("Plugin manager cleaned up");
    }

    /// Returns the hook dispatcher.
    pub fn dispatcher(&self) -> &Arc<HookDispatcher> {
        &self.hook_dispatcher
    }

    /// Returns the hook registry.
    pub fn hook_registry(&self) -> &Arc<HookRegistry> {
        &self.hook_registry
    }

    /// Returns the plugin loader.
    pub fn loader(&self) -> &Arc<PluginLoader> {
        &self.loader
    }

    /// Returns the settings.
    pub fn settings(&self) -> &PluginSettings {
        &self.settings
    }
}
