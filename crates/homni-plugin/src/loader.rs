//! Plugin loader. Brings manifests from the store into the active registry.
//!
//! Loading is dependency-first and sequential. Every plugin is resolved
//! through the injected [`ModuleResolver`], initialised with the current
//! context and only then has its hooks registered, so a failure at any step
//! leaves nothing behind.

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::FutureExt;
use futures::future::BoxFuture;
use serde_json::Value;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, warn};

use crate::api::context::SharedContext;
use crate::error::PluginError;
use crate::hooks::registry::{HookHandler, HookRegistry};
use crate::manifest::PluginManifest;
use crate::module::PluginModule;
use crate::resolver::ModuleResolver;
use crate::store::ManifestStore;

/// A plugin that is present in the active registry.
#[derive(Debug, Clone)]
pub struct LoadedPlugin {
    /// The manifest it was loaded from.
    pub manifest: PluginManifest,
    /// The resolved module.
    pub module: Arc<dyn PluginModule>,
    /// Whether the plugin is active.
    pub is_active: bool,
    /// Hook name → handlers contributed by this plugin, in module order.
    pub hooks: HashMap<String, Vec<Arc<dyn HookHandler>>>,
    /// When the plugin finished loading.
    pub loaded_at: DateTime<Utc>,
}

impl LoadedPlugin {
    /// Plugin id.
    pub fn id(&self) -> &str {
        &self.manifest.id
    }

    /// Hook names this plugin contributes to, sorted.
    pub fn hook_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.hooks.keys().cloned().collect();
        names.sort();
        names
    }
}

/// Outcome of a bulk load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Ids that are active after the call, in manifest order.
    pub loaded: Vec<String>,
    /// Ids that failed with their error message.
    pub failed: Vec<(String, String)>,
}

impl LoadReport {
    /// Whether every manifest loaded.
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Loads, tracks and unloads plugins.
pub struct PluginLoader {
    /// Source of manifests.
    store: Arc<dyn ManifestStore>,
    /// Entry point → module.
    resolver: Arc<dyn ModuleResolver>,
    /// Where plugin hooks are registered.
    hooks: Arc<HookRegistry>,
    /// Context handed to `init`.
    context: SharedContext,
    /// Plugin id → loaded plugin.
    plugins: RwLock<HashMap<String, LoadedPlugin>>,
    /// Plugin ids in the order they finished loading.
    load_order: RwLock<Vec<String>>,
    /// Entry point → resolved module. Survives unload.
    module_cache: RwLock<HashMap<String, Arc<dyn PluginModule>>>,
    /// Serializes load and unload.
    lifecycle: Mutex<()>,
    /// Limit for a single module resolution.
    module_load_timeout: Option<Duration>,
}

impl std::fmt::Debug for PluginLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginLoader")
            .field("store", &self.store)
            .field("resolver", &self.resolver)
            .field("module_load_timeout", &self.module_load_timeout)
            .finish_non_exhaustive()
    }
}

impl PluginLoader {
    /// Creates a loader.
    pub fn new(
        store: Arc<dyn ManifestStore>,
        resolver: Arc<dyn ModuleResolver>,
        hooks: Arc<HookRegistry>,
        context: SharedContext,
    ) -> Self {
        Self {
            store,
            resolver,
            hooks,
            context,
            plugins: RwLock::new(HashMap::new()),
            load_order: RwLock::new(Vec::new()),
            module_cache: RwLock::new(HashMap::new()),
            lifecycle: Mutex::new(()),
            module_load_timeout: None,
        }
    }

    /// Sets the module resolution timeout.
    pub fn with_module_load_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.module_load_timeout = timeout;
        self
    }

    /// Returns the manifest store.
    pub fn store(&self) -> &Arc<dyn ManifestStore> {
        &self.store
    }

    /// Loads every enabled manifest, one after another, in store order.
    ///
    /// Never fails: a store error loads nothing and per-plugin failures are
    /// logged and recorded in the report.
    pub async fn load_enabled_plugins(&self) -> LoadReport {
        let mut report = LoadReport::default();

        let manifests = match self.store.list_enabled_plugins().await {
            Ok(manifests) => manifests,
            Err(e) => {
                error!(error = %e, "Failed to fetch enabled plugins");
                return report;
            }
        };

        info!(count = manifests.len(), "Loading enabled plugins");

        for manifest in manifests {
            let id = manifest.id.clone();
            match self.load_plugin(manifest).await {
                Ok(()) => report.loaded.push(id),
                Err(e) => report.failed.push((id, e.to_string())),
            }
        }

        info!(
            loaded = report.loaded.len(),
            failed = report.failed.len(),
            "Plugin loading finished"
        );
        report
    }

    /// Loads one plugin and, first, its dependencies.
    ///
    /// A no-op when the plugin is already active.
    pub async fn load_plugin(&self, manifest: PluginManifest) -> Result<(), PluginError> {
        let _guard = self.lifecycle.lock().await;
        let mut chain = Vec::new();
        self.load_inner(manifest, &mut chain).await
    }

    fn load_inner<'a>(
        &'a self,
        manifest: PluginManifest,
        chain: &'a mut Vec<(String, String)>,
    ) -> BoxFuture<'a, Result<(), PluginError>> {
        async move {
            if self.is_plugin_active(&manifest.id).await {
                debug!(plugin_id = %manifest.id, "Plugin already loaded");
                return Ok(());
            }

            chain.push((manifest.id.clone(), manifest.name.clone()));
            let result = self.load_steps(&manifest, chain).await;
            chain.pop();

            if let Err(e) = &result {
                error!(
                    plugin_id = %manifest.id,
                    name = %manifest.name,
                    error = %e,
                    "Failed to load plugin"
                );
            }
            result
        }
        .boxed()
    }

    async fn load_steps(
        &self,
        manifest: &PluginManifest,
        chain: &mut Vec<(String, String)>,
    ) -> Result<(), PluginError> {
        manifest.validate()?;
        if !manifest.has_semver_version() {
            warn!(
                plugin_id = %manifest.id,
                version = %manifest.version,
                "Plugin version is not MAJOR.MINOR.PATCH"
            );
        }

        for dependency in &manifest.dependencies {
            self.load_dependency(manifest, dependency, chain).await?;
        }

        let module = self.resolve_module(&manifest.entry_point).await?;

        let snapshot = self.context.read().await.clone();
        AssertUnwindSafe(module.init(&snapshot, manifest))
            .catch_unwind()
            .await
            .unwrap_or_else(|_| Err("init panicked".to_string()))
            .map_err(|reason| PluginError::InitFailed {
                plugin: manifest.id.clone(),
                reason,
            })?;

        let mut hooks: HashMap<String, Vec<Arc<dyn HookHandler>>> = HashMap::new();
        for (hook_name, handler) in module.hooks() {
            hooks.entry(hook_name).or_default().push(handler);
        }
        for (hook_name, handlers) in &hooks {
            self.hooks
                .register_hooks(hook_name, &manifest.id, handlers.clone())
                .await;
        }

        let loaded = LoadedPlugin {
            manifest: manifest.clone(),
            module,
            is_active: true,
            hooks,
            loaded_at: Utc::now(),
        };

        info!(
            plugin_id = %manifest.id,
            name = %manifest.name,
            version = %manifest.version,
            hooks = loaded.hooks.values().map(Vec::len).sum::<usize>(),
            "Plugin loaded"
        );

        self.plugins.write().await.insert(manifest.id.clone(), loaded);
        self.load_order.write().await.push(manifest.id.clone());
        Ok(())
    }

    async fn load_dependency(
        &self,
        manifest: &PluginManifest,
        dependency: &str,
        chain: &mut Vec<(String, String)>,
    ) -> Result<(), PluginError> {
        if let Some(start) = chain
            .iter()
            .position(|(id, name)| id == dependency || name == dependency)
        {
            let mut cycle: Vec<&str> = chain[start..].iter().map(|(id, _)| id.as_str()).collect();
            cycle.push(chain[start].0.as_str());
            return Err(PluginError::CyclicDependency {
                cycle: cycle.join(" -> "),
            });
        }

        if self.find_active(dependency).await.is_some() {
            return Ok(());
        }

        let wrap = |source: PluginError| PluginError::DependencyFailed {
            plugin: manifest.id.clone(),
            dependency: dependency.to_string(),
            source: Box::new(source),
        };

        let dependency_manifest = self
            .store
            .get_manifest_by_name(dependency)
            .await
            .map_err(wrap)?
            .ok_or_else(|| PluginError::MissingDependency {
                plugin: manifest.id.clone(),
                dependency: dependency.to_string(),
            })?;

        debug!(
            plugin_id = %manifest.id,
            dependency = %dependency,
            "Loading dependency"
        );

        match self.load_inner(dependency_manifest, chain).await {
            Ok(()) => Ok(()),
            Err(e @ PluginError::CyclicDependency { .. }) => Err(e),
            Err(e) => Err(wrap(e)),
        }
    }

    async fn resolve_module(&self, locator: &str) -> Result<Arc<dyn PluginModule>, PluginError> {
        if let Some(module) = self.module_cache.read().await.get(locator).cloned() {
            debug!(locator = %locator, "Module served from cache");
            return Ok(module);
        }

        let pending = async {
            AssertUnwindSafe(self.resolver.load_module(locator))
                .catch_unwind()
                .await
                .unwrap_or_else(|_| {
                    Err(PluginError::ModuleLoad {
                        locator: locator.to_string(),
                        reason: "resolver panicked".to_string(),
                    })
                })
        };
        let module = match self.module_load_timeout {
            Some(limit) => tokio::time::timeout(limit, pending).await.map_err(|_| {
                PluginError::ModuleLoadTimeout {
                    locator: locator.to_string(),
                    timeout_ms: limit.as_millis(),
                }
            })??,
            None => pending.await?,
        };

        self.module_cache
            .write()
            .await
            .insert(locator.to_string(), module.clone());
        Ok(module)
    }

    async fn find_active(&self, key: &str) -> Option<String> {
        let plugins = self.plugins.read().await;
        plugins
            .values()
            .find(|p| p.is_active && p.manifest.matches(key))
            .map(|p| p.manifest.id.clone())
    }

    /// Unloads a plugin. Returns `false` when it was not loaded.
    ///
    /// `cleanup` errors are logged; the plugin is removed regardless.
    pub async fn unload_plugin(&self, id: &str) -> bool {
        let _guard = self.lifecycle.lock().await;
        self.unload_inner(id).await
    }

    async fn unload_inner(&self, id: &str) -> bool {
        let Some(plugin) = self.get_plugin(id).await else {
            debug!(plugin_id = %id, "Unload requested for plugin that is not loaded");
            return false;
        };

        match AssertUnwindSafe(plugin.module.cleanup()).catch_unwind().await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(plugin_id = %id, error = %e, "Plugin cleanup returned error"),
            Err(_) => warn!(plugin_id = %id, "Plugin cleanup panicked"),
        }

        for (hook_name, handlers) in &plugin.hooks {
            self.hooks.unregister_hooks(hook_name, id, handlers).await;
        }

        self.plugins.write().await.remove(id);
        self.load_order.write().await.retain(|loaded| loaded != id);

        info!(plugin_id = %id, name = %plugin.manifest.name, "Plugin unloaded");
        true
    }

    /// Unloads every plugin, dependents before their dependencies.
    pub async fn unload_all(&self) {
        let _guard = self.lifecycle.lock().await;
        let order: Vec<String> = self.load_order.read().await.iter().rev().cloned().collect();

        for id in &order {
            self.unload_inner(id).await;
        }

        info!(count = order.len(), "All plugins unloaded");
    }

    /// Calls an exported function of an active plugin.
    pub async fn execute_plugin_function(
        &self,
        id: &str,
        function: &str,
        args: Vec<Value>,
    ) -> Result<Value, PluginError> {
        let module = {
            let plugins = self.plugins.read().await;
            plugins
                .get(id)
                .filter(|p| p.is_active)
                .map(|p| p.module.clone())
        }
        .ok_or_else(|| PluginError::NotActive {
            plugin: id.to_string(),
        })?;

        if !module.exported_functions().iter().any(|f| f == function) {
            return Err(PluginError::FunctionNotFound {
                plugin: id.to_string(),
                function: function.to_string(),
            });
        }

        module
            .call(function, args)
            .await
            .map_err(|reason| PluginError::FunctionFailed {
                plugin: id.to_string(),
                function: function.to_string(),
                reason,
            })
    }

    /// Whether the plugin is loaded and active.
    pub async fn is_plugin_active(&self, id: &str) -> bool {
        let plugins = self.plugins.read().await;
        plugins.get(id).is_some_and(|p| p.is_active)
    }

    /// Returns a loaded plugin.
    pub async fn get_plugin(&self, id: &str) -> Option<LoadedPlugin> {
        self.plugins.read().await.get(id).cloned()
    }

    /// All loaded plugins, sorted by id.
    pub async fn loaded_plugins(&self) -> Vec<LoadedPlugin> {
        let plugins = self.plugins.read().await;
        let mut list: Vec<LoadedPlugin> = plugins.values().cloned().collect();
        list.sort_by(|a, b| a.manifest.id.cmp(&b.manifest.id));
        list
    }

    /// Number of loaded plugins.
    pub async fn loaded_count(&self) -> usize {
        self.plugins.read().await.len()
    }

    /// Plugin ids in load order.
    pub async fn load_order(&self) -> Vec<String> {
        self.load_order.read().await.clone()
    }

    /// Active plugins that declare `id` (or its name) as a dependency, sorted.
    pub async fn active_dependents(&self, id: &str) -> Vec<String> {
        let plugins = self.plugins.read().await;
        let name = plugins.get(id).map(|p| p.manifest.name.clone());

        let mut dependents: Vec<String> = plugins
            .values()
            .filter(|p| p.is_active && p.manifest.id != id)
            .filter(|p| {
                p.manifest
                    .dependencies
                    .iter()
                    .any(|dep| dep == id || Some(dep) == name.as_ref())
            })
            .map(|p| p.manifest.id.clone())
            .collect();
        dependents.sort();
        dependents
    }
}
