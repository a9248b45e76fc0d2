//! Homni plugin host and routing-shell projection
//!
//! Loads enabled plugins, announces startup through the hook system and
//! prints the route and navigation projection for the configured role.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::json;
use tracing_subscriber::{EnvFilter, fmt};
use uuid::Uuid;

use homni_core::config::AppConfig;
use homni_core::error::AppError;
use homni_core::{AppResult, UserRole};
use homni_modules::navigation::default_navigation;
use homni_modules::{FeatureFlagSet, ModuleRegistry, NavConfig, NavItem, filter_navigation};
use homni_plugin::prelude::*;
use homni_plugin::{JsonFileManifestStore, PluginManager, PluginSettings, StaticModuleResolver};

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Homni error: {}", e);
        std::process::exit(1);
    }
}

/// Load configuration from `config/` and the environment
fn load_configuration() -> AppResult<AppConfig> {
    let env = std::env::var("HOMNI_ENV").unwrap_or_else(|_| "development".to_string());
    AppConfig::load(&env)
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_writer(std::io::stderr)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

/// Resolver with every built-in plugin module
fn builtin_modules() -> StaticModuleResolver {
    StaticModuleResolver::new().with_module(plugin_notifications::ENTRY_POINT, || {
        Arc::new(plugin_notifications::NotificationsPlugin::new()) as Arc<dyn PluginModule>
    })
}

/// Profile for the configured default role. Guests are anonymous.
fn session_user(role: UserRole) -> UserProfile {
    match role {
        UserRole::Guest => UserProfile::anonymous(),
        role => UserProfile::new(Uuid::new_v4(), role),
    }
}

async fn load_flags(config: &AppConfig) -> AppResult<FeatureFlagSet> {
    let mut flags = match &config.modules.feature_flags_file {
        Some(path) => FeatureFlagSet::from_json_file(path).await?,
        None => FeatureFlagSet::default(),
    };
    flags.apply_overrides(&config.modules.flag_overrides);
    Ok(flags)
}

async fn load_navigation(config: &AppConfig, role: UserRole) -> AppResult<NavConfig> {
    match &config.modules.navigation_file {
        Some(path) => NavConfig::from_json_file(path).await,
        None => Ok(default_navigation(role)),
    }
}

/// Main run function
async fn run(config: AppConfig) -> AppResult<()> {
    tracing::info!("Starting Homni v{}", env!("CARGO_PKG_VERSION"));

    let role = config.modules.default_role;
    let user = session_user(role);
    let user_key = user.id.to_string();

    // ── Step 1: Plugins ─────────────────────────────────────────
    let store = Arc::new(JsonFileManifestStore::new(&config.plugins.manifest_file));
    let manager = PluginManager::new(
        store,
        Arc::new(builtin_modules()),
        PluginSettings::from(&config.plugins),
    );

    let report = manager.initialize(user, None).await;
    for (id, reason) in &report.failed {
        tracing::warn!(plugin_id = %id, reason = %reason, "Plugin failed to load");
    }
    tracing::info!(
        loaded = report.loaded.len(),
        failed = report.failed.len(),
        "Plugins initialized"
    );

    // ── Step 2: Modules and feature flags ───────────────────────
    let registry = ModuleRegistry::default();
    let flags = load_flags(&config).await?.applicable_for(role);
    let flag_map: HashMap<String, bool> = flags.as_map(&user_key);

    let mut modules = registry.active_module_ids();
    modules.extend(report.loaded.iter().cloned());
    manager.set_modules(modules.clone()).await;
    manager.set_features(flags.enabled_names(&user_key)).await;

    let started = manager
        .dispatch_hook(hook_names::APP_START, &[json!({ "role": role })])
        .await;
    tracing::info!(
        handlers = started.results.len(),
        failures = started.failures,
        "Startup hook dispatched"
    );

    // ── Step 3: Routes and navigation ───────────────────────────
    let routes = registry.visible_routes(role, &flag_map);

    let mut navigation = load_navigation(&config, role).await?;
    for contribution in manager
        .execute_hooks(hook_names::NAVIGATION_ITEMS, &[])
        .await
        .into_iter()
        .flatten()
    {
        match serde_json::from_value::<Vec<NavItem>>(contribution) {
            Ok(items) => navigation.secondary.extend(items),
            Err(e) => tracing::warn!(error = %e, "Ignoring malformed navigation contribution"),
        }
    }
    let navigation = filter_navigation(&navigation, &modules, &flag_map);

    tracing::info!(
        role = %role,
        routes = routes.len(),
        primary = navigation.primary.len(),
        "Projection ready"
    );

    let projection = json!({
        "role": role,
        "plugins": manager.list_plugins().await,
        "modules": modules,
        "features": flags.enabled_names(&user_key),
        "routes": routes,
        "navigation": navigation,
    });
    let rendered = serde_json::to_string_pretty(&projection)
        .map_err(|e| AppError::internal(format!("Cannot render projection: {e}")))?;
    println!("{rendered}");

    // ── Step 4: Shutdown ────────────────────────────────────────
    manager.cleanup().await;
    tracing::info!("Homni shutdown complete");

    Ok(())
}
