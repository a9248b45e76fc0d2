//! The capability interface a loaded plugin module exposes.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::api::context::PluginContext;
use crate::hooks::registry::HookHandler;
use crate::manifest::PluginManifest;

/// A plugin module as returned by a `ModuleResolver`.
///
/// Every capability is optional: the defaults do nothing, contribute no
/// hooks and export no functions.
#[async_trait]
pub trait PluginModule: Send + Sync + std::fmt::Debug {
    /// Called once after the module is resolved, before hooks are registered.
    async fn init(&self, _context: &PluginContext, _manifest: &PluginManifest) -> Result<(), String> {
        Ok(())
    }

    /// Called when the plugin is unloaded. Errors are logged, never propagated.
    async fn cleanup(&self) -> Result<(), String> {
        Ok(())
    }

    /// Hook handlers contributed by this module, as `(hook name, handler)`.
    fn hooks(&self) -> Vec<(String, Arc<dyn HookHandler>)> {
        Vec::new()
    }

    /// Names of functions callable through `execute_plugin_function`.
    fn exported_functions(&self) -> Vec<String> {
        Vec::new()
    }

    /// Invokes an exported function.
    async fn call(&self, function: &str, _args: Vec<Value>) -> Result<Value, String> {
        Err(format!("function '{function}' is not implemented"))
    }
}
