//! Hook handlers grouped by hook name in priority order.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::definitions::HookOutput;
use crate::api::context::PluginContext;

/// A single extension-point handler contributed by a plugin.
#[async_trait]
pub trait HookHandler: Send + Sync + std::fmt::Debug {
    /// Handler name, unique within its plugin and hook.
    fn name(&self) -> &str;

    /// Execution priority (higher runs first).
    fn priority(&self) -> i32 {
        0
    }

    /// Handles one invocation.
    async fn execute(&self, context: &PluginContext, args: &[Value]) -> Result<HookOutput, String>;
}

/// Entry in the hook registry.
#[derive(Debug, Clone)]
pub struct RegisteredHook {
    /// Plugin that registered this handler.
    pub plugin_id: String,
    /// The handler.
    pub handler: Arc<dyn HookHandler>,
}

impl RegisteredHook {
    fn priority(&self) -> i32 {
        self.handler.priority()
    }

    fn same_identity(&self, plugin_id: &str, name: &str) -> bool {
        self.plugin_id == plugin_id && self.handler.name() == name
    }
}

/// Registry of hook handlers organized by hook name.
#[derive(Debug)]
pub struct HookRegistry {
    /// Hook name → handlers sorted by descending priority.
    handlers: RwLock<HashMap<String, Vec<RegisteredHook>>>,
}

impl HookRegistry {
    /// Creates a new empty hook registry.
    pub fn new() -> Self {
        Self {
            handlers: RwLock::new(HashMap::new()),
        }
    }

    /// Appends handlers to a hook, then re-sorts by descending priority.
    ///
    /// The sort is stable, so equal priorities keep registration order.
    pub async fn register_hooks(
        &self,
        hook_name: &str,
        plugin_id: &str,
        handlers: Vec<Arc<dyn HookHandler>>,
    ) {
        if handlers.is_empty() {
            return;
        }

        let count = handlers.len();
        let mut map = self.handlers.write().await;
        let entries = map.entry(hook_name.to_string()).or_default();

        entries.extend(handlers.into_iter().map(|handler| RegisteredHook {
            plugin_id: plugin_id.to_string(),
            handler,
        }));
        entries.sort_by(|a, b| b.priority().cmp(&a.priority()));

        info!(
            hook = %hook_name,
            plugin_id = %plugin_id,
            count = count,
            "Hook handlers registered"
        );
    }

    /// Removes the given handlers of one plugin from a hook.
    ///
    /// Returns how many entries were removed. The hook name disappears once
    /// its list is empty.
    pub async fn unregister_hooks(
        &self,
        hook_name: &str,
        plugin_id: &str,
        handlers: &[Arc<dyn HookHandler>],
    ) -> usize {
        let mut map = self.handlers.write().await;
        let Some(entries) = map.get_mut(hook_name) else {
            return 0;
        };

        let before = entries.len();
        entries.retain(|entry| {
            !handlers
                .iter()
                .any(|h| entry.same_identity(plugin_id, h.name()))
        });
        let removed = before - entries.len();

        if entries.is_empty() {
            map.remove(hook_name);
        }

        debug!(
            hook = %hook_name,
            plugin_id = %plugin_id,
            removed = removed,
            "Hook handlers unregistered"
        );
        removed
    }

    /// Unregisters all handlers for a specific plugin.
    pub async fn unregister_plugin(&self, plugin_id: &str) {
        let mut map = self.handlers.write().await;

        for entries in map.values_mut() {
            entries.retain(|e| e.plugin_id != plugin_id);
        }
        map.retain(|_, entries| !entries.is_empty());

        info!(plugin_id = %plugin_id, "All hooks unregistered for plugin");
    }

    /// Returns the handlers of a hook in execution order.
    pub async fn get_handlers(&self, hook_name: &str) -> Vec<RegisteredHook> {
        let map = self.handlers.read().await;
        map.get(hook_name).cloned().unwrap_or_default()
    }

    /// Returns whether any handlers are registered for a hook.
    pub async fn has_handlers(&self, hook_name: &str) -> bool {
        let map = self.handlers.read().await;
        map.get(hook_name).is_some_and(|entries| !entries.is_empty())
    }

    /// Returns the number of handlers registered for a hook.
    pub async fn handler_count(&self, hook_name: &str) -> usize {
        let map = self.handlers.read().await;
        map.get(hook_name).map(Vec::len).unwrap_or(0)
    }

    /// Returns all hook names with at least one handler, sorted.
    pub async fn registered_hooks(&self) -> Vec<String> {
        let map = self.handlers.read().await;
        let mut names: Vec<String> = map.keys().cloned().collect();
        names.sort();
        names
    }
}

impl Default for HookRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::ClosureHandler;
    use serde_json::json;

    fn handler(name: &str, priority: i32) -> Arc<dyn HookHandler> {
        let label = name.to_string();
        Arc::new(ClosureHandler::new(name, priority, move |_ctx, _args| {
            let label = label.clone();
            async move { Ok(HookOutput::value(json!(label))) }
        }))
    }

    fn names(entries: &[RegisteredHook]) -> Vec<String> {
        entries.iter().map(|e| e.handler.name().to_string()).collect()
    }

    #[tokio::test]
    async fn test_descending_priority_stable_for_ties() {
        let registry = HookRegistry::new();
        registry
            .register_hooks(
                "dashboard:widgets",
                "p",
                vec![handler("p3a", 3), handler("p1", 1), handler("p3b", 3), handler("p2", 2)],
            )
            .await;

        let entries = registry.get_handlers("dashboard:widgets").await;
        assert_eq!(names(&entries), vec!["p3a", "p3b", "p2", "p1"]);
    }

    #[tokio::test]
    async fn test_unregister_removes_empty_hook() {
        let registry = HookRegistry::new();
        let a = handler("a", 10);
        let b = handler("b", 5);
        registry
            .register_hooks("notification:send", "plugin-a", vec![a.clone(), b.clone()])
            .await;

        assert_eq!(registry.unregister_hooks("notification:send", "plugin-a", &[a]).await, 1);
        assert_eq!(registry.handler_count("notification:send").await, 1);

        // Same name under another plugin does not match.
        assert_eq!(
            registry
                .unregister_hooks("notification:send", "plugin-x", std::slice::from_ref(&b))
                .await,
            0
        );

        registry.unregister_hooks("notification:send", "plugin-a", &[b]).await;
        assert!(!registry.has_handlers("notification:send").await);
        assert!(registry.registered_hooks().await.is_empty());
    }

    #[tokio::test]
    async fn test_unregister_plugin() {
        let registry = HookRegistry::new();
        registry.register_hooks("a:x", "one", vec![handler("h", 0)]).await;
        registry.register_hooks("a:y", "one", vec![handler("h", 0)]).await;
        registry.register_hooks("a:y", "two", vec![handler("h", 0)]).await;

        registry.unregister_plugin("one").await;

        assert_eq!(registry.registered_hooks().await, vec!["a:y"]);
        assert_eq!(registry.get_handlers("a:y").await[0].plugin_id, "two");
    }
}
