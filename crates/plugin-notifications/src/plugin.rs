//! Notifications plugin module and its manifest.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::info;

use homni_plugin::prelude::*;

use crate::hooks::{
    DashboardWidgetsHook, NavigationItemsHook, NotificationDeliveredHook, NotificationReadHook,
    SendNotificationHook, UserPreferencesHook,
};
use crate::preferences::{NotificationState, Preferences};

/// Locator the built-in resolver registers this module under.
pub const ENTRY_POINT: &str = "builtin://notifications";

/// Manifest for the notifications plugin.
pub fn manifest() -> PluginManifest {
    plugin_manifest!(
        id: "notifications",
        name: "Notifications Module",
        version: "1.0.0",
        entry_point: ENTRY_POINT,
        description: "In-app, email and push notification delivery",
    )
}

/// Notifications plugin for Homni
#[derive(Debug, Default)]
pub struct NotificationsPlugin {
    /// Preferences and unread counters
    state: Arc<NotificationState>,
}

impl NotificationsPlugin {
    /// Create a new notifications plugin
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared plugin state
    pub fn state(&self) -> Arc<NotificationState> {
        self.state.clone()
    }
}

fn user_arg(args: &[Value], function: &str) -> Result<String, String> {
    args.first()
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| format!("{function}: first argument must be a user id"))
}

#[async_trait]
impl PluginModule for NotificationsPlugin {
    async fn init(&self, context: &PluginContext, manifest: &PluginManifest) -> Result<(), String> {
        info!(
            plugin_id = %manifest.id,
            version = %manifest.version,
            user_id = %context.user.id,
            "Notifications module initialized"
        );
        Ok(())
    }

    async fn cleanup(&self) -> Result<(), String> {
        self.state.clear().await;
        info!("Notifications module cleaned up");
        Ok(())
    }

    fn hooks(&self) -> Vec<(String, Arc<dyn HookHandler>)> {
        let handlers: [(&str, Arc<dyn HookHandler>); 6] = [
            (
                hook_names::NOTIFICATION_SEND,
                Arc::new(SendNotificationHook::new(self.state.clone())),
            ),
            (
                hook_names::NOTIFICATION_DELIVERED,
                Arc::new(NotificationDeliveredHook),
            ),
            (
                hook_names::NOTIFICATION_READ,
                Arc::new(NotificationReadHook::new(self.state.clone())),
            ),
            (
                hook_names::USER_PREFERENCES,
                Arc::new(UserPreferencesHook::new(self.state.clone())),
            ),
            (hook_names::NAVIGATION_ITEMS, Arc::new(NavigationItemsHook)),
            (hook_names::DASHBOARD_WIDGETS, Arc::new(DashboardWidgetsHook)),
        ];
        handlers
            .into_iter()
            .map(|(hook, handler)| (hook.to_string(), handler))
            .collect()
    }

    fn exported_functions(&self) -> Vec<String> {
        vec![
            "get_preferences".to_string(),
            "set_preferences".to_string(),
            "unread_count".to_string(),
        ]
    }

    async fn call(&self, function: &str, args: Vec<Value>) -> Result<Value, String> {
        match function {
            "get_preferences" => {
                let user_id = user_arg(&args, function)?;
                serde_json::to_value(self.state.preferences(&user_id).await)
                    .map_err(|e| e.to_string())
            }
            "set_preferences" => {
                let user_id = user_arg(&args, function)?;
                let changes: Preferences = args
                    .get(1)
                    .cloned()
                    .map(serde_json::from_value)
                    .transpose()
                    .map_err(|e| format!("{function}: invalid preferences: {e}"))?
                    .unwrap_or_default();
                let merged = self.state.update_preferences(&user_id, changes).await;
                serde_json::to_value(merged).map_err(|e| e.to_string())
            }
            "unread_count" => {
                let user_id = user_arg(&args, function)?;
                Ok(json!(self.state.unread_count(&user_id).await))
            }
            other => Err(format!("function '{other}' is not implemented")),
        }
    }
}
