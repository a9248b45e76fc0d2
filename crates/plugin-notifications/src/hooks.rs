//! Hook implementations for the notifications plugin.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::{debug, info};

use homni_plugin::prelude::*;

use crate::preferences::{CHANNELS, NotificationState};

/// Priority shared by every notifications hook.
pub const PRIORITY: i32 = 75;

/// Recipient of a payload: its `recipient` field, else the current user.
fn recipient(context: &PluginContext, payload: &Value) -> String {
    payload
        .get("recipient")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| context.user.id.to_string())
}

fn first_arg(args: &[Value]) -> &Value {
    args.first().unwrap_or(&Value::Null)
}

/// `notification:send`: delivers over every channel the recipient enabled.
#[derive(Debug)]
pub struct SendNotificationHook {
    state: Arc<NotificationState>,
}

impl SendNotificationHook {
    /// Create a new send hook handler
    pub fn new(state: Arc<NotificationState>) -> Self {
        Self { state }
    }
}

#[async_trait]
impl HookHandler for SendNotificationHook {
    fn name(&self) -> &str {
        "sendNotification"
    }

    fn priority(&self) -> i32 {
        PRIORITY
    }

    async fn execute(&self, context: &PluginContext, args: &[Value]) -> Result<HookOutput, String> {
        let payload = first_arg(args);
        let kind = payload
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| "notification payload has no 'type'".to_string())?;
        let recipient = recipient(context, payload);

        info!(kind = %kind, recipient = %recipient, "Send notification hook executed");

        if !self.state.is_enabled(&recipient, kind).await {
            return Ok(json!({ "sent": false, "reason": "disabled_by_user" }).into());
        }

        let preferences = self.state.preferences(&recipient).await;
        let channels: Vec<Value> = CHANNELS
            .iter()
            .filter(|channel| preferences.get(**channel).is_some_and(|s| s.enabled))
            .map(|channel| json!({ "channel": channel, "status": "sent" }))
            .collect();

        self.state.record_sent(&recipient).await;
        Ok(json!({
            "sent": true,
            "channels": channels,
            "sent_at": chrono::Utc::now().to_rfc3339(),
        })
        .into())
    }
}

/// `notification:delivered`: acknowledges a delivery receipt.
#[derive(Debug)]
pub struct NotificationDeliveredHook;

#[async_trait]
impl HookHandler for NotificationDeliveredHook {
    fn name(&self) -> &str {
        "onNotificationDelivered"
    }

    fn priority(&self) -> i32 {
        PRIORITY
    }

    async fn execute(&self, _context: &PluginContext, args: &[Value]) -> Result<HookOutput, String> {
        let payload = first_arg(args);
        debug!(
            notification_id = ?payload.get("id"),
            channel = ?payload.get("channel"),
            "Notification delivered"
        );
        Ok(json!({ "processed": true }).into())
    }
}

/// `notification:read`: marks a notification read for its recipient.
#[derive(Debug)]
pub struct NotificationReadHook {
    state: Arc<NotificationState>,
}

impl NotificationReadHook {
    /// Create a new read hook handler
    pub fn new(state: Arc<NotificationState>) -> Self {
        Self { state }
    }
}

#[async_trait]
impl HookHandler for NotificationReadHook {
    fn name(&self) -> &str {
        "onNotificationRead"
    }

    fn priority(&self) -> i32 {
        PRIORITY
    }

    async fn execute(&self, context: &PluginContext, args: &[Value]) -> Result<HookOutput, String> {
        let recipient = recipient(context, first_arg(args));
        self.state.record_read(&recipient).await;
        Ok(json!({ "marked": true }).into())
    }
}

/// `user:preferences`: the current user's notification preferences.
#[derive(Debug)]
pub struct UserPreferencesHook {
    state: Arc<NotificationState>,
}

impl UserPreferencesHook {
    /// Create a new preferences hook handler
    pub fn new(state: Arc<NotificationState>) -> Self {
        Self { state }
    }
}

#[async_trait]
impl HookHandler for UserPreferencesHook {
    fn name(&self) -> &str {
        "getNotificationPreferences"
    }

    fn priority(&self) -> i32 {
        PRIORITY
    }

    async fn execute(&self, context: &PluginContext, _args: &[Value]) -> Result<HookOutput, String> {
        let preferences = self.state.preferences(&context.user.id.to_string()).await;
        let value = serde_json::to_value(preferences).map_err(|e| e.to_string())?;
        Ok(json!({ "notifications": value }).into())
    }
}

/// `navigation:items`: a notifications entry for signed-in users.
#[derive(Debug)]
pub struct NavigationItemsHook;

#[async_trait]
impl HookHandler for NavigationItemsHook {
    fn name(&self) -> &str {
        "provideNavigationItems"
    }

    fn priority(&self) -> i32 {
        PRIORITY
    }

    async fn execute(&self, context: &PluginContext, _args: &[Value]) -> Result<HookOutput, String> {
        if context.user.is_anonymous() {
            return Ok(json!([]).into());
        }
        Ok(json!([{
            "href": "/notifications",
            "title": "Varsler",
            "icon": "Bell",
            "module_key": "notifications",
        }])
        .into())
    }
}

/// `dashboard:widgets`: the recent-notifications widget for signed-in users.
#[derive(Debug)]
pub struct DashboardWidgetsHook;

#[async_trait]
impl HookHandler for DashboardWidgetsHook {
    fn name(&self) -> &str {
        "provideDashboardWidgets"
    }

    fn priority(&self) -> i32 {
        PRIORITY
    }

    async fn execute(&self, context: &PluginContext, _args: &[Value]) -> Result<HookOutput, String> {
        if context.user.is_anonymous() {
            return Ok(json!([]).into());
        }
        Ok(json!([{
            "id": "recent-notifications",
            "title": "Siste varsler",
            "component": "RecentNotificationsWidget",
            "size": "medium",
        }])
        .into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use homni_core::UserRole;
    use uuid::Uuid;

    fn signed_in() -> PluginContext {
        PluginContext::new(UserProfile::new(Uuid::new_v4(), UserRole::User), None)
    }

    #[tokio::test]
    async fn test_send_respects_type_preference() {
        let state = Arc::new(NotificationState::new());
        let hook = SendNotificationHook::new(state.clone());
        let ctx = signed_in();

        let out = hook
            .execute(&ctx, &[json!({ "type": "lead_created", "recipient": "u1" })])
            .await
            .unwrap();
        assert_eq!(out.value["sent"], json!(true));
        let channels: Vec<&str> = out.value["channels"]
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["channel"].as_str().unwrap())
            .collect();
        assert_eq!(channels, vec!["email", "push"]);
        assert_eq!(state.unread_count("u1").await, 1);

        let out = hook
            .execute(&ctx, &[json!({ "type": "weekly_digest", "recipient": "u1" })])
            .await
            .unwrap();
        assert_eq!(out.value, json!({ "sent": false, "reason": "disabled_by_user" }));
        assert_eq!(state.unread_count("u1").await, 1);
    }

    #[tokio::test]
    async fn test_send_without_type_fails() {
        let hook = SendNotificationHook::new(Arc::new(NotificationState::new()));
        assert!(hook.execute(&signed_in(), &[]).await.is_err());
    }

    #[tokio::test]
    async fn test_anonymous_gets_no_contributions() {
        let guest = PluginContext::default();
        let nav = NavigationItemsHook.execute(&guest, &[]).await.unwrap();
        let widgets = DashboardWidgetsHook.execute(&guest, &[]).await.unwrap();
        assert_eq!(nav.value, json!([]));
        assert_eq!(widgets.value, json!([]));

        let nav = NavigationItemsHook.execute(&signed_in(), &[]).await.unwrap();
        assert_eq!(nav.value[0]["href"], json!("/notifications"));
    }
}
