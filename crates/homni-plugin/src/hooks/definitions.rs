//! Well-known hook names and the handler output type.
//!
//! Hook names are open strings; the constants below are the extension
//! points the host application fires.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::context::ContextUpdate;

// ── Lifecycle ──
/// Fired once after the manager finished loading plugins.
pub const APP_START: &str = "app:start";

// ── Notifications ──
/// Fired to deliver a notification.
pub const NOTIFICATION_SEND: &str = "notification:send";
/// Fired when a notification is read.
pub const NOTIFICATION_READ: &str = "notification:read";
/// Fired after a notification reached a channel.
pub const NOTIFICATION_DELIVERED: &str = "notification:delivered";

// ── User ──
/// Fired to collect per-user preference panels.
pub const USER_PREFERENCES: &str = "user:preferences";

// ── UI contributions ──
/// Fired to collect extra navigation items.
pub const NAVIGATION_ITEMS: &str = "navigation:items";
/// Fired to collect dashboard widgets.
pub const DASHBOARD_WIDGETS: &str = "dashboard:widgets";

// ── Domain events ──
/// Fired after a lead was created.
pub const LEAD_CREATED: &str = "lead:created";
/// Fired after a lead was distributed to a buyer.
pub const LEAD_DISTRIBUTED: &str = "lead:distributed";
/// Fired after a property was created.
pub const PROPERTY_CREATED: &str = "property:created";

/// What a hook handler returns on success.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HookOutput {
    /// The value placed in the handler's result slot.
    pub value: Value,
    /// Optional change to the context, visible to later handlers.
    #[serde(default)]
    pub context_update: Option<ContextUpdate>,
}

impl HookOutput {
    /// Output carrying only a value.
    pub fn value(value: Value) -> Self {
        Self {
            value,
            context_update: None,
        }
    }

    /// Output with a `null` value.
    pub fn empty() -> Self {
        Self::value(Value::Null)
    }

    /// Attaches a context update.
    pub fn with_update(mut self, update: ContextUpdate) -> Self {
        self.context_update = Some(update);
        self
    }
}

impl From<Value> for HookOutput {
    fn from(value: Value) -> Self {
        Self::value(value)
    }
}
