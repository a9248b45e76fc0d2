//! Per-user notification preferences and unread counters.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

/// Delivery channels, in the order they are tried.
pub const CHANNELS: [&str; 3] = ["email", "sms", "push"];

/// On/off setting for a channel or notification type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelSetting {
    /// Whether the channel or type is enabled.
    pub enabled: bool,
}

/// Channel and type settings keyed by name.
pub type Preferences = BTreeMap<String, ChannelSetting>;

/// Preferences for users that never changed anything.
pub fn default_preferences() -> Preferences {
    [
        ("email", true),
        ("sms", false),
        ("push", true),
        ("lead_created", true),
        ("lead_distributed", true),
        ("maintenance_reminder", true),
    ]
    .into_iter()
    .map(|(name, enabled)| (name.to_string(), ChannelSetting { enabled }))
    .collect()
}

/// In-memory plugin state.
#[derive(Debug, Default)]
pub struct NotificationState {
    /// User id → explicit preferences.
    preferences: RwLock<HashMap<String, Preferences>>,
    /// User id → unread notifications.
    unread: RwLock<HashMap<String, u64>>,
}

impl NotificationState {
    /// Creates empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Effective preferences for a user.
    pub async fn preferences(&self, user_id: &str) -> Preferences {
        let stored = self.preferences.read().await;
        stored.get(user_id).cloned().unwrap_or_else(default_preferences)
    }

    /// Merges `changes` into a user's preferences and returns the result.
    pub async fn update_preferences(&self, user_id: &str, changes: Preferences) -> Preferences {
        let mut stored = self.preferences.write().await;
        let entry = stored
            .entry(user_id.to_string())
            .or_insert_with(default_preferences);
        entry.extend(changes);
        entry.clone()
    }

    /// Whether a key is enabled for the user. Unknown keys are off.
    pub async fn is_enabled(&self, user_id: &str, key: &str) -> bool {
        self.preferences(user_id)
            .await
            .get(key)
            .is_some_and(|setting| setting.enabled)
    }

    /// Records a delivered notification.
    pub async fn record_sent(&self, user_id: &str) {
        *self.unread.write().await.entry(user_id.to_string()).or_insert(0) += 1;
    }

    /// Records a read notification.
    pub async fn record_read(&self, user_id: &str) {
        if let Some(count) = self.unread.write().await.get_mut(user_id) {
            *count = count.saturating_sub(1);
        }
    }

    /// Unread notifications for a user.
    pub async fn unread_count(&self, user_id: &str) -> u64 {
        self.unread.read().await.get(user_id).copied().unwrap_or(0)
    }

    /// Drops all state.
    pub async fn clear(&self) {
        self.preferences.write().await.clear();
        self.unread.write().await.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_update_merges_over_defaults() {
        let state = NotificationState::new();
        assert!(!state.is_enabled("u1", "sms").await);

        let changes = Preferences::from([("sms".to_string(), ChannelSetting { enabled: true })]);
        let merged = state.update_preferences("u1", changes).await;

        assert!(merged["sms"].enabled);
        assert!(merged["email"].enabled);
        assert!(!state.is_enabled("u2", "sms").await);
    }

    #[tokio::test]
    async fn test_unread_never_negative() {
        let state = NotificationState::new();
        state.record_read("u1").await;
        state.record_sent("u1").await;
        state.record_sent("u1").await;
        state.record_read("u1").await;
        assert_eq!(state.unread_count("u1").await, 1);
    }
}
