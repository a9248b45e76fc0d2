//! Loads the notifications plugin through a real `PluginManager`.

use std::sync::Arc;

use serde_json::json;
use uuid::Uuid;

use homni_core::UserRole;
use homni_plugin::prelude::*;
use homni_plugin::{InMemoryManifestStore, PluginManager, PluginSettings, StaticModuleResolver};
use plugin_notifications::{ENTRY_POINT, NotificationsPlugin, manifest};

async fn manager_for(user: UserProfile) -> PluginManager {
    let store = Arc::new(InMemoryManifestStore::new(vec![manifest()]));
    let resolver = Arc::new(StaticModuleResolver::new().with_module(ENTRY_POINT, || {
        Arc::new(NotificationsPlugin::new()) as Arc<dyn PluginModule>
    }));
    let manager = PluginManager::new(store, resolver, PluginSettings::default());
    let report = manager.initialize(user, None).await;
    assert!(report.is_clean());
    manager
}

#[tokio::test]
async fn test_send_then_read_updates_unread_count() {
    let user_id = Uuid::new_v4();
    let manager = manager_for(UserProfile::new(user_id, UserRole::User)).await;
    assert!(manager.is_plugin_active("notifications").await);

    let results = manager
        .execute_hooks(hook_names::NOTIFICATION_SEND, &[json!({ "type": "lead_created" })])
        .await;
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].as_ref().unwrap()["sent"], json!(true));

    let count = manager
        .execute_plugin_function("notifications", "unread_count", vec![json!(user_id.to_string())])
        .await
        .unwrap();
    assert_eq!(count, json!(1));

    manager
        .execute_hooks(hook_names::NOTIFICATION_READ, &[json!({})])
        .await;
    let count = manager
        .execute_plugin_function("notifications", "unread_count", vec![json!(user_id.to_string())])
        .await
        .unwrap();
    assert_eq!(count, json!(0));
}

#[tokio::test]
async fn test_disabled_type_is_not_sent() {
    let user_id = Uuid::new_v4();
    let manager = manager_for(UserProfile::new(user_id, UserRole::Company)).await;

    manager
        .execute_plugin_function(
            "notifications",
            "set_preferences",
            vec![
                json!(user_id.to_string()),
                json!({ "lead_created": { "enabled": false } }),
            ],
        )
        .await
        .unwrap();

    let results = manager
        .execute_hooks(hook_names::NOTIFICATION_SEND, &[json!({ "type": "lead_created" })])
        .await;
    assert_eq!(
        results[0],
        Some(json!({ "sent": false, "reason": "disabled_by_user" }))
    );

    let prefs = manager
        .execute_hooks(hook_names::USER_PREFERENCES, &[])
        .await;
    assert_eq!(
        prefs[0].as_ref().unwrap()["notifications"]["lead_created"]["enabled"],
        json!(false)
    );
}

#[tokio::test]
async fn test_guest_sees_no_navigation_and_unload_removes_hooks() {
    let manager = manager_for(UserProfile::anonymous()).await;

    let nav = manager
        .execute_hooks(hook_names::NAVIGATION_ITEMS, &[])
        .await;
    assert_eq!(nav, vec![Some(json!([]))]);

    assert!(manager.unload_plugin("notifications").await);
    assert!(
        manager
            .execute_hooks(hook_names::DASHBOARD_WIDGETS, &[])
            .await
            .is_empty()
    );
    assert!(
        manager
            .execute_plugin_function("notifications", "unread_count", vec![json!("x")])
            .await
            .is_err()
    );
}
