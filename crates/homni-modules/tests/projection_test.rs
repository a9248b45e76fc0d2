//! End-to-end projection: catalog + flags + navigation for one user.

use std::collections::HashMap;

use homni_core::UserRole;
use homni_modules::navigation::default_navigation;
use homni_modules::{
    FeatureFlag, FeatureFlagSet, ModuleRegistry, NavConfig, filter_navigation, flatten_navigation,
    get_breadcrumbs,
};

fn company_flags() -> FeatureFlagSet {
    FeatureFlagSet::new(vec![
        FeatureFlag::new("ENABLE_LEAD_MANAGEMENT", true),
        FeatureFlag::new("ENABLE_PROPERTY_MANAGEMENT", true),
        FeatureFlag::new("ENABLE_LEAD_MARKETPLACE", false),
    ])
}

#[test]
fn test_company_projection() {
    let registry = ModuleRegistry::default();
    let flags = company_flags().applicable_for(UserRole::Company);
    let flag_map = flags.as_map("company-1");

    let modules = registry.active_module_ids();
    let nav = filter_navigation(&default_navigation(UserRole::Company), &modules, &flag_map);

    let hrefs: Vec<String> = flatten_navigation(&nav).into_iter().map(|i| i.href).collect();
    assert!(hrefs.contains(&"/properties".to_string()));
    assert!(hrefs.contains(&"/leads/my".to_string()));
    assert!(!hrefs.contains(&"/marketplace".to_string()));

    let trail: Vec<String> = get_breadcrumbs("/leads/my", &nav)
        .into_iter()
        .map(|i| i.title)
        .collect();
    assert_eq!(trail, vec!["Leads", "Mine leads"]);

    let routes: Vec<String> = registry
        .visible_routes(UserRole::Company, &flag_map)
        .into_iter()
        .map(|r| r.path)
        .collect();
    assert!(routes.contains(&"/company/leads".to_string()));
    assert!(!routes.contains(&"/marketplace".to_string()));
}

#[test]
fn test_marketplace_appears_when_enabled() {
    let mut registry = ModuleRegistry::default();
    registry.toggle_module("lead_marketplace", true).unwrap();

    let mut flags = company_flags();
    flags.apply_overrides(&HashMap::from([(
        "ENABLE_LEAD_MARKETPLACE".to_string(),
        true,
    )]));

    let nav = filter_navigation(
        &default_navigation(UserRole::Company),
        &registry.active_module_ids(),
        &flags.as_map("company-1"),
    );
    let hrefs: Vec<String> = flatten_navigation(&nav).into_iter().map(|i| i.href).collect();
    assert!(hrefs.contains(&"/marketplace".to_string()));

    let paths: Vec<String> = registry
        .routes_for_role(UserRole::Company)
        .into_iter()
        .map(|r| r.path)
        .collect();
    assert!(paths.contains(&"/marketplace".to_string()));
    assert!(!paths.contains(&"/marketplace/packages".to_string()));
}

#[tokio::test]
async fn test_json_files_round_into_projections() {
    let dir = std::env::temp_dir().join(format!("homni-nav-{}", uuid::Uuid::new_v4()));
    tokio::fs::create_dir_all(&dir).await.unwrap();

    let nav_path = dir.join("navigation.json");
    tokio::fs::write(
        &nav_path,
        r#"{
            "primary": [
                {"href": "/", "title": "Hjem"},
                {"href": "/beta", "title": "Beta", "feature_flag": "BETA"}
            ],
            "secondary": [{"href": "/account", "title": "Konto"}]
        }"#,
    )
    .await
    .unwrap();

    let flags_path = dir.join("flags.json");
    tokio::fs::write(
        &flags_path,
        r#"[{"name": "BETA", "is_enabled": true, "target_roles": ["admin"]}]"#,
    )
    .await
    .unwrap();

    let nav = NavConfig::from_json_file(&nav_path).await.unwrap();
    let flags = FeatureFlagSet::from_json_file(&flags_path).await.unwrap();
    assert_eq!(flags.get("BETA").unwrap().rollout_percentage, 100);

    let as_user = filter_navigation(&nav, &[], &flags.applicable_for(UserRole::User).as_map("u"));
    assert_eq!(as_user.primary.len(), 1);

    let as_admin = filter_navigation(&nav, &[], &flags.applicable_for(UserRole::Admin).as_map("u"));
    assert_eq!(as_admin.primary.len(), 2);

    assert!(NavConfig::from_json_file(dir.join("missing.json")).await.is_err());

    let _ = tokio::fs::remove_dir_all(&dir).await;
}
