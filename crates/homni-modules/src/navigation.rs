//! Navigation trees and their projections.
//!
//! Filtering, breadcrumb lookup and flattening are pure functions over a
//! [`NavConfig`]; nothing here mutates its input.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use homni_core::UserRole;
use homni_core::error::AppError;
use homni_core::result::AppResult;

/// One navigation entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavItem {
    /// Target path or URL.
    pub href: String,
    /// Label.
    pub title: String,
    /// Icon identifier.
    #[serde(default)]
    pub icon: Option<String>,
    /// Longer description.
    #[serde(default)]
    pub description: Option<String>,
    /// Badge text.
    #[serde(default)]
    pub badge: Option<String>,
    /// Whether `href` leaves the application.
    #[serde(default)]
    pub external: bool,
    /// Nested items.
    #[serde(default)]
    pub children: Vec<NavItem>,
    /// Module that must be enabled for the item to show.
    #[serde(default)]
    pub module_key: Option<String>,
    /// Feature flag that must be on for the item to show.
    #[serde(default)]
    pub feature_flag: Option<String>,
}

impl NavItem {
    /// Creates a plain item.
    pub fn new(href: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            title: title.into(),
            icon: None,
            description: None,
            badge: None,
            external: false,
            children: Vec::new(),
            module_key: None,
            feature_flag: None,
        }
    }

    /// Sets the icon.
    pub fn icon(mut self, icon: &str) -> Self {
        self.icon = Some(icon.to_string());
        self
    }

    /// Sets the description.
    pub fn describe(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    /// Requires a module.
    pub fn module(mut self, module_key: &str) -> Self {
        self.module_key = Some(module_key.to_string());
        self
    }

    /// Requires a feature flag.
    pub fn flag(mut self, flag: &str) -> Self {
        self.feature_flag = Some(flag.to_string());
        self
    }

    /// Sets the children.
    pub fn with_children(mut self, children: Vec<NavItem>) -> Self {
        self.children = children;
        self
    }
}

/// Navigation sections rendered by the shell.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavConfig {
    /// Main navigation.
    #[serde(default)]
    pub primary: Vec<NavItem>,
    /// Settings, profile and similar.
    #[serde(default)]
    pub secondary: Vec<NavItem>,
    /// Command palette actions.
    #[serde(default)]
    pub quick_actions: Vec<NavItem>,
    /// Mobile navigation.
    #[serde(default)]
    pub mobile: Vec<NavItem>,
}

impl NavConfig {
    /// Reads a navigation tree from a JSON file.
    pub async fn from_json_file(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
            AppError::configuration(format!(
                "Cannot read navigation file '{}': {e}",
                path.display()
            ))
        })?;
        let config: NavConfig = serde_json::from_str(&raw)?;
        debug!(
            path = %path.display(),
            primary = config.primary.len(),
            "Navigation loaded"
        );
        Ok(config)
    }
}

/// Whether an item's feature flag (if any) is on.
pub fn is_nav_item_visible(item: &NavItem, enabled_flags: &HashMap<String, bool>) -> bool {
    match &item.feature_flag {
        None => true,
        Some(flag) => enabled_flags.get(flag).copied().unwrap_or(false),
    }
}

/// Keeps items whose flag is on and whose module is enabled, recursively.
pub fn filter_navigation(
    config: &NavConfig,
    enabled_modules: &[String],
    enabled_flags: &HashMap<String, bool>,
) -> NavConfig {
    let filter = |items: &[NavItem]| filter_items(items, enabled_modules, enabled_flags);
    NavConfig {
        primary: filter(&config.primary),
        secondary: filter(&config.secondary),
        quick_actions: filter(&config.quick_actions),
        mobile: filter(&config.mobile),
    }
}

fn filter_items(
    items: &[NavItem],
    enabled_modules: &[String],
    enabled_flags: &HashMap<String, bool>,
) -> Vec<NavItem> {
    items
        .iter()
        .filter(|item| is_nav_item_visible(item, enabled_flags))
        .filter(|item| {
            item.module_key
                .as_ref()
                .is_none_or(|key| enabled_modules.contains(key))
        })
        .map(|item| NavItem {
            children: filter_items(&item.children, enabled_modules, enabled_flags),
            ..item.clone()
        })
        .collect()
}

/// Ancestor chain of the first item whose `href` equals `path`.
///
/// Searches `primary` then `secondary`, depth first. Empty when nothing matches.
pub fn get_breadcrumbs(path: &str, config: &NavConfig) -> Vec<NavItem> {
    let mut trail = Vec::new();
    for items in [&config.primary, &config.secondary] {
        if find_trail(items, path, &mut trail) {
            return trail;
        }
    }
    Vec::new()
}

fn find_trail(items: &[NavItem], path: &str, trail: &mut Vec<NavItem>) -> bool {
    for item in items {
        trail.push(item.clone());
        if item.href == path || find_trail(&item.children, path, trail) {
            return true;
        }
        trail.pop();
    }
    false
}

/// Pre-order list of every item in `primary`, `secondary` and `quick_actions`.
pub fn flatten_navigation(config: &NavConfig) -> Vec<NavItem> {
    let mut out = Vec::new();
    for items in [&config.primary, &config.secondary, &config.quick_actions] {
        flatten_into(items, &mut out);
    }
    out
}

fn flatten_into(items: &[NavItem], out: &mut Vec<NavItem>) {
    for item in items {
        out.push(item.clone());
        flatten_into(&item.children, out);
    }
}

/// Built-in navigation tree for a role.
pub fn default_navigation(role: UserRole) -> NavConfig {
    let core = vec![NavItem::new("/", "Hjem").icon("home").describe("Hovedside og oversikt")];

    let user = vec![
        NavItem::new("/dashboard", "Dashboard").icon("bar-chart").describe("Personlig oversikt"),
        NavItem::new("/properties", "Eiendommer")
            .icon("building")
            .describe("Administrer eiendommer")
            .module("property_management")
            .flag("ENABLE_PROPERTY_MANAGEMENT"),
        NavItem::new("/profile", "Profil").icon("users").describe("Rediger profil"),
    ];

    let company = vec![
        NavItem::new("/dashboard/company", "Bedriftsoversikt").icon("building"),
        NavItem::new("/company/leads", "Leads")
            .icon("users")
            .describe("Administrer kundehenvendelser")
            .module("lead_management")
            .with_children(vec![
                NavItem::new("/leads/my", "Mine leads").icon("target"),
                NavItem::new("/marketplace", "Lead-markedsplass")
                    .icon("briefcase")
                    .module("lead_marketplace")
                    .flag("ENABLE_LEAD_MARKETPLACE"),
            ]),
        NavItem::new("/leads/intelligence", "Lead Intelligence")
            .icon("bar-chart")
            .module("analytics"),
    ];

    let admin = vec![
        NavItem::new("/dashboard/admin", "Admin Dashboard").icon("shield"),
        NavItem::new("/admin/users", "Brukere").icon("users").module("user_management"),
        NavItem::new("/admin/companies", "Bedrifter")
            .icon("building")
            .module("company_management"),
        NavItem::new("/admin/system", "System")
            .icon("settings")
            .module("system_management"),
    ];

    let content_editor = vec![
        NavItem::new("/dashboard/content-editor", "Innhold").icon("file-text"),
        NavItem::new("/content/articles", "Artikler")
            .icon("file-text")
            .module("content_management"),
        NavItem::new("/content/pages", "Sider")
            .icon("globe")
            .module("content_management"),
    ];

    let master_admin = vec![
        NavItem::new("/dashboard/master-admin", "Master Admin").icon("shield"),
        NavItem::new("/admin/modules", "Moduler").icon("zap").module("module_management"),
        NavItem::new("/admin/features", "Feature Flags")
            .icon("settings")
            .module("feature_management"),
    ];

    let secondary = vec![
        NavItem::new("/account", "Kontoinnstillinger").icon("settings"),
        NavItem::new("/notifications", "Varsler").icon("bell"),
    ];

    let quick_actions = vec![
        NavItem::new("/properties/new", "Legg til eiendom").icon("building"),
        NavItem::new("/leads/new", "Ny lead").icon("users"),
        NavItem::new("/help", "Hjelp").icon("file-text"),
    ];

    let concat = |sections: &[&[NavItem]]| -> Vec<NavItem> { sections.concat() };

    let (primary, mobile, secondary) = match role {
        UserRole::MasterAdmin => (
            concat(&[&core, &user, &company, &admin, &content_editor, &master_admin]),
            concat(&[&core, &user, &admin[..3]]),
            secondary,
        ),
        UserRole::Admin => (
            concat(&[&core, &user, &company, &admin, &content_editor]),
            concat(&[&core, &user, &admin[..3]]),
            secondary,
        ),
        UserRole::ContentEditor => (
            concat(&[&core, &user, &content_editor]),
            concat(&[&core, &user, &content_editor[..2]]),
            secondary,
        ),
        UserRole::Company => (
            concat(&[&core, &user, &company]),
            concat(&[&core, &user, &company[..2]]),
            secondary,
        ),
        UserRole::User => (concat(&[&core, &user]), concat(&[&core, &user]), secondary),
        UserRole::Guest => {
            let primary = concat(&[&core, &[NavItem::new("/login", "Logg inn").icon("users")]]);
            (primary.clone(), primary, Vec::new())
        }
    };

    NavConfig {
        primary,
        secondary,
        quick_actions,
        mobile: mobile.into_iter().take(5).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flags(pairs: &[(&str, bool)]) -> HashMap<String, bool> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    fn hrefs(items: &[NavItem]) -> Vec<&str> {
        items.iter().map(|i| i.href.as_str()).collect()
    }

    fn sample() -> NavConfig {
        NavConfig {
            primary: vec![
                NavItem::new("/", "Home"),
                NavItem::new("/beta", "Beta").flag("X"),
                NavItem::new("/leads", "Leads")
                    .module("lead_management")
                    .with_children(vec![
                        NavItem::new("/leads/my", "Mine"),
                        NavItem::new("/leads/market", "Market").flag("Y"),
                    ]),
            ],
            secondary: vec![NavItem::new("/account", "Account")],
            quick_actions: vec![NavItem::new("/help", "Help")],
            mobile: vec![],
        }
    }

    #[test]
    fn test_flag_toggles_only_its_item() {
        let config = sample();
        let modules = vec!["lead_management".to_string()];

        let off = filter_navigation(&config, &modules, &flags(&[("X", false)]));
        assert_eq!(hrefs(&off.primary), vec!["/", "/leads"]);

        let on = filter_navigation(&config, &modules, &flags(&[("X", true)]));
        assert_eq!(hrefs(&on.primary), vec!["/", "/beta", "/leads"]);
        assert_eq!(on.secondary, config.secondary);
    }

    #[test]
    fn test_children_filtered_independently() {
        let config = sample();
        let modules = vec!["lead_management".to_string()];

        let filtered = filter_navigation(&config, &modules, &flags(&[]));
        assert_eq!(hrefs(&filtered.primary[1].children), vec!["/leads/my"]);
        // Input untouched.
        assert_eq!(config.primary[2].children.len(), 2);

        let without_module = filter_navigation(&config, &[], &flags(&[("Y", true)]));
        assert_eq!(hrefs(&without_module.primary), vec!["/"]);
    }

    #[test]
    fn test_breadcrumbs() {
        let config = sample();
        let trail = get_breadcrumbs("/leads/market", &config);
        assert_eq!(hrefs(&trail), vec!["/leads", "/leads/market"]);

        assert_eq!(hrefs(&get_breadcrumbs("/account", &config)), vec!["/account"]);
        // Quick actions are not searched.
        assert!(get_breadcrumbs("/help", &config).is_empty());
        assert!(get_breadcrumbs("/nowhere", &config).is_empty());
    }

    #[test]
    fn test_flatten_pre_order() {
        let flat = flatten_navigation(&sample());
        assert_eq!(
            hrefs(&flat),
            vec!["/", "/beta", "/leads", "/leads/my", "/leads/market", "/account", "/help"]
        );
    }

    #[test]
    fn test_default_navigation() {
        let guest = default_navigation(UserRole::Guest);
        assert_eq!(hrefs(&guest.primary), vec!["/", "/login"]);
        assert!(guest.secondary.is_empty());

        let master = default_navigation(UserRole::MasterAdmin);
        assert_eq!(master.mobile.len(), 5);
        assert!(hrefs(&master.primary).contains(&"/admin/modules"));
        assert!(!hrefs(&default_navigation(UserRole::Admin).primary).contains(&"/admin/modules"));
    }
}
