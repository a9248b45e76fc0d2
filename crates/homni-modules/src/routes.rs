//! Route descriptors and the role-based route filter.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use homni_core::UserRole;

/// A route contributed by a module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleRoute {
    /// URL path pattern (`/leads/:id`).
    pub path: String,
    /// Component identifier the router mounts.
    pub component: String,
    /// Roles allowed to see the route. `None` means every role.
    #[serde(default)]
    pub roles: Option<Vec<UserRole>>,
    /// Feature flag gating the route.
    #[serde(default)]
    pub feature_flag: Option<String>,
    /// Whether the path must match exactly.
    #[serde(default)]
    pub exact: bool,
    /// Optional page title.
    #[serde(default)]
    pub title: Option<String>,
}

impl ModuleRoute {
    /// Creates an unrestricted route.
    pub fn new(path: impl Into<String>, component: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            component: component.into(),
            roles: None,
            feature_flag: None,
            exact: false,
            title: None,
        }
    }

    /// Restricts the route to the given roles.
    pub fn for_roles(mut self, roles: &[UserRole]) -> Self {
        self.roles = Some(roles.to_vec());
        self
    }

    /// Gates the route behind a feature flag.
    pub fn with_flag(mut self, flag: impl Into<String>) -> Self {
        self.feature_flag = Some(flag.into());
        self
    }

    /// Requires an exact path match.
    pub fn exact(mut self) -> Self {
        self.exact = true;
        self
    }

    /// Whether `role` may see this route.
    pub fn allows(&self, role: UserRole) -> bool {
        self.roles.as_ref().is_none_or(|roles| roles.contains(&role))
    }

    /// Whether the route's flag (if any) is on.
    pub fn flag_enabled(&self, enabled_flags: &HashMap<String, bool>) -> bool {
        self.feature_flag
            .as_ref()
            .is_none_or(|flag| enabled_flags.get(flag).copied().unwrap_or(false))
    }
}

/// Keeps the routes with no role set or whose role set contains `role`.
pub fn filter_routes_for_role(routes: &[ModuleRoute], role: UserRole) -> Vec<ModuleRoute> {
    routes.iter().filter(|r| r.allows(role)).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_filter() {
        let routes = vec![
            ModuleRoute::new("/admin/users", "UserManagement").for_roles(&[UserRole::Admin]),
            ModuleRoute::new("/properties", "PropertyDashboard")
                .for_roles(&[UserRole::User, UserRole::Company]),
            ModuleRoute::new("/", "Home").exact(),
        ];

        let visible = filter_routes_for_role(&routes, UserRole::User);
        let paths: Vec<&str> = visible.iter().map(|r| r.path.as_str()).collect();
        assert_eq!(paths, vec!["/properties", "/"]);

        let admin: Vec<String> = filter_routes_for_role(&routes, UserRole::Admin)
            .into_iter()
            .map(|r| r.path)
            .collect();
        assert_eq!(admin, vec!["/admin/users", "/"]);
    }

    #[test]
    fn test_flag_gate() {
        let route = ModuleRoute::new("/marketplace", "LeadMarketplace").with_flag("ENABLE_LEAD_MARKETPLACE");
        let mut flags = HashMap::new();
        assert!(!route.flag_enabled(&flags));
        flags.insert("ENABLE_LEAD_MARKETPLACE".to_string(), true);
        assert!(route.flag_enabled(&flags));
    }
}
