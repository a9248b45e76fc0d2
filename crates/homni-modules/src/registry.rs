//! Module registry: role and activation projections over the catalog.

use std::collections::HashMap;

use serde::Serialize;
use tracing::{info, warn};

use homni_core::error::AppError;
use homni_core::result::AppResult;
use homni_core::UserRole;

use crate::catalog::{ModuleCategory, ModuleMetadata, default_catalog};
use crate::routes::ModuleRoute;

/// Result of checking a module's dependencies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyCheck {
    /// Whether every dependency exists and is active.
    pub valid: bool,
    /// Dependencies that are unknown or inactive.
    pub missing: Vec<String>,
}

/// Registry of logical modules keyed by id.
#[derive(Debug, Clone)]
pub struct ModuleRegistry {
    /// Module id → metadata.
    modules: HashMap<String, ModuleMetadata>,
}

impl ModuleRegistry {
    /// Creates a registry from a catalog. Later entries replace earlier ones with the same id.
    pub fn new(catalog: Vec<ModuleMetadata>) -> Self {
        let modules = catalog.into_iter().map(|m| (m.id.clone(), m)).collect();
        Self { modules }
    }

    /// Registers or replaces a module.
    pub fn register(&mut self, module: ModuleMetadata) {
        self.modules.insert(module.id.clone(), module);
    }

    /// All modules, by `sort_order`.
    pub fn all_modules(&self) -> Vec<&ModuleMetadata> {
        let mut modules: Vec<&ModuleMetadata> = self.modules.values().collect();
        modules.sort_by(|a, b| a.sort_order.cmp(&b.sort_order).then_with(|| a.id.cmp(&b.id)));
        modules
    }

    /// Active modules, by `sort_order`.
    pub fn active_modules(&self) -> Vec<&ModuleMetadata> {
        self.all_modules().into_iter().filter(|m| m.is_active).collect()
    }

    /// Active modules available to `role`.
    pub fn modules_for_role(&self, role: UserRole) -> Vec<&ModuleMetadata> {
        self.active_modules()
            .into_iter()
            .filter(|m| m.available_to(role))
            .collect()
    }

    /// Active modules in a category.
    pub fn modules_by_category(&self, category: ModuleCategory) -> Vec<&ModuleMetadata> {
        self.active_modules()
            .into_iter()
            .filter(|m| m.category == category)
            .collect()
    }

    /// Looks up a module.
    pub fn get_module(&self, id: &str) -> Option<&ModuleMetadata> {
        self.modules.get(id)
    }

    /// Whether a module is active and available to `role`.
    pub fn is_module_available(&self, id: &str, role: UserRole) -> bool {
        self.get_module(id)
            .is_some_and(|m| m.is_active && m.available_to(role))
    }

    /// Ids of active modules, by `sort_order`.
    pub fn active_module_ids(&self) -> Vec<String> {
        self.active_modules().iter().map(|m| m.id.clone()).collect()
    }

    /// Routes of the modules available to `role`, filtered by route roles.
    pub fn routes_for_role(&self, role: UserRole) -> Vec<ModuleRoute> {
        self.modules_for_role(role)
            .into_iter()
            .flat_map(|m| m.routes.iter())
            .filter(|r| r.allows(role))
            .cloned()
            .collect()
    }

    /// Like [`routes_for_role`](Self::routes_for_role), also dropping routes
    /// whose feature flag is off.
    pub fn visible_routes(
        &self,
        role: UserRole,
        enabled_flags: &HashMap<String, bool>,
    ) -> Vec<ModuleRoute> {
        self.routes_for_role(role)
            .into_iter()
            .filter(|r| r.flag_enabled(enabled_flags))
            .collect()
    }

    /// Checks that every dependency of a module exists and is active.
    ///
    /// An unknown module is invalid with nothing missing.
    pub fn validate_dependencies(&self, id: &str) -> DependencyCheck {
        let Some(module) = self.get_module(id) else {
            return DependencyCheck {
                valid: false,
                missing: Vec::new(),
            };
        };

        let missing: Vec<String> = module
            .dependencies
            .iter()
            .filter(|dep| !self.get_module(dep).is_some_and(|d| d.is_active))
            .cloned()
            .collect();

        DependencyCheck {
            valid: missing.is_empty(),
            missing,
        }
    }

    /// Active modules that depend on `id`, by `sort_order`.
    pub fn active_dependents(&self, id: &str) -> Vec<String> {
        self.active_modules()
            .into_iter()
            .filter(|m| m.dependencies.iter().any(|d| d == id))
            .map(|m| m.id.clone())
            .collect()
    }

    /// Activates or deactivates a module.
    ///
    /// Deactivation is refused while active modules depend on it.
    pub fn toggle_module(&mut self, id: &str, is_active: bool) -> AppResult<()> {
        if !self.modules.contains_key(id) {
            return Err(AppError::not_found(format!("Module '{id}' not found")));
        }

        if !is_active {
            let dependents = self.active_dependents(id);
            if !dependents.is_empty() {
                warn!(
                    module_id = %id,
                    dependents = ?dependents,
                    "Cannot deactivate module with active dependents"
                );
                return Err(AppError::conflict(format!(
                    "Module '{id}' is required by: {}",
                    dependents.join(", ")
                )));
            }
        }

        if let Some(module) = self.modules.get_mut(id) {
            module.is_active = is_active;
        }
        info!(module_id = %id, is_active = is_active, "Module toggled");
        Ok(())
    }

    /// Number of modules.
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

impl Default for ModuleRegistry {
    fn default() -> Self {
        Self::new(default_catalog())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use homni_core::error::ErrorKind;

    #[test]
    fn test_modules_for_role_sorted_and_active_only() {
        let registry = ModuleRegistry::default();
        let ids: Vec<&str> = registry
            .modules_for_role(UserRole::Company)
            .iter()
            .map(|m| m.id.as_str())
            .collect();
        assert_eq!(
            ids,
            vec![
                "authentication",
                "dashboard",
                "lead_management",
                "property_management",
                "insurance_comparison",
                "analytics"
            ]
        );
        assert!(!registry.is_module_available("lead_marketplace", UserRole::Company));
    }

    #[test]
    fn test_guest_routes() {
        let registry = ModuleRegistry::default();
        let paths: Vec<String> = registry
            .routes_for_role(UserRole::Guest)
            .into_iter()
            .map(|r| r.path)
            .collect();
        assert_eq!(paths, vec!["/login", "/forsikring", "/forsikring/selskaper"]);
    }

    #[test]
    fn test_route_roles_narrow_module_roles() {
        let registry = ModuleRegistry::default();
        let admin: Vec<String> = registry
            .routes_for_role(UserRole::Admin)
            .into_iter()
            .map(|r| r.path)
            .collect();
        assert!(admin.contains(&"/admin/users".to_string()));
        assert!(!admin.contains(&"/admin/roles".to_string()));
        assert!(!admin.contains(&"/company/leads".to_string()));
    }

    #[test]
    fn test_validate_dependencies() {
        let mut registry = ModuleRegistry::default();
        assert!(registry.validate_dependencies("lead_marketplace").valid);
        assert_eq!(
            registry.validate_dependencies("nope"),
            DependencyCheck {
                valid: false,
                missing: vec![]
            }
        );

        registry.toggle_module("analytics", false).unwrap();
        registry.register(
            ModuleMetadata::new("reports", "Reports", ModuleCategory::Analytics, 21)
                .depends_on(&["analytics", "ghost"]),
        );
        assert_eq!(
            registry.validate_dependencies("reports").missing,
            vec!["analytics", "ghost"]
        );
    }

    #[test]
    fn test_toggle_refuses_with_active_dependents() {
        let mut registry = ModuleRegistry::default();

        let err = registry.toggle_module("user_management", false).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);
        assert!(registry.get_module("user_management").unwrap().is_active);

        registry.toggle_module("company_management", false).unwrap();
        registry.toggle_module("user_management", false).unwrap();
        assert!(!registry.is_module_available("user_management", UserRole::Admin));

        assert_eq!(
            registry.toggle_module("ghost", true).unwrap_err().kind,
            ErrorKind::NotFound
        );
    }
}
