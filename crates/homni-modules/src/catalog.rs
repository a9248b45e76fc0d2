//! Module metadata and the built-in module catalog.

use std::fmt;

use serde::{Deserialize, Serialize};

use homni_core::UserRole;
use homni_core::UserRole::{Admin, Company, ContentEditor, Guest, MasterAdmin, User};

use crate::routes::ModuleRoute;

/// Module grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleCategory {
    /// Always-present platform modules.
    Core,
    /// Lead and property workflows.
    Business,
    /// Reporting.
    Analytics,
    /// Administration.
    Admin,
    /// Editorial content.
    Content,
}

impl fmt::Display for ModuleCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Core => write!(f, "core"),
            Self::Business => write!(f, "business"),
            Self::Analytics => write!(f, "analytics"),
            Self::Admin => write!(f, "admin"),
            Self::Content => write!(f, "content"),
        }
    }
}

/// A logical module of the application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleMetadata {
    /// Unique module id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Description.
    #[serde(default)]
    pub description: String,
    /// Semver version.
    pub version: String,
    /// Category.
    pub category: ModuleCategory,
    /// Ids of modules that must be active.
    #[serde(default)]
    pub dependencies: Vec<String>,
    /// Roles the module is available to.
    #[serde(default)]
    pub required_roles: Vec<UserRole>,
    /// Feature flags associated with the module.
    #[serde(default)]
    pub feature_flags: Vec<String>,
    /// Routes contributed by the module.
    #[serde(default)]
    pub routes: Vec<ModuleRoute>,
    /// Whether the module is active.
    pub is_active: bool,
    /// Position in listings.
    pub sort_order: i32,
}

impl ModuleMetadata {
    /// Creates an active module with no routes.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        category: ModuleCategory,
        sort_order: i32,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            version: "1.0.0".to_string(),
            category,
            dependencies: Vec::new(),
            required_roles: Vec::new(),
            feature_flags: Vec::new(),
            routes: Vec::new(),
            is_active: true,
            sort_order,
        }
    }

    /// Sets the description.
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the dependencies.
    pub fn depends_on(mut self, dependencies: &[&str]) -> Self {
        self.dependencies = dependencies.iter().map(|d| d.to_string()).collect();
        self
    }

    /// Sets the roles the module is available to.
    pub fn for_roles(mut self, roles: &[UserRole]) -> Self {
        self.required_roles = roles.to_vec();
        self
    }

    /// Sets the feature flags.
    pub fn flags(mut self, flags: &[&str]) -> Self {
        self.feature_flags = flags.iter().map(|f| f.to_string()).collect();
        self
    }

    /// Appends a route.
    pub fn route(mut self, route: ModuleRoute) -> Self {
        self.routes.push(route);
        self
    }

    /// Sets the active flag.
    pub fn active(mut self, is_active: bool) -> Self {
        self.is_active = is_active;
        self
    }

    /// Whether the module lists `role` among its required roles.
    pub fn available_to(&self, role: UserRole) -> bool {
        self.required_roles.contains(&role)
    }
}

const SIGNED_IN: &[UserRole] = &[User, Company, ContentEditor, Admin, MasterAdmin];
const LEAD_BUYERS: &[UserRole] = &[Company, Admin, MasterAdmin];
const ADMINS: &[UserRole] = &[Admin, MasterAdmin];

fn route(path: &str, component: &str, roles: &[UserRole]) -> ModuleRoute {
    ModuleRoute::new(path, component).for_roles(roles)
}

/// The built-in catalog.
pub fn default_catalog() -> Vec<ModuleMetadata> {
    use ModuleCategory as C;

    vec![
        // ── Core ──
        ModuleMetadata::new("authentication", "Autentisering", C::Core, 1)
            .describe("Brukerautentisering og autorisasjon")
            .for_roles(&UserRole::ALL)
            .route(route("/login", "LoginPage", &[Guest]))
            .route(route("/profile", "ProfilePage", SIGNED_IN)),
        ModuleMetadata::new("dashboard", "Dashboard", C::Core, 2)
            .describe("Personaliserte dashboards")
            .depends_on(&["authentication"])
            .for_roles(SIGNED_IN)
            .route(route("/dashboard", "Dashboard", SIGNED_IN)),
        // ── Business ──
        ModuleMetadata::new("lead_management", "Lead-administrasjon", C::Business, 10)
            .describe("Administrer kundehenvendelser og leads")
            .depends_on(&["authentication", "dashboard"])
            .for_roles(LEAD_BUYERS)
            .flags(&["ENABLE_LEAD_MANAGEMENT"])
            .route(route("/leads", "LeadDashboard", LEAD_BUYERS))
            .route(route("/leads/:id", "LeadDetails", LEAD_BUYERS))
            .route(route("/company/leads", "CompanyLeadDashboard", &[Company])),
        ModuleMetadata::new("lead_marketplace", "Lead Marketplace", C::Business, 11)
            .describe("Kjøp og salg av leads")
            .depends_on(&["lead_management"])
            .for_roles(LEAD_BUYERS)
            .flags(&["ENABLE_LEAD_MARKETPLACE"])
            .active(false)
            .route(route("/marketplace", "LeadMarketplace", LEAD_BUYERS))
            .route(route("/marketplace/packages", "LeadPackages", ADMINS)),
        ModuleMetadata::new("property_management", "Eiendomsadministrasjon", C::Business, 12)
            .describe("Administrer eiendommer og dokumenter")
            .depends_on(&["authentication"])
            .for_roles(&[User, Company, Admin, MasterAdmin])
            .flags(&["ENABLE_PROPERTY_MANAGEMENT"])
            .route(route("/properties", "PropertyDashboard", &[User, Company, Admin, MasterAdmin]))
            .route(route("/properties/new", "NewPropertyPage", &[User, Company, Admin, MasterAdmin]))
            .route(route("/properties/:id", "PropertyDetailsPage", &[User, Company, Admin, MasterAdmin])),
        ModuleMetadata::new("insurance_comparison", "Forsikringssammenligning", C::Business, 13)
            .describe("Sammenlign forsikringsselskaper og produkter")
            .depends_on(&["authentication"])
            .for_roles(&[Guest, User, Company])
            .route(route("/forsikring", "InsuranceLanding", &[Guest, User, Company]))
            .route(route("/forsikring/selskaper", "PublicCompaniesDirectory", &[Guest, User, Company])),
        // ── Analytics ──
        ModuleMetadata::new("analytics", "Analytics", C::Analytics, 20)
            .describe("Analyse og rapporter")
            .depends_on(&["authentication"])
            .for_roles(LEAD_BUYERS)
            .route(route("/analytics", "AnalyticsDashboard", LEAD_BUYERS))
            .route(route("/leads/intelligence", "LeadIntelligence", LEAD_BUYERS)),
        // ── Admin ──
        ModuleMetadata::new("user_management", "Brukeradministrasjon", C::Admin, 30)
            .describe("Administrer brukere og roller")
            .depends_on(&["authentication"])
            .for_roles(ADMINS)
            .route(route("/admin/users", "UserManagement", ADMINS))
            .route(route("/admin/roles", "RoleManagement", &[MasterAdmin])),
        ModuleMetadata::new("company_management", "Bedriftsadministrasjon", C::Admin, 31)
            .describe("Administrer bedriftsprofiler")
            .depends_on(&["authentication", "user_management"])
            .for_roles(ADMINS),
        ModuleMetadata::new("system_management", "Systemadministrasjon", C::Admin, 32)
            .describe("Systemkonfigurasjon og overvåking")
            .depends_on(&["authentication"])
            .for_roles(&[MasterAdmin]),
        ModuleMetadata::new("module_management", "Moduladministrasjon", C::Admin, 33)
            .describe("Administrer systemmoduler")
            .depends_on(&["authentication"])
            .for_roles(&[MasterAdmin]),
        ModuleMetadata::new("feature_management", "Feature Flag-administrasjon", C::Admin, 34)
            .describe("Administrer funksjonsbrytere")
            .depends_on(&["authentication"])
            .for_roles(&[MasterAdmin]),
        // ── Content ──
        ModuleMetadata::new("content_management", "Innholdsadministrasjon", C::Content, 40)
            .describe("Administrer artikler og sider")
            .depends_on(&["authentication"])
            .for_roles(&[ContentEditor, Admin, MasterAdmin]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_catalog_ids_unique_and_dependencies_known() {
        let catalog = default_catalog();
        let ids: HashSet<&str> = catalog.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids.len(), catalog.len());

        for module in &catalog {
            for dep in &module.dependencies {
                assert!(ids.contains(dep.as_str()), "{} depends on unknown {dep}", module.id);
            }
        }
    }
}
