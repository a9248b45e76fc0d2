//! # homni-modules
//!
//! Static module catalog and the pure projections the routing shell uses:
//!
//! - Role-based route filtering over the module catalog
//! - Navigation filtering by enabled modules and feature flags
//! - Breadcrumb resolution and navigation flattening
//! - Feature flags with role targeting and percentage rollout

pub mod catalog;
pub mod flags;
pub mod navigation;
pub mod registry;
pub mod routes;

pub use catalog::{ModuleCategory, ModuleMetadata};
pub use flags::{FeatureFlag, FeatureFlagSet};
pub use navigation::{
    NavConfig, NavItem, filter_navigation, flatten_navigation, get_breadcrumbs,
    is_nav_item_visible,
};
pub use registry::{DependencyCheck, ModuleRegistry};
pub use routes::{ModuleRoute, filter_routes_for_role};
