//! Module catalog and navigation configuration.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types::role::UserRole;

/// Settings for the module registry and navigation projection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModulesConfig {
    /// Optional JSON file with the navigation tree. The built-in tree is used when absent.
    #[serde(default)]
    pub navigation_file: Option<String>,
    /// Optional JSON file with feature flag definitions.
    #[serde(default)]
    pub feature_flags_file: Option<String>,
    /// Role used when no authenticated user is present.
    #[serde(default)]
    pub default_role: UserRole,
    /// Static flag overrides applied on top of the flag file.
    #[serde(default)]
    pub flag_overrides: HashMap<String, bool>,
}
