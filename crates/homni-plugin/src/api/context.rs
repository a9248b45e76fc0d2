//! State every plugin `init` and hook handler observes.
//!
//! Handlers receive an immutable snapshot. Mutations are expressed as a
//! [`ContextUpdate`] returned from the handler; the dispatcher applies it
//! before the next handler runs and the manager commits it afterwards.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

use homni_core::UserRole;

/// Context shared by the manager, the loader, and the dispatcher.
pub type SharedContext = Arc<RwLock<PluginContext>>;

/// The current user as seen by plugins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    /// User id (`Uuid::nil()` for anonymous visitors).
    pub id: Uuid,
    /// Effective role.
    pub role: UserRole,
    /// Contact email, when known.
    #[serde(default)]
    pub email: Option<String>,
    /// Display name, when known.
    #[serde(default)]
    pub display_name: Option<String>,
}

impl UserProfile {
    /// Creates a profile with the given id and role.
    pub fn new(id: Uuid, role: UserRole) -> Self {
        Self {
            id,
            role,
            email: None,
            display_name: None,
        }
    }

    /// The anonymous guest profile.
    pub fn anonymous() -> Self {
        Self::new(Uuid::nil(), UserRole::Guest)
    }

    /// Sets the email.
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Whether this is the anonymous profile.
    pub fn is_anonymous(&self) -> bool {
        self.id.is_nil()
    }
}

/// The company the current user acts for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyProfile {
    /// Company id.
    pub id: Uuid,
    /// Company name.
    pub name: String,
}

/// State passed to plugin `init` and every hook invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginContext {
    /// Current user.
    pub user: UserProfile,
    /// Current company, if any.
    pub company: Option<CompanyProfile>,
    /// Enabled feature names.
    pub features: Vec<String>,
    /// Enabled module names.
    pub modules: Vec<String>,
    /// Free-form configuration.
    pub config: HashMap<String, Value>,
}

impl PluginContext {
    /// Creates a context for the given user and company.
    pub fn new(user: UserProfile, company: Option<CompanyProfile>) -> Self {
        Self {
            user,
            company,
            features: Vec::new(),
            modules: Vec::new(),
            config: HashMap::new(),
        }
    }

    /// Whether a feature is enabled.
    pub fn has_feature(&self, name: &str) -> bool {
        self.features.iter().any(|f| f == name)
    }

    /// Whether a module is enabled.
    pub fn has_module(&self, name: &str) -> bool {
        self.modules.iter().any(|m| m == name)
    }

    /// Reads a configuration value.
    pub fn config_value(&self, key: &str) -> Option<&Value> {
        self.config.get(key)
    }
}

impl Default for PluginContext {
    fn default() -> Self {
        Self::new(UserProfile::anonymous(), None)
    }
}

/// An explicit change to the plugin context requested by a hook handler.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContextUpdate {
    /// Features to enable.
    #[serde(default)]
    pub enable_features: Vec<String>,
    /// Features to disable.
    #[serde(default)]
    pub disable_features: Vec<String>,
    /// Modules to enable.
    #[serde(default)]
    pub enable_modules: Vec<String>,
    /// Modules to disable.
    #[serde(default)]
    pub disable_modules: Vec<String>,
    /// Configuration entries to set.
    #[serde(default)]
    pub set_config: HashMap<String, Value>,
    /// Configuration keys to remove.
    #[serde(default)]
    pub remove_config: Vec<String>,
}

impl ContextUpdate {
    /// Creates an empty update.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables a feature.
    pub fn enable_feature(mut self, name: impl Into<String>) -> Self {
        self.enable_features.push(name.into());
        self
    }

    /// Disables a feature.
    pub fn disable_feature(mut self, name: impl Into<String>) -> Self {
        self.disable_features.push(name.into());
        self
    }

    /// Enables a module.
    pub fn enable_module(mut self, name: impl Into<String>) -> Self {
        self.enable_modules.push(name.into());
        self
    }

    /// Disables a module.
    pub fn disable_module(mut self, name: impl Into<String>) -> Self {
        self.disable_modules.push(name.into());
        self
    }

    /// Sets a configuration value.
    pub fn set_config(mut self, key: impl Into<String>, value: Value) -> Self {
        self.set_config.insert(key.into(), value);
        self
    }

    /// Removes a configuration key.
    pub fn remove_config(mut self, key: impl Into<String>) -> Self {
        self.remove_config.push(key.into());
        self
    }

    /// Whether applying this update would change nothing.
    pub fn is_empty(&self) -> bool {
        self.enable_features.is_empty()
            && self.disable_features.is_empty()
            && self.enable_modules.is_empty()
            && self.disable_modules.is_empty()
            && self.set_config.is_empty()
            && self.remove_config.is_empty()
    }

    /// Applies the update in place. Removals run after additions.
    pub fn apply(&self, context: &mut PluginContext) {
        merge_names(&mut context.features, &self.enable_features, &self.disable_features);
        merge_names(&mut context.modules, &self.enable_modules, &self.disable_modules);

        for (key, value) in &self.set_config {
            context.config.insert(key.clone(), value.clone());
        }
        for key in &self.remove_config {
            context.config.remove(key);
        }
    }
}

fn merge_names(target: &mut Vec<String>, add: &[String], remove: &[String]) {
    for name in add {
        if !target.contains(name) {
            target.push(name.clone());
        }
    }
    target.retain(|name| !remove.contains(name));
}
