//! Feature flags with role targeting and percentage rollout.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use homni_core::UserRole;
use homni_core::error::AppError;
use homni_core::result::AppResult;

/// A feature flag definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureFlag {
    /// Flag name.
    pub name: String,
    /// Master switch.
    pub is_enabled: bool,
    /// Share of users (0-100) that see the flag on.
    #[serde(default = "full_rollout")]
    pub rollout_percentage: u8,
    /// Roles the flag applies to. Empty means all roles.
    #[serde(default)]
    pub target_roles: Vec<UserRole>,
    /// Description.
    #[serde(default)]
    pub description: Option<String>,
}

fn full_rollout() -> u8 {
    100
}

impl FeatureFlag {
    /// Creates a flag with full rollout for every role.
    pub fn new(name: impl Into<String>, is_enabled: bool) -> Self {
        Self {
            name: name.into(),
            is_enabled,
            rollout_percentage: 100,
            target_roles: Vec::new(),
            description: None,
        }
    }

    /// Sets the rollout percentage, clamped to 100.
    pub fn rollout(mut self, percentage: u8) -> Self {
        self.rollout_percentage = percentage.min(100);
        self
    }

    /// Restricts the flag to the given roles.
    pub fn for_roles(mut self, roles: &[UserRole]) -> Self {
        self.target_roles = roles.to_vec();
        self
    }

    /// Whether the flag targets `role`.
    pub fn targets(&self, role: UserRole) -> bool {
        self.target_roles.is_empty() || self.target_roles.contains(&role)
    }

    /// Whether the flag is on for `user_id`.
    pub fn enabled_for(&self, user_id: &str) -> bool {
        if !self.is_enabled {
            return false;
        }
        if self.rollout_percentage >= 100 {
            return true;
        }
        let bucket = rollout_hash(&format!("{}{user_id}", self.name)) % 100;
        bucket < u64::from(self.rollout_percentage)
    }
}

/// 32-bit string hash used for rollout bucketing.
///
/// `h = h * 31 + c` over UTF-16 code units with wrapping `i32` arithmetic,
/// then the absolute value.
pub fn rollout_hash(input: &str) -> u64 {
    let hash = input
        .encode_utf16()
        .fold(0i32, |h, unit| h.wrapping_mul(31).wrapping_add(i32::from(unit)));
    i64::from(hash).unsigned_abs()
}

/// A named set of feature flags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeatureFlagSet {
    /// Flag name → definition.
    flags: HashMap<String, FeatureFlag>,
}

impl FeatureFlagSet {
    /// Creates a set. Later flags replace earlier ones with the same name.
    pub fn new(flags: Vec<FeatureFlag>) -> Self {
        Self {
            flags: flags.into_iter().map(|f| (f.name.clone(), f)).collect(),
        }
    }

    /// Reads flag definitions from a JSON array.
    pub async fn from_json_file(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
            AppError::configuration(format!(
                "Cannot read feature flag file '{}': {e}",
                path.display()
            ))
        })?;
        let flags: Vec<FeatureFlag> = serde_json::from_str(&raw)?;
        debug!(path = %path.display(), count = flags.len(), "Feature flags loaded");
        Ok(Self::new(flags))
    }

    /// Forces flags on or off. Unknown names are added.
    pub fn apply_overrides(&mut self, overrides: &HashMap<String, bool>) {
        for (name, enabled) in overrides {
            let flag = self
                .flags
                .entry(name.clone())
                .or_insert_with(|| FeatureFlag::new(name.clone(), *enabled));
            flag.is_enabled = *enabled;
            if *enabled {
                flag.rollout_percentage = 100;
            }
        }
    }

    /// Enabled flags that target `role`.
    pub fn applicable_for(&self, role: UserRole) -> FeatureFlagSet {
        Self {
            flags: self
                .flags
                .iter()
                .filter(|(_, f)| f.is_enabled && f.targets(role))
                .map(|(name, f)| (name.clone(), f.clone()))
                .collect(),
        }
    }

    /// Looks up a flag.
    pub fn get(&self, name: &str) -> Option<&FeatureFlag> {
        self.flags.get(name)
    }

    /// Whether `name` is on for `user_id`. Unknown flags are off.
    pub fn is_enabled(&self, name: &str, user_id: &str) -> bool {
        self.flags.get(name).is_some_and(|f| f.enabled_for(user_id))
    }

    /// Names of flags on for `user_id`, sorted.
    pub fn enabled_names(&self, user_id: &str) -> Vec<String> {
        let mut names: Vec<String> = self
            .flags
            .values()
            .filter(|f| f.enabled_for(user_id))
            .map(|f| f.name.clone())
            .collect();
        names.sort();
        names
    }

    /// Every flag with its state for `user_id`.
    pub fn as_map(&self, user_id: &str) -> HashMap<String, bool> {
        self.flags
            .values()
            .map(|f| (f.name.clone(), f.enabled_for(user_id)))
            .collect()
    }

    /// Number of flags.
    pub fn len(&self) -> usize {
        self.flags.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }
}
