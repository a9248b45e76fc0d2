//! Prelude for convenient imports.

pub use async_trait::async_trait;

pub use crate::api::context::{
    CompanyProfile, ContextUpdate, PluginContext, SharedContext, UserProfile,
};
pub use crate::error::PluginError;
pub use crate::hooks::definitions::{self as hook_names, HookOutput};
pub use crate::hooks::registry::HookHandler;
pub use crate::manifest::PluginManifest;
pub use crate::module::PluginModule;
pub use crate::traits::ClosureHandler;

pub use crate::plugin_manifest;
