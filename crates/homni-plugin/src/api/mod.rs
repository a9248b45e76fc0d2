//! Plugin API exposed to plugin code.

pub mod context;

pub use context::{CompanyProfile, ContextUpdate, PluginContext, SharedContext, UserProfile};
