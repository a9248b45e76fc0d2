//! # homni-plugin
//!
//! Plugin framework for Homni. Provides:
//!
//! - Manifest store and module resolver capabilities supplied by the host
//! - Dependency-first plugin loading with a per-entry-point module cache
//! - Hook registry with descending-priority, stable registration order
//! - Hook dispatcher with per-handler failure isolation and context chaining
//! - A manager facade owning the shared plugin context
//! - Optional dynamic loading via `libloading` (feature `dynamic`)

pub mod api;
pub mod error;
pub mod hooks;
pub mod loader;
pub mod macros;
pub mod manager;
pub mod manifest;
pub mod module;
pub mod prelude;
pub mod resolver;
pub mod store;
pub mod traits;

#[cfg(feature = "dynamic")]
pub mod dynamic;

#[cfg(feature = "dynamic")]
pub use dynamic::DynamicModuleResolver;

pub use api::context::{CompanyProfile, ContextUpdate, PluginContext, SharedContext, UserProfile};
pub use error::PluginError;
pub use hooks::definitions::HookOutput;
pub use hooks::dispatcher::{DispatchResult, HookDispatcher};
pub use hooks::registry::{HookHandler, HookRegistry};
pub use loader::{LoadReport, LoadedPlugin, PluginLoader};
pub use manager::{PluginManager, PluginSettings, PluginSummary};
pub use manifest::PluginManifest;
pub use module::PluginModule;
pub use resolver::{ModuleFactory, ModuleResolver, StaticModuleResolver};
pub use store::{InMemoryManifestStore, JsonFileManifestStore, ManifestStore};
