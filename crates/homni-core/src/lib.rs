//! # homni-core
//!
//! Core crate for the Homni plugin platform. Contains configuration schemas,
//! the role model shared by the plugin and module layers, and the unified
//! error system.
//!
//! This crate has **no** internal dependencies on other Homni crates.

pub mod config;
pub mod error;
pub mod result;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
pub use types::role::UserRole;
