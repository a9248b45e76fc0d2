//! Core type definitions used across the Homni workspace.

pub mod role;

pub use role::UserRole;
