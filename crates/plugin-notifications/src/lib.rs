//! Notifications plugin for Homni.
//!
//! Delivers in-app notifications according to per-user channel preferences
//! and contributes a navigation entry and a dashboard widget for signed-in
//! users.

pub mod hooks;
pub mod plugin;
pub mod preferences;

pub use plugin::{ENTRY_POINT, NotificationsPlugin, manifest};
pub use preferences::{ChannelSetting, NotificationState, Preferences};
