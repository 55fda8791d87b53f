//! snipex daemon - keyboard hook lifecycle for the expansion engine.
//!
//! [`ExpansionMonitor`] owns the hook, follows input-monitoring permission
//! and moves key events from the hook thread to the matcher and on to
//! expansion workers.

pub mod keyboard_listener;
pub mod monitor;
pub mod permissions;

pub use keyboard_listener::{KeySink, KeyboardHook, RdevHook};
pub use monitor::{ExpansionMonitor, MonitorStatus};
pub use permissions::{PermissionProbe, SystemPermissions};
