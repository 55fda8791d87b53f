//! Input-monitoring permission checks.
//!
//! Observing global key events needs an OS grant on macOS (Accessibility)
//! and read access to input devices on Linux without X11. Windows needs
//! nothing.

use tracing::debug;

#[cfg(target_os = "macos")]
use macos_accessibility_client::accessibility;

/// Reports and requests the permission needed to observe keystrokes
pub trait PermissionProbe: Send + Sync {
    fn is_granted(&self) -> bool;

    /// Ask the OS (or the user) for the grant. Returns immediately; the
    /// grant, if given, is picked up by a later `is_granted` call.
    fn request(&self);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemPermissions;

impl PermissionProbe for SystemPermissions {
    fn is_granted(&self) -> bool {
        let granted = has_input_permission();
        debug!(granted, "Checked input-monitoring permission");
        granted
    }

    fn request(&self) {
        request_input_permission();
    }
}

#[cfg(target_os = "macos")]
const ACCESSIBILITY_SETTINGS_URL: &str =
    "x-apple.systempreferences:com.apple.preference.security?Privacy_Accessibility";

#[cfg(target_os = "macos")]
fn has_input_permission() -> bool {
    accessibility::application_is_trusted()
}

#[cfg(target_os = "macos")]
fn request_input_permission() {
    // Shows the system prompt once per process lifetime
    if accessibility::application_is_trusted_with_prompt() {
        return;
    }

    tracing::info!("Opening Accessibility settings");
    if let Err(e) = std::process::Command::new("open")
        .arg(ACCESSIBILITY_SETTINGS_URL)
        .status()
    {
        tracing::warn!(error = %e, "Failed to open System Settings");
    }
}

#[cfg(target_os = "linux")]
fn has_input_permission() -> bool {
    use std::path::Path;

    // X11 delivers key events to any client on the display
    if std::env::var_os("DISPLAY").is_some() {
        return true;
    }

    let device = Path::new("/dev/input/event0");
    if device.exists() {
        return std::fs::File::open(device).is_ok();
    }

    std::process::Command::new("groups")
        .output()
        .ok()
        .and_then(|o| String::from_utf8(o.stdout).ok())
        .map(|groups| groups.split_whitespace().any(|g| g == "input"))
        .unwrap_or(false)
}

#[cfg(target_os = "linux")]
fn request_input_permission() {
    tracing::warn!(
        "snipex needs read access to input devices. Add your user to the 'input' group \
         (sudo usermod -a -G input $USER) and log in again"
    );
}

#[cfg(not(any(target_os = "macos", target_os = "linux")))]
fn has_input_permission() -> bool {
    true
}

#[cfg(not(any(target_os = "macos", target_os = "linux")))]
fn request_input_permission() {
    tracing::info!("No input-monitoring permission required on this platform");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(not(any(target_os = "macos", target_os = "linux")))]
    fn test_always_granted_elsewhere() {
        assert!(SystemPermissions.is_granted());
    }

    #[test]
    #[cfg(target_os = "linux")]
    fn test_linux_probe_does_not_panic() {
        let _ = SystemPermissions.is_granted();
    }
}
