//! Platform automation backends.
//!
//! macOS lists windows through Core Graphics and drives System Events through
//! `osascript`. Other platforms report [`AutomationError::Unsupported`].

use super::{ClipboardReader, DesktopWindow, WindowAutomation};
use crate::types::AutomationError;

#[cfg(target_os = "macos")]
mod macos {
    use super::*;
    use core_foundation::array::CFArray;
    use core_foundation::base::{CFType, TCFType};
    use core_foundation::dictionary::CFDictionary;
    use core_foundation::number::CFNumber;
    use core_foundation::string::CFString;
    use core_graphics::window::{
        kCGNullWindowID, kCGWindowListExcludeDesktopElements, kCGWindowListOptionOnScreenOnly,
        CGWindowListCopyWindowInfo,
    };
    use std::process::Command;

    /// Get all normal on-screen windows, front to back
    pub fn get_windows() -> Vec<DesktopWindow> {
        let options = kCGWindowListOptionOnScreenOnly | kCGWindowListExcludeDesktopElements;

        let window_list: CFArray<CFDictionary<CFString, CFType>> = unsafe {
            let list_ref = CGWindowListCopyWindowInfo(options, kCGNullWindowID);
            if list_ref.is_null() {
                return vec![];
            }
            CFArray::wrap_under_create_rule(list_ref)
        };

        let mut windows = Vec::new();
        for i in 0..window_list.len() {
            if let Some(dict) = window_list.get(i) {
                // Skip menu bars, docks, etc.
                if get_dict_number(&dict, "kCGWindowLayer").unwrap_or(0) != 0 {
                    continue;
                }
                let Some(pid) = get_dict_number(&dict, "kCGWindowOwnerPID") else {
                    continue;
                };
                windows.push(DesktopWindow {
                    title: get_dict_string(&dict, "kCGWindowName").unwrap_or_default(),
                    app_name: get_dict_string(&dict, "kCGWindowOwnerName").unwrap_or_default(),
                    pid: pid as u32,
                });
            }
        }

        windows
    }

    fn get_dict_number(dict: &CFDictionary<CFString, CFType>, key: &str) -> Option<i64> {
        let cf_key = CFString::new(key);
        dict.find(&cf_key).and_then(|value| {
            if value.type_of() == CFNumber::type_id() {
                let num: CFNumber = unsafe {
                    CFNumber::wrap_under_get_rule(value.as_CFTypeRef() as *const _)
                };
                num.to_i64()
            } else {
                None
            }
        })
    }

    fn get_dict_string(dict: &CFDictionary<CFString, CFType>, key: &str) -> Option<String> {
        let cf_key = CFString::new(key);
        dict.find(&cf_key).and_then(|value| {
            if value.type_of() == CFString::type_id() {
                let s: CFString = unsafe {
                    CFString::wrap_under_get_rule(value.as_CFTypeRef() as *const _)
                };
                Some(s.to_string())
            } else {
                None
            }
        })
    }

    /// Run an AppleScript snippet through osascript
    pub fn run_osascript(script: &str) -> Result<(), AutomationError> {
        let output = Command::new("osascript")
            .arg("-e")
            .arg(script)
            .output()
            .map_err(|e| AutomationError::AutomationFailed(format!("Failed to run osascript: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AutomationError::AutomationFailed(format!(
                "AppleScript failed: {}",
                stderr.trim()
            )));
        }
        Ok(())
    }

    pub fn activate_pid(pid: u32) -> Result<(), AutomationError> {
        run_osascript(&format!(
            "tell application \"System Events\" to set frontmost of \
             first process whose unix id is {} to true",
            pid
        ))
    }

    pub fn keystroke_with_command(key: char) -> Result<(), AutomationError> {
        if !key.is_ascii_alphanumeric() {
            return Err(AutomationError::AutomationFailed(format!("Unsupported key {:?}", key)));
        }
        run_osascript(&format!(
            "tell application \"System Events\" to keystroke \"{}\" using command down",
            key
        ))
    }
}

/// Window automation for the current platform
#[derive(Debug, Clone, Copy, Default)]
pub struct PlatformAutomation;

impl PlatformAutomation {
    pub fn new() -> Self {
        Self
    }
}

#[cfg(target_os = "macos")]
impl WindowAutomation for PlatformAutomation {
    fn list_windows(&self) -> Result<Vec<DesktopWindow>, AutomationError> {
        Ok(macos::get_windows())
    }

    fn activate(&self, window: &DesktopWindow) -> Result<(), AutomationError> {
        macos::activate_pid(window.pid)
    }

    fn send_shortcut(&self, key: char) -> Result<(), AutomationError> {
        macos::keystroke_with_command(key)
    }
}

#[cfg(not(target_os = "macos"))]
impl WindowAutomation for PlatformAutomation {
    fn list_windows(&self) -> Result<Vec<DesktopWindow>, AutomationError> {
        Err(AutomationError::Unsupported)
    }

    fn activate(&self, _window: &DesktopWindow) -> Result<(), AutomationError> {
        Err(AutomationError::Unsupported)
    }

    fn send_shortcut(&self, _key: char) -> Result<(), AutomationError> {
        Err(AutomationError::Unsupported)
    }
}

/// System clipboard through arboard. Opens a fresh handle per call.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClipboard;

impl SystemClipboard {
    pub fn new() -> Self {
        Self
    }

    /// Replace the clipboard contents
    pub fn write_text(&self, text: &str) -> Result<(), AutomationError> {
        let mut clipboard =
            arboard::Clipboard::new().map_err(|e| AutomationError::Clipboard(e.to_string()))?;
        clipboard
            .set_text(text.to_string())
            .map_err(|e| AutomationError::Clipboard(e.to_string()))
    }
}

impl ClipboardReader for SystemClipboard {
    fn read_text(&self) -> Result<String, AutomationError> {
        let mut clipboard =
            arboard::Clipboard::new().map_err(|e| AutomationError::Clipboard(e.to_string()))?;
        clipboard
            .get_text()
            .map_err(|e| AutomationError::Clipboard(e.to_string()))
    }
}

#[cfg(all(test, not(target_os = "macos")))]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_platform_reports_errors() {
        let automation = PlatformAutomation::new();
        assert!(matches!(automation.list_windows(), Err(AutomationError::Unsupported)));
        assert!(matches!(automation.send_shortcut('l'), Err(AutomationError::Unsupported)));
    }
}
