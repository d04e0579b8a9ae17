//! Browser URL resolution via UI automation.
//!
//! Once a report has been read, the ticket the user is working on is the page
//! open in their browser. The resolver finds a supported browser window,
//! brings it to the front, focuses the address bar, copies it and reads the
//! clipboard. Every step is best-effort; any failure yields no URL.

pub mod platform;

pub use platform::{PlatformAutomation, SystemClipboard};

use crate::config::{BrowserConfig, BrowserIdentity};
use crate::types::AutomationError;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Key sent with the platform modifier to copy the selection
const COPY_KEY: char = 'c';

/// An on-screen top-level window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesktopWindow {
    pub title: String,
    /// Owning application name
    pub app_name: String,
    pub pid: u32,
}

/// Window lookup, activation and keystroke injection
pub trait WindowAutomation: Send + Sync {
    /// On-screen windows, front to back
    fn list_windows(&self) -> Result<Vec<DesktopWindow>, AutomationError>;

    /// Bring a window's application to the foreground
    fn activate(&self, window: &DesktopWindow) -> Result<(), AutomationError>;

    /// Send `key` together with the platform's primary modifier (Ctrl or Cmd)
    fn send_shortcut(&self, key: char) -> Result<(), AutomationError>;
}

/// Read access to the system clipboard
pub trait ClipboardReader: Send + Sync {
    fn read_text(&self) -> Result<String, AutomationError>;
}

/// Resolves the URL of the foreground-able browser window
pub struct BrowserUrlResolver {
    browsers: Vec<BrowserIdentity>,
    settle_delay: Duration,
    automation: Arc<dyn WindowAutomation>,
    clipboard: Arc<dyn ClipboardReader>,
}

impl BrowserUrlResolver {
    pub fn new(
        config: &BrowserConfig,
        automation: Arc<dyn WindowAutomation>,
        clipboard: Arc<dyn ClipboardReader>,
    ) -> Self {
        Self {
            browsers: config.browsers.clone(),
            settle_delay: config.settle_delay(),
            automation,
            clipboard,
        }
    }

    /// Resolver using the platform automation and system clipboard
    pub fn platform(config: &BrowserConfig) -> Self {
        Self::new(
            config,
            Arc::new(PlatformAutomation::new()),
            Arc::new(SystemClipboard::new()),
        )
    }

    /// First window matching a supported browser, in preference order
    pub fn find_browser_window(
        &self,
        windows: &[DesktopWindow],
    ) -> Option<(BrowserIdentity, DesktopWindow)> {
        self.browsers.iter().find_map(|browser| {
            windows
                .iter()
                .find(|w| w.title.contains(&browser.name) || w.app_name.contains(&browser.name))
                .map(|w| (browser.clone(), w.clone()))
        })
    }

    /// Read the current browser URL. Blocks for the settle delay.
    pub fn resolve(&self) -> Option<String> {
        match self.try_resolve() {
            Ok(url) => {
                info!("Resolved browser URL: {}", url);
                Some(url)
            }
            Err(e) => {
                warn!("Error retrieving browser URL: {}", e);
                None
            }
        }
    }

    fn try_resolve(&self) -> Result<String, AutomationError> {
        let windows = self.automation.list_windows()?;
        let (browser, window) = self
            .find_browser_window(&windows)
            .ok_or(AutomationError::NoBrowserWindow)?;

        debug!(
            "Using {} window: {} ({}, pid {})",
            browser.name, window.title, window.app_name, window.pid
        );

        self.automation.activate(&window)?;
        self.automation.send_shortcut(browser.focus_key)?;
        self.automation.send_shortcut(COPY_KEY)?;
        std::thread::sleep(self.settle_delay);

        let url = self.clipboard.read_text()?.trim().to_string();
        if url.is_empty() {
            return Err(AutomationError::Clipboard("clipboard is empty".to_string()));
        }
        Ok(url)
    }
}
