//! Chrome DevTools Protocol renderer backend
//!
//! One headless Chrome process per renderer; each render opens a fresh tab
//! and closes it before returning, matching the one-session-per-render
//! contract of the stabilizer.

use std::sync::Arc;
use std::time::Duration;

use headless_chrome::browser::tab::Tab;
use headless_chrome::protocol::cdp::Page;
use headless_chrome::{Browser, LaunchOptions};
use log::warn;

use crate::{Error, RenderSession, Renderer, Result, Viewport};

/// CDP-based renderer (uses the `headless_chrome` crate).
pub struct CdpRenderer {
    browser: Browser,
    viewport: Viewport,
}

impl CdpRenderer {
    /// Launch a headless Chrome instance sized to `viewport`.
    pub fn new(viewport: Viewport) -> Result<Self> {
        let launch_options = LaunchOptions::default_builder()
            .headless(true)
            // Slide servers commonly run containerized; Chrome's sandbox is
            // unavailable there.
            .sandbox(false)
            .window_size(Some((viewport.width, viewport.height)))
            .build()
            .map_err(|e| Error::InitializationError(format!("Failed to build launch options: {}", e)))?;

        let browser = Browser::new(launch_options)
            .map_err(|e| Error::InitializationError(format!("Failed to launch browser: {}", e)))?;

        Ok(Self { browser, viewport })
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }
}

impl Renderer for CdpRenderer {
    type Session = CdpSession;

    fn open_session(&self) -> Result<CdpSession> {
        let tab = self
            .browser
            .new_tab()
            .map_err(|e| Error::InitializationError(format!("Failed to create tab: {}", e)))?;
        Ok(CdpSession { tab, closed: false })
    }
}

/// One Chrome tab, alive for a single render.
pub struct CdpSession {
    tab: Arc<Tab>,
    closed: bool,
}

impl RenderSession for CdpSession {
    fn navigate(&mut self, url: &str, timeout: Duration) -> Result<()> {
        self.tab.set_default_timeout(timeout);

        self.tab
            .navigate_to(url)
            .map_err(|e| Error::LoadError(format!("Navigation failed: {}", e)))?;

        // Blocks until the tab reports the navigation finished, bounded by
        // the default timeout set above.
        self.tab
            .wait_until_navigated()
            .map_err(|_| Error::Timeout(timeout.as_millis() as u64))?;

        Ok(())
    }

    fn capture(&mut self) -> Result<Vec<u8>> {
        self.tab
            .capture_screenshot(Page::CaptureScreenshotFormatOption::Png, None, None, true)
            .map_err(|e| Error::CaptureError(format!("Screenshot failed: {}", e)))
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        // anyhow errors from headless_chrome convert to Error::CdpError.
        self.tab.close(true)?;
        Ok(())
    }
}

impl Drop for CdpSession {
    fn drop(&mut self) {
        // Backstop for callers that drop the session without closing it.
        if !self.closed {
            if let Err(e) = self.tab.close(true) {
                warn!("tab leaked and close-on-drop failed: {}", e);
            }
        }
    }
}
