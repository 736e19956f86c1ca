//! slidethumb
//!
//! A cached thumbnail pipeline for Markdown slide decks served by a
//! reveal.js-style server. Given a deck label, the pipeline probes the slide
//! server for freshness, reconciles an in-memory byte-bounded cache and an
//! on-disk artifact store against the source file modification times, and —
//! only when everything is stale — drives a headless browser session until
//! the asynchronously rendering page settles, then screenshots it.
//!
//! # Features
//!
//! - **CDP Backend** (default): Uses Chrome DevTools Protocol via headless Chrome
//! - **Renderer Seam**: Adapter traits so tests can substitute scripted renderers
//!
//! # Example
//!
//! ```no_run
//! use slidethumb::service::{ServiceConfig, ThumbnailService};
//! use slidethumb::cdp::CdpRenderer;
//! use slidethumb::Viewport;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ServiceConfig {
//!     server_address: "http://localhost:3000".to_string(),
//!     resource_dir: "resource".into(),
//!     ..Default::default()
//! };
//!
//! let renderer = CdpRenderer::new(Viewport::default())?;
//! let service = ThumbnailService::new(renderer, config)?;
//! let thumbnail = service.generate("my-deck")?;
//! println!("served from {:?}", thumbnail.served_from);
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

pub mod error;
pub use error::{Error, Result};

pub mod cache;
pub mod freshness;
pub mod probe;
pub mod service;
pub mod stabilize;
pub mod store;

#[cfg(feature = "cdp")]
pub mod cdp;

// Async-friendly facade (worker-thread-backed abstraction)
#[cfg(feature = "cdp")]
pub mod async_api;

// Re-export the handle type at the crate root for ergonomic use
#[cfg(feature = "cdp")]
pub use async_api::Thumbnailer;

/// Extension of Markdown source documents.
pub const MD_EXT: &str = "md";
/// Extension of the optional per-deck parameter file next to the source.
pub const META_EXT: &str = "yaml";
/// Extension of rendered thumbnail artifacts.
pub const THUMBNAIL_EXT: &str = "png";

/// Subdirectory of the resource root holding Markdown sources.
pub const MD_DIR: &str = "md";
/// Subdirectory of the resource root holding persisted thumbnails.
pub const THUMBNAIL_DIR: &str = "thumbnail";

/// Route on the slide server that renders a deck as HTML.
pub const VIEW_ROUTE: &str = "view";
/// Query key carrying the deck label.
pub const LABEL_KEY: &str = "label";

/// Viewport dimensions for the renderer session
#[derive(Debug, Clone, Copy)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

/// Core trait for renderer backends.
///
/// A renderer owns a long-lived browser (or equivalent) and hands out
/// short-lived sessions. Each `generate` call that needs a fresh screenshot
/// opens exactly one session and releases it before returning.
pub trait Renderer {
    type Session: RenderSession;

    /// Open a new page/tab session.
    fn open_session(&self) -> Result<Self::Session>;
}

/// One ephemeral page in the renderer. Never shared across render calls.
pub trait RenderSession {
    /// Navigate to a URL and wait until the page's network activity settles,
    /// failing with [`Error::Timeout`] once `timeout` elapses.
    fn navigate(&mut self, url: &str, timeout: Duration) -> Result<()>;

    /// Capture the current visual state as raw PNG bytes.
    fn capture(&mut self) -> Result<Vec<u8>>;

    /// Release the session. Must be safe to call after a failed navigation.
    fn close(&mut self) -> Result<()>;
}

/// Normalize a sub-directory string to the `/…/` form the slide server
/// expects: exactly one leading and one trailing slash, `"/"` when empty.
pub fn normalize_sub_directory(raw: &str) -> String {
    let inner = raw.trim_matches('/');
    if inner.is_empty() {
        "/".to_string()
    } else {
        format!("/{}/", inner)
    }
}

/// Build the render URL for a label. This string is also the cache key, so
/// two requests addressing the same deck through the same server always
/// agree on one cache slot.
pub fn render_url(server_address: &str, sub_directory: &str, label: &str) -> Result<String> {
    let mut url = url::Url::parse(server_address)
        .map_err(|e| Error::ConfigError(format!("invalid server address '{}': {}", server_address, e)))?;

    let path = format!("{}{}", normalize_sub_directory(sub_directory), VIEW_ROUTE);
    url.set_path(&path);
    url.query_pairs_mut().append_pair(LABEL_KEY, label);

    Ok(url.to_string())
}
