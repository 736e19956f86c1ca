//! Thumbnail orchestration.
//!
//! `ThumbnailService` ties the pipeline together: probe the slide server,
//! invalidate and consult the in-memory cache, fall back to the disk
//! artifact when it is newer than every source file, and only as a last
//! resort drive a renderer session. Cache and disk are touched strictly
//! before and after the render, never during it, so one slow render never
//! blocks lookups for unrelated decks.

use std::path::PathBuf;
use std::time::SystemTime;

use log::{debug, warn};

use crate::cache::ThumbnailCache;
use crate::freshness::SourceLayout;
use crate::probe::FreshnessProbe;
use crate::stabilize::{settled_screenshot, StabilizePolicy};
use crate::store::ArtifactStore;
use crate::{render_url, Error, Renderer, Result, Viewport, MD_DIR, THUMBNAIL_DIR};

/// Which tier of the pipeline produced the bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServedFrom {
    Cache,
    Disk,
    Fresh,
}

/// A generated thumbnail plus the metadata the route layer needs for its
/// response headers.
#[derive(Debug, Clone)]
pub struct Thumbnail {
    pub data: Vec<u8>,
    pub served_from: ServedFrom,
    /// Source freshness instant, suitable for the reply's `Date` header.
    pub freshness: SystemTime,
}

/// Externally supplied configuration; nothing here is reparsed from files.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Base address of the slide server, e.g. `http://localhost:3000`.
    pub server_address: String,
    /// Sub-directory the server is mounted under; normalized internally.
    pub sub_directory: String,
    /// Resource directory holding `md/` sources and `thumbnail/` artifacts.
    pub resource_dir: PathBuf,
    /// Global slide config file.
    pub config_path: PathBuf,
    /// Byte ceiling of the in-memory cache.
    pub cache_bytes: u64,
    /// Render-and-settle knobs.
    pub policy: StabilizePolicy,
    /// Viewport for renderer sessions.
    pub viewport: Viewport,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            server_address: "http://localhost:3000".to_string(),
            sub_directory: "/".to_string(),
            resource_dir: PathBuf::from("resource"),
            config_path: PathBuf::from("config.yaml"),
            cache_bytes: 100 * 1024 * 1024,
            policy: StabilizePolicy::default(),
            viewport: Viewport::default(),
        }
    }
}

/// The thumbnail pipeline facade. Shareable across request tasks behind an
/// `Arc`; the cache carries its own lock and the renderer hands out
/// independent sessions.
pub struct ThumbnailService<R: Renderer> {
    renderer: R,
    cache: ThumbnailCache,
    store: ArtifactStore,
    probe: FreshnessProbe,
    sources: SourceLayout,
    server_address: String,
    sub_directory: String,
    policy: StabilizePolicy,
}

impl<R: Renderer> ThumbnailService<R> {
    pub fn new(renderer: R, config: ServiceConfig) -> Result<Self> {
        let probe = FreshnessProbe::new(config.policy.timeout)?;
        let sources = SourceLayout::new(config.resource_dir.join(MD_DIR), config.config_path);
        Ok(Self {
            renderer,
            cache: ThumbnailCache::new(config.cache_bytes),
            store: ArtifactStore::new(config.resource_dir.join(THUMBNAIL_DIR)),
            probe,
            sources,
            server_address: config.server_address,
            sub_directory: config.sub_directory,
            policy: config.policy,
        })
    }

    /// Produce the thumbnail for `label`, cheapest tier first.
    pub fn generate(&self, label: &str) -> Result<Thumbnail> {
        let url = render_url(&self.server_address, &self.sub_directory, label)?;

        // Liveness and freshness in one round trip. A dead server aborts the
        // request here; rendering against it could not succeed anyway.
        let remote_date = self.probe.remote_date(&url)?;

        // Drop any cached entry that does not provably postdate the state
        // the server just reported.
        self.cache.trash_if(&url, remote_date);

        if let Some(data) = self.cache.pull(&url) {
            debug!("{}: served from cache", label);
            return Ok(Thumbnail {
                data,
                served_from: ServedFrom::Cache,
                freshness: self.sources.source_freshness(label),
            });
        }

        let freshness = self.sources.source_freshness(label);

        if let Some((data, artifact_mtime)) = self.store.read(label) {
            if artifact_mtime > freshness {
                debug!("{}: served from disk artifact", label);
                self.cache.push(&url, data.clone());
                return Ok(Thumbnail {
                    data,
                    served_from: ServedFrom::Disk,
                    freshness,
                });
            }
        }

        let data = match settled_screenshot(&self.renderer, &url, self.policy) {
            Ok(data) => data,
            Err(err @ Error::Timeout(_)) => return Err(err),
            Err(err) => {
                // A failed render of one deck is a missing thumbnail, not a
                // pipeline failure.
                return Err(Error::NotFound(format!("{}: {}", label, err)));
            }
        };

        // A write failure costs us the persisted copy but not the response.
        if let Err(err) = self.store.write(label, &data) {
            warn!("{}: {}", label, err);
        }
        self.cache.push(&url, data.clone());

        debug!("{}: served from fresh render", label);
        Ok(Thumbnail {
            data,
            served_from: ServedFrom::Fresh,
            freshness,
        })
    }

    /// Render URL (and cache key) for a label; exposed for route handlers
    /// that need to address the deck themselves.
    pub fn url_for(&self, label: &str) -> Result<String> {
        render_url(&self.server_address, &self.sub_directory, label)
    }
}
