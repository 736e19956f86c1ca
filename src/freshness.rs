//! Source freshness clock.
//!
//! Staleness of a thumbnail is judged against the newest modification
//! instant among the files that influence the rendered page: the global
//! config file, the deck's optional parameter file, and the Markdown source
//! itself. The clock is a pure function over the filesystem; callers must
//! re-evaluate it on every staleness decision rather than hold onto a value.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::{MD_EXT, META_EXT};

/// Newest modification instant among the paths that exist.
///
/// Missing paths are skipped; when none exist the epoch is returned, which
/// makes every persisted artifact count as fresh. Never fails.
pub fn latest_mtime<P: AsRef<Path>>(paths: &[P]) -> SystemTime {
    let mut latest = SystemTime::UNIX_EPOCH;
    for path in paths {
        let Ok(meta) = std::fs::metadata(path) else {
            continue;
        };
        if let Ok(modified) = meta.modified() {
            if modified > latest {
                latest = modified;
            }
        }
    }
    latest
}

/// Filesystem layout of the inputs that feed one rendered deck.
#[derive(Debug, Clone)]
pub struct SourceLayout {
    /// Directory holding `{label}.md` and `{label}.yaml`.
    pub md_root: PathBuf,
    /// Global slide server config file.
    pub config_path: PathBuf,
}

impl SourceLayout {
    pub fn new(md_root: impl Into<PathBuf>, config_path: impl Into<PathBuf>) -> Self {
        Self {
            md_root: md_root.into(),
            config_path: config_path.into(),
        }
    }

    /// Path of the Markdown source for `label`.
    pub fn markdown_path(&self, label: &str) -> PathBuf {
        self.md_root.join(format!("{}.{}", label, MD_EXT))
    }

    /// Path of the per-deck parameter file for `label`.
    pub fn metadata_path(&self, label: &str) -> PathBuf {
        self.md_root.join(format!("{}.{}", label, META_EXT))
    }

    /// Freshness instant of the deck: max mtime over config, parameter file
    /// and Markdown source.
    pub fn source_freshness(&self, label: &str) -> SystemTime {
        latest_mtime(&[
            self.config_path.clone(),
            self.metadata_path(label),
            self.markdown_path(label),
        ])
    }
}
