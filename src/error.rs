//! Error types for the thumbnail pipeline

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the thumbnail pipeline
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to initialize the renderer backend
    #[error("Renderer initialization failed: {0}")]
    InitializationError(String),

    /// The slide server did not answer the freshness probe
    #[error("Slide server unavailable: {0}")]
    Unavailable(String),

    /// Navigation to the render URL failed
    #[error("Failed to load URL: {0}")]
    LoadError(String),

    /// Screenshot capture failed
    #[error("Capture failed: {0}")]
    CaptureError(String),

    /// Navigation did not settle within the configured budget
    #[error("Render timed out after {0}ms")]
    Timeout(u64),

    /// The deck could not be rendered
    #[error("Thumbnail not found: {0}")]
    NotFound(String),

    /// Reading or writing the persisted artifact failed
    #[error("Artifact I/O failed: {0}")]
    ArtifactIo(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// CDP-specific error
    #[cfg(feature = "cdp")]
    #[error("CDP error: {0}")]
    CdpError(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// The HTTP status an inbound route should answer with for this error.
    ///
    /// A dead slide server is a 503 (no render is attempted for it); every
    /// failure of a single render attempt degrades to a 404.
    pub fn http_status(&self) -> u16 {
        match self {
            Error::Unavailable(_) => 503,
            Error::LoadError(_)
            | Error::CaptureError(_)
            | Error::Timeout(_)
            | Error::NotFound(_) => 404,
            _ => 500,
        }
    }
}

#[cfg(feature = "cdp")]
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::CdpError(err.to_string())
    }
}
