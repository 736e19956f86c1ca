//! Async-friendly facade over the thumbnail pipeline.
//!
//! The worker thread owns a synchronous [`ThumbnailService`] backed by the
//! CDP renderer and executes commands sent from async tasks, so an async
//! route layer gets an async interface without the renderer having to be
//! `Send` across tasks. Requests are served in arrival order; coalescing
//! concurrent requests for the same label is left to callers that need it.

use std::sync::mpsc::{self, Sender};
use std::thread;

use tokio::sync::oneshot;

use crate::cdp::CdpRenderer;
use crate::service::{ServiceConfig, Thumbnail, ThumbnailService};
use crate::{Error, Result};

enum Command {
    Generate(String, oneshot::Sender<Result<Thumbnail>>),
    Close(oneshot::Sender<()>),
}

/// Cloneable async handle to a worker-owned thumbnail service.
#[derive(Clone)]
pub struct Thumbnailer {
    cmd_tx: Sender<Command>,
}

impl Thumbnailer {
    /// Launch the browser and pipeline on a background thread.
    pub async fn new(config: ServiceConfig) -> Result<Self> {
        let (cmd_tx, cmd_rx) = mpsc::channel::<Command>();
        let (init_tx, init_rx): (oneshot::Sender<Result<()>>, oneshot::Receiver<Result<()>>) =
            oneshot::channel();

        thread::spawn(move || {
            // Initialize renderer and service on the worker thread
            let viewport = config.viewport;
            let service = match CdpRenderer::new(viewport)
                .and_then(|renderer| ThumbnailService::new(renderer, config))
            {
                Ok(service) => service,
                Err(err) => {
                    let _ = init_tx.send(Err(err));
                    return;
                }
            };

            let _ = init_tx.send(Ok(()));

            // Command loop
            while let Ok(cmd) = cmd_rx.recv() {
                match cmd {
                    Command::Generate(label, resp) => {
                        let res = service.generate(&label);
                        let _ = resp.send(res);
                    }
                    Command::Close(resp) => {
                        let _ = resp.send(());
                        break;
                    }
                }
            }
        });

        // Wait for the worker to report initialization success or failure
        let init_res = init_rx
            .await
            .map_err(|e| Error::Other(format!("Worker init canceled: {}", e)))?;
        init_res?;

        Ok(Self { cmd_tx })
    }

    /// Generate (or fetch) the thumbnail for a deck label.
    pub async fn generate(&self, label: &str) -> Result<Thumbnail> {
        let (tx, rx) = oneshot::channel();
        let _ = self.cmd_tx.send(Command::Generate(label.to_string(), tx));
        rx.await
            .map_err(|e| Error::Other(format!("Generate canceled: {}", e)))?
    }

    /// Shut down the background worker and the browser it owns.
    pub async fn close(self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        let _ = self.cmd_tx.send(Command::Close(tx));
        rx.await
            .map_err(|e| Error::Other(format!("Close canceled: {}", e)))
    }
}
