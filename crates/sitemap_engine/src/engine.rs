use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use crawl_logging::{crawl_debug, crawl_error, crawl_trace, crawl_warn};

use crate::{AgentReport, BackendError, EngineEvent, HeaderOutcome, PageId, RenderBackend};

/// Work requested of the rendering backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCommand {
    OpenContext,
    OpenPage { page: PageId, url: String },
    InjectAgent { page: PageId },
    ClosePage { page: PageId },
    QueryOpenCount,
    CloseContext,
}

/// Runs a [`RenderBackend`] on a background thread with its own tokio runtime.
///
/// Page-table commands (open, close, count) are applied in the order they are
/// sent; network work is spawned as one task per command.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<BackendCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl EngineHandle {
    pub fn spawn(backend: Arc<dyn RenderBackend>) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();

        thread::spawn(move || {
            let runtime = match tokio::runtime::Runtime::new() {
                Ok(runtime) => runtime,
                Err(err) => {
                    crawl_error!("Failed to start engine runtime: {}", err);
                    let _ = event_tx.send(EngineEvent::ContextFailed {
                        reason: format!("runtime unavailable: {err}"),
                    });
                    return;
                }
            };
            while let Ok(command) = cmd_rx.recv() {
                crawl_trace!("Engine command {:?}", command);
                dispatch(&runtime, &backend, command, &event_tx);
            }
            crawl_debug!("Engine command channel closed; shutting down");
        });

        Self { cmd_tx, event_rx }
    }

    pub fn send(&self, command: BackendCommand) {
        if self.cmd_tx.send(command).is_err() {
            crawl_warn!("Engine thread is gone; command dropped");
        }
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }

    /// Hands the event stream to another consumer, e.g. a relay thread.
    pub fn into_parts(self) -> (EngineCommander, mpsc::Receiver<EngineEvent>) {
        (
            EngineCommander {
                cmd_tx: self.cmd_tx,
            },
            self.event_rx,
        )
    }
}

/// Sending half of an [`EngineHandle`].
#[derive(Clone)]
pub struct EngineCommander {
    cmd_tx: mpsc::Sender<BackendCommand>,
}

impl EngineCommander {
    pub fn send(&self, command: BackendCommand) {
        if self.cmd_tx.send(command).is_err() {
            crawl_warn!("Engine thread is gone; command dropped");
        }
    }
}

fn dispatch(
    runtime: &tokio::runtime::Runtime,
    backend: &Arc<dyn RenderBackend>,
    command: BackendCommand,
    event_tx: &mpsc::Sender<EngineEvent>,
) {
    match command {
        BackendCommand::OpenContext => {
            let backend = backend.clone();
            let event_tx = event_tx.clone();
            runtime.spawn(async move {
                let event = match backend.open_context().await {
                    Ok(()) => EngineEvent::ContextOpened,
                    Err(err) => EngineEvent::ContextFailed {
                        reason: err.to_string(),
                    },
                };
                let _ = event_tx.send(event);
            });
        }
        BackendCommand::OpenPage { page, url } => {
            if let Err(err) = runtime.block_on(backend.open_page(page, &url)) {
                let _ = event_tx.send(EngineEvent::OpenFailed {
                    page,
                    reason: err.to_string(),
                });
                return;
            }
            let backend = backend.clone();
            let event_tx = event_tx.clone();
            runtime.spawn(async move {
                if let Some(event) = headers_event(page, backend.observe_headers(page).await) {
                    let _ = event_tx.send(event);
                }
            });
        }
        BackendCommand::InjectAgent { page } => {
            let backend = backend.clone();
            let event_tx = event_tx.clone();
            runtime.spawn(async move {
                for event in inject_events(page, backend.inject_agent(page).await) {
                    let _ = event_tx.send(event);
                }
            });
        }
        BackendCommand::ClosePage { page } => {
            let event = match runtime.block_on(backend.close_page(page)) {
                Ok(()) => EngineEvent::PageClosed { page },
                Err(err) => {
                    crawl_warn!("Failed to close page {}: {}", page, err);
                    EngineEvent::ContextFailed {
                        reason: err.to_string(),
                    }
                }
            };
            let _ = event_tx.send(event);
        }
        BackendCommand::QueryOpenCount => {
            let count = runtime.block_on(backend.query_open_count());
            let _ = event_tx.send(EngineEvent::OpenPages { count });
        }
        BackendCommand::CloseContext => {
            if let Err(err) = runtime.block_on(backend.close_context()) {
                crawl_warn!("Failed to close rendering context: {}", err);
            }
        }
    }
}

fn headers_event(
    page: PageId,
    result: Result<HeaderOutcome, BackendError>,
) -> Option<EngineEvent> {
    match result {
        Ok(HeaderOutcome::Response {
            status,
            content_type,
        }) => Some(EngineEvent::Headers {
            page,
            status,
            content_type,
        }),
        Ok(HeaderOutcome::Redirect { target }) => Some(EngineEvent::Redirected { page, target }),
        Err(err) if err.is_page_gone() => {
            crawl_trace!("Page {} closed before headers arrived", page);
            None
        }
        Err(err) if err.is_surface_failure() => Some(EngineEvent::OpenFailed {
            page,
            reason: err.to_string(),
        }),
        Err(err) => Some(EngineEvent::PageError {
            page,
            reason: err.to_string(),
        }),
    }
}

fn inject_events(
    page: PageId,
    result: Result<AgentReport, BackendError>,
) -> Vec<EngineEvent> {
    match result {
        Ok(report) => report
            .into_messages(page)
            .into_iter()
            .map(EngineEvent::Agent)
            .collect(),
        Err(err) if err.is_page_gone() => {
            crawl_trace!("Page {} closed before the agent ran", page);
            Vec::new()
        }
        Err(err) if err.is_surface_failure() => vec![EngineEvent::InjectFailed {
            page,
            reason: err.to_string(),
        }],
        // The body could not be read; the page already counted, only its links are lost.
        Err(err) => vec![EngineEvent::PageError {
            page,
            reason: err.to_string(),
        }],
    }
}

