use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use crawl_logging::{crawl_debug, crawl_info, crawl_trace};
use sitemap_core::{CrawlStatus, Effect, Msg};
use sitemap_engine::{AgentMessage, BackendCommand, EngineCommander, EngineEvent, FileSink};

use crate::SessionError;

pub(crate) type CompletionCallback = Box<dyn FnOnce(&CrawlStatus) + Send>;

/// Executes orchestrator effects against the engine and the export sink.
pub(crate) struct EffectRunner {
    engine: EngineCommander,
    sink: FileSink,
    base_url: String,
    on_complete: Option<CompletionCallback>,
    schedule: Option<Option<Duration>>,
    pub(crate) completed: Option<(CrawlStatus, DateTime<Utc>)>,
    pub(crate) sitemap_path: Option<PathBuf>,
}

impl EffectRunner {
    pub(crate) fn new(
        engine: EngineCommander,
        sink: FileSink,
        base_url: String,
        on_complete: CompletionCallback,
    ) -> Self {
        Self {
            engine,
            sink,
            base_url,
            on_complete: Some(on_complete),
            schedule: None,
            completed: None,
            sitemap_path: None,
        }
    }

    pub(crate) fn run(&mut self, effects: Vec<Effect>) -> Result<(), SessionError> {
        for effect in effects {
            crawl_trace!("Effect {:?}", effect);
            match effect {
                Effect::OpenContext => self.engine.send(BackendCommand::OpenContext),
                Effect::OpenPage { page, url } => {
                    self.engine.send(BackendCommand::OpenPage { page, url });
                }
                Effect::InjectAgent { page } => {
                    self.engine.send(BackendCommand::InjectAgent { page });
                }
                Effect::ClosePage { page } => self.engine.send(BackendCommand::ClosePage { page }),
                Effect::QueryOpenCount => self.engine.send(BackendCommand::QueryOpenCount),
                Effect::CloseContext => self.engine.send(BackendCommand::CloseContext),
                Effect::Schedule(timer) => {
                    crawl_debug!("Timer now {:?}", timer);
                    self.schedule = Some(timer.interval());
                }
                Effect::NotifyComplete(status) => {
                    if let Some(callback) = self.on_complete.take() {
                        callback(&status);
                    }
                    self.completed = Some((status, Utc::now()));
                }
                Effect::ExportSitemap { document } => {
                    let completed_at = self
                        .completed
                        .as_ref()
                        .map(|(_, at)| *at)
                        .unwrap_or_else(Utc::now);
                    let path = self.sink.export(&self.base_url, completed_at, &document)?;
                    self.sitemap_path = Some(path);
                }
                Effect::ReportStatus(status) => log_status(&status),
            }
        }
        Ok(())
    }

    /// A timer change requested since the last call, if any.
    pub(crate) fn take_schedule(&mut self) -> Option<Option<Duration>> {
        self.schedule.take()
    }

    pub(crate) fn sink(&self) -> &FileSink {
        &self.sink
    }
}

pub(crate) fn log_status(status: &CrawlStatus) {
    crawl_info!(
        "Status url={} state={:?} queue={} completed={} success={} error={}",
        status.url,
        status.state,
        status.queue,
        status.completed,
        status.success,
        status.error
    );
}

/// Translates a backend event into the orchestrator's vocabulary.
pub(crate) fn event_to_msg(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::ContextOpened => Msg::ContextOpened,
        EngineEvent::ContextFailed { reason } => Msg::ContextFailed { reason },
        EngineEvent::OpenFailed { page, reason } => Msg::OpenFailed { page, reason },
        EngineEvent::Headers {
            page,
            status,
            content_type,
        } => Msg::HeadersReceived {
            page,
            status,
            content_type,
        },
        EngineEvent::Redirected { page, target } => Msg::Redirected { page, target },
        EngineEvent::PageError { page, reason } => Msg::PageError { page, reason },
        EngineEvent::InjectFailed { page, reason } => Msg::InjectFailed { page, reason },
        EngineEvent::Agent(AgentMessage::ExcludeSelf { url, .. }) => Msg::Exclude { url },
        EngineEvent::Agent(AgentMessage::DiscoveredLinks { page, origin, urls }) => {
            Msg::LinksDiscovered { page, origin, urls }
        }
        EngineEvent::PageClosed { page } => Msg::PageClosed { page },
        EngineEvent::OpenPages { count } => Msg::OpenPages { count },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn agent_messages_map_to_exclude_and_links() {
        assert_eq!(
            event_to_msg(EngineEvent::Agent(AgentMessage::ExcludeSelf {
                page: 4,
                url: "https://x.test/private".to_string(),
            })),
            Msg::Exclude {
                url: "https://x.test/private".to_string()
            }
        );
        assert_eq!(
            event_to_msg(EngineEvent::Agent(AgentMessage::DiscoveredLinks {
                page: 4,
                origin: "https://x.test/".to_string(),
                urls: vec!["/a".to_string()],
            })),
            Msg::LinksDiscovered {
                page: 4,
                origin: "https://x.test/".to_string(),
                urls: vec!["/a".to_string()],
            }
        );
    }

    #[test]
    fn header_event_keeps_status_and_type() {
        assert_eq!(
            event_to_msg(EngineEvent::Headers {
                page: 1,
                status: 304,
                content_type: None,
            }),
            Msg::HeadersReceived {
                page: 1,
                status: 304,
                content_type: None,
            }
        );
    }
}
