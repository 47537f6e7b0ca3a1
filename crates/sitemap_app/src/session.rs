use std::path::PathBuf;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::{Duration, Instant};

use crawl_logging::{crawl_debug, crawl_info, crawl_warn};
use sitemap_core::{update, CrawlConfig, CrawlState, CrawlStatus, Msg};
use sitemap_engine::{
    sitemap_filename, BackendSettings, EngineHandle, FileSink, HttpBackend, RenderBackend,
};

use crate::effects::{event_to_msg, log_status, EffectRunner};
use crate::report::{report_filename, CrawlReport};
use crate::SessionError;

pub const DEFAULT_STATUS_INTERVAL: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub crawl: CrawlConfig,
    pub backend: BackendSettings,
    pub output_dir: PathBuf,
    pub status_interval: Duration,
    /// Terminate the crawl once this much time has passed.
    pub max_duration: Option<Duration>,
    pub write_report: bool,
}

impl SessionOptions {
    pub fn new(crawl: CrawlConfig, output_dir: PathBuf) -> Self {
        Self {
            crawl,
            backend: BackendSettings::default(),
            output_dir,
            status_interval: DEFAULT_STATUS_INTERVAL,
            max_duration: None,
            write_report: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOutcome {
    pub status: CrawlStatus,
    pub success: Vec<String>,
    pub errors: Vec<String>,
    /// `None` when no page qualified for the sitemap.
    pub sitemap_path: Option<PathBuf>,
    pub report_path: Option<PathBuf>,
}

/// Crawls with the HTTP backend until the session completes.
///
/// `on_complete` runs exactly once, when the crawl finishes, before the
/// sitemap is written.
pub fn run_session<F>(options: SessionOptions, on_complete: F) -> Result<SessionOutcome, SessionError>
where
    F: FnOnce(&CrawlStatus) + Send + 'static,
{
    let backend = HttpBackend::new(options.backend.clone())?;
    run_session_with_backend(options, Arc::new(backend), on_complete)
}

pub fn run_session_with_backend<F>(
    options: SessionOptions,
    backend: Arc<dyn RenderBackend>,
    on_complete: F,
) -> Result<SessionOutcome, SessionError>
where
    F: FnOnce(&CrawlStatus) + Send + 'static,
{
    let (msg_tx, msg_rx) = mpsc::channel::<Msg>();
    let (engine, events) = EngineHandle::spawn(backend).into_parts();

    // Relay: engine events become messages on the session channel.
    thread::spawn(move || {
        for event in events.iter() {
            if msg_tx.send(event_to_msg(event)).is_err() {
                break;
            }
        }
    });

    let base_url = options.crawl.base_url().to_string();
    let mut runner = EffectRunner::new(
        engine,
        FileSink::new(options.output_dir.clone()),
        base_url.clone(),
        Box::new(on_complete),
    );
    let mut driver = Driver::new(&options);
    let mut state = CrawlState::new();

    state = dispatch(state, Msg::Start(options.crawl.clone()), &mut runner, &mut driver)?;

    while !state.is_complete() {
        let now = Instant::now();
        if let Some(msg) = driver.due(now) {
            state = dispatch(state, msg, &mut runner, &mut driver)?;
            continue;
        }

        let wait = driver.next_deadline().saturating_duration_since(now);
        match msg_rx.recv_timeout(wait) {
            Ok(msg) => state = dispatch(state, msg, &mut runner, &mut driver)?,
            Err(mpsc::RecvTimeoutError::Timeout) => {}
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                crawl_warn!("Engine event stream closed mid-session");
                return Err(SessionError::EngineStopped);
            }
        }
    }

    let (status, completed_at) = runner
        .completed
        .clone()
        .unwrap_or_else(|| (state.status(), chrono::Utc::now()));
    log_status(&status);

    let success = state.success_urls();
    let errors = state.error_urls();
    let sitemap_path = runner.sitemap_path.clone();
    if sitemap_path.is_none() {
        crawl_info!("No pages qualified for the sitemap; nothing exported");
    }

    let report_path = if options.write_report {
        let report = CrawlReport::new(
            &status,
            completed_at,
            sitemap_path.as_ref().map(|path| path.display().to_string()),
            success.clone(),
            errors.clone(),
        );
        let name = report_filename(&sitemap_filename(&base_url, completed_at));
        let path = runner.sink().write_named(&name, &report.to_json()?)?;
        crawl_info!("Crawl report written to {}", path.display());
        Some(path)
    } else {
        None
    };

    Ok(SessionOutcome {
        status,
        success,
        errors,
        sitemap_path,
        report_path,
    })
}

fn dispatch(
    state: CrawlState,
    msg: Msg,
    runner: &mut EffectRunner,
    driver: &mut Driver,
) -> Result<CrawlState, SessionError> {
    let (state, effects) = update(state, msg);
    runner.run(effects)?;
    if let Some(interval) = runner.take_schedule() {
        driver.set_tick(interval);
    }
    Ok(state)
}

/// Local timers: the orchestrator's tick, status polling and the overall deadline.
struct Driver {
    tick_interval: Option<Duration>,
    next_tick: Option<Instant>,
    status_interval: Duration,
    next_status: Instant,
    terminate_at: Option<Instant>,
}

impl Driver {
    fn new(options: &SessionOptions) -> Self {
        let now = Instant::now();
        let status_interval = options.status_interval.max(Duration::from_millis(1));
        Self {
            tick_interval: None,
            next_tick: None,
            status_interval,
            next_status: now + status_interval,
            terminate_at: options.max_duration.map(|limit| now + limit),
        }
    }

    fn set_tick(&mut self, interval: Option<Duration>) {
        if self.tick_interval != interval {
            crawl_debug!("Tick interval {:?}", interval);
        }
        self.tick_interval = interval;
        self.next_tick = interval.map(|every| Instant::now() + every);
    }

    /// The next locally generated message that is due, if any.
    fn due(&mut self, now: Instant) -> Option<Msg> {
        if self.terminate_at.is_some_and(|at| now >= at) {
            self.terminate_at = None;
            crawl_info!("Maximum crawl duration reached; terminating");
            return Some(Msg::Terminate);
        }
        if now >= self.next_status {
            self.next_status = now + self.status_interval;
            return Some(Msg::Status);
        }
        if let (Some(at), Some(every)) = (self.next_tick, self.tick_interval) {
            if now >= at {
                self.next_tick = Some(now + every);
                return Some(Msg::Tick);
            }
        }
        None
    }

    fn next_deadline(&self) -> Instant {
        [self.next_tick, self.terminate_at]
            .into_iter()
            .flatten()
            .fold(self.next_status, Instant::min)
    }
}
