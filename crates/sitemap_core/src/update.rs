use crawl_logging::{crawl_debug, crawl_info, crawl_trace, crawl_warn};
use url::Url;

use crate::filter::{self, Admission};
use crate::state::{OpenPage, Session};
use crate::{serialize_sitemap, CrawlConfig, CrawlState, Effect, Msg, PageId, SessionState, Timer};

/// Pure update function: applies a message to state and returns any effects.
///
/// Effects must be carried out in order. Events for unknown or already closed
/// pages are dropped, so backend signals may arrive late or out of order.
pub fn update(mut state: CrawlState, msg: Msg) -> (CrawlState, Vec<Effect>) {
    let mut effects = Vec::new();

    match msg {
        Msg::Start(config) => {
            if state.session.is_none() {
                start(&mut state, config, &mut effects);
            } else {
                crawl_debug!("Start ignored: a session already exists");
            }
        }
        Msg::Status => effects.push(Effect::ReportStatus(state.status())),
        other => {
            if let Some(session) = state.session.as_mut() {
                handle(session, other, &mut effects);
            }
        }
    }

    (state, effects)
}

fn start(state: &mut CrawlState, config: CrawlConfig, effects: &mut Vec<Effect>) {
    let base = match Url::parse(config.base_url()) {
        Ok(base) => base,
        Err(err) => {
            crawl_warn!("Start ignored: base url {} unparsable: {}", config.base_url(), err);
            return;
        }
    };
    crawl_info!(
        "Crawl session starting url={} scope={} concurrency={}",
        config.base_url(),
        config.request_pattern(),
        config.effective_concurrency()
    );

    let mut session = Session::new(config, base);
    let seed = session.config.base_url().to_string();
    session.frontier.push(seed);
    state.session = Some(session);
    effects.push(Effect::OpenContext);
}

fn handle(session: &mut Session, msg: Msg, effects: &mut Vec<Effect>) {
    let running = session.phase == SessionState::Running;

    match msg {
        Msg::Start(_) | Msg::Status => {}
        Msg::Tick => match session.phase {
            SessionState::Running => drain(session, effects),
            SessionState::Draining => poll_closed(session, effects),
            SessionState::Idle | SessionState::Complete => {}
        },
        Msg::Terminate => {
            if running {
                begin_draining(session, "terminate requested", effects);
            }
        }
        Msg::Exclude { url } => {
            if running {
                exclude(session, &url);
            }
        }
        Msg::ContextOpened => {
            if running && !session.context_ready {
                session.context_ready = true;
                drain(session, effects);
                if session.phase == SessionState::Running {
                    effects.push(Effect::Schedule(Timer::Drain(session.config.drain_interval)));
                }
            }
        }
        Msg::ContextFailed { reason } => {
            if running {
                crawl_warn!("Rendering context failed to open: {}", reason);
                begin_draining(session, "rendering context unavailable", effects);
            }
        }
        Msg::OpenFailed { page, reason } => {
            // The page never opened, so there is nothing left to close.
            if let Some(slot) = session.open_pages.remove(&page) {
                crawl_warn!("Failed to open page {} url={}: {}", page, slot.url, reason);
            }
            if running {
                begin_draining(session, "rendering surface refused a page", effects);
            } else {
                after_page_released(session, effects);
            }
        }
        Msg::HeadersReceived {
            page,
            status,
            content_type,
        } => headers_received(session, page, status, content_type, effects),
        Msg::Redirected { page, target } => {
            let Some(slot) = session.open_pages.get_mut(&page) else {
                return;
            };
            slot.headers_seen = true;
            let origin = slot.url.clone();
            effects.push(Effect::ClosePage { page });
            if running {
                crawl_debug!("Redirect page={} from={} to={}", page, origin, target);
                submit_links(session, std::slice::from_ref(&target), Some(origin.as_str()));
                drain(session, effects);
            }
        }
        Msg::PageError { page, reason } => {
            let Some(slot) = session.open_pages.get(&page) else {
                return;
            };
            crawl_debug!("Page error page={} url={}: {}", page, slot.url, reason);
            effects.push(Effect::ClosePage { page });
        }
        Msg::InjectFailed { page, reason } => {
            if running && session.open_pages.contains_key(&page) {
                crawl_warn!("Page agent injection failed for page {}: {}", page, reason);
                begin_draining(session, "page agent injection failed", effects);
            }
        }
        Msg::LinksDiscovered { page, origin, urls } => {
            if !running || !session.open_pages.contains_key(&page) {
                return;
            }
            crawl_debug!("Page {} reported {} links from {}", page, urls.len(), origin);
            submit_links(session, &urls, Some(origin.as_str()));
            effects.push(Effect::ClosePage { page });
            drain(session, effects);
        }
        Msg::PageClosed { page } => {
            if session.open_pages.remove(&page).is_some() {
                crawl_trace!("Page {} closed", page);
                after_page_released(session, effects);
            }
        }
        Msg::OpenPages { count } => {
            if session.phase == SessionState::Draining && count == 0 {
                finish(session, effects);
            }
        }
    }
}

fn headers_received(
    session: &mut Session,
    page: PageId,
    status: u16,
    content_type: Option<String>,
    effects: &mut Vec<Effect>,
) {
    let Some(slot) = session.open_pages.get_mut(&page) else {
        return;
    };
    if session.phase != SessionState::Running {
        effects.push(Effect::ClosePage { page });
        return;
    }
    if slot.headers_seen {
        return;
    }
    slot.headers_seen = true;
    let url = slot.url.clone();

    let allowed = content_type
        .as_deref()
        .is_some_and(|ct| session.config.is_content_type_allowed(ct));
    if !allowed {
        crawl_debug!(
            "Cancel page={} url={} content_type={:?}",
            page,
            url,
            content_type
        );
        effects.push(Effect::ClosePage { page });
        return;
    }

    if !session.config.is_status_accepted(status) {
        crawl_debug!("Rejected status page={} url={} status={}", page, url, status);
        session.ledger.record_error(&url);
        effects.push(Effect::ClosePage { page });
        drain(session, effects);
        return;
    }

    session.ledger.record_success(&url);
    effects.push(Effect::InjectAgent { page });
}

fn exclude(session: &mut Session, raw: &str) {
    let Some(canonical) = filter::canonicalize(raw, Some(&session.base)) else {
        crawl_debug!("Exclude ignored: unparsable url {}", raw);
        return;
    };
    if session.ledger.exclude(canonical.as_str()) {
        crawl_info!("Excluded from sitemap: {}", canonical.as_str());
    }
}

fn submit_links(session: &mut Session, urls: &[String], origin: Option<&str>) {
    let origin = origin.and_then(|raw| Url::parse(raw).ok());
    let origin = origin.as_ref().unwrap_or(&session.base);

    for raw in urls {
        match filter::admit(
            raw,
            Some(origin),
            &session.config,
            &session.ledger,
            &session.frontier,
        ) {
            Admission::Enqueue(url) => {
                crawl_trace!("Admitted {}", url);
                session.frontier.push(url);
            }
            Admission::MirrorSuccess(url) => {
                session.ledger.mark_handled(&url);
                session.ledger.record_success(&url);
            }
            Admission::MirrorError(url) => {
                session.ledger.mark_handled(&url);
                session.ledger.record_error(&url);
            }
            Admission::Rejected(reason) => {
                crawl_trace!("Rejected {} ({:?})", raw, reason);
            }
        }
    }
}

/// Dispatches frontier URLs until the concurrency cap is reached, or starts
/// shutdown when the crawl is exhausted.
fn drain(session: &mut Session, effects: &mut Vec<Effect>) {
    if session.phase != SessionState::Running || !session.context_ready {
        return;
    }
    let cap = session.config.effective_concurrency();

    loop {
        if session.crawl_exhausted() {
            begin_draining(session, "crawl complete", effects);
            return;
        }
        if session.open_pages.len() >= cap {
            return;
        }
        let Some(url) = session.frontier.pop() else {
            return;
        };
        // Excluded after it was queued.
        if session.ledger.is_handled(&url) {
            continue;
        }

        session.ledger.mark_handled(&url);
        session.dispatched_any = true;
        let page = session.allocate_page_id();
        crawl_debug!("Dispatch page={} url={}", page, url);
        session.open_pages.insert(
            page,
            OpenPage {
                url: url.clone(),
                headers_seen: false,
            },
        );
        effects.push(Effect::OpenPage { page, url });
    }
}

fn after_page_released(session: &mut Session, effects: &mut Vec<Effect>) {
    match session.phase {
        SessionState::Running => drain(session, effects),
        SessionState::Draining if session.open_pages.is_empty() => {
            effects.push(Effect::QueryOpenCount);
        }
        _ => {}
    }
}

fn begin_draining(session: &mut Session, reason: &str, effects: &mut Vec<Effect>) {
    crawl_info!(
        "Crawl session draining ({}): {} open pages, {} pending",
        reason,
        session.open_pages.len(),
        session.frontier.len()
    );
    session.phase = SessionState::Draining;
    effects.push(Effect::Schedule(Timer::ClosePoll(
        session.config.close_poll_interval,
    )));
    poll_closed(session, effects);
}

fn poll_closed(session: &mut Session, effects: &mut Vec<Effect>) {
    for page in session.open_pages.keys() {
        effects.push(Effect::ClosePage { page: *page });
    }
    effects.push(Effect::QueryOpenCount);
}

fn finish(session: &mut Session, effects: &mut Vec<Effect>) {
    if !session.open_pages.is_empty() {
        crawl_warn!(
            "Backend reports no open pages; dropping {} unconfirmed",
            session.open_pages.len()
        );
        session.open_pages.clear();
    }
    session.phase = SessionState::Complete;

    let status = session.status();
    crawl_info!(
        "Crawl session complete url={} success={} error={} completed={}",
        status.url,
        status.success,
        status.error,
        status.completed
    );
    effects.push(Effect::Schedule(Timer::Stopped));
    effects.push(Effect::CloseContext);
    effects.push(Effect::NotifyComplete(status));
    if let Some(document) = serialize_sitemap(session.ledger.success()) {
        effects.push(Effect::ExportSitemap { document });
    }
}
