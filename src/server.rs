//! Web server for the Rakshita dashboard.
//!
//! Provides the alert pages and the support desk using:
//! - Axum for HTTP server
//! - SSE (Server-Sent Events) to tell open pages the alert set changed
//! - HTMX for dynamic UI without heavy JavaScript
//! - Leaflet for the live map

use std::collections::BTreeMap;
use std::convert::Infallible;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use axum::{
    Form, Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{
        Html, IntoResponse, Redirect, Response,
        sse::{Event, KeepAlive, Sse},
    },
    routing::{get, post},
};
use serde::Deserialize;
use tokio::sync::{Mutex, RwLock, broadcast};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;

use crate::clock::{Clock, SystemClock};
use crate::contact::{
    self, ChannelAction, ContactForm, EMERGENCY_SERVICES, FAQ_ITEMS, FORM_FIELDS, FaqAccordion,
    Notice, SubscribeForm, SupportChannel,
};
use crate::errors::RakshitaError;
use crate::export;
use crate::field_cache::{FieldCache, FieldSessions, SessionBacking, SessionId};
use crate::generator::MockGenerator;
use crate::map::{LeafletScript, MapFocus, sync_markers};
use crate::models::{AlertId, PageKind};
use crate::pages;
use crate::render;
use crate::simulator::{FeedEvent, MockFeed, Schedule, Simulator};
use crate::store::AlertStore;
use crate::view::AlertView;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    /// Which page's starting set to seed the shared store with
    pub seed: PageKind,
    pub seed_count: usize,
    pub schedule: Schedule,
    /// Fixed RNG seed for reproducible demos
    pub rng_seed: Option<u64>,
    /// Directory for auto-saved form drafts, one file per browser session;
    /// in memory when `None`
    pub cache_dir: Option<PathBuf>,
    pub submit_delay: Duration,
    pub subscribe_delay: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        let seed = PageKind::default();
        Self {
            port: 8080,
            host: "127.0.0.1".to_string(),
            seed,
            seed_count: default_seed_count(seed),
            schedule: Schedule::for_page(seed),
            rng_seed: None,
            cache_dir: None,
            submit_delay: contact::SUBMIT_DELAY,
            subscribe_delay: contact::SUBSCRIBE_DELAY,
        }
    }
}

/// Size of a page's starting set.
#[must_use]
pub const fn default_seed_count(kind: PageKind) -> usize {
    match kind {
        PageKind::LiveMap => 5,
        PageKind::History => 25,
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// The one alert collection every page reads
    store: Arc<RwLock<AlertStore>>,
    /// Channel for broadcasting feed events to SSE clients
    tx: broadcast::Sender<FeedEvent>,
    /// Flag to control the live feed
    feed_active: Arc<AtomicBool>,
    clock: Arc<dyn Clock>,
    /// Auto-saved support form drafts, per browser session
    fields: Arc<Mutex<FieldSessions>>,
    /// Server configuration
    config: ServerConfig,
}

impl AppState {
    #[must_use]
    pub fn new(
        config: ServerConfig,
        store: AlertStore,
        clock: Arc<dyn Clock>,
        fields: FieldSessions,
    ) -> Self {
        let (tx, _rx) = broadcast::channel::<FeedEvent>(100);
        Self {
            store: Arc::new(RwLock::new(store)),
            tx,
            feed_active: Arc::new(AtomicBool::new(true)),
            clock,
            fields: Arc::new(Mutex::new(fields)),
            config,
        }
    }
}

/// Create the Axum router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/map", get(map_page_handler))
        .route("/map/alerts", get(map_alerts_handler))
        .route("/alerts", get(alerts_page_handler))
        .route("/alerts/table", get(alerts_table_handler))
        .route("/alerts/export.csv", get(export_handler))
        .route("/alerts/refresh", post(refresh_handler))
        .route("/alerts/{id}", get(alert_detail_handler))
        .route("/contact", get(contact_page_handler))
        .route("/contact/submit", post(submit_handler))
        .route("/contact/subscribe", post(subscribe_handler))
        .route("/contact/field", post(save_field_handler))
        .route("/contact/fields", get(restore_fields_handler))
        .route("/contact/faq/{index}", get(faq_handler))
        .route("/contact/call/{index}", post(call_handler))
        .route("/contact/channel/{channel}", post(channel_handler))
        .route("/stream", get(sse_handler))
        .route("/feed/start", post(start_feed_handler))
        .route("/feed/stop", post(stop_feed_handler))
        .route("/feed/status", get(feed_status_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

/// Start the web server.
///
/// Seeds the shared store, spawns the feed simulator and serves until the
/// listener fails.
///
/// # Errors
///
/// Returns an error if seeding or binding fails.
pub async fn run_server(config: ServerConfig) -> anyhow::Result<()> {
    config.schedule.validate().map_err(anyhow::Error::msg)?;

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let now = clock.now();
    let mut generator = MockGenerator::from_seed(config.rng_seed);
    let seed = generator.seed(config.seed, config.seed_count, now);
    let store = AlertStore::seeded(seed, now)?;
    tracing::info!(
        "Seeded {} {} alerts ({} active)",
        store.len(),
        config.seed.as_str(),
        store.active_count()
    );

    let backing = match &config.cache_dir {
        Some(dir) => SessionBacking::Directory(dir.clone()),
        None => SessionBacking::Memory,
    };
    let fields = FieldSessions::new("contact", &FORM_FIELDS, backing);

    let state = AppState::new(config.clone(), store, clock.clone(), fields);

    // Spawn the background feed, continuing the seeding generator's ids
    let simulator = Simulator::new(
        Box::new(MockFeed::new(generator, &config.schedule)),
        clock,
    );
    tokio::spawn(simulator.run(
        config.schedule,
        state.store.clone(),
        state.tx.clone(),
        state.feed_active.clone(),
    ));

    let app = create_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    tracing::info!("🛡 Rakshita dashboard starting at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============================================================================
// Query Parameters
// ============================================================================

/// Filter criteria and page cursor carried by every alert fragment request.
#[derive(Debug, Default, Deserialize)]
struct ViewQuery {
    #[serde(default)]
    search: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    time: String,
    /// Absent on filter changes, which therefore land on page 1
    page: Option<String>,
    /// Move one page from `page`
    step: Option<Step>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
enum Step {
    Prev,
    Next,
}

impl ViewQuery {
    fn view(&self, kind: PageKind) -> Result<AlertView, (StatusCode, String)> {
        let bad = |e: String| (StatusCode::BAD_REQUEST, e);
        let mut view = AlertView::new(kind);
        view.set_search(&self.search);
        view.set_status(self.status.parse().map_err(bad)?);
        view.set_window(self.time.parse().map_err(bad)?);
        Ok(view)
    }

    fn page(&self) -> Option<usize> {
        self.page.as_deref().and_then(|p| p.trim().parse().ok())
    }
}

#[derive(Debug, Deserialize)]
struct FocusQuery {
    lat: Option<f64>,
    lng: Option<f64>,
    alert: Option<AlertId>,
}

#[derive(Debug, Deserialize)]
struct FieldUpdate {
    field: String,
    #[serde(default)]
    value: String,
}

#[derive(Debug, Deserialize)]
struct FaqQuery {
    /// Currently open question; empty when all are closed
    open: Option<String>,
}

// ============================================================================
// Route Handlers
// ============================================================================

async fn index_handler() -> Redirect {
    Redirect::to("/map")
}

/// Map page, optionally focused on one alert.
async fn map_page_handler(Query(query): Query<FocusQuery>) -> Html<String> {
    let focus = MapFocus::from_query(query.lat, query.lng, query.alert);
    Html(pages::map_page(focus.as_ref()))
}

/// Side list, counters and marker script for the map page.
async fn map_alerts_handler(
    State(state): State<AppState>,
    Query(query): Query<ViewQuery>,
) -> Result<Html<String>, (StatusCode, String)> {
    let view = query.view(PageKind::LiveMap)?;
    let now = state.clock.now();
    let store = state.store.read().await;
    let snapshot = view.snapshot(&store, now);

    let mut script = LeafletScript::new();
    sync_markers(&mut script, snapshot.visible(), now);

    Ok(Html(format!(
        "{}\n{}\n{}",
        render::alert_list(&snapshot, now),
        render::stats(&snapshot, now),
        script.finish()
    )))
}

async fn alerts_page_handler() -> Html<String> {
    Html(pages::alerts_page())
}

/// History table, pagination bar and counters.
async fn alerts_table_handler(
    State(state): State<AppState>,
    Query(query): Query<ViewQuery>,
) -> Result<Html<String>, (StatusCode, String)> {
    let mut view = query.view(PageKind::History)?;
    let now = state.clock.now();
    let store = state.store.read().await;
    let snapshot = view.snapshot(&store, now);
    if let Some(page) = query.page() {
        view.go_to_page(page, &snapshot);
    }
    // Stepping past either end leaves the page where it is
    match query.step {
        Some(Step::Prev) => {
            view.prev_page();
        }
        Some(Step::Next) => {
            view.next_page(&snapshot);
        }
        None => {}
    }
    let snapshot = view.snapshot(&store, now);

    Ok(Html(format!(
        r#"<table>
  <thead>
    <tr><th>User</th><th>Location</th><th>Time</th><th>Status</th><th>Message</th><th>Actions</th></tr>
  </thead>
  <tbody>
{rows}  </tbody>
</table>
{pagination}
{stats}
<input type="hidden" id="page" name="page" value="{page}" hx-swap-oob="true">"#,
        rows = render::alert_rows(&snapshot, now),
        pagination = render::pagination(&snapshot),
        stats = render::stats(&snapshot, now),
        page = snapshot.page(),
    )))
}

/// CSV download of every alert in the filtered history view.
async fn export_handler(
    State(state): State<AppState>,
    Query(query): Query<ViewQuery>,
) -> Result<Response, (StatusCode, String)> {
    let view = query.view(PageKind::History)?;
    let now = state.clock.now();
    let csv = {
        let store = state.store.read().await;
        export::to_csv_string(view.snapshot(&store, now).filtered())
    };
    let filename = export::filename(now);
    tracing::info!("Exporting alerts to {}", filename);

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        csv,
    )
        .into_response())
}

/// Detail modal for one alert.
async fn alert_detail_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Html<String>, (StatusCode, String)> {
    let store = state.store.read().await;
    store
        .get(AlertId(id))
        .map(|alert| Html(render::detail_modal(alert, state.clock.now())))
        .ok_or((StatusCode::NOT_FOUND, format!("no alert with id {id}")))
}

/// Touch the store so "last updated" reads "Just now", then ask the page
/// to re-fetch its fragments.
async fn refresh_handler(State(state): State<AppState>) -> impl IntoResponse {
    state.store.write().await.touch(state.clock.now());
    tracing::debug!("Alert view refreshed via UI");
    ([("HX-Trigger", "alerts-refresh")], StatusCode::NO_CONTENT)
}

// ============================================================================
// Support Desk
// ============================================================================

/// Session named by the request's cookie, if any.
fn request_session(headers: &HeaderMap) -> Option<SessionId> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find_map(SessionId::from_cookie_header)
}

/// The request's session, minting a new one (and its cookie) when absent.
fn session_or_new(headers: &HeaderMap) -> (SessionId, Option<String>) {
    match request_session(headers) {
        Some(session) => (session, None),
        None => {
            let session = SessionId::generate(&mut rand::thread_rng());
            let cookie = session.set_cookie();
            (session, Some(cookie))
        }
    }
}

fn with_cookie(mut response: Response, cookie: Option<String>) -> Response {
    if let Some(value) = cookie.and_then(|c| HeaderValue::from_str(&c).ok()) {
        response.headers_mut().insert(header::SET_COOKIE, value);
    }
    response
}

fn field_error(e: &RakshitaError) -> (StatusCode, String) {
    match e {
        RakshitaError::InvalidFieldKey(_) => (StatusCode::BAD_REQUEST, e.to_string()),
        _ => {
            tracing::warn!("Field cache failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "field cache unavailable".to_string())
        }
    }
}

/// Support page. Hands out a session cookie so drafts stay with this browser.
async fn contact_page_handler(headers: HeaderMap) -> Response {
    let (_, cookie) = session_or_new(&headers);
    with_cookie(Html(pages::contact_page()).into_response(), cookie)
}

/// Support form submission. Always answers 200 so HTMX swaps the banner in.
async fn submit_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<ContactForm>,
) -> Response {
    match contact::submit(&form, state.config.submit_delay).await {
        Ok(text) => {
            if let Some(session) = request_session(&headers) {
                let mut sessions = state.fields.lock().await;
                if let Err(e) = sessions.cache(&session).and_then(FieldCache::clear) {
                    tracing::warn!("Failed to clear saved fields: {}", e);
                }
            }
            (
                [("HX-Trigger", "contact-sent")],
                Html(render::banner(&Notice::success(text))),
            )
                .into_response()
        }
        Err(errors) => Html(render::banner(&Notice::error(errors.to_string()))).into_response(),
    }
}

async fn subscribe_handler(
    State(state): State<AppState>,
    Form(form): Form<SubscribeForm>,
) -> Html<String> {
    let notice = match contact::subscribe(&form, state.config.subscribe_delay).await {
        Ok(text) => Notice::success(text),
        Err(errors) => Notice::error(errors.to_string()),
    };
    Html(render::banner(&notice))
}

/// Auto-save one form field. Message edits answer with a fresh length meter.
async fn save_field_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(update): Form<FieldUpdate>,
) -> Result<Response, (StatusCode, String)> {
    let (session, cookie) = session_or_new(&headers);
    state
        .fields
        .lock()
        .await
        .cache(&session)
        .and_then(|cache| cache.save(&update.field, &update.value))
        .map_err(|e| field_error(&e))?;

    let body = if update.field == "message" {
        render::length_meter(&update.value)
    } else {
        String::new()
    };
    Ok(with_cookie(Html(body).into_response(), cookie))
}

/// This browser's saved field values, for the page to restore on load.
async fn restore_fields_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<BTreeMap<String, String>>, (StatusCode, String)> {
    let Some(session) = request_session(&headers) else {
        return Ok(Json(BTreeMap::new()));
    };
    let mut sessions = state.fields.lock().await;
    let cache = sessions.cache(&session).map_err(|e| field_error(&e))?;
    Ok(Json(cache.restore()))
}

/// Confirmed tap on a helpline card.
async fn call_handler(Path(index): Path<usize>) -> Result<Html<String>, (StatusCode, String)> {
    let service = EMERGENCY_SERVICES
        .get(index)
        .ok_or_else(|| (StatusCode::NOT_FOUND, format!("no emergency service {index}")))?;
    tracing::info!("Call requested to {} ({})", service.name, service.number);
    Ok(Html(render::banner(&service.call_notice())))
}

/// Tap on a support channel card: a banner, or a redirect to the mail client.
async fn channel_handler(Path(channel): Path<String>) -> Result<Response, (StatusCode, String)> {
    let channel: SupportChannel = channel
        .parse()
        .map_err(|e: String| (StatusCode::NOT_FOUND, e))?;
    Ok(match channel.action() {
        ChannelAction::Open(url) => ([("HX-Redirect", url)], StatusCode::OK).into_response(),
        ChannelAction::Notify(notice) => Html(render::banner(&notice)).into_response(),
    })
}

/// Toggle FAQ question `index` given which one is currently open.
async fn faq_handler(
    Path(index): Path<usize>,
    Query(query): Query<FaqQuery>,
) -> Result<Html<String>, (StatusCode, String)> {
    if index >= FAQ_ITEMS.len() {
        return Err((StatusCode::NOT_FOUND, format!("no FAQ item {index}")));
    }
    let open = query
        .open
        .as_deref()
        .and_then(|o| o.trim().parse::<usize>().ok())
        .filter(|o| *o < FAQ_ITEMS.len());
    let mut accordion = FaqAccordion::with_open(open);
    accordion.toggle(index);
    Ok(Html(render::faq(&accordion)))
}

/// SSE stream handler.
///
/// Every feed event becomes `alerts-changed` (pages re-fetch their
/// fragments); arrivals additionally send a `notification` toast.
async fn sse_handler(
    State(state): State<AppState>,
) -> Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>> {
    let changes = BroadcastStream::new(state.tx.subscribe()).map(|result| {
        let data = match result {
            Ok(event) => event.alert().id.to_string(),
            // Missed events still mean the set changed
            Err(BroadcastStreamRecvError::Lagged(n)) => format!("lagged {n}"),
        };
        Ok::<_, Infallible>(Event::default().event("alerts-changed").data(data))
    });
    let toasts = BroadcastStream::new(state.tx.subscribe()).filter_map(|result| match result {
        Ok(FeedEvent::Arrived(alert)) => Some(Ok::<_, Infallible>(Event::default()
            .event("notification")
            .data(render::toast(&alert)))),
        _ => None,
    });

    Sse::new(changes.merge(toasts)).keep_alive(KeepAlive::default())
}

fn feed_status_html(active: bool) -> Html<&'static str> {
    if active {
        Html(r#"<div id="feed-status" class="status-pill"><span class="status-dot"></span><span>Live</span></div>"#)
    } else {
        Html(r#"<div id="feed-status" class="status-pill status-paused"><span class="status-dot"></span><span>Paused</span></div>"#)
    }
}

/// Start the feed handler.
async fn start_feed_handler(State(state): State<AppState>) -> impl IntoResponse {
    state.feed_active.store(true, Ordering::Relaxed);
    tracing::info!("Feed started via UI");
    feed_status_html(true)
}

/// Stop the feed handler.
async fn stop_feed_handler(State(state): State<AppState>) -> impl IntoResponse {
    state.feed_active.store(false, Ordering::Relaxed);
    tracing::info!("Feed stopped via UI");
    feed_status_html(false)
}

/// Feed status handler.
async fn feed_status_handler(State(state): State<AppState>) -> impl IntoResponse {
    feed_status_html(state.feed_active.load(Ordering::Relaxed))
}

/// Health check endpoint.
async fn health_handler() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use chrono::{DateTime, TimeZone, Utc};
    use tower::ServiceExt;

    use super::*;
    use crate::clock::FixedClock;
    use crate::models::AlertStatus;
    use crate::models::fixtures::alert;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    fn config() -> ServerConfig {
        ServerConfig {
            submit_delay: Duration::ZERO,
            subscribe_delay: Duration::ZERO,
            ..ServerConfig::default()
        }
    }

    fn state_on(clock: Arc<FixedClock>, alerts: Vec<crate::models::AlertRecord>) -> AppState {
        let store = AlertStore::seeded(alerts, now()).unwrap();
        let fields = FieldSessions::new("contact", &FORM_FIELDS, SessionBacking::Memory);
        AppState::new(config(), store, clock, fields)
    }

    fn state_with(alerts: Vec<crate::models::AlertRecord>) -> AppState {
        state_on(Arc::new(FixedClock::new(now())), alerts)
    }

    const ALICE: &str = "rakshita_session=aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
    const BOB: &str = "rakshita_session=bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";

    fn mumbai_delhi() -> AppState {
        state_with(vec![
            alert(1, "Mumbai, Maharashtra", AlertStatus::Active, 10, now()),
            alert(2, "Delhi, Delhi", AlertStatus::Resolved, 120, now()),
        ])
    }

    fn many(count: u64) -> AppState {
        state_with(
            (1..=count)
                .map(|i| alert(i, "Pune, Maharashtra", AlertStatus::Active, 5, now()))
                .collect(),
        )
    }

    async fn get_as(state: &AppState, uri: &str, cookie: Option<&str>) -> (StatusCode, String) {
        let mut request = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }
        let response = create_router(state.clone())
            .oneshot(request.body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    async fn get(state: &AppState, uri: &str) -> (StatusCode, String) {
        get_as(state, uri, None).await
    }

    async fn post_form_as(
        state: &AppState,
        uri: &str,
        body: &str,
        cookie: Option<&str>,
    ) -> Response {
        let mut request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }
        create_router(state.clone())
            .oneshot(request.body(Body::from(body.to_string())).unwrap())
            .await
            .unwrap()
    }

    async fn post_form(state: &AppState, uri: &str, body: &str) -> Response {
        post_form_as(state, uri, body, None).await
    }

    const VALID_SUBMIT: &str = "name=Priya&email=priya%40example.com&subject=Map+not+loading\
        &category=technical&message=The+live+map+stays+blank.";

    async fn body_text(response: Response) -> String {
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(body.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = get(&many(1), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "OK");
    }

    #[tokio::test]
    async fn test_root_redirects_to_map() {
        let response = create_router(many(1))
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert!(response.status().is_redirection());
        assert_eq!(response.headers()[header::LOCATION], "/map");
    }

    #[tokio::test]
    async fn test_table_filters_status_and_window() {
        let state = mumbai_delhi();
        let (status, body) = get(&state, "/alerts/table?search=&status=active&time=1h").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains(r#"<tr id="alert-1">"#));
        assert!(!body.contains(r#"<tr id="alert-2">"#));
        assert!(body.contains(r#"<span id="total-alerts" hx-swap-oob="true">1</span>"#));
    }

    #[tokio::test]
    async fn test_table_rejects_unknown_criteria() {
        let (status, _) = get(&mumbai_delhi(), "/alerts/table?status=pending").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) = get(&mumbai_delhi(), "/alerts/table?time=2d").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_table_pages() {
        let state = many(25);
        let (_, body) = get(&state, "/alerts/table?page=3").await;
        assert!(body.contains("Page 3 of 3"));
        assert_eq!(body.matches("<tr id=\"alert-").count(), 5);
        assert!(body.contains(r#"name="page" value="3""#));

        // Out-of-range page is a no-op
        let (_, body) = get(&state, "/alerts/table?page=9").await;
        assert!(body.contains("Page 1 of 3"));
    }

    #[tokio::test]
    async fn test_table_steps() {
        let state = many(25);
        let (_, body) = get(&state, "/alerts/table?page=1&step=next").await;
        assert!(body.contains("Page 2 of 3"));

        let (_, body) = get(&state, "/alerts/table?page=3&step=next").await;
        assert!(body.contains("Page 3 of 3"));

        let (_, body) = get(&state, "/alerts/table?page=1&step=prev").await;
        assert!(body.contains("Page 1 of 3"));

        let (status, _) = get(&state, "/alerts/table?step=sideways").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_empty_table() {
        let (_, body) = get(&mumbai_delhi(), "/alerts/table?search=chennai").await;
        assert!(body.contains("No SOS alerts match your current filters."));
        assert!(body.contains("Page 1 of 1"));
    }

    #[tokio::test]
    async fn test_map_fragment_has_markers() {
        let (status, body) = get(&mumbai_delhi(), "/map/alerts?status=all").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("rakshita.clear();"));
        assert_eq!(body.matches("rakshita.add(").count(), 2);
        assert!(body.contains(r#"<span id="alert-count" hx-swap-oob="true">1</span>"#));
    }

    #[tokio::test]
    async fn test_map_page_focus() {
        let (_, body) = get(&many(1), "/map?lat=19.076&lng=72.8777&alert=1").await;
        assert!(body.contains("rakshita.focus(19.076, 72.8777, 15, 1);"));
    }

    #[tokio::test]
    async fn test_detail_modal() {
        let state = mumbai_delhi();
        let (status, body) = get(&state, "/alerts/2").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("SOS Alert #2"));
        assert!(body.contains("2 hours ago"));

        let (status, _) = get(&state, "/alerts/99").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_export_csv() {
        let response = create_router(mumbai_delhi())
            .oneshot(
                Request::builder()
                    .uri("/alerts/export.csv?status=resolved")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let disposition = response.headers()[header::CONTENT_DISPOSITION]
            .to_str()
            .unwrap()
            .to_string();
        assert!(disposition.contains("rakshita-alerts-"));

        let csv = body_text(response).await;
        assert_eq!(csv.lines().count(), 2);
        assert!(csv.contains("Delhi, Delhi"));
    }

    #[tokio::test]
    async fn test_submit_invalid_form() {
        let response = post_form(&many(1), "/contact/submit", "name=A&email=a%40b").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get("HX-Trigger").is_none());
        let body = body_text(response).await;
        assert!(body.contains("notice-error"));
        assert!(body.contains(
            "Name must be at least 2 characters long, Please enter a valid email address"
        ));
    }

    #[tokio::test]
    async fn test_submit_clears_saved_fields() {
        let state = many(1);
        let response =
            post_form_as(&state, "/contact/field", "field=name&value=Priya", Some(ALICE)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(header::SET_COOKIE).is_none());

        let (_, saved) = get_as(&state, "/contact/fields", Some(ALICE)).await;
        let saved: BTreeMap<String, String> = serde_json::from_str(&saved).unwrap();
        assert_eq!(saved["name"], "Priya");

        let response = post_form_as(&state, "/contact/submit", VALID_SUBMIT, Some(ALICE)).await;
        assert_eq!(response.headers()["HX-Trigger"], "contact-sent");
        assert!(body_text(response).await.contains("Thank you! Your message has been sent"));

        let (_, saved) = get_as(&state, "/contact/fields", Some(ALICE)).await;
        assert_eq!(saved, "{}");
    }

    #[tokio::test]
    async fn test_drafts_stay_with_their_browser() {
        let state = many(1);
        post_form_as(
            &state,
            "/contact/field",
            "field=email&value=alice%40private.in",
            Some(ALICE),
        )
        .await;
        post_form_as(&state, "/contact/field", "field=name&value=Bob", Some(BOB)).await;

        let (_, bob) = get_as(&state, "/contact/fields", Some(BOB)).await;
        assert!(!bob.contains("alice"));
        assert!(bob.contains("Bob"));

        let (_, anonymous) = get(&state, "/contact/fields").await;
        assert_eq!(anonymous, "{}");

        // Bob sending his form leaves Alice's draft alone
        post_form_as(&state, "/contact/submit", VALID_SUBMIT, Some(BOB)).await;
        let (_, alice) = get_as(&state, "/contact/fields", Some(ALICE)).await;
        assert!(alice.contains("alice@private.in"));
    }

    #[tokio::test]
    async fn test_session_cookie_issued_once() {
        let state = many(1);
        let response = create_router(state.clone())
            .oneshot(Request::builder().uri("/contact").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
        assert!(cookie.starts_with("rakshita_session="));
        assert!(cookie.contains("HttpOnly"));

        let response = create_router(state.clone())
            .oneshot(
                Request::builder()
                    .uri("/contact")
                    .header(header::COOKIE, ALICE)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert!(response.headers().get(header::SET_COOKIE).is_none());

        // A save without a cookie starts a session of its own
        let response = post_form(&state, "/contact/field", "field=name&value=Anon").await;
        assert!(response.headers().get(header::SET_COOKIE).is_some());
    }

    #[tokio::test]
    async fn test_emergency_call() {
        let state = many(1);
        let response = post_form(&state, "/contact/call/1", "").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("Initiating call to Police..."));

        let response = post_form(&state, "/contact/call/99", "").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_support_channels() {
        let state = many(1);
        let response = post_form(&state, "/contact/channel/email", "").await;
        assert_eq!(response.headers()["HX-Redirect"], "mailto:support@rakshita.in");

        let response = post_form(&state, "/contact/channel/phone", "").await;
        assert!(body_text(response).await.contains("Initiating call..."));

        let response = post_form(&state, "/contact/channel/chat", "").await;
        assert!(body_text(response).await.contains("Live chat feature coming soon!"));

        let response = post_form(&state, "/contact/channel/fax", "").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_refresh_resets_last_updated() {
        let clock = Arc::new(FixedClock::new(now()));
        let state = state_on(clock.clone(), vec![alert(1, "Pune", AlertStatus::Active, 0, now())]);
        clock.advance(chrono::Duration::minutes(5));

        let (_, body) = get(&state, "/alerts/table").await;
        assert!(body.contains(r#"<span id="last-updated" hx-swap-oob="true">5 minutes ago</span>"#));

        let response = post_form(&state, "/alerts/refresh", "").await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(response.headers()["HX-Trigger"], "alerts-refresh");

        let (_, body) = get(&state, "/alerts/table").await;
        assert!(body.contains(r#"<span id="last-updated" hx-swap-oob="true">Just now</span>"#));
    }

    #[tokio::test]
    async fn test_field_save_rejects_unknown_field() {
        let response = post_form(&many(1), "/contact/field", "field=password&value=x").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_message_field_returns_meter() {
        let response = post_form(&many(1), "/contact/field", "field=message&value=hello").await;
        assert!(body_text(response).await.contains("5 / 1000"));
    }

    #[tokio::test]
    async fn test_subscribe() {
        let response = post_form(&many(1), "/contact/subscribe", "email=a%40b.co").await;
        assert!(body_text(response).await.contains("Thank you for subscribing!"));

        let response = post_form(&many(1), "/contact/subscribe", "email=nope").await;
        assert!(body_text(response).await.contains("Please enter a valid email address"));
    }

    #[tokio::test]
    async fn test_faq_toggle() {
        let state = many(1);
        let (_, body) = get(&state, "/contact/faq/1?open=").await;
        assert_eq!(body.matches("faq-item active").count(), 1);
        assert!(body.contains("/contact/faq/0?open=1"));

        let (_, body) = get(&state, "/contact/faq/1?open=1").await;
        assert_eq!(body.matches("faq-item active").count(), 0);

        let (status, _) = get(&state, "/contact/faq/42").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_feed_toggle() {
        let state = many(1);
        let response = post_form(&state, "/feed/stop", "").await;
        assert!(body_text(response).await.contains("Paused"));
        assert!(!state.feed_active.load(Ordering::Relaxed));

        let (_, body) = get(&state, "/feed/status").await;
        assert!(body.contains("Paused"));

        post_form(&state, "/feed/start", "").await;
        assert!(state.feed_active.load(Ordering::Relaxed));
    }

    #[tokio::test]
    async fn test_pages_render() {
        let state = many(1);
        for uri in ["/map", "/alerts", "/contact"] {
            let (status, body) = get(&state, uri).await;
            assert_eq!(status, StatusCode::OK, "{uri}");
            assert!(body.starts_with("<!DOCTYPE html>"));
        }
    }
}
