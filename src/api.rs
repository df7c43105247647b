//! HTTP control panel.
//!
//! JSON endpoints for bot setup, start/stop, manual sends, the message log,
//! and schedule management. Every schedule or settings change triggers a
//! dispatcher rebuild before the response is returned.

use crate::gateway::{BotSession, Dispatcher};
use crate::reply::Persona;
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::Json,
    routing::{get, post},
    Router,
};
use lantern_core::config::ApiConfig;
use lantern_core::error::LanternError;
use lantern_core::settings;
use lantern_memory::Store;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Default schedule name when the request leaves it blank.
const DEFAULT_SCHEDULE_NAME: &str = "Auto message";

type ApiError = (StatusCode, Json<Value>);
type ApiResult = Result<Json<Value>, ApiError>;

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    store: Store,
    session: Arc<BotSession>,
    dispatcher: Arc<Dispatcher>,
    api_key: Option<String>,
    message_log_limit: i64,
    uptime: Instant,
}

impl ApiState {
    pub fn new(
        store: Store,
        session: Arc<BotSession>,
        dispatcher: Arc<Dispatcher>,
        config: &ApiConfig,
        message_log_limit: i64,
    ) -> Self {
        let api_key = if config.api_key.is_empty() {
            None
        } else {
            Some(config.api_key.clone())
        };
        Self {
            store,
            session,
            dispatcher,
            api_key,
            message_log_limit,
            uptime: Instant::now(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SetupRequest {
    token: Option<String>,
    persona: Option<String>,
    bot_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EnabledRequest {
    enabled: bool,
}

#[derive(Debug, Deserialize)]
struct SendRequest {
    #[serde(default)]
    chat_id: String,
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct ScheduleRequest {
    #[serde(default)]
    name: String,
    #[serde(default)]
    chat_id: String,
    #[serde(default)]
    text: String,
    #[serde(default)]
    cron: String,
}

#[derive(Debug, Deserialize)]
struct MessagesQuery {
    limit: Option<i64>,
}

/// Constant-time string comparison to prevent timing attacks on API token validation.
fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes()
        .zip(b.bytes())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}

/// Check bearer token auth. Returns `Err(response)` if rejected.
fn check_auth(headers: &HeaderMap, api_key: &Option<String>) -> Result<(), ApiError> {
    let Some(key) = api_key else {
        return Ok(());
    };

    let value = headers
        .get("authorization")
        .ok_or_else(|| unauthorized("missing Authorization header"))?
        .to_str()
        .map_err(|_| unauthorized("invalid Authorization header"))?;

    match value.strip_prefix("Bearer ") {
        Some(token) if constant_time_eq(token, key) => Ok(()),
        _ => Err(unauthorized("invalid token")),
    }
}

fn unauthorized(msg: &str) -> ApiError {
    (StatusCode::UNAUTHORIZED, Json(json!({"error": msg})))
}

fn bad_request(msg: impl Into<String>) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(json!({"error": msg.into()})))
}

fn not_found(msg: impl Into<String>) -> ApiError {
    (StatusCode::NOT_FOUND, Json(json!({"error": msg.into()})))
}

/// Map a store or dispatcher failure to a 500.
fn internal(e: LanternError) -> ApiError {
    error!("api request failed: {e}");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({"error": e.to_string()})),
    )
}

/// Map a body rejection to a 400.
fn parse_body<T>(
    body: Result<Json<T>, axum::extract::rejection::JsonRejection>,
) -> Result<T, ApiError> {
    body.map(|Json(v)| v)
        .map_err(|e| bad_request(format!("invalid request: {e}")))
}

async fn rebuild(state: &ApiState) -> Result<usize, ApiError> {
    state.dispatcher.rebuild().await.map_err(internal)
}

/// `GET /api/health`: session and settings overview.
async fn health(headers: HeaderMap, State(state): State<ApiState>) -> ApiResult {
    check_auth(&headers, &state.api_key)?;

    let persona = state
        .store
        .get_setting(settings::PERSONA)
        .await
        .map_err(internal)?;
    let bot_name = state
        .store
        .get_setting(settings::BOT_NAME)
        .await
        .map_err(internal)?;
    let auto_reply = state
        .store
        .get_setting(settings::AUTO_REPLY_ENABLED)
        .await
        .map_err(internal)?;
    let token = state
        .store
        .get_setting(settings::BOT_TOKEN)
        .await
        .map_err(internal)?;

    Ok(Json(json!({
        "status": "ok",
        "uptime_secs": state.uptime.elapsed().as_secs(),
        "running": state.session.running(),
        "state": state.session.state().as_str(),
        "has_token": settings::token_from(token.as_deref()).is_some(),
        "persona": Persona::from_setting(persona.as_deref()).as_str(),
        "bot_name": settings::bot_name_from(bot_name.as_deref()),
        "auto_reply": settings::auto_reply_from(auto_reply.as_deref()),
        "jobs": state.dispatcher.job_count().await,
    })))
}

/// `POST /api/setup`: store token, persona and bot name.
async fn setup(
    headers: HeaderMap,
    State(state): State<ApiState>,
    body: Result<Json<SetupRequest>, axum::extract::rejection::JsonRejection>,
) -> ApiResult {
    check_auth(&headers, &state.api_key)?;
    let req = parse_body(body)?;

    if let Some(token) = settings::token_from(req.token.as_deref()) {
        state
            .store
            .set_setting(settings::BOT_TOKEN, &token)
            .await
            .map_err(internal)?;
        state.session.configure(&token);
    }

    let persona = Persona::from_setting(req.persona.as_deref());
    state
        .store
        .set_setting(settings::PERSONA, persona.as_str())
        .await
        .map_err(internal)?;

    let bot_name = settings::bot_name_from(req.bot_name.as_deref());
    state
        .store
        .set_setting(settings::BOT_NAME, &bot_name)
        .await
        .map_err(internal)?;

    rebuild(&state).await?;
    info!("setup saved (persona: {}, bot name: {bot_name})", persona.as_str());

    Ok(Json(json!({
        "status": "saved",
        "persona": persona.as_str(),
        "bot_name": bot_name,
    })))
}

/// `POST /api/bot/start`: start polling with the stored token.
async fn bot_start(headers: HeaderMap, State(state): State<ApiState>) -> ApiResult {
    check_auth(&headers, &state.api_key)?;

    let stored = state
        .store
        .get_setting(settings::BOT_TOKEN)
        .await
        .map_err(internal)?;
    let Some(token) = settings::token_from(stored.as_deref()) else {
        return Err(bad_request("no bot token configured; run setup first"));
    };

    state.session.configure(&token);
    state.session.start().map_err(|e| {
        if e.is_config() {
            bad_request(e.to_string())
        } else {
            internal(e)
        }
    })?;

    Ok(Json(json!({
        "status": "started",
        "state": state.session.state().as_str(),
    })))
}

/// `POST /api/bot/stop`: request a stop; the listener winds down on its own.
async fn bot_stop(headers: HeaderMap, State(state): State<ApiState>) -> ApiResult {
    check_auth(&headers, &state.api_key)?;
    state.session.stop();
    Ok(Json(json!({"status": "stop_requested"})))
}

/// `POST /api/autoreply`: toggle auto-replies.
async fn autoreply(
    headers: HeaderMap,
    State(state): State<ApiState>,
    body: Result<Json<EnabledRequest>, axum::extract::rejection::JsonRejection>,
) -> ApiResult {
    check_auth(&headers, &state.api_key)?;
    let req = parse_body(body)?;

    state
        .store
        .set_setting(
            settings::AUTO_REPLY_ENABLED,
            if req.enabled { "1" } else { "0" },
        )
        .await
        .map_err(internal)?;
    rebuild(&state).await?;

    Ok(Json(json!({"auto_reply": req.enabled})))
}

/// `POST /api/send`: one-shot send, independent of the listener.
async fn send(
    headers: HeaderMap,
    State(state): State<ApiState>,
    body: Result<Json<SendRequest>, axum::extract::rejection::JsonRejection>,
) -> ApiResult {
    check_auth(&headers, &state.api_key)?;
    let req = parse_body(body)?;

    let chat_id = req.chat_id.trim();
    let text = req.text.trim();
    if chat_id.is_empty() || text.is_empty() {
        return Err(bad_request("chat_id and text are required"));
    }

    state
        .session
        .reload_token(&state.store)
        .await
        .map_err(internal)?;

    match state.session.send(chat_id, text).await {
        Ok(()) => Ok(Json(json!({"status": "sent", "chat_id": chat_id}))),
        Err(e) if e.is_config() => Err(bad_request(e.to_string())),
        Err(e) => {
            warn!("manual send to {chat_id} failed: {e}");
            Err((
                StatusCode::BAD_GATEWAY,
                Json(json!({"error": format!("delivery failed: {e}")})),
            ))
        }
    }
}

/// `GET /api/messages?limit=`: newest inbound messages first.
async fn messages(
    headers: HeaderMap,
    State(state): State<ApiState>,
    Query(query): Query<MessagesQuery>,
) -> ApiResult {
    check_auth(&headers, &state.api_key)?;

    let limit = query
        .limit
        .filter(|l| *l > 0)
        .unwrap_or(state.message_log_limit);
    let rows = state.store.list_messages(limit).await.map_err(internal)?;
    Ok(Json(json!({"messages": rows})))
}

/// `GET /api/schedules`
async fn list_schedules(headers: HeaderMap, State(state): State<ApiState>) -> ApiResult {
    check_auth(&headers, &state.api_key)?;
    let rows = state.store.list_schedules().await.map_err(internal)?;
    Ok(Json(json!({"schedules": rows})))
}

/// `POST /api/schedules`: create an enabled schedule.
///
/// The cron string is stored as given; one the dispatcher cannot use stays
/// in the table but never fires.
async fn create_schedule(
    headers: HeaderMap,
    State(state): State<ApiState>,
    body: Result<Json<ScheduleRequest>, axum::extract::rejection::JsonRejection>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    check_auth(&headers, &state.api_key)?;
    let req = parse_body(body)?;

    let name = match req.name.trim() {
        "" => DEFAULT_SCHEDULE_NAME,
        n => n,
    };
    let chat_id = req.chat_id.trim();
    let text = req.text.trim();
    let cron = req.cron.trim();
    if chat_id.is_empty() || text.is_empty() || cron.is_empty() {
        return Err(bad_request("chat_id, text and cron are required"));
    }

    let id = state
        .store
        .create_schedule(name, chat_id, text, cron)
        .await
        .map_err(internal)?;
    let jobs = rebuild(&state).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({"id": id, "jobs": jobs})),
    ))
}

/// `POST /api/schedules/{id}/toggle`
async fn toggle_schedule(
    headers: HeaderMap,
    State(state): State<ApiState>,
    Path(id): Path<i64>,
    body: Result<Json<EnabledRequest>, axum::extract::rejection::JsonRejection>,
) -> ApiResult {
    check_auth(&headers, &state.api_key)?;
    let req = parse_body(body)?;

    let found = state
        .store
        .set_schedule_enabled(id, req.enabled)
        .await
        .map_err(internal)?;
    if !found {
        return Err(not_found(format!("schedule {id} not found")));
    }
    let jobs = rebuild(&state).await?;

    Ok(Json(json!({"id": id, "enabled": req.enabled, "jobs": jobs})))
}

/// `DELETE /api/schedules/{id}`
async fn delete_schedule(
    headers: HeaderMap,
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> ApiResult {
    check_auth(&headers, &state.api_key)?;

    let found = state.store.delete_schedule(id).await.map_err(internal)?;
    if !found {
        return Err(not_found(format!("schedule {id} not found")));
    }
    let jobs = rebuild(&state).await?;

    Ok(Json(json!({"id": id, "deleted": true, "jobs": jobs})))
}

/// Build the axum router with shared state.
fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/setup", post(setup))
        .route("/api/bot/start", post(bot_start))
        .route("/api/bot/stop", post(bot_stop))
        .route("/api/autoreply", post(autoreply))
        .route("/api/send", post(send))
        .route("/api/messages", get(messages))
        .route("/api/schedules", get(list_schedules).post(create_schedule))
        .route("/api/schedules/{id}/toggle", post(toggle_schedule))
        .route("/api/schedules/{id}", axum::routing::delete(delete_schedule))
        .layer(axum::extract::DefaultBodyLimit::max(64 * 1024))
        .with_state(state)
}

/// Serve the control panel until `shutdown` fires.
pub async fn serve(
    config: &ApiConfig,
    state: ApiState,
    shutdown: CancellationToken,
) -> Result<(), LanternError> {
    let app = build_router(state);
    let addr = format!("{}:{}", config.host, config.port);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("API server listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;
    Ok(())
}
