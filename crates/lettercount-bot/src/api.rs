//! HTTP ingress.
//!
//! Slack delivers channel messages to `/slack/events` and slash commands to
//! `/slack/commands`. Request signing is checked upstream; this layer only
//! turns payloads into game events. `/api/v1/report` is hit by an external
//! scheduler once a day.

use crate::node::BotState;
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use lettercount_core::{AdminCommand, GameState, MessageRef, Submission};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

type AppState = Arc<BotState>;

/// Build the API router.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready))
        // Slack
        .route("/slack/events", post(slack_events))
        .route("/slack/commands", post(slack_commands))
        // Game
        .route("/api/v1/report", post(daily_report))
        .route("/api/v1/state", get(get_state))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// --- Health endpoints ---

async fn health() -> &'static str {
    "OK"
}

async fn ready() -> &'static str {
    "OK"
}

// --- Slack events ---

/// Outer envelope of the Events API.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum EventEnvelope {
    /// Sent once when the endpoint is registered
    UrlVerification { challenge: String },
    EventCallback { event: SlackEvent },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum SlackEvent {
    Message(MessageEvent),
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct MessageEvent {
    channel: String,
    #[serde(default)]
    user: Option<String>,
    #[serde(default)]
    text: Option<String>,
    ts: String,
    #[serde(default)]
    thread_ts: Option<String>,
    #[serde(default)]
    subtype: Option<String>,
}

impl MessageEvent {
    /// The game's view of this message; `None` for messages without an author.
    fn into_submission(self) -> Option<Submission> {
        let submitter = self.user?;
        Some(Submission {
            text: self.text.unwrap_or_default(),
            submitter,
            message: MessageRef::new(self.channel, self.ts),
            is_thread_reply: self.thread_ts.is_some(),
            has_subtype: self.subtype.is_some(),
        })
    }
}

/// Header Slack sets on redelivery after a slow or failed acknowledgement.
const RETRY_HEADER: &str = "x-slack-retry-num";

async fn slack_events(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(envelope): Json<EventEnvelope>,
) -> Result<Response, StatusCode> {
    // Redeliveries repeat an event that was already counted.
    if let Some(attempt) = headers.get(RETRY_HEADER) {
        tracing::info!(?attempt, "Skipping redelivered event");
        return Ok(StatusCode::OK.into_response());
    }

    let event = match envelope {
        EventEnvelope::UrlVerification { challenge } => {
            return Ok(Json(json!({ "challenge": challenge })).into_response());
        }
        EventEnvelope::EventCallback {
            event: SlackEvent::Message(event),
        } => event,
        _ => return Ok(StatusCode::OK.into_response()),
    };

    if event.channel != state.config.channel {
        return Ok(StatusCode::OK.into_response());
    }
    let Some(submission) = event.into_submission() else {
        return Ok(StatusCode::OK.into_response());
    };

    match state.game.handle_submission(&submission).await {
        Ok(outcome) => {
            tracing::debug!(?outcome, "Submission handled");
            Ok(StatusCode::OK.into_response())
        }
        Err(e) => {
            // Acknowledged anyway so Slack does not redeliver.
            tracing::error!("Submission from {} dropped: {}", submission.submitter, e);
            Ok(StatusCode::OK.into_response())
        }
    }
}

// --- Slash commands ---

/// Form body Slack posts for a slash command.
#[derive(Debug, Deserialize)]
struct SlashCommand {
    user_id: String,
    #[serde(default)]
    text: String,
}

async fn slack_commands(
    State(state): State<AppState>,
    Form(cmd): Form<SlashCommand>,
) -> Result<String, StatusCode> {
    let command = AdminCommand {
        operator: cmd.user_id,
        text: cmd.text,
    };

    state.game.handle_admin_command(&command).await.map_err(|e| {
        tracing::error!("Reset by {} failed: {}", command.operator, e);
        StatusCode::INTERNAL_SERVER_ERROR
    })
}

// --- Game endpoints ---

/// Result of a report run.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct ReportResponse {
    count: u64,
    delta: i64,
    message: String,
}

async fn daily_report(
    State(state): State<AppState>,
) -> Result<Json<Option<ReportResponse>>, StatusCode> {
    let summary = state.game.daily_report().await.map_err(|e| {
        tracing::error!("Daily report failed: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok(Json(summary.map(|s| ReportResponse {
        count: s.current().get(),
        delta: clamp_delta(s.delta()),
        message: s.to_string(),
    })))
}

async fn get_state(State(state): State<AppState>) -> Result<Json<GameState>, StatusCode> {
    let game_state = state
        .game
        .store()
        .load()
        .await
        .map_err(|e| {
            tracing::error!("Reading state failed: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;
    Ok(Json(game_state))
}

/// Saturate a report delta into the JSON-friendly range, keeping its sign.
fn clamp_delta(delta: i128) -> i64 {
    i64::try_from(delta).unwrap_or(if delta < 0 { i64::MIN } else { i64::MAX })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::BotConfig;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request};
    use async_trait::async_trait;
    use lettercount_core::{
        Error, KvStore, MemoryKv, Notification, Reaction, RecordingNotifier, StatePatch,
    };
    use std::sync::atomic::{AtomicBool, Ordering};
    use tower::ServiceExt;

    struct TestApp {
        router: Router,
        state: AppState,
        notifier: Arc<RecordingNotifier>,
    }

    async fn app() -> TestApp {
        app_with_kv(Arc::new(MemoryKv::new())).await
    }

    async fn app_with_kv(kv: Arc<dyn KvStore>) -> TestApp {
        let config = BotConfig {
            data_dir: "unused".into(),
            api_addr: "127.0.0.1:0".parse().unwrap(),
            channel: "CGAME".into(),
            admins: vec!["UADMIN".into()],
            slack_token: None,
            slack_api_base: "http://localhost".into(),
        };
        let notifier = Arc::new(RecordingNotifier::new());
        let state = Arc::new(
            BotState::open(config, kv, notifier.clone())
                .await
                .unwrap(),
        );
        TestApp {
            router: build_router(state.clone()),
            state,
            notifier,
        }
    }

    async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, body.to_vec())
    }

    /// A store that can be taken down after startup.
    #[derive(Default)]
    struct FlakyKv {
        inner: MemoryKv,
        down: AtomicBool,
    }

    #[async_trait]
    impl KvStore for FlakyKv {
        async fn get(&self, key: &str) -> lettercount_core::Result<Option<String>> {
            if self.down.load(Ordering::SeqCst) {
                return Err(Error::Storage("unavailable".into()));
            }
            self.inner.get(key).await
        }

        async fn put(&self, key: &str, value: String) -> lettercount_core::Result<()> {
            if self.down.load(Ordering::SeqCst) {
                return Err(Error::Storage("unavailable".into()));
            }
            self.inner.put(key, value).await
        }
    }

    fn json_request(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn message(channel: &str, user: &str, text: &str) -> serde_json::Value {
        json!({
            "type": "event_callback",
            "event": {
                "type": "message",
                "channel": channel,
                "user": user,
                "text": text,
                "ts": "1700000000.000100"
            }
        })
    }

    #[tokio::test]
    async fn health_ok() {
        let app = app().await;
        let (status, body) = send(&app.router, Request::get("/health").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"OK");
    }

    #[tokio::test]
    async fn url_verification_echoes_challenge() {
        let app = app().await;
        let (status, body) = send(
            &app.router,
            json_request("/slack/events", json!({ "type": "url_verification", "challenge": "abc123" })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["challenge"], "abc123");
    }

    #[tokio::test]
    async fn message_event_counts() {
        let app = app().await;
        let (status, _) = send(&app.router, json_request("/slack/events", message("CGAME", "U1", "a"))).await;

        assert_eq!(status, StatusCode::OK);
        let state = app.state.game.store().load().await.unwrap();
        assert_eq!(state.current_count, Some(1));
        assert_eq!(state.last_counter.as_deref(), Some("U1"));
        assert_eq!(
            app.notifier.sent().await,
            vec![Notification::Reaction {
                message: MessageRef::new("CGAME", "1700000000.000100"),
                reaction: Reaction::Accepted,
            }]
        );
    }

    #[tokio::test]
    async fn redelivered_event_not_counted_twice() {
        let app = app().await;
        send(&app.router, json_request("/slack/events", message("CGAME", "U1", "a"))).await;

        let mut retry = json_request("/slack/events", message("CGAME", "U1", "a"));
        retry
            .headers_mut()
            .insert("X-Slack-Retry-Num", "1".parse().unwrap());
        let (status, _) = send(&app.router, retry).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            app.notifier.sent().await,
            vec![Notification::Reaction {
                message: MessageRef::new("CGAME", "1700000000.000100"),
                reaction: Reaction::Accepted,
            }]
        );
        let state = app.state.game.store().load().await.unwrap();
        assert_eq!(state.current_count, Some(1));
        assert_eq!(state.last_counter.as_deref(), Some("U1"));
    }

    #[tokio::test]
    async fn store_outage_acknowledged_without_counting() {
        let kv = Arc::new(FlakyKv::default());
        let app = app_with_kv(kv.clone()).await;
        kv.down.store(true, Ordering::SeqCst);

        let (status, _) = send(&app.router, json_request("/slack/events", message("CGAME", "U1", "a"))).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send(&app.router, Request::get("/api/v1/state").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

        kv.down.store(false, Ordering::SeqCst);
        assert_eq!(app.state.game.store().load().await.unwrap(), GameState::default());
    }

    #[tokio::test]
    async fn other_channels_ignored() {
        let app = app().await;
        let (status, _) = send(&app.router, json_request("/slack/events", message("COTHER", "U1", "a"))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(app.state.game.store().load().await.unwrap(), GameState::default());
        assert!(app.notifier.sent().await.is_empty());
    }

    #[tokio::test]
    async fn thread_replies_and_subtypes_ignored() {
        let app = app().await;

        let mut threaded = message("CGAME", "U1", "a");
        threaded["event"]["thread_ts"] = json!("1699999999.000001");
        send(&app.router, json_request("/slack/events", threaded)).await;

        let mut edited = message("CGAME", "U1", "a");
        edited["event"]["subtype"] = json!("message_changed");
        send(&app.router, json_request("/slack/events", edited)).await;

        assert!(app.notifier.sent().await.is_empty());
        assert_eq!(app.state.game.store().load().await.unwrap().current_count, None);
    }

    #[tokio::test]
    async fn unknown_events_acknowledged() {
        let app = app().await;
        let (status, _) = send(
            &app.router,
            json_request(
                "/slack/events",
                json!({ "type": "event_callback", "event": { "type": "reaction_added" } }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send(&app.router, json_request("/slack/events", json!({ "type": "app_rate_limited" }))).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn slash_command_resets() {
        let app = app().await;
        app.state
            .game
            .store()
            .update_object(StatePatch::new().current_count(40).last_counter("U1"))
            .await
            .unwrap();

        let request = Request::post("/slack/commands")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("command=%2Freset&user_id=UADMIN&text=z"))
            .unwrap();
        let (status, body) = send(&app.router, request).await;

        assert_eq!(status, StatusCode::OK);
        assert!(String::from_utf8(body).unwrap().contains('z'));
        let state = app.state.game.store().load().await.unwrap();
        assert_eq!(state.current_count, Some(25));
        assert_eq!(state.last_counter, None);
    }

    #[tokio::test]
    async fn slash_command_denied() {
        let app = app().await;

        let request = Request::post("/slack/commands")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("user_id=U1&text=z"))
            .unwrap();
        let (status, body) = send(&app.router, request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            String::from_utf8(body).unwrap(),
            lettercount_core::OverrideRejected::PermissionDenied.to_string()
        );
        assert_eq!(app.state.game.store().load().await.unwrap().current_count, None);
    }

    #[tokio::test]
    async fn report_endpoint() {
        let app = app().await;

        let (status, body) = send(&app.router, Request::post("/api/v1/report").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"null");

        app.state
            .game
            .store()
            .update_object(StatePatch::new().current_count(10).last_daily_count(4))
            .await
            .unwrap();

        let (_, body) = send(&app.router, Request::post("/api/v1/report").body(Body::empty()).unwrap()).await;
        let report: ReportResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(report.count, 10);
        assert_eq!(report.delta, 6);
        assert!(report.message.contains("+6"));
    }

    #[test]
    fn delta_clamps_by_sign() {
        assert_eq!(clamp_delta(-3), -3);
        assert_eq!(clamp_delta(i128::from(u64::MAX)), i64::MAX);
        assert_eq!(clamp_delta(-i128::from(u64::MAX)), i64::MIN);
    }

    #[tokio::test]
    async fn state_endpoint() {
        let app = app().await;
        send(&app.router, json_request("/slack/events", message("CGAME", "U9", "a"))).await;

        let (status, body) = send(&app.router, Request::get("/api/v1/state").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body, json!({ "number": 1, "lastCounter": "U9" }));
    }
}
