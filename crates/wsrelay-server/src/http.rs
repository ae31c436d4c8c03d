//! HTTP handlers and the relay error → response mapping.

use std::io;

use axum::Json;
use axum::body::Body;
use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use futures::TryStreamExt;
use metrics::counter;
use serde::Serialize;
use serde_json::json;
use tokio_util::io::StreamReader;
use tracing::{error, info, warn};
use wsrelay_core::{ConnectionId, RelayError, SendSummary, Token};

use crate::health::{self, HealthResponse};
use crate::metrics::HTTP_RELAY_ERRORS_TOTAL;
use crate::server::AppState;
use crate::websocket::session::run_relay_session;

/// `POST /session` response body.
#[derive(Debug, Clone, Serialize)]
pub struct TokenResponse {
    /// Token the producer sends under and the consumer connects with.
    pub token: Token,
}

/// A relay failure surfaced at the HTTP boundary.
#[derive(Debug)]
pub struct ApiError(pub RelayError);

impl ApiError {
    /// Status code for the wrapped error.
    pub fn status_code(&self) -> StatusCode {
        match &self.0 {
            RelayError::TokenNotFound { .. } => StatusCode::NOT_FOUND,
            RelayError::NoBoundChannel { .. } | RelayError::AlreadyBound { .. } => {
                StatusCode::CONFLICT
            }
            RelayError::MissingToken => StatusCode::BAD_REQUEST,
            RelayError::Write { .. } | RelayError::Read { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<RelayError> for ApiError {
    fn from(err: RelayError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let kind = self.0.error_kind();
        if status.is_server_error() {
            error!(error = %self.0, kind, "relay request failed");
        } else {
            warn!(error = %self.0, kind, "relay request rejected");
        }
        counter!(HTTP_RELAY_ERRORS_TOTAL, "kind" => kind).increment(1);

        let body = json!({
            "error": {
                "code": kind,
                "message": self.0.to_string(),
            }
        });
        (status, Json(body)).into_response()
    }
}

/// POST /session
pub async fn issue_session(State(state): State<AppState>) -> Json<TokenResponse> {
    let token = state.engine.issue_token().await;
    Json(TokenResponse { token })
}

/// GET /session/receive/{token}
///
/// Always upgrades; an unknown or expired token is refused with a close
/// frame once the socket is open.
pub async fn receive_session(
    ws: WebSocketUpgrade,
    Path(token): Path<String>,
    State(state): State<AppState>,
) -> Response {
    let lifecycle = state.lifecycle.clone();
    let settings = state.session.clone();
    let tasks = state.tasks.clone();
    ws.max_message_size(state.max_message_size)
        .on_upgrade(move |socket| {
            tasks.track_future(run_relay_session(
                socket,
                ConnectionId::new(),
                token,
                lifecycle,
                settings,
            ))
        })
}

/// POST /session/send/{token}
///
/// Streams the request body to the bound consumer without buffering it.
pub async fn send_to_session(
    State(state): State<AppState>,
    Path(token): Path<String>,
    body: Body,
) -> Result<Json<SendSummary>, ApiError> {
    let token = Token::from_raw(token);
    let reader = StreamReader::new(body.into_data_stream().map_err(io::Error::other));
    let summary = state.engine.send_data(&token, reader).await?;
    info!(
        token = %token,
        bytes = summary.bytes,
        messages = summary.messages,
        "relayed request body"
    );
    Ok(Json(summary))
}

/// GET /metrics
pub async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    let body = wsrelay_telemetry::prometheus::render(&state.metrics_handle);
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    )
}

/// GET /health
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let tokens = state.engine.token_count().await;
    let draining = state.session.shutdown.is_cancelled();
    Json(health::health_check(state.start_time, tokens, draining))
}
