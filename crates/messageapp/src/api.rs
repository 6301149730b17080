use std::sync::atomic::Ordering;
use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        DefaultBodyLimit, Path, Query, State,
    },
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use messages::{AppError, ErrorResponse, MessageDetail, MessageId, ModifyMessage};

use crate::params::ListParams;
use crate::AppState;

/// Largest accepted request body.
pub const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

const LAST_MODIFIED_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Build the axum router
pub fn router(state: Arc<AppState>) -> Router {
    let log_requests = state.log_requests;

    let mut app = Router::new()
        .route(
            "/messages",
            get(list_messages)
                .post(create_message)
                .options(collection_options),
        )
        .route(
            "/messages/:id",
            get(read_message)
                .put(update_message)
                .delete(delete_message)
                .options(item_options),
        )
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("deny"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCEPT,
            HeaderValue::from_static("application/json"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::CONTENT_SECURITY_POLICY,
            HeaderValue::from_static("frame-ancestors 'none'"),
        ))
        .with_state(state);

    if log_requests {
        app = app.layer(TraceLayer::new_for_http());
    }
    app
}

/// Render an application error.
///
/// Internal errors are logged with their cause chain and captured stack, and
/// answered with an empty 500. Errors without client-facing responses get
/// their status and no body. Invalid errors with responses get a JSON body.
pub fn send_error(op: &'static str, state: &AppState, err: AppError) -> Response {
    state.metrics.record_error(err.kind());

    if err.is_internal() {
        match err.stack() {
            Some(stack) => tracing::error!(
                op,
                error_op = err.op(),
                error = %err,
                causes = %err.cause_chain(),
                stack = %stack,
                "internal error"
            ),
            None => tracing::error!(
                op,
                error_op = err.op(),
                error = %err,
                causes = %err.cause_chain(),
                "internal error"
            ),
        }
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if !err.has_response() {
        return status.into_response();
    }

    match err.to_json() {
        Ok(body) => (status, [(header::CONTENT_TYPE, "application/json")], body).into_response(),
        Err(e) => {
            tracing::error!(op, error = %e, "failed to encode error response");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

fn parse_id(op: &'static str, raw: &str) -> Result<MessageId, AppError> {
    raw.parse::<MessageId>().map_err(|e| {
        AppError::invalid(op)
            .with_source(e)
            .with_response(ErrorResponse::message("invalid message id"))
    })
}

fn reject_json(op: &'static str, state: &AppState, rejection: JsonRejection) -> Response {
    match rejection {
        JsonRejection::MissingJsonContentType(_) => {
            StatusCode::UNSUPPORTED_MEDIA_TYPE.into_response()
        }
        JsonRejection::JsonDataError(_) | JsonRejection::JsonSyntaxError(_) => {
            tracing::debug!(op, error = %rejection.body_text(), "rejected request body");
            send_error(
                op,
                state,
                AppError::invalid(op).with_response(ErrorResponse::message("invalid json")),
            )
        }
        other => other.status().into_response(),
    }
}

/// POST /messages
async fn create_message(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ModifyMessage>, JsonRejection>,
) -> Response {
    const OP: &str = "api.CreateMessage";
    let Json(candidate) = match payload {
        Ok(p) => p,
        Err(rejection) => return reject_json(OP, &state, rejection),
    };

    match state.service.create(&candidate).await {
        Ok(id) => {
            state.metrics.messages_created.inc();
            (
                StatusCode::CREATED,
                [(header::LOCATION, format!("/messages/{}", id))],
            )
                .into_response()
        }
        Err(e) => send_error(OP, &state, e),
    }
}

/// GET /messages
async fn list_messages(
    State(state): State<Arc<AppState>>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Response {
    const OP: &str = "api.ListMessages";
    let query = match params {
        Ok(Query(params)) => params.into_query(OP),
        Err(rejection) => Err(AppError::invalid(OP)
            .with_source(rejection)
            .with_response(ErrorResponse::message("invalid query string"))),
    };
    let query = match query {
        Ok(q) => q,
        Err(e) => return send_error(OP, &state, e),
    };

    match state.service.list(&query).await {
        Ok(messages) => {
            (StatusCode::OK, Json(serde_json::json!({ "messages": messages }))).into_response()
        }
        Err(e) => send_error(OP, &state, e),
    }
}

fn detail_response(detail: MessageDetail) -> Response {
    let etag = format!("\"{}\"", detail.message.version);
    let last_modified = detail
        .message
        .updated_at
        .format(LAST_MODIFIED_FORMAT)
        .to_string();
    (
        StatusCode::OK,
        [(header::ETAG, etag), (header::LAST_MODIFIED, last_modified)],
        Json(detail),
    )
        .into_response()
}

/// GET /messages/:id
async fn read_message(State(state): State<Arc<AppState>>, Path(raw_id): Path<String>) -> Response {
    const OP: &str = "api.ReadMessage";
    let id = match parse_id(OP, &raw_id) {
        Ok(id) => id,
        Err(e) => return send_error(OP, &state, e),
    };

    match state.service.read(id).await {
        Ok(detail) => detail_response(detail),
        Err(e) => send_error(OP, &state, e),
    }
}

/// PUT /messages/:id
async fn update_message(
    State(state): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
    payload: Result<Json<ModifyMessage>, JsonRejection>,
) -> Response {
    const OP: &str = "api.UpdateMessage";
    let id = match parse_id(OP, &raw_id) {
        Ok(id) => id,
        Err(e) => return send_error(OP, &state, e),
    };
    let Json(candidate) = match payload {
        Ok(p) => p,
        Err(rejection) => return reject_json(OP, &state, rejection),
    };

    match state.service.update(id, &candidate).await {
        Ok(version) => {
            state.metrics.messages_updated.inc();
            (StatusCode::OK, [(header::ETAG, format!("\"{}\"", version))]).into_response()
        }
        Err(e) if e.is_id_missing() => {
            send_error(OP, &state, AppError::not_found(OP).with_source(e))
        }
        Err(e) => send_error(OP, &state, e),
    }
}

/// DELETE /messages/:id
async fn delete_message(
    State(state): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
) -> Response {
    const OP: &str = "api.DeleteMessage";
    let id = match parse_id(OP, &raw_id) {
        Ok(id) => id,
        Err(e) => return send_error(OP, &state, e),
    };

    match state.service.delete(id).await {
        Ok(()) => {
            state.metrics.messages_deleted.inc();
            StatusCode::OK.into_response()
        }
        Err(e) => send_error(OP, &state, e),
    }
}

/// OPTIONS /messages
async fn collection_options() -> impl IntoResponse {
    (StatusCode::OK, [(header::ALLOW, "GET, HEAD, POST, OPTIONS")])
}

/// OPTIONS /messages/:id
async fn item_options() -> impl IntoResponse {
    (StatusCode::OK, [(header::ALLOW, "GET, HEAD, PUT, DELETE, OPTIONS")])
}

/// GET /health
async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    if state.shutting_down.load(Ordering::Relaxed) {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({"status": "shutting_down"})),
        )
            .into_response();
    }

    // Check storage connectivity
    match state.service.repository().ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({"status": "healthy"})),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(
                error_op = e.op(),
                error = %e,
                causes = %e.cause_chain(),
                "health check failed"
            );
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({"status": "unhealthy"})),
            )
                .into_response()
        }
    }
}

/// GET /metrics
async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let encoder = prometheus::TextEncoder::new();
    let families = state.metrics.registry.gather();
    match encoder.encode_to_string(&families) {
        Ok(text) => (StatusCode::OK, text).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("metrics encoding error: {}", e),
        )
            .into_response(),
    }
}
