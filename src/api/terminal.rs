//! Interactive terminal endpoints
//!
//! The client types lines with `POST /exec` and fetches whatever the
//! interpreter printed with `POST /update`. Output is pulled, never pushed:
//! anything not yet printed when `/update` returns shows up on a later poll.

use super::ApiError;
use crate::activity;
use crate::middleware::ClientSession;
use axum::{
    extract::{rejection::JsonRejection, Extension},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use ravensh_core::{SessionManager, SessionOutput};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One line of terminal input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineRequest {
    pub line: String,
}

/// Forward a line to the caller's interpreter
pub async fn submit_line(
    Extension(sessions): Extension<Arc<SessionManager>>,
    Extension(client): Extension<ClientSession>,
    payload: Result<Json<LineRequest>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Json(request) = payload?;

    sessions.submit_line(&client.key, &request.line).await?;
    activity::line_submitted(&client, &request.line);
    Ok(StatusCode::OK)
}

/// Drain pending interpreter output
pub async fn poll_output(
    Extension(sessions): Extension<Arc<SessionManager>>,
    Extension(client): Extension<ClientSession>,
) -> Result<Json<SessionOutput>, ApiError> {
    let output = sessions.poll_output(&client.key).await?;
    activity::output_polled(&client, &output);
    Ok(Json(output))
}

/// Kill the caller's interpreter; the next request starts a fresh one
pub async fn reset_session(
    Extension(sessions): Extension<Arc<SessionManager>>,
    Extension(client): Extension<ClientSession>,
) -> StatusCode {
    let existed = sessions.reset(&client.key).await;
    activity::session_reset(&client, existed);
    StatusCode::OK
}

pub fn terminal_routes() -> Router {
    Router::new()
        .route("/exec", post(submit_line))
        .route("/update", post(poll_output))
        .route("/reset", post(reset_session))
}
