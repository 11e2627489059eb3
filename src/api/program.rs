//! One-shot program endpoint

use super::ApiError;
use crate::activity;
use crate::middleware::ClientSession;
use axum::{
    extract::{rejection::JsonRejection, Extension},
    routing::post,
    Json, Router,
};
use ravensh_exec::{ExecutionResult, ProgramRequest, ProgramRunner};
use std::sync::Arc;

/// Run a program in a throwaway interpreter
///
/// Timeouts and oversized output are reported in the result's `status`,
/// not as HTTP errors.
pub async fn execute_program(
    Extension(runner): Extension<Arc<ProgramRunner>>,
    Extension(client): Extension<ClientSession>,
    payload: Result<Json<ProgramRequest>, JsonRejection>,
) -> Result<Json<ExecutionResult>, ApiError> {
    let Json(request) = payload?;

    let result = runner.execute(&request).await?;
    activity::program_executed(&client, &result);
    Ok(Json(result))
}

pub fn program_routes() -> Router {
    Router::new().route("/program", post(execute_program))
}
