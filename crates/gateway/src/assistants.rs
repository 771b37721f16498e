//! HTTP routes for assistants, threads, messages, and runs.
//!
//! Endpoints:
//!
//! - `POST /assistants`                         — Describe the default assistant
//! - `POST /threads`                            — Create a thread (allocates an agent)
//! - `GET  /threads/{id}`                       — Retrieve a thread
//! - `POST /threads/{id}/messages`              — Append a message
//! - `GET  /threads/{id}/messages`              — List messages (cursor paginated)
//! - `GET  /threads/{id}/messages/{mid}`        — Retrieve a message
//! - `POST /threads/{id}/runs`                  — Run one step synchronously
//!
//! Every other assistants-API route answers `501 not_implemented`.

use std::sync::Arc;

use assistd_core::context::RequestContext;
use axum::body::Bytes;
use axum::extract::{FromRequestParts, Path, Query, State};
use axum::http::request::Parts;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::de::DeserializeOwned;

use crate::dto::{
    Assistant, CreateAssistantRequest, CreateMessageRequest, CreateRunRequest,
    CreateThreadRequest, ListMessagesParams, ListMessagesResponse, Run, Thread, ThreadMessage,
};
use crate::error::ApiError;
use crate::mapper::ResourceMapper;

/// Header carrying the resolved caller identity.
pub const USER_HEADER: &str = "x-user-id";

/// Shared state for the resource routes.
#[derive(Clone)]
pub struct ApiState {
    pub mapper: Arc<ResourceMapper>,
    /// Caller used when a request carries no `X-User-Id`
    pub default_user: Arc<str>,
}

/// The caller of a request, taken from `X-User-Id` or the configured default.
pub struct Caller(pub RequestContext);

impl FromRequestParts<ApiState> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &ApiState) -> Result<Self, Self::Rejection> {
        let user = match parts.headers.get(USER_HEADER) {
            Some(value) => value
                .to_str()
                .map_err(|_| ApiError::invalid("X-User-Id must be valid UTF-8"))?
                .trim(),
            None => "",
        };

        let user_id = if user.is_empty() {
            state.default_user.as_ref()
        } else {
            user
        };
        Ok(Caller(RequestContext::new(user_id)))
    }
}

/// Build the resource router. Mounted at the root and under `/v1`.
pub fn router(state: ApiState) -> Router {
    Router::new()
        // Assistants
        .route(
            "/assistants",
            post(create_assistant).get(not_implemented("list_assistants")),
        )
        .route(
            "/assistants/{assistant_id}",
            get(not_implemented("retrieve_assistant"))
                .post(not_implemented("modify_assistant"))
                .delete(not_implemented("delete_assistant")),
        )
        .route(
            "/assistants/{assistant_id}/files",
            post(not_implemented("create_assistant_file"))
                .get(not_implemented("list_assistant_files")),
        )
        .route(
            "/assistants/{assistant_id}/files/{file_id}",
            get(not_implemented("retrieve_assistant_file"))
                .delete(not_implemented("delete_assistant_file")),
        )
        // Threads
        .route("/threads", post(create_thread))
        .route("/threads/runs", post(not_implemented("create_thread_and_run")))
        .route(
            "/threads/{thread_id}",
            get(retrieve_thread)
                .post(not_implemented("modify_thread"))
                .delete(not_implemented("delete_thread")),
        )
        // Messages
        .route(
            "/threads/{thread_id}/messages",
            post(create_message).get(list_messages),
        )
        .route(
            "/threads/{thread_id}/messages/{message_id}",
            get(retrieve_message).post(not_implemented("modify_message")),
        )
        .route(
            "/threads/{thread_id}/messages/{message_id}/files/{file_id}",
            get(not_implemented("retrieve_message_file")),
        )
        // Runs
        .route(
            "/threads/{thread_id}/runs",
            post(create_run).get(not_implemented("list_runs")),
        )
        .route(
            "/threads/{thread_id}/runs/{run_id}",
            get(not_implemented("retrieve_run")).post(not_implemented("modify_run")),
        )
        .route(
            "/threads/{thread_id}/runs/{run_id}/steps",
            get(not_implemented("list_run_steps")),
        )
        .route(
            "/threads/{thread_id}/runs/{run_id}/steps/{step_id}",
            get(not_implemented("retrieve_run_step")),
        )
        .route(
            "/threads/{thread_id}/runs/{run_id}/submit_tool_outputs",
            post(not_implemented("submit_tool_outputs_to_run")),
        )
        .route(
            "/threads/{thread_id}/runs/{run_id}/cancel",
            post(not_implemented("cancel_run")),
        )
        .with_state(state)
}

/// A handler that always fails with `NotImplemented` for `operation`.
fn not_implemented(
    operation: &'static str,
) -> impl Fn() -> std::future::Ready<Result<Json<()>, ApiError>> + Clone + Send + Sync + 'static {
    move || std::future::ready(Err(ApiError::NotImplemented(operation)))
}

/// Decode a JSON body. An empty body reads as `{}`.
fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, ApiError> {
    let raw: &[u8] = if body.iter().all(u8::is_ascii_whitespace) {
        b"{}"
    } else {
        body
    };
    serde_json::from_slice(raw).map_err(|e| ApiError::invalid(format!("Invalid request body: {e}")))
}

// ── Handlers ─────────────────────────────────────────────────────────────

async fn create_assistant(
    State(state): State<ApiState>,
    Caller(ctx): Caller,
    body: Bytes,
) -> Result<Json<Assistant>, ApiError> {
    let request: CreateAssistantRequest = parse_body(&body)?;
    Ok(Json(state.mapper.create_assistant(&ctx, request)))
}

async fn create_thread(
    State(state): State<ApiState>,
    Caller(ctx): Caller,
    body: Bytes,
) -> Result<Json<Thread>, ApiError> {
    let request: CreateThreadRequest = parse_body(&body)?;
    Ok(Json(state.mapper.create_thread(&ctx, request).await?))
}

async fn retrieve_thread(
    State(state): State<ApiState>,
    Caller(ctx): Caller,
    Path(thread_id): Path<String>,
) -> Result<Json<Thread>, ApiError> {
    Ok(Json(state.mapper.retrieve_thread(&ctx, &thread_id).await?))
}

async fn create_message(
    State(state): State<ApiState>,
    Caller(ctx): Caller,
    Path(thread_id): Path<String>,
    body: Bytes,
) -> Result<Json<ThreadMessage>, ApiError> {
    let request: CreateMessageRequest = parse_body(&body)?;
    Ok(Json(
        state
            .mapper
            .create_message(&ctx, &thread_id, request)
            .await?,
    ))
}

async fn list_messages(
    State(state): State<ApiState>,
    Caller(ctx): Caller,
    Path(thread_id): Path<String>,
    Query(params): Query<ListMessagesParams>,
) -> Result<Json<ListMessagesResponse>, ApiError> {
    Ok(Json(
        state
            .mapper
            .list_messages(&ctx, &thread_id, params)
            .await?,
    ))
}

async fn retrieve_message(
    State(state): State<ApiState>,
    Caller(ctx): Caller,
    Path((thread_id, message_id)): Path<(String, String)>,
) -> Result<Json<ThreadMessage>, ApiError> {
    Ok(Json(
        state
            .mapper
            .retrieve_message(&ctx, &thread_id, &message_id)
            .await?,
    ))
}

async fn create_run(
    State(state): State<ApiState>,
    Caller(ctx): Caller,
    Path(thread_id): Path<String>,
    body: Bytes,
) -> Result<Json<Run>, ApiError> {
    let request: CreateRunRequest = parse_body(&body)?;
    Ok(Json(state.mapper.create_run(&ctx, &thread_id, request).await?))
}
