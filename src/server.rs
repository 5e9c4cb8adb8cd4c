//!
//! quillboard HTTP server
//! ----------------------
//! This module defines the Axum-based JSON API for quillboard.
//!
//! Responsibilities:
//! - Request-context resolution from the `Authorization: Bearer` header; a
//!   missing or bad token degrades to an anonymous context, never an error.
//! - Signup/login endpoints backed by the identity module.
//! - Post CRUD endpoints delegating to the posts module, which consults the
//!   authorization gate before every mutation.
//! - Boundary validation of request payloads before they reach the services.

use std::net::SocketAddr;

use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router, extract::{Path, State}};
use serde_json::json;
use tracing::{error, info};

use crate::error::AppError;
use crate::identity::{self, LoginRequest, RequestContext, SessionManager, SignupRequest};
use crate::posts::{self, CreatePostRequest};
use crate::storage::{PostPatch, SharedStore};

/// Shared server state injected into all handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: SharedStore,
    pub sessions: SessionManager,
}

/// Start the quillboard HTTP server bound to the given port.
///
/// The session manager carries the signing secret; constructing it is the
/// caller's responsibility so startup can fail hard on a missing secret.
pub async fn run_with_config(
    http_port: u16,
    db_root: &str,
    sessions: SessionManager,
) -> anyhow::Result<()> {
    let store = SharedStore::new(db_root)?;
    let app_state = AppState { store, sessions };

    let app = router(app_state);

    let addr: SocketAddr = format!("0.0.0.0:{}", http_port).parse()?;
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { "quillboard ok" }))
        .route("/auth/signup", post(signup_handler))
        .route("/auth/login", post(login_handler))
        .route("/me", get(me_handler))
        .route("/posts", get(list_posts_handler).post(create_post_handler))
        .route("/posts/{id}", get(get_post_handler).patch(update_post_handler).delete(delete_post_handler))
        .route("/my/posts", get(my_posts_handler))
        .with_state(state)
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            error!("request failed: {}", self);
        }
        let body = Json(json!({"status": "error", "code": self.code_str(), "error": self.message()}));
        (status, body).into_response()
    }
}

/// Resolve the request context once, at the edge of the request.
fn request_context(state: &AppState, headers: &HeaderMap) -> RequestContext {
    let authorization = headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok());
    let request_id = headers
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());
    RequestContext::resolve(&state.sessions, authorization, request_id)
}

fn validate_signup(payload: &SignupRequest) -> Result<(), AppError> {
    if payload.username.trim().is_empty() {
        return Err(AppError::user("invalid_username", "username must not be empty"));
    }
    if payload.email.trim().is_empty() || !payload.email.contains('@') {
        return Err(AppError::user("invalid_email", "email must be a valid address"));
    }
    if payload.password.is_empty() {
        return Err(AppError::user("invalid_password", "password must not be empty"));
    }
    Ok(())
}

fn validate_create_post(payload: &CreatePostRequest) -> Result<(), AppError> {
    if payload.title.trim().is_empty() {
        return Err(AppError::user("invalid_title", "title must not be empty"));
    }
    if payload.content.trim().is_empty() {
        return Err(AppError::user("invalid_content", "content must not be empty"));
    }
    Ok(())
}

fn validate_post_patch(patch: &PostPatch) -> Result<(), AppError> {
    if patch.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
        return Err(AppError::user("invalid_title", "title must not be empty"));
    }
    if patch.content.as_deref().is_some_and(|c| c.trim().is_empty()) {
        return Err(AppError::user("invalid_content", "content must not be empty"));
    }
    Ok(())
}

async fn signup_handler(
    State(state): State<AppState>,
    Json(payload): Json<SignupRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_signup(&payload)?;
    let resp = identity::signup(&state.store, &state.sessions, &payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

async fn login_handler(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let resp = identity::login(&state.store, &state.sessions, &payload).await?;
    Ok(Json(resp))
}

async fn me_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let ctx = request_context(&state, &headers);
    let user = identity::current_user(&state.store, &ctx)?;
    Ok(Json(user))
}

async fn list_posts_handler(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    Ok(Json(posts::list_posts(&state.store)?))
}

async fn get_post_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(posts::get_post(&state.store, &id)?))
}

async fn my_posts_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let ctx = request_context(&state, &headers);
    Ok(Json(posts::my_posts(&state.store, &ctx)?))
}

async fn create_post_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<CreatePostRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_create_post(&payload)?;
    let ctx = request_context(&state, &headers);
    let view = posts::create_post(&state.store, &ctx, &payload)?;
    Ok((StatusCode::CREATED, Json(view)))
}

async fn update_post_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(patch): Json<PostPatch>,
) -> Result<impl IntoResponse, AppError> {
    validate_post_patch(&patch)?;
    let ctx = request_context(&state, &headers);
    Ok(Json(posts::update_post(&state.store, &ctx, &id, &patch)?))
}

async fn delete_post_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let ctx = request_context(&state, &headers);
    posts::delete_post(&state.store, &ctx, &id)?;
    Ok(Json(json!({"status": "ok", "deleted": true})))
}
