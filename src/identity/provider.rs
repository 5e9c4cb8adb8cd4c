//! Store-backed signup and login.
//! Hashing runs on the blocking pool so a login burst cannot stall unrelated
//! requests on the async workers.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::AppError;
use crate::storage::{PublicUser, SharedStore, User};
use crate::tprintln;

use super::authorizer::require_identity;
use super::request_context::RequestContext;
use super::token::{SessionManager, SessionToken};

#[derive(Clone, Deserialize)]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

// Manual Debug keeps the plaintext password out of logs and panics.
impl fmt::Debug for SignupRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignupRequest")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Successful signup/login payload: a fresh token plus the public profile.
#[derive(Debug, Clone, Serialize)]
pub struct AuthResponse {
    pub token: SessionToken,
    pub user: PublicUser,
}

// One error for unknown email and wrong password alike; the caller must not
// learn which factor failed.
fn invalid_credentials() -> AppError {
    AppError::auth("invalid_credentials", "invalid email or password")
}

/// Register a new identity and mint its first session token.
///
/// The duplicate pre-check here only produces a friendlier error; the store's
/// own uniqueness enforcement inside `insert_user` is the authoritative guard
/// against the check-then-insert race.
pub async fn signup(
    store: &SharedStore,
    sm: &SessionManager,
    req: &SignupRequest,
) -> Result<AuthResponse, AppError> {
    {
        let guard = store.0.lock();
        if guard.identity_taken(&req.username, &req.email) {
            return Err(AppError::conflict(
                "duplicate_identity",
                "a user with this email or username already exists",
            ));
        }
    }

    let password = req.password.clone();
    let phc = tokio::task::spawn_blocking(move || crate::security::hash_password(&password))
        .await
        .map_err(|e| AppError::internal("hash_task_failed", e.to_string()))??;

    let user = User::new(&req.username, &req.email, &phc);
    {
        let mut guard = store.0.lock();
        guard.insert_user(&user)?;
    }

    let token = sm.issue(&user.id)?;
    info!(target: "auth", "signup user={} id={}", user.username, user.id);
    Ok(AuthResponse { token, user: user.to_public() })
}

/// Authenticate by email and password and mint a new session token.
pub async fn login(
    store: &SharedStore,
    sm: &SessionManager,
    req: &LoginRequest,
) -> Result<AuthResponse, AppError> {
    let user = {
        let guard = store.0.lock();
        guard.find_user_by_email(&req.email).cloned()
    };
    let Some(user) = user else { return Err(invalid_credentials()); };

    let password = req.password.clone();
    let phc = user.password_hash.clone();
    let ok = tokio::task::spawn_blocking(move || crate::security::verify_password(&phc, &password))
        .await
        .map_err(|e| AppError::internal("verify_task_failed", e.to_string()))?;
    if !ok {
        return Err(invalid_credentials());
    }

    let token = sm.issue(&user.id)?;
    tprintln!("auth.login user={} id={}", user.username, user.id);
    Ok(AuthResponse { token, user: user.to_public() })
}

/// Profile of the identity the context asserts. A valid token whose subject
/// no longer exists resolves to Unauthenticated, not NotFound.
pub fn current_user(store: &SharedStore, ctx: &RequestContext) -> Result<PublicUser, AppError> {
    let user_id = require_identity(ctx)?;
    let guard = store.0.lock();
    guard
        .find_user_by_id(user_id)
        .map(User::to_public)
        .ok_or_else(|| AppError::auth("unauthenticated", "not authenticated"))
}
