//! Authentication route handlers.
//!
//! Sign-up and sign-in accept JSON or urlencoded forms. The signed-in user is
//! kept in the server-side session.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{OptionalAuth, clear_current_user, set_current_user};
use crate::models::{CurrentUser, User};
use crate::services::auth::{AuthError, AuthService, SignUp};
use crate::state::AppState;

use super::JsonOrForm;

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Response carrying the signed-in user.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub success: bool,
    pub user: User,
}

/// Response for `GET /auth/session`.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub user: Option<User>,
}

/// Response with no payload beyond the outcome.
#[derive(Debug, Serialize)]
pub struct Ack {
    pub success: bool,
}

/// POST /auth/signup
#[instrument(skip_all)]
pub async fn signup(
    State(state): State<AppState>,
    session: Session,
    JsonOrForm(form): JsonOrForm<SignUp>,
) -> Result<(StatusCode, Json<AuthResponse>)> {
    let user = AuthService::new(state.pool()).sign_up(&form).await?;
    start_session(&session, &user).await?;

    tracing::info!(user_id = %user.id, "User signed up");
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            success: true,
            user,
        }),
    ))
}

/// POST /auth/login
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    JsonOrForm(form): JsonOrForm<LoginForm>,
) -> Result<Json<AuthResponse>> {
    let user = AuthService::new(state.pool())
        .sign_in(&form.email, &form.password)
        .await?;
    start_session(&session, &user).await?;

    tracing::info!(user_id = %user.id, "User signed in");
    Ok(Json(AuthResponse {
        success: true,
        user,
    }))
}

/// POST /auth/logout
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Result<Json<Ack>> {
    clear_current_user(&session)
        .await
        .map_err(|e| AppError::Internal(format!("failed to clear session: {e}")))?;
    clear_sentry_user();

    Ok(Json(Ack { success: true }))
}

/// GET /auth/session
///
/// The signed-in user, or `null`. A session whose user has since been
/// deleted reports `null`.
pub async fn session(
    State(state): State<AppState>,
    OptionalAuth(current): OptionalAuth,
) -> Result<Json<SessionResponse>> {
    let Some(current) = current else {
        return Ok(Json(SessionResponse { user: None }));
    };

    let user = match AuthService::new(state.pool()).get_user(current.id).await {
        Ok(user) => Some(user),
        Err(AuthError::UserNotFound) => None,
        Err(e) => return Err(e.into()),
    };

    Ok(Json(SessionResponse { user }))
}

async fn start_session(session: &Session, user: &User) -> Result<()> {
    set_current_user(session, &CurrentUser::from(user))
        .await
        .map_err(|e| AppError::Internal(format!("failed to store session: {e}")))?;
    set_sentry_user(&user.id, Some(user.email.as_str()));
    Ok(())
}
