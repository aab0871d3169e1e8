use axum::{
    Extension, Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use linkstash_db::Credential;
use linkstash_types::api::{
    AuthResponse, CheckUserResponse, Claims, LoginRequest, RegisterRequest,
    ResetPasswordRequest, SuccessResponse, UserSummary, VerifyResponse,
};
use tracing::info;

use crate::error::ApiError;
use crate::state::{AppState, blocking};

fn auth_response(state: &AppState, credential: &Credential) -> Result<AuthResponse, ApiError> {
    Ok(AuthResponse {
        success: true,
        user: UserSummary {
            username: credential.username.clone(),
        },
        token: state.tokens.issue(credential)?,
    })
}

/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;

    let st = state.clone();
    let credential = blocking(move || st.accounts.register(&req.username, &req.password)).await?;

    Ok((StatusCode::CREATED, Json(auth_response(&state, &credential)?)))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, ApiError> {
    let Json(req) = payload?;

    let st = state.clone();
    let credential =
        blocking(move || st.accounts.authenticate(&req.username, &req.password)).await?;

    info!("{} signed in", credential.username);
    Ok(Json(auth_response(&state, &credential)?))
}

/// POST /api/auth/reset-password
pub async fn reset_password(
    State(state): State<AppState>,
    payload: Result<Json<ResetPasswordRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, ApiError> {
    let Json(req) = payload?;

    let st = state.clone();
    let credential =
        blocking(move || st.accounts.reset_password(&req.username, &req.new_password)).await?;

    Ok(Json(auth_response(&state, &credential)?))
}

/// GET /api/auth/check/{username}
pub async fn check_username(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<CheckUserResponse>, ApiError> {
    let exists = blocking(move || state.accounts.exists(&username)).await?;
    Ok(Json(CheckUserResponse { exists }))
}

/// GET /api/auth/verify
pub async fn verify(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<VerifyResponse>, ApiError> {
    let username = claims.username.clone();
    let credential = blocking(move || state.accounts.find(&username))
        .await?
        .ok_or(ApiError::InvalidToken)?;

    // A token minted for a different bucket than the account now owns is stale.
    if credential.user_hash != claims.sub {
        return Err(ApiError::InvalidToken);
    }

    Ok(Json(VerifyResponse {
        success: true,
        user: UserSummary {
            username: credential.username,
        },
    }))
}

/// POST /api/auth/logout
///
/// Tokens are stateless; the client forgets its copy.
pub async fn logout(Extension(claims): Extension<Claims>) -> Json<SuccessResponse> {
    info!("{} signed out", claims.username);
    Json(SuccessResponse { success: true })
}
