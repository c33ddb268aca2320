use axum::{Json, extract::State, http::StatusCode};
use std::sync::Arc;
use validator::Validate;

use super::service::{AuthError, LoginResult, RegisterResult};
use crate::gateway::{
    state::AppState,
    types::{ApiResponse, LoginRequest, RegisterRequest, error_codes},
};

type HandlerError = (StatusCode, Json<ApiResponse<()>>);

/// POST /api/v1/auth/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<ApiResponse<RegisterResult>>, HandlerError> {
    req.validate().map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::<()>::error(
                error_codes::INVALID_PARAMETER,
                e.to_string(),
            )),
        )
    })?;

    match state.auth.register(&req.email, &req.password).await {
        Ok(result) => Ok(Json(ApiResponse::success(result))),
        Err(e) => Err(map_auth_error(e)),
    }
}

/// POST /api/v1/auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResult>>, HandlerError> {
    match state.auth.login(&req.email, &req.password).await {
        Ok(result) => Ok(Json(ApiResponse::success(result))),
        Err(e) => Err(map_auth_error(e)),
    }
}

fn map_auth_error(e: AuthError) -> HandlerError {
    let (status, code) = match &e {
        AuthError::EmailRequired | AuthError::WeakPassword => {
            (StatusCode::BAD_REQUEST, error_codes::INVALID_PARAMETER)
        }
        AuthError::EmailTaken => (StatusCode::CONFLICT, error_codes::CONFLICT),
        AuthError::InvalidCredentials | AuthError::Token(_) => {
            (StatusCode::UNAUTHORIZED, error_codes::AUTH_FAILED)
        }
        AuthError::Database(_) | AuthError::Internal(_) => {
            tracing::error!(error = %e, "auth failure");
            (StatusCode::INTERNAL_SERVER_ERROR, error_codes::INTERNAL_ERROR)
        }
    };

    // Credential failures keep a fixed message; nothing to probe.
    let msg = match &e {
        AuthError::Database(_) | AuthError::Internal(_) => "internal error".to_string(),
        other => other.to_string(),
    };

    (status, Json(ApiResponse::<()>::error(code, msg)))
}
