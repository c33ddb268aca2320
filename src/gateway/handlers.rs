//! Gateway HTTP handlers
//!
//! Thin request plumbing: extract the authenticated actor, validate the
//! payload shape, call into the core, map errors to status codes. All
//! business rules live below this layer.

use axum::{
    Json,
    extract::{Extension, Path, Query, State},
    http::{HeaderMap, StatusCode},
};
use std::sync::Arc;
use validator::Validate;

use super::state::AppState;
use super::types::{
    AccountData, ApiResponse, CreatePayeeRequest, CreateTransferRequest, ListTransfersQuery,
    TransferPageData, error_codes,
};
use crate::account::AccountRepository;
use crate::core_types::{AccountId, PayeeId, UserId};
use crate::payee::{Payee, PayeeDirectory, PayeeError};
use crate::transfer::{CreateTransfer, TransferError, TransferView};
use crate::user_auth::Claims;

type HandlerError = (StatusCode, Json<ApiResponse<()>>);

const DEFAULT_PAGE_SIZE: i64 = 20;

/// Clients must send their replay token on every transfer request
const IDEMPOTENCY_KEY_HEADER: &str = "Idempotency-Key";

// ============================================================================
// Accounts
// ============================================================================

/// GET /api/v1/accounts
pub async fn list_accounts(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<ApiResponse<Vec<AccountData>>>, HandlerError> {
    let actor_id = actor_id(&claims)?;

    let accounts = AccountRepository::list_for_user(&state.pool, actor_id)
        .await
        .map_err(internal_error)?;

    Ok(Json(ApiResponse::success(
        accounts.into_iter().map(AccountData::from).collect(),
    )))
}

/// GET /api/v1/accounts/{id}
pub async fn get_account(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Path(account_id): Path<AccountId>,
) -> Result<Json<ApiResponse<AccountData>>, HandlerError> {
    let actor_id = actor_id(&claims)?;

    let account = AccountRepository::get_owned(&state.pool, account_id, actor_id)
        .await
        .map_err(internal_error)?
        .ok_or_else(|| {
            (
                StatusCode::NOT_FOUND,
                Json(ApiResponse::<()>::error(
                    error_codes::NOT_FOUND,
                    "account not found",
                )),
            )
        })?;

    Ok(Json(ApiResponse::success(AccountData::from(account))))
}

// ============================================================================
// Payees
// ============================================================================

/// POST /api/v1/payees
pub async fn create_payee(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreatePayeeRequest>,
) -> Result<Json<ApiResponse<Payee>>, HandlerError> {
    let actor_id = actor_id(&claims)?;
    validate(&req)?;

    let payee = PayeeDirectory::add_payee(&state.pool, actor_id, &req.email, req.label.as_deref())
        .await
        .map_err(map_payee_error)?;

    Ok(Json(ApiResponse::success(payee)))
}

/// GET /api/v1/payees
pub async fn list_payees(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<ApiResponse<Vec<Payee>>>, HandlerError> {
    let actor_id = actor_id(&claims)?;

    let payees = PayeeDirectory::list_payees(&state.pool, actor_id)
        .await
        .map_err(map_payee_error)?;

    Ok(Json(ApiResponse::success(payees)))
}

/// DELETE /api/v1/payees/{id} - payees are disabled, never deleted
pub async fn disable_payee(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Path(payee_id): Path<PayeeId>,
) -> Result<Json<ApiResponse<Payee>>, HandlerError> {
    let actor_id = actor_id(&claims)?;

    let payee = PayeeDirectory::disable_payee(&state.pool, actor_id, payee_id)
        .await
        .map_err(map_payee_error)?;

    Ok(Json(ApiResponse::success(payee)))
}

// ============================================================================
// Transfers
// ============================================================================

/// POST /api/v1/transfers
pub async fn create_transfer(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    headers: HeaderMap,
    Json(req): Json<CreateTransferRequest>,
) -> Result<Json<ApiResponse<TransferView>>, HandlerError> {
    let actor_id = actor_id(&claims)?;
    validate(&req)?;

    let idempotency_key = headers
        .get(IDEMPOTENCY_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            (
                StatusCode::BAD_REQUEST,
                Json(ApiResponse::<()>::error(
                    error_codes::INVALID_PARAMETER,
                    "missing Idempotency-Key header",
                )),
            )
        })?;

    let view = state
        .engine
        .create_transfer(
            actor_id,
            idempotency_key,
            CreateTransfer {
                from_account_id: req.from_account_id,
                payee_id: req.payee_id,
                amount_cents: req.amount_cents,
                currency: req.currency,
            },
        )
        .await
        .map_err(map_transfer_error)?;

    Ok(Json(ApiResponse::success(view)))
}

/// GET /api/v1/transfers?limit&cursor
pub async fn list_transfers(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<ListTransfersQuery>,
) -> Result<Json<ApiResponse<TransferPageData>>, HandlerError> {
    let actor_id = actor_id(&claims)?;

    let page = state
        .engine
        .list_transfers(
            actor_id,
            query.limit.unwrap_or(DEFAULT_PAGE_SIZE),
            query.cursor.as_deref(),
        )
        .await
        .map_err(map_transfer_error)?;

    Ok(Json(ApiResponse::success(TransferPageData {
        items: page.items,
        next_cursor: page.next_cursor,
    })))
}

// ============================================================================
// Shared plumbing
// ============================================================================

fn actor_id(claims: &Claims) -> Result<UserId, HandlerError> {
    claims.user_id().ok_or((
        StatusCode::UNAUTHORIZED,
        Json(ApiResponse::<()>::error(
            error_codes::AUTH_FAILED,
            "invalid token subject",
        )),
    ))
}

fn validate<T: Validate>(req: &T) -> Result<(), HandlerError> {
    req.validate().map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::<()>::error(
                error_codes::INVALID_PARAMETER,
                e.to_string(),
            )),
        )
    })
}

fn internal_error(e: sqlx::Error) -> HandlerError {
    internal_error_from(e)
}

fn map_transfer_error(e: TransferError) -> HandlerError {
    let (status, code) = match &e {
        TransferError::Database(_) => return internal_error_from(e),
        TransferError::NotFound | TransferError::PayeeNotFound | TransferError::PayeeDisabled => {
            (StatusCode::NOT_FOUND, error_codes::NOT_FOUND)
        }
        TransferError::InsufficientFunds => {
            (StatusCode::BAD_REQUEST, error_codes::INSUFFICIENT_FUNDS)
        }
        TransferError::ConflictingReplay | TransferError::KeyAlreadyUsed => {
            (StatusCode::CONFLICT, error_codes::CONFLICT)
        }
        TransferError::SameAccount
        | TransferError::AccountNotActive
        | TransferError::InvalidCurrency
        | TransferError::CurrencyMismatch
        | TransferError::InvalidAmount
        | TransferError::InvalidIdempotencyKey
        | TransferError::InvalidCursor => (StatusCode::BAD_REQUEST, error_codes::INVALID_PARAMETER),
    };

    (status, Json(ApiResponse::<()>::error(code, e.to_string())))
}

fn map_payee_error(e: PayeeError) -> HandlerError {
    let (status, code) = match &e {
        PayeeError::Database(_) => return internal_error_from(e),
        PayeeError::NotFound | PayeeError::Disabled | PayeeError::DestinationAccountNotFound => {
            (StatusCode::NOT_FOUND, error_codes::NOT_FOUND)
        }
        PayeeError::EmailNotFound | PayeeError::SelfPayee => {
            (StatusCode::BAD_REQUEST, error_codes::INVALID_PARAMETER)
        }
        PayeeError::AlreadyExists => (StatusCode::CONFLICT, error_codes::CONFLICT),
    };

    (status, Json(ApiResponse::<()>::error(code, e.to_string())))
}

fn internal_error_from(e: impl std::fmt::Display) -> HandlerError {
    tracing::error!(error = %e, "storage failure");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ApiResponse::<()>::error(
            error_codes::INTERNAL_ERROR,
            "internal error",
        )),
    )
}
