//! HTTP gateway
//!
//! Thin axum surface over the transfer core. Every route except
//! register/login sits behind the JWT middleware, which injects the
//! authenticated actor's claims for the handlers.

pub mod handlers;
pub mod state;
pub mod types;

use axum::{
    Router, middleware,
    routing::{get, post},
};
use std::net::SocketAddr;
use std::sync::Arc;

use crate::config::GatewayConfig;
use crate::user_auth;
pub use state::AppState;
pub use types::{ApiResponse, error_codes};

/// Assemble the full route tree
pub fn build_router(state: Arc<AppState>) -> Router {
    let protected = Router::new()
        .route("/api/v1/accounts", get(handlers::list_accounts))
        .route("/api/v1/accounts/{id}", get(handlers::get_account))
        .route(
            "/api/v1/payees",
            post(handlers::create_payee).get(handlers::list_payees),
        )
        .route(
            "/api/v1/payees/{id}",
            axum::routing::delete(handlers::disable_payee),
        )
        .route(
            "/api/v1/transfers",
            post(handlers::create_transfer).get(handlers::list_transfers),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            user_auth::jwt_auth_middleware,
        ));

    let public = Router::new()
        .route("/api/v1/auth/register", post(user_auth::handlers::register))
        .route("/api/v1/auth/login", post(user_auth::handlers::login))
        .route("/health", get(health));

    Router::new()
        .merge(protected)
        .merge(public)
        .with_state(state)
}

/// GET /health
async fn health() -> &'static str {
    "ok"
}

/// Bind and serve until the process is stopped
pub async fn serve(config: &GatewayConfig, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = build_router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    tracing::info!(addr = %addr, "gateway listening");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}
