use sqlx::PgPool;

use crate::transfer::TransferEngine;
use crate::user_auth::UserAuthService;

/// Shared application state for the gateway
pub struct AppState {
    /// Transfer core (create + history)
    pub engine: TransferEngine,
    /// Authentication service (register/login/verify)
    pub auth: UserAuthService,
    /// Pool for the plain read paths (accounts, payees)
    pub pool: PgPool,
}

impl AppState {
    pub fn new(engine: TransferEngine, auth: UserAuthService, pool: PgPool) -> Self {
        Self { engine, auth, pool }
    }
}
