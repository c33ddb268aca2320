//! User authentication
//!
//! Password registration/login over `users` with argon2 hashing and HS256
//! JWTs. The transfer core never sees any of this; it receives an already
//! authenticated actor id extracted by the middleware.

pub mod handlers;
pub mod middleware;
pub mod service;

pub use middleware::jwt_auth_middleware;
pub use service::{AuthError, Claims, LoginResult, RegisterResult, UserAuthService};
