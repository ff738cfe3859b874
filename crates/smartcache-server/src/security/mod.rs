//! Request authentication

pub mod auth;

pub use auth::{api_key_auth_middleware, ApiKeyAuth, AuthError, API_KEY_HEADER};
