pub mod auth;
pub mod resiliency;

pub use auth::{session_middleware, GuestClaims, Session};
