//! Concrete API endpoints.

pub mod auth;

pub use auth::{AuthApi, LoginResponse, UserProfile};
