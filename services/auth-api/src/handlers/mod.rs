//! HTTP handlers

mod auth;
mod health;

pub use auth::{login_info, token_info};
pub use health::{health, ready};
