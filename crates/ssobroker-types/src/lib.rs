//! SSO Broker Types - Shared domain types
//!
//! This crate contains the types exchanged between the broker core and its
//! external collaborators:
//! - Raw identity-provider attributes (single or list-shaped values)
//! - Session state written by the protocol handler

pub mod attribute;
pub mod session;

pub use attribute::*;
pub use session::*;
