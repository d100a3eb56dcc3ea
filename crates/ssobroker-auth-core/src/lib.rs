//! SSO broker auth core
//!
//! Credential normalization and token issuance: the canonical credential
//! record, the token generator strategy, the provider attribute adapter,
//! and the session authentication gate.

pub mod adapter;
pub mod attributes;
pub mod config;
pub mod credentials;
pub mod error;
pub mod gate;
pub mod token;

pub use adapter::*;
pub use attributes::*;
pub use config::*;
pub use credentials::*;
pub use error::*;
pub use gate::*;
pub use token::*;
