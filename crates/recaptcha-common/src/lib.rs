//! # Recaptcha Common
//!
//! Shared types, errors, and constants used by the gate crate and by hosts
//! that embed it.
//!
//! ## Modules
//! - `types` - Verification outcomes, gate decisions, roles
//! - `error` - Gate error taxonomy
//! - `constants` - Field names, default endpoint, message keys

pub mod constants;
pub mod error;
pub mod types;

pub use error::GateError;
pub use types::*;
