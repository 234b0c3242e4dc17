//! # Recaptcha Gate
//!
//! Request gates that demand a verified reCAPTCHA token before a request
//! reaches application logic.
//!
//! ```text
//! request → policy bypass? → extract token → siteverify → continue | 400 | error
//! ```
//!
//! ## Modules
//! - `property` - String-path lookup over JSON values
//! - `body` - JSON and form body codecs
//! - `extract` - Token extraction from a request
//! - `verifier` - Verification service client
//! - `policy` - Gate policies and the shared verify-then-decide sequence
//! - `middleware` - axum adapter
//! - `config` - Configuration loading and the global fallback

pub mod body;
pub mod config;
pub mod extract;
pub mod middleware;
pub mod policy;
pub mod property;
pub mod request;
pub mod routes;
pub mod state;
pub mod verifier;

pub use config::GateConfig;
pub use middleware::{CaptchaVerified, GateErrorResponse, enforce};
pub use policy::{CaptchaGate, Policy};
pub use request::{GateRequest, GateResponse};
pub use verifier::VerificationClient;
