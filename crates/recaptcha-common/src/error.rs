//! Error taxonomy for the reCAPTCHA gate.

use thiserror::Error;

use crate::constants::message_keys;

/// Errors surfaced by token verification and gate policies.
///
/// `InvalidToken` and `BadToken` are client errors rendered as 400s.
/// `Config` and `Transport` signal deployment or infrastructure trouble and
/// are always handed to the host's error handling.
#[derive(Debug, Error)]
pub enum GateError {
    /// Missing secret key or no configuration available
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network, timeout, or malformed response from the verification service
    #[error("Verification service error: {0}")]
    Transport(String),

    /// The verification service rejected the token
    #[error("Invalid reCAPTCHA token")]
    InvalidToken,

    /// No usable token was supplied
    #[error("Bad reCAPTCHA token")]
    BadToken,

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl GateError {
    /// Returns the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Config(_) => 500,
            Self::Transport(_) => 502,
            Self::InvalidToken => 400,
            Self::BadToken => 400,
            Self::Internal(_) => 500,
        }
    }

    /// Stable localisation key for the client
    pub fn message_key(&self) -> &'static str {
        match self {
            Self::Config(_) => message_keys::CONFIGURATION,
            Self::Transport(_) => message_keys::VERIFICATION_UNAVAILABLE,
            Self::InvalidToken => message_keys::INVALID_RECAPTCHA,
            Self::BadToken => message_keys::BAD_RECAPTCHA_TOKEN,
            Self::Internal(_) => message_keys::INTERNAL,
        }
    }

    /// True when the client caused the failure
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status_code())
    }
}
