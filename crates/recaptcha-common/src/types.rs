//! Core types shared between the gate and its hosts.

use serde::{Deserialize, Serialize};

use crate::constants::message_keys;
use crate::error::GateError;

/// Why a token did not verify
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// No token at the configured location, or an empty one
    TokenAbsent,
    /// The verification service answered `success: false`
    InvalidToken,
}

impl RejectReason {
    pub fn message_key(&self) -> &'static str {
        match self {
            Self::TokenAbsent => message_keys::BAD_RECAPTCHA_TOKEN,
            Self::InvalidToken => message_keys::INVALID_RECAPTCHA,
        }
    }
}

/// Result of a single verification attempt.
///
/// Transport and configuration failures are not outcomes; they travel as
/// `Err(GateError)` next to this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationOutcome {
    Verified,
    Rejected(RejectReason),
}

impl VerificationOutcome {
    pub fn is_verified(&self) -> bool {
        matches!(self, Self::Verified)
    }

    /// Error-shaped view: rejections become 400-class [`GateError`]s.
    pub fn into_result(self) -> Result<(), GateError> {
        match self {
            Self::Verified => Ok(()),
            Self::Rejected(RejectReason::TokenAbsent) => Err(GateError::BadToken),
            Self::Rejected(RejectReason::InvalidToken) => Err(GateError::InvalidToken),
        }
    }
}

/// What the pipeline should do after a gate ran
#[derive(Debug)]
pub enum GateDecision {
    /// Proceed to the handler; the token has been consumed
    Continue,
    /// Answer with a client error carrying the reason's message key
    Reject(RejectReason),
    /// Hand the error to the host's error handling
    Propagate(GateError),
}

/// Role of an authenticated user. Lower index means more privilege.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub index: u32,
    pub name: String,
}

/// Role indices used by role-aware gates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleThreshold {
    /// Index of the administrator role
    pub admin: u32,
}

impl Default for RoleThreshold {
    fn default() -> Self {
        Self {
            admin: crate::constants::DEFAULT_ADMIN_ROLE_INDEX,
        }
    }
}

/// The authenticated user, populated by the host's auth layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: String,
    pub role: Role,
}

impl CurrentUser {
    pub fn is_admin(&self, threshold: &RoleThreshold) -> bool {
        self.role.index == threshold.admin
    }
}

/// A user entity loaded earlier in the pipeline for endpoint-specific checks
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueriedUser {
    pub id: String,

    /// Account flag: contacting this user requires a CAPTCHA
    #[serde(default, alias = "captcha_required", alias = "captcharequired")]
    pub captcha_required: bool,
}

impl QueriedUser {
    pub fn is_verification_required(&self) -> bool {
        self.captcha_required
    }
}

/// Body returned by the siteverify endpoint. Only `success` is interpreted.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SiteVerifyResponse {
    #[serde(default)]
    pub success: bool,

    #[serde(default, rename = "error-codes")]
    pub error_codes: Vec<String>,

    #[serde(default)]
    pub hostname: Option<String>,
}
