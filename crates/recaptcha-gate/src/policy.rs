//! Gate policies: when to demand a verified token, and what to do with the result.
//!
//! Every policy reduces to a bypass check followed by one shared
//! verify-then-decide sequence.

use std::fmt;
use std::sync::Arc;

use recaptcha_common::constants::flags;
use recaptcha_common::{GateDecision, GateError, VerificationOutcome};

use crate::config::{self, GateConfig};
use crate::extract::extract_token;
use crate::request::{GateRequest, GateResponse};
use crate::verifier::VerificationClient;

/// Which requests must carry a verified token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    /// Every request is verified
    Unconditional,
    /// Authenticated users skip verification
    UnlessAuthenticated,
    /// Users holding the admin role skip verification
    UnlessAdmin,
    /// Verified only when the queried user's account demands it
    AccountFlag,
}

/// What a policy asks for before any token is looked at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Requirement {
    Bypass,
    Verify,
    /// Raise the captcha-required flag, then verify
    FlagAndVerify,
}

impl Policy {
    fn requirement(&self, request: &GateRequest, config: &GateConfig) -> Result<Requirement, GateError> {
        let requirement = match self {
            Self::Unconditional => Requirement::Verify,
            Self::UnlessAuthenticated if request.user.is_some() => Requirement::Bypass,
            Self::UnlessAuthenticated => Requirement::Verify,
            Self::UnlessAdmin => match &request.user {
                Some(user) if user.is_admin(&config.role_threshold) => Requirement::Bypass,
                _ => Requirement::Verify,
            },
            Self::AccountFlag => {
                let queried = request.queried_user.as_ref().ok_or_else(|| {
                    GateError::Internal("account-flag gate ran without a queried user".into())
                })?;
                if queried.is_verification_required() {
                    Requirement::FlagAndVerify
                } else {
                    Requirement::Bypass
                }
            }
        };
        Ok(requirement)
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unconditional => "unconditional",
            Self::UnlessAuthenticated => "unless-authenticated",
            Self::UnlessAdmin => "unless-admin",
            Self::AccountFlag => "account-flag",
        };
        f.write_str(name)
    }
}

/// A policy bound to a verifier and, optionally, its own configuration.
///
/// Gates built without a configuration fall back to the global one
/// installed through [`config::install_global`].
#[derive(Debug, Clone)]
pub struct CaptchaGate {
    policy: Policy,
    verifier: VerificationClient,
    config: Option<Arc<GateConfig>>,
}

impl CaptchaGate {
    pub fn new(policy: Policy, verifier: VerificationClient) -> Self {
        Self {
            policy,
            verifier,
            config: None,
        }
    }

    pub fn with_config(mut self, config: Arc<GateConfig>) -> Self {
        self.config = Some(config);
        self
    }

    pub fn policy(&self) -> Policy {
        self.policy
    }

    /// The configuration this gate runs with
    pub fn config(&self) -> Result<Arc<GateConfig>, GateError> {
        config::resolve(self.config.as_ref())
    }

    /// True when the policy lets `request` through on identity alone.
    ///
    /// Only the user fields are consulted, so hosts can decide before
    /// reading the body. Errors count as "no bypass" and surface in [`check`].
    ///
    /// [`check`]: CaptchaGate::check
    pub fn bypasses(&self, request: &GateRequest) -> bool {
        self.config()
            .and_then(|config| self.policy.requirement(request, &config))
            .is_ok_and(|requirement| requirement == Requirement::Bypass)
    }

    /// Run the policy against a request, recording response effects in `response`.
    ///
    /// The token is removed from the request body only when the decision is
    /// [`GateDecision::Continue`] after a successful verification.
    pub async fn check(&self, request: &mut GateRequest, response: &mut GateResponse) -> GateDecision {
        let config = match self.config() {
            Ok(config) => config,
            Err(e) => return GateDecision::Propagate(e),
        };

        let requirement = match self.policy.requirement(request, &config) {
            Ok(requirement) => requirement,
            Err(e) => return GateDecision::Propagate(e),
        };

        match requirement {
            Requirement::Bypass => {
                tracing::debug!(policy = %self.policy, "Verification bypassed");
                GateDecision::Continue
            }
            Requirement::Verify => self.verify_then_decide(&config, request, response).await,
            Requirement::FlagAndVerify => {
                response.set_flag(flags::CAPTCHA_REQUIRED, true);
                self.verify_then_decide(&config, request, response).await
            }
        }
    }

    async fn verify_then_decide(
        &self,
        config: &GateConfig,
        request: &mut GateRequest,
        response: &mut GateResponse,
    ) -> GateDecision {
        let location = config.token_location();
        let token = extract_token(request, location);

        match self.verifier.verify(config, token.as_deref()).await {
            Ok(VerificationOutcome::Verified) => {
                request.remove_body_field(location);
                response.mark_verified();
                tracing::info!(policy = %self.policy, "reCAPTCHA verified");
                GateDecision::Continue
            }
            Ok(VerificationOutcome::Rejected(reason)) => {
                tracing::debug!(policy = %self.policy, reason = ?reason, "reCAPTCHA rejected");
                GateDecision::Reject(reason)
            }
            Err(e) => {
                tracing::warn!(policy = %self.policy, error = %e, "reCAPTCHA verification failed");
                GateDecision::Propagate(e)
            }
        }
    }
}
