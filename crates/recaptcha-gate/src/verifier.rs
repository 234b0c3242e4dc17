//! Client for the remote reCAPTCHA verification service.

use std::time::Duration;

use recaptcha_common::{GateError, RejectReason, SiteVerifyResponse, VerificationOutcome};
use reqwest::Client;

use crate::config::GateConfig;

/// Verification service client. Cheap to clone; clones share one connection pool.
#[derive(Debug, Clone)]
pub struct VerificationClient {
    http: Client,
}

impl VerificationClient {
    /// Build a client whose requests time out after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, GateError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GateError::Internal(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { http })
    }

    pub fn from_config(config: &GateConfig) -> Result<Self, GateError> {
        Self::new(Duration::from_secs(config.timeout_secs))
    }

    /// Verify a client token.
    ///
    /// A missing secret key is a configuration error even when verification
    /// is disabled. An absent or empty token is rejected without contacting
    /// the service. Every call with a token makes its own remote request.
    pub async fn verify(
        &self,
        config: &GateConfig,
        token: Option<&str>,
    ) -> Result<VerificationOutcome, GateError> {
        let secret = config
            .secret()
            .ok_or_else(|| GateError::Config("a reCAPTCHA secret key is required".into()))?;

        let token = match token {
            Some(t) if !t.is_empty() => t,
            _ => return Ok(VerificationOutcome::Rejected(RejectReason::TokenAbsent)),
        };

        if !config.enabled {
            tracing::debug!("Verification disabled, accepting token");
            return Ok(VerificationOutcome::Verified);
        }

        let url = config.verification_url();
        let response = self
            .http
            .get(url)
            .query(&[("secret", secret), ("response", token)])
            .send()
            .await
            .map_err(|e| {
                let e = e.without_url();
                tracing::warn!(url = %url, timeout = e.is_timeout(), error = %e, "Verification request failed");
                GateError::Transport(e.to_string())
            })?;

        let status = response.status();
        if status.is_server_error() {
            tracing::warn!(url = %url, status = %status, "Verification service unavailable");
            return Err(GateError::Transport(format!("verification service returned {status}")));
        }

        let body: SiteVerifyResponse = response.json().await.map_err(|e| {
            let e = e.without_url();
            tracing::warn!(url = %url, error = %e, "Malformed verification response");
            GateError::Transport(format!("malformed verification response: {e}"))
        })?;

        if body.success {
            Ok(VerificationOutcome::Verified)
        } else {
            tracing::debug!(error_codes = ?body.error_codes, "Token rejected by verification service");
            Ok(VerificationOutcome::Rejected(RejectReason::InvalidToken))
        }
    }
}
