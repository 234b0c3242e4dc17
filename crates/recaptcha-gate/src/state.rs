//! Application state and shared resources.

use std::collections::HashMap;
use std::sync::Arc;

use recaptcha_common::{GateError, QueriedUser};

use crate::config::{AppConfig, GateConfig};
use crate::policy::{CaptchaGate, Policy};
use crate::verifier::VerificationClient;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Gate configuration shared by every route
    pub gate_config: Arc<GateConfig>,

    /// Verification service client
    pub verifier: VerificationClient,

    /// Users addressable by the account-flag route
    pub directory: Arc<HashMap<String, QueriedUser>>,
}

impl AppState {
    pub fn new(config: &AppConfig) -> Result<Self, GateError> {
        let verifier = VerificationClient::from_config(&config.gate)?;
        let directory = config
            .directory
            .iter()
            .map(|user| (user.id.clone(), user.clone()))
            .collect();

        Ok(Self {
            gate_config: Arc::new(config.gate.clone()),
            verifier,
            directory: Arc::new(directory),
        })
    }

    /// Build a gate for `policy` sharing this state's verifier and configuration
    pub fn gate(&self, policy: Policy) -> Arc<CaptchaGate> {
        Arc::new(CaptchaGate::new(policy, self.verifier.clone()).with_config(self.gate_config.clone()))
    }

    pub fn queried_user(&self, id: &str) -> Option<QueriedUser> {
        self.directory.get(id).cloned()
    }
}
