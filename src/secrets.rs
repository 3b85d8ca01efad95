//! Credential lookup.
//!
//! Lookups fail soft: a missing or unreadable secret comes back as an empty
//! string and the reason is logged. Callers decide whether an empty value
//! is fatal.

use async_trait::async_trait;
use aws_sdk_ssm::Client as SsmClient;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{error, warn};

#[async_trait]
pub trait SecretProvider: Send + Sync {
    /// Return the secret stored under `name`, or an empty string.
    async fn get_secret(&self, name: &str) -> String;
}

/// Reads decrypted values from SSM Parameter Store.
#[derive(Clone)]
pub struct SsmSecretProvider {
    client: SsmClient,
    timeout: Duration,
}

impl SsmSecretProvider {
    pub async fn from_env(timeout: Duration) -> Self {
        let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self::new(SsmClient::new(&config), timeout)
    }

    pub fn new(client: SsmClient, timeout: Duration) -> Self {
        Self { client, timeout }
    }
}

#[async_trait]
impl SecretProvider for SsmSecretProvider {
    async fn get_secret(&self, name: &str) -> String {
        let request = self
            .client
            .get_parameter()
            .name(name)
            .with_decryption(true)
            .send();

        match tokio::time::timeout(self.timeout, request).await {
            Ok(Ok(output)) => output
                .parameter()
                .and_then(|p| p.value())
                .map(str::to_string)
                .unwrap_or_default(),
            Ok(Err(e)) => {
                let not_found = e
                    .as_service_error()
                    .map(|se| se.is_parameter_not_found())
                    .unwrap_or(false);
                if not_found {
                    warn!("Parameter {name} not found");
                } else {
                    error!(
                        "Failed to read parameter {name}: {}",
                        aws_sdk_ssm::error::DisplayErrorContext(&e)
                    );
                }
                String::new()
            }
            Err(_) => {
                error!("Timed out after {:?} reading parameter {name}", self.timeout);
                String::new()
            }
        }
    }
}

/// Fixed name → value map, for tests and local runs.
#[derive(Debug, Clone, Default)]
pub struct StaticSecretProvider {
    values: HashMap<String, String>,
}

impl StaticSecretProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }
}

#[async_trait]
impl SecretProvider for StaticSecretProvider {
    async fn get_secret(&self, name: &str) -> String {
        match self.values.get(name) {
            Some(value) => value.clone(),
            None => {
                warn!("Parameter {name} not found");
                String::new()
            }
        }
    }
}
