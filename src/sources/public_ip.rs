use super::AddressSource;
use crate::error::SourceError;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::time::Duration;
use tokio::time::timeout;

pub const DEFAULT_ENDPOINT: &str = "https://checkip.amazonaws.com";

/// Longest body accepted as an address (textual IPv6 is at most 45 chars)
const MAX_ADDRESS_LEN: usize = 64;

/// Extra time given to the blocking request before the async side gives up
const TIMEOUT_GRACE: Duration = Duration::from_secs(1);

/// Fetches the public address from a plain-text "what is my IP" endpoint.
pub struct HttpAddressSource {
    endpoint: String,
    timeout: Duration,
    agent: ureq::Agent,
}

impl HttpAddressSource {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(timeout)
            .user_agent(concat!("geoprobe/", env!("CARGO_PKG_VERSION")))
            .build();
        Self {
            endpoint: endpoint.into(),
            timeout,
            agent,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl AddressSource for HttpAddressSource {
    fn name(&self) -> &str {
        &self.endpoint
    }

    async fn public_address(&self) -> Result<String> {
        let agent = self.agent.clone();
        let endpoint = self.endpoint.clone();

        let request = tokio::task::spawn_blocking(move || -> Result<String, SourceError> {
            let response = agent.get(&endpoint).call().map_err(|e| SourceError::Http {
                endpoint: endpoint.clone(),
                reason: e.to_string(),
            })?;
            response.into_string().map_err(|e| SourceError::Http {
                endpoint: endpoint.clone(),
                reason: e.to_string(),
            })
        });

        let body = match timeout(self.timeout + TIMEOUT_GRACE, request).await {
            Err(_) => {
                return Err(SourceError::Timeout {
                    what: "public address lookup",
                    after: self.timeout,
                }
                .into())
            }
            Ok(Err(join)) => return Err(anyhow!("address lookup task failed: {join}")),
            Ok(Ok(body)) => body?,
        };

        Ok(parse_address(&self.endpoint, &body)?)
    }
}

/// Validate a lookup response body and return the trimmed address.
pub fn parse_address(endpoint: &str, body: &str) -> Result<String, SourceError> {
    let address = body.trim();
    if address.is_empty() {
        return Err(SourceError::EmptyResponse(endpoint.to_string()));
    }
    if address.len() > MAX_ADDRESS_LEN || address.chars().any(char::is_whitespace) {
        return Err(SourceError::Malformed {
            what: "address response",
            reason: format!("unexpected body from {endpoint}"),
        });
    }
    Ok(address.to_string())
}
