//! Shared HTTP plumbing for provider clients

use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::ClientError;

/// Bytes of a payload included in parse-failure logs
const PAYLOAD_PREFIX_BYTES: usize = 200;

/// Settings shared by every outbound client
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(8),
            user_agent: format!("leafnode/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Build the reqwest client shared by all providers
pub fn build_client(config: &HttpConfig) -> Result<Client, ClientError> {
    let client = Client::builder()
        .timeout(config.timeout)
        .user_agent(config.user_agent.clone())
        .build()?;
    Ok(client)
}

/// Send a request and decode a JSON body.
///
/// Non-2xx responses become `Upstream` with the (truncated) body as message;
/// undecodable bodies are logged with a payload prefix.
pub(crate) async fn get_json<T: DeserializeOwned>(
    provider: &str,
    request: RequestBuilder,
) -> Result<T, ClientError> {
    let response = request.send().await?;
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        debug!("{} returned HTTP {}", provider, status.as_u16());
        return Err(ClientError::Upstream {
            status: status.as_u16(),
            message: payload_prefix(&body).to_string(),
        });
    }

    parse_json(provider, &body)
}

pub(crate) fn parse_json<T: DeserializeOwned>(provider: &str, body: &str) -> Result<T, ClientError> {
    serde_json::from_str(body).map_err(|e| {
        warn!(
            "Failed to parse {} response: {} (payload: {:?})",
            provider,
            e,
            payload_prefix(body)
        );
        ClientError::InvalidResponse(format!("{} returned malformed JSON", provider))
    })
}

/// At most the first 200 bytes of `body`, cut on a char boundary
pub(crate) fn payload_prefix(body: &str) -> &str {
    if body.len() <= PAYLOAD_PREFIX_BYTES {
        return body;
    }
    let mut end = PAYLOAD_PREFIX_BYTES;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}
