//! HEAD-based image probe

use async_trait::async_trait;
use leafnode_core::{ImageHead, ImageProbe, ProviderError};
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE, HeaderMap};
use reqwest::{Client, StatusCode};
use tracing::debug;

use crate::error::ClientError;

pub struct HttpImageProbe {
    client: Client,
}

impl HttpImageProbe {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

fn head_from(status: StatusCode, headers: &HeaderMap) -> ImageHead {
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|h| h.to_str().ok())
        .map(|s| s.to_string());

    let content_length = headers
        .get(CONTENT_LENGTH)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.trim().parse().ok());

    ImageHead {
        status: status.as_u16(),
        content_type,
        content_length,
    }
}

#[async_trait]
impl ImageProbe for HttpImageProbe {
    async fn head(&self, url: &str) -> Result<ImageHead, ProviderError> {
        let response = self
            .client
            .head(url)
            .send()
            .await
            .map_err(ClientError::from)?;

        // Some image hosts refuse HEAD; fall back to GET and read headers only
        if response.status() == StatusCode::METHOD_NOT_ALLOWED {
            debug!("HEAD not allowed for {}, retrying with GET", url);
            let response = self
                .client
                .get(url)
                .send()
                .await
                .map_err(ClientError::from)?;
            return Ok(head_from(response.status(), response.headers()));
        }

        Ok(head_from(response.status(), response.headers()))
    }
}
