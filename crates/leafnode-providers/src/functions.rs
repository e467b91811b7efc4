//! Invokes job endpoints over HTTP for fan-out

use async_trait::async_trait;
use leafnode_core::{INTERNAL_SECRET_HEADER, JobInvoker, ProviderError};
use reqwest::Client;
use serde_json::json;
use tracing::debug;

use crate::error::ClientError;
use crate::http::{HttpConfig, payload_prefix};

/// Client for job calls. Only connecting is bounded: the job endpoint
/// answers after its whole batch, and dropping the call cancels the run.
pub fn build_invoker_client(config: &HttpConfig) -> Result<Client, ClientError> {
    let client = Client::builder()
        .connect_timeout(config.timeout)
        .user_agent(config.user_agent.clone())
        .build()?;
    Ok(client)
}

/// Posts `{ "bookIds" | "filmIds": [...] }` to `<base>/functions/v1/<job>`
pub struct HttpJobInvoker {
    client: Client,
    base_url: String,
    secret: String,
}

impl HttpJobInvoker {
    pub fn new(client: Client, base_url: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            secret: secret.into(),
        }
    }

    fn endpoint(&self, job: &str) -> String {
        format!("{}/functions/v1/{}", self.base_url, job)
    }
}

/// Body key the job endpoint expects for its row ids
fn id_field(job: &str) -> &'static str {
    if job.contains("book") { "bookIds" } else { "filmIds" }
}

#[async_trait]
impl JobInvoker for HttpJobInvoker {
    async fn invoke(&self, job: &str, ids: &[String]) -> Result<(), ProviderError> {
        let url = self.endpoint(job);
        debug!("Invoking {} for {} ids", url, ids.len());

        let response = self
            .client
            .post(&url)
            .header(INTERNAL_SECRET_HEADER, &self.secret)
            .json(&json!({ id_field(job): ids }))
            .send()
            .await
            .map_err(ClientError::from)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Upstream {
                status: status.as_u16(),
                message: payload_prefix(&body).to_string(),
            }
            .into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_and_body_key() {
        let invoker = HttpJobInvoker::new(Client::new(), "http://127.0.0.1:8080/", "s3cret");
        assert_eq!(
            invoker.endpoint("enrich-trailers"),
            "http://127.0.0.1:8080/functions/v1/enrich-trailers"
        );
        assert_eq!(id_field("enrich-book-covers"), "bookIds");
        assert_eq!(id_field("enrich-film-posters"), "filmIds");
        assert_eq!(id_field("enrich-criterion-links"), "filmIds");
    }

    #[tokio::test]
    async fn test_invoker_waits_for_slow_job() {
        use std::time::Duration;
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        use tokio::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 4096];
            let _ = socket.read(&mut buf).await.unwrap();
            // The job takes longer than the provider timeout below
            tokio::time::sleep(Duration::from_millis(300)).await;
            socket
                .write_all(b"HTTP/1.1 200 OK\r\ncontent-length: 0\r\nconnection: close\r\n\r\n")
                .await
                .unwrap();
        });

        let config = HttpConfig {
            timeout: Duration::from_millis(100),
            ..Default::default()
        };
        let client = build_invoker_client(&config).unwrap();
        let invoker = HttpJobInvoker::new(client, format!("http://{}", addr), "s3cret");
        invoker
            .invoke("enrich-film-posters", &["film-1".to_string()])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_an_error() {
        let invoker = HttpJobInvoker::new(Client::new(), "http://127.0.0.1:9", "s3cret");
        let result = invoker.invoke("enrich-trailers", &["film-1".to_string()]).await;
        assert!(matches!(result, Err(ProviderError::Http(_))));
    }
}
