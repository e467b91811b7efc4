//! OpenLibrary covers

use async_trait::async_trait;
use leafnode_core::matching::title_matches;
use leafnode_core::{Provider, ProviderError};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::error::ClientError;
use crate::http::get_json;
use crate::types::{BookQuery, CoverCandidate};

const PROVIDER: &str = "open_library";

#[derive(Debug, Clone)]
pub struct OpenLibraryConfig {
    pub base_url: String,
    pub covers_url: String,
}

impl Default for OpenLibraryConfig {
    fn default() -> Self {
        Self {
            base_url: "https://openlibrary.org".to_string(),
            covers_url: "https://covers.openlibrary.org".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    docs: Vec<SearchDoc>,
}

#[derive(Debug, Deserialize)]
struct SearchDoc {
    #[serde(default)]
    title: String,
    cover_i: Option<i64>,
}

pub struct OpenLibraryClient {
    config: OpenLibraryConfig,
    client: Client,
}

impl OpenLibraryClient {
    pub fn new(config: OpenLibraryConfig, client: Client) -> Self {
        Self { config, client }
    }

    /// Cover by ISBN; `default=false` makes a missing cover a 404
    fn isbn_cover_url(&self, isbn: &str) -> String {
        format!("{}/b/isbn/{}-L.jpg?default=false", self.config.covers_url, isbn)
    }

    async fn cover_exists(&self, url: &str) -> Result<bool, ClientError> {
        let response = self.client.head(url).send().await?;
        Ok(response.status().is_success())
    }

    fn id_cover_url(&self, cover_id: i64) -> String {
        format!("{}/b/id/{}-L.jpg", self.config.covers_url, cover_id)
    }

    fn pick(&self, docs: &[SearchDoc], wanted_title: &str) -> Option<CoverCandidate> {
        docs.iter()
            .filter(|doc| title_matches(wanted_title, &doc.title))
            .find_map(|doc| doc.cover_i)
            .map(|cover_id| CoverCandidate {
                url: self.id_cover_url(cover_id),
                google_books_id: None,
            })
    }
}

#[async_trait]
impl Provider<BookQuery, CoverCandidate> for OpenLibraryClient {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn lookup(&self, query: &BookQuery) -> Result<Option<CoverCandidate>, ProviderError> {
        if let Some(isbn) = query.clean_isbn() {
            let url = self.isbn_cover_url(&isbn);
            if self.cover_exists(&url).await? {
                return Ok(Some(CoverCandidate {
                    url,
                    google_books_id: None,
                }));
            }
            debug!("No OpenLibrary cover for ISBN {}, searching by title", isbn);
        }

        if query.title.trim().is_empty() {
            return Ok(None);
        }

        let mut params = vec![("title", query.title.trim()), ("limit", "10")];
        if let Some(author) = query.author.as_deref() {
            params.push(("author", author.trim()));
        }

        debug!("Searching OpenLibrary: {}", query.title);
        let request = self
            .client
            .get(format!("{}/search.json", self.config.base_url))
            .query(&params);
        let response: SearchResponse = get_json(PROVIDER, request).await?;

        Ok(self.pick(&response.docs, &query.title))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::parse_json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    const ISBN_COVER: &str = "HEAD /b/isbn/9780061054884-L.jpg";
    const SEARCH: &str = "GET /search.json";
    const SEARCH_BODY: &str = r#"{"docs": [{"title": "The Dispossessed", "cover_i": 12345}]}"#;

    fn create_test_client() -> OpenLibraryClient {
        OpenLibraryClient::new(OpenLibraryConfig::default(), Client::new())
    }

    fn dispossessed() -> BookQuery {
        BookQuery {
            title: "The Dispossessed".to_string(),
            author: Some("Ursula K. Le Guin".to_string()),
            isbn: Some("978-0061054884".to_string()),
        }
    }

    /// Local server answering by request-line prefix, one request per connection
    async fn spawn_server(routes: Vec<(&'static str, u16, &'static str)>) -> OpenLibraryClient {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let mut buf = vec![0u8; 8192];
                let n = socket.read(&mut buf).await.unwrap_or(0);
                let request = String::from_utf8_lossy(&buf[..n]).to_string();
                let (status, body) = routes
                    .iter()
                    .find(|(prefix, _, _)| request.starts_with(prefix))
                    .map(|(_, status, body)| (*status, *body))
                    .unwrap_or((404, ""));
                let response = format!(
                    "HTTP/1.1 {} Test\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
            }
        });

        let config = OpenLibraryConfig {
            base_url: base.clone(),
            covers_url: base,
        };
        OpenLibraryClient::new(config, Client::new())
    }

    #[tokio::test]
    async fn test_isbn_cover_is_used_when_present() {
        let client = spawn_server(vec![(ISBN_COVER, 200, ""), (SEARCH, 200, SEARCH_BODY)]).await;

        let candidate = client.lookup(&dispossessed()).await.unwrap().unwrap();
        assert!(candidate.url.ends_with("/b/isbn/9780061054884-L.jpg?default=false"));
    }

    #[tokio::test]
    async fn test_missing_isbn_cover_falls_back_to_title_search() {
        let client = spawn_server(vec![(ISBN_COVER, 404, ""), (SEARCH, 200, SEARCH_BODY)]).await;

        let candidate = client.lookup(&dispossessed()).await.unwrap().unwrap();
        assert!(candidate.url.ends_with("/b/id/12345-L.jpg"));
    }

    #[test]
    fn test_isbn_cover_url() {
        let client = create_test_client();
        assert_eq!(
            client.isbn_cover_url("9780061054884"),
            "https://covers.openlibrary.org/b/isbn/9780061054884-L.jpg?default=false"
        );
    }

    #[test]
    fn test_pick_first_matching_doc_with_cover() {
        let body = r#"{
            "numFound": 3,
            "docs": [
                { "title": "Solaris", "key": "/works/OL1" },
                { "title": "Solaris", "cover_i": 8231990 },
                { "title": "Solaris Rising", "cover_i": 1 }
            ]
        }"#;
        let response: SearchResponse = parse_json(PROVIDER, body).unwrap();
        let client = create_test_client();

        let candidate = client.pick(&response.docs, "Solaris").unwrap();
        assert_eq!(candidate.url, "https://covers.openlibrary.org/b/id/8231990-L.jpg");
        assert_eq!(client.pick(&response.docs, "Roadside Picnic"), None);
    }
}
