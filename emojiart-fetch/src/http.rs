//! Fetching background bytes by URL.

use async_trait::async_trait;
use emojiart_core::{FetchError, NetworkFetch};
use reqwest::Client;
use url::Url;

use crate::data_uri::decode_data_uri;

/// Fetches `http`, `https`, `data` and `file` URLs.
#[derive(Debug, Clone)]
pub struct HttpFetch {
    http: Client,
}

impl HttpFetch {
    /// Create a fetcher with its own HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Network`] if the HTTP client fails to build.
    pub fn new() -> Result<Self, FetchError> {
        let http = Client::builder()
            .user_agent(concat!("emojiart/", env!("CARGO_PKG_VERSION")))
            // Disable proxy detection to avoid macOS system-configuration panic
            .no_proxy()
            .build()
            .map_err(|e| FetchError::Network(e.to_string()))?;
        Ok(Self { http })
    }

    /// Use an existing HTTP client.
    #[must_use]
    pub fn with_client(http: Client) -> Self {
        Self { http }
    }

    async fn fetch_http(&self, url: &Url) -> Result<Vec<u8>, FetchError> {
        tracing::debug!("GET {url}");
        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl NetworkFetch for HttpFetch {
    async fn fetch(&self, url: &Url) -> Result<Vec<u8>, FetchError> {
        match url.scheme() {
            "http" | "https" => self.fetch_http(url).await,
            "data" => decode_data_uri(url.as_str()),
            "file" => {
                let path = url
                    .to_file_path()
                    .map_err(|()| FetchError::Io(format!("not a local path: {url}")))?;
                tokio::fs::read(&path)
                    .await
                    .map_err(|e| FetchError::Io(format!("{}: {e}", path.display())))
            }
            other => Err(FetchError::UnsupportedScheme(other.to_string())),
        }
    }
}
