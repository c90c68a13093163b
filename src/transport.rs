//! The HTTP seam between the client and the archive service.

use crate::error::FetchError;
use async_trait::async_trait;
use log::warn;
use reqwest::Client;

/// Open-Meteo historical archive endpoint.
pub const ARCHIVE_URL: &str = "https://archive-api.open-meteo.com/v1/archive";

/// Status line and body of one archive response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub status_text: String,
    /// Empty unless `status` is a success code.
    pub body: String,
}

impl TransportResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Issues GET requests on behalf of [`ArchiveClient`](crate::ArchiveClient).
///
/// Implementations report transport-level failures as [`FetchError::Network`]
/// and hand every received response back, whatever its status.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<TransportResponse, FetchError>;
}

/// [`Transport`] over a `reqwest` client.
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reuses an existing client, e.g. one configured with timeouts or a proxy.
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<TransportResponse, FetchError> {
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| FetchError::network(url, e))?;

        let status = response.status();
        let status_text = status.canonical_reason().unwrap_or_default().to_string();
        if !status.is_success() {
            warn!("HTTP error for {}: {}", url, status);
            return Ok(TransportResponse {
                status: status.as_u16(),
                status_text,
                body: String::new(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::network(url, e))?;
        Ok(TransportResponse {
            status: status.as_u16(),
            status_text,
            body,
        })
    }
}
