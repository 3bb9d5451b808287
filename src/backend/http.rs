//! `reqwest` implementation of [`Backend`] for the indexing service.

#![allow(missing_docs)]

use std::time::Duration;

use reqwest::{Client, Method, StatusCode};
use tracing::debug;

use super::wire::{self, ProcessResponse, RawDistribution, RawMetadata};
use super::{
    ANALYTICS_BY_AGE_PATH, ANALYTICS_BY_TYPE_PATH, Backend, METADATA_PATH, PROCESS_PATH,
    RESET_INDEX_PATH, TransportError, TransportErrorKind, TransportResult,
};
use crate::core::config::BackendConfig;
use crate::core::errors::Result;
use crate::dashboard::model::FidelityMode;

/// HTTP client bound to one service base URL.
///
/// Cloning is cheap: the underlying connection pool is shared.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    /// Build a client from validated backend configuration.
    ///
    /// # Errors
    /// Returns `FinsError::HttpClient` when the TLS/HTTP stack cannot be initialized.
    pub fn from_config(config: &BackendConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
            .build()?;
        Ok(Self::with_client(client, &config.base_url))
    }

    /// Wrap an existing client.
    #[must_use]
    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
        }
    }

    /// Normalized base URL (no trailing slash).
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Send one request and return the body of a success response.
    async fn call(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
    ) -> TransportResult<String> {
        let url = self.endpoint(path);
        debug!(%method, %url, "backend request");
        let response = self
            .client
            .request(method, &url)
            .query(query)
            .send()
            .await
            .map_err(classify)?;

        let status = response.status();
        let body = response.text().await.map_err(classify)?;
        if status.is_success() {
            Ok(body)
        } else {
            Err(TransportError::from_status(status.as_u16(), &body))
        }
    }
}

impl Backend for HttpBackend {
    async fn process_folder(&self, folder_path: &str) -> TransportResult<ProcessResponse> {
        let body = self
            .call(Method::POST, PROCESS_PATH, &[("folderPath", folder_path)])
            .await?;
        Ok(wire::decode_process_response(&body))
    }

    async fn fetch_metadata(
        &self,
        folder_path: &str,
        mode: FidelityMode,
    ) -> TransportResult<RawMetadata> {
        let body = self
            .call(
                Method::GET,
                METADATA_PATH,
                &[("folderPath", folder_path), ("type", mode.as_str())],
            )
            .await?;
        let decoded = match mode {
            FidelityMode::Basic => wire::decode_list(&body).map(RawMetadata::Basic),
            FidelityMode::Advanced => wire::decode_list(&body).map(RawMetadata::Advanced),
        };
        decoded.map_err(decode_error)
    }

    async fn reset_index(&self, folder_path: &str) -> TransportResult<()> {
        self.call(Method::DELETE, RESET_INDEX_PATH, &[("folderPath", folder_path)])
            .await
            .map(drop)
    }

    async fn analytics_by_age(&self) -> TransportResult<RawDistribution> {
        let body = self.call(Method::GET, ANALYTICS_BY_AGE_PATH, &[]).await?;
        wire::decode_distribution(&body).map_err(decode_error)
    }

    async fn analytics_by_type(&self) -> TransportResult<RawDistribution> {
        let body = self.call(Method::GET, ANALYTICS_BY_TYPE_PATH, &[]).await?;
        wire::decode_distribution(&body).map_err(decode_error)
    }
}

fn classify(error: reqwest::Error) -> TransportError {
    let kind = if error.is_timeout() {
        TransportErrorKind::Timeout
    } else if error.is_connect() {
        TransportErrorKind::Connect
    } else if error.is_decode() || error.is_body() {
        TransportErrorKind::Decode
    } else {
        TransportErrorKind::Other
    };
    let mut transport = TransportError::new(kind, error.to_string());
    transport.status = error.status().map(|s: StatusCode| s.as_u16());
    transport
}

fn decode_error(error: serde_json::Error) -> TransportError {
    TransportError::new(TransportErrorKind::Decode, error.to_string())
}
