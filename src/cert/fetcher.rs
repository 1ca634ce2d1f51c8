// SPDX-License-Identifier: MIT OR Apache-2.0

//! Retrieval of the server certificate from the resource-secret endpoint.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::config::ServerSettings;
use crate::credentials::{encode_credential, BearerToken};
use crate::error::{CustosError, Result};

/// Well-known path of the resource-secret endpoint.
pub const SECRET_ENDPOINT_PATH: &str = "/resource-secret-management/v1.0.0/secret";

/// Bounded timeout for the certificate fetch. A timeout is a transient
/// failure the caller may retry; it is never retried internally.
const FETCH_TIMEOUT: Duration = Duration::from_secs(60);

/// Anything that can produce a fresh PEM server certificate.
///
/// The production implementation is [`HttpCertificateFetcher`]; tests stub
/// this to drive the bootstrapper without a live endpoint.
#[async_trait]
pub trait CertificateSource: Send + Sync {
    /// Fetch the PEM text of the server certificate.
    async fn fetch(&self) -> Result<String>;
}

/// JSON body of the resource-secret response.
#[derive(Debug, Deserialize)]
struct SecretResponse {
    value: String,
}

/// Fetches the server certificate over authenticated HTTPS.
///
/// TLS verification is disabled for this request only: before the first
/// certificate is obtained there is no trust anchor to verify against. The
/// relaxation is scoped to this bootstrap fetch and never applies to the
/// gRPC channel built afterwards.
#[derive(Debug, Clone)]
pub struct HttpCertificateFetcher {
    endpoint: String,
    token: BearerToken,
    client: reqwest::Client,
}

impl HttpCertificateFetcher {
    /// Build a fetcher for the deployment described by `settings`.
    #[allow(clippy::result_large_err)]
    pub fn for_settings(settings: &ServerSettings) -> Result<Self> {
        let token = encode_credential(&settings.client_id, &settings.client_secret)?;
        let endpoint = format!(
            "https://{}:{}{}",
            settings.host, settings.port, SECRET_ENDPOINT_PATH
        );
        Self::with_endpoint(endpoint, token)
    }

    /// Build a fetcher against an explicit endpoint URL.
    #[allow(clippy::result_large_err)]
    pub fn with_endpoint(endpoint: impl Into<String>, token: BearerToken) -> Result<Self> {
        let endpoint = endpoint.into();
        url::Url::parse(&endpoint)
            .map_err(|e| CustosError::Config(format!("Invalid secret endpoint URL: {}", e)))?;

        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .danger_accept_invalid_certs(true)
            .build()
            .map_err(|e| {
                CustosError::CertificateFetch(format!("Failed to build HTTP client: {}", e))
            })?;

        Ok(Self {
            endpoint,
            token,
            client,
        })
    }

    /// The endpoint URL this fetcher targets.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl CertificateSource for HttpCertificateFetcher {
    async fn fetch(&self) -> Result<String> {
        debug!(
            target: "custos_api::cert",
            endpoint = %self.endpoint,
            "fetching server certificate"
        );

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("metadata.owner_type", "CUSTOS"),
                ("metadata.resource_type", "SERVER_CERTIFICATE"),
            ])
            .header(
                reqwest::header::AUTHORIZATION,
                self.token.authorization_value(),
            )
            .send()
            .await
            .map_err(|e| CustosError::CertificateFetch(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CustosError::CertificateFetch(format!(
                "Endpoint returned HTTP {}",
                status
            )));
        }

        let body: SecretResponse = response
            .json()
            .await
            .map_err(|e| CustosError::CertificateFetch(format!("Malformed response: {}", e)))?;

        if body.value.trim().is_empty() {
            return Err(CustosError::CertificateFetch(
                "Response carried an empty certificate value".to_string(),
            ));
        }

        Ok(body.value)
    }
}
