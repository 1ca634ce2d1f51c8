// SPDX-License-Identifier: MIT OR Apache-2.0

use thiserror::Error;

/// Error taxonomy for the Custos client.
///
/// A corrupt on-disk certificate never surfaces here: the certificate store
/// treats it as "invalid" and the bootstrapper re-fetches instead.
#[allow(clippy::result_large_err)]
#[derive(Debug, Error)]
pub enum CustosError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Certificate fetch failed: {0}")]
    CertificateFetch(String),

    #[error("Channel bootstrap failed: {0}")]
    Bootstrap(String),

    #[error("API request failed: {0}")]
    Api(#[from] tonic::Status),

    #[error("Validation error: {0}")]
    Validation(String),
}

pub type Result<T> = std::result::Result<T, CustosError>;
