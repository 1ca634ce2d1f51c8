// SPDX-License-Identifier: MIT OR Apache-2.0

//! Agent credential encoding.
//!
//! Custos authenticates the calling tenant/service with a bearer token that
//! is the base64 encoding of `client_id:client_secret`. The token is derived
//! on demand and never persisted.

use std::fmt;

use base64::Engine;
use tonic::metadata::MetadataValue;
use tonic::Request;

use crate::error::{CustosError, Result};

/// Encode a client id/secret pair into a transport-level bearer credential.
///
/// Deterministic: the same inputs always yield the same token.
///
/// # Errors
///
/// Returns a `Validation` error if either input is empty.
#[allow(clippy::result_large_err)]
pub fn encode_credential(client_id: &str, client_secret: &str) -> Result<BearerToken> {
    if client_id.is_empty() {
        return Err(CustosError::Validation("client_id must not be empty".to_string()));
    }
    if client_secret.is_empty() {
        return Err(CustosError::Validation("client_secret must not be empty".to_string()));
    }

    let raw = format!("{}:{}", client_id, client_secret);
    let encoded = base64::engine::general_purpose::STANDARD.encode(raw.as_bytes());
    Ok(BearerToken::new(encoded))
}

/// A bearer credential for the `Authorization` header.
///
/// Holds either an encoded agent credential (see [`encode_credential`]) or a
/// user access token obtained from the identity service. Treated as a secret:
/// the `Debug` representation is redacted and the token must never be logged.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    /// Wrap an existing token string (e.g. a user access token).
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The `Authorization` header value (`Bearer <token>`).
    #[must_use]
    pub fn authorization_value(&self) -> String {
        format!("Bearer {}", self.0)
    }

    /// Build a request with this token attached as `authorization` metadata.
    ///
    /// # Errors
    ///
    /// Returns a `Validation` error if the token contains characters that are
    /// not valid in an ASCII header value.
    #[allow(clippy::result_large_err)]
    pub fn authorize<T>(&self, message: T) -> Result<Request<T>> {
        let value: MetadataValue<_> = self
            .authorization_value()
            .parse()
            .map_err(|_| CustosError::Validation("token is not a valid header value".to_string()))?;

        let mut request = Request::new(message);
        request.metadata_mut().insert("authorization", value);
        Ok(request)
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerToken([REDACTED])")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoder_deterministic() {
        let first = encode_credential("a", "b").unwrap();
        let second = encode_credential("a", "b").unwrap();
        assert_eq!(first, second);
        // base64("a:b")
        assert_eq!(first.as_str(), "YTpi");
    }

    #[test]
    fn test_encoder_order_sensitive() {
        let ab = encode_credential("a", "b").unwrap();
        let ba = encode_credential("b", "a").unwrap();
        assert_ne!(ab, ba);
    }

    #[test]
    fn test_encoder_rejects_empty_inputs() {
        assert!(matches!(
            encode_credential("", "sec"),
            Err(CustosError::Validation(_))
        ));
        assert!(matches!(
            encode_credential("id", ""),
            Err(CustosError::Validation(_))
        ));
    }

    #[test]
    fn test_authorization_value() {
        let token = encode_credential("a", "b").unwrap();
        assert_eq!(token.authorization_value(), "Bearer YTpi");
    }

    #[test]
    fn test_authorize_attaches_metadata() {
        let token = BearerToken::new("user-access-token");
        let request = token.authorize(()).unwrap();

        let value = request.metadata().get("authorization").unwrap();
        assert_eq!(value.to_str().unwrap(), "Bearer user-access-token");
    }

    #[test]
    fn test_debug_is_redacted() {
        let token = encode_credential("a", "b").unwrap();
        let debug = format!("{:?}", token);
        assert!(!debug.contains("YTpi"));
        assert!(debug.contains("REDACTED"));
    }
}
