// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed wrappers for identity token operations.

use crate::api::identity::{
    GetTokenRequest as ProtoGetTokenRequest, TokenResponse as ProtoTokenResponse,
};
use crate::credentials::BearerToken;

/// OAuth-style grant carried by a token request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GrantType {
    /// Resource-owner password grant.
    #[default]
    Password,
    /// Refresh an existing session.
    RefreshToken,
    /// Service-account (agent) token.
    ClientCredentials,
}

impl GrantType {
    /// Wire representation of the grant.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            GrantType::Password => "password",
            GrantType::RefreshToken => "refresh_token",
            GrantType::ClientCredentials => "client_credentials",
        }
    }
}

/// Request for an access token.
///
/// The agent credential (client id/secret) is attached by the client from its
/// settings; callers only supply the grant-specific fields.
///
/// # Example
///
/// ```
/// use custos_api_rs::resources::TokenRequest;
///
/// let request = TokenRequest::password("jdoe", "hunter2");
/// let refresh = TokenRequest::refresh("eyJhbGciOi...");
/// ```
#[derive(Debug, Clone, Default)]
pub struct TokenRequest {
    /// Username for the password grant.
    pub username: Option<String>,
    /// Password for the password grant.
    pub password: Option<String>,
    /// Refresh token for the refresh grant.
    pub refresh_token: Option<String>,
    /// The grant to use.
    pub grant_type: GrantType,
}

impl TokenRequest {
    /// Password-grant request for a user session.
    #[must_use]
    pub fn password(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            password: Some(password.into()),
            refresh_token: None,
            grant_type: GrantType::Password,
        }
    }

    /// Refresh-grant request for an existing session.
    #[must_use]
    pub fn refresh(refresh_token: impl Into<String>) -> Self {
        Self {
            username: None,
            password: None,
            refresh_token: Some(refresh_token.into()),
            grant_type: GrantType::RefreshToken,
        }
    }

    /// Client-credentials request for a service-account token.
    #[must_use]
    pub fn client_credentials() -> Self {
        Self {
            username: None,
            password: None,
            refresh_token: None,
            grant_type: GrantType::ClientCredentials,
        }
    }
}

impl From<TokenRequest> for ProtoGetTokenRequest {
    fn from(req: TokenRequest) -> Self {
        ProtoGetTokenRequest {
            // Agent credential is filled in by the client
            client_id: String::new(),
            client_secret: String::new(),
            username: req.username.unwrap_or_default(),
            password: req.password.unwrap_or_default(),
            refresh_token: req.refresh_token.unwrap_or_default(),
            grant_type: req.grant_type.as_str().to_string(),
        }
    }
}

/// An issued token set.
#[derive(Debug, Clone)]
pub struct Token {
    /// The access token for subsequent calls.
    pub access_token: String,
    /// Token used to refresh the session.
    pub refresh_token: String,
    /// OpenID Connect id token, if issued.
    pub id_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
    /// Token type as reported by the server (normally `Bearer`).
    pub token_type: String,
    /// Granted scopes.
    pub scope: String,
}

impl Token {
    /// The access token wrapped for use as an `Authorization` header.
    #[must_use]
    pub fn bearer(&self) -> BearerToken {
        BearerToken::new(self.access_token.clone())
    }
}

impl From<ProtoTokenResponse> for Token {
    fn from(proto: ProtoTokenResponse) -> Self {
        Self {
            access_token: proto.access_token,
            refresh_token: proto.refresh_token,
            id_token: proto.id_token,
            expires_in: proto.expires_in,
            token_type: proto.token_type,
            scope: proto.scope,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_grant() {
        let request = TokenRequest::password("jdoe", "hunter2");
        assert_eq!(request.username.as_deref(), Some("jdoe"));
        assert_eq!(request.password.as_deref(), Some("hunter2"));
        assert_eq!(request.grant_type, GrantType::Password);
    }

    #[test]
    fn test_refresh_grant() {
        let request = TokenRequest::refresh("tok");
        assert_eq!(request.refresh_token.as_deref(), Some("tok"));
        assert_eq!(request.grant_type, GrantType::RefreshToken);
        assert!(request.username.is_none());
    }

    #[test]
    fn test_grant_wire_names() {
        assert_eq!(GrantType::Password.as_str(), "password");
        assert_eq!(GrantType::RefreshToken.as_str(), "refresh_token");
        assert_eq!(GrantType::ClientCredentials.as_str(), "client_credentials");
    }

    #[test]
    fn test_proto_conversion_leaves_credential_empty() {
        let proto: ProtoGetTokenRequest = TokenRequest::password("jdoe", "hunter2").into();
        assert!(proto.client_id.is_empty());
        assert!(proto.client_secret.is_empty());
        assert_eq!(proto.username, "jdoe");
        assert_eq!(proto.grant_type, "password");
    }

    #[test]
    fn test_token_bearer() {
        let token = Token {
            access_token: "abc".to_string(),
            refresh_token: String::new(),
            id_token: String::new(),
            expires_in: 1800,
            token_type: "Bearer".to_string(),
            scope: String::new(),
        };
        assert_eq!(token.bearer().authorization_value(), "Bearer abc");
    }
}
