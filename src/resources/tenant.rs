// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed wrappers for tenant management.

use crate::api::tenant::{
    CreateTenantResponse as ProtoCreateTenantResponse, Tenant as ProtoTenant,
};

/// Request to register a new tenant.
///
/// # Example
///
/// ```
/// use custos_api_rs::resources::CreateTenantRequest;
///
/// let request = CreateTenantRequest::builder("gateway-portal")
///     .requester_email("admin@example.org")
///     .admin_username("gateway-admin")
///     .redirect_uri("https://portal.example.org/callback")
///     .scope("openid profile email")
///     .build();
/// ```
#[derive(Debug, Clone, Default)]
pub struct CreateTenantRequest {
    /// Human-readable tenant name.
    pub client_name: String,
    /// Email of the person requesting the tenant.
    pub requester_email: String,
    /// Username of the tenant administrator.
    pub admin_username: String,
    /// Email of the tenant administrator.
    pub admin_email: String,
    /// OAuth redirect URIs registered for the tenant.
    pub redirect_uris: Vec<String>,
    /// Scopes the tenant may request.
    pub scope: String,
    /// Tenant domain.
    pub domain: String,
}

impl CreateTenantRequest {
    /// Create a builder for a tenant with the given name.
    #[must_use]
    pub fn builder(client_name: impl Into<String>) -> CreateTenantRequestBuilder {
        CreateTenantRequestBuilder {
            request: CreateTenantRequest {
                client_name: client_name.into(),
                ..Default::default()
            },
        }
    }
}

impl From<CreateTenantRequest> for ProtoTenant {
    fn from(req: CreateTenantRequest) -> Self {
        ProtoTenant {
            // Assigned by the server on creation
            client_id: String::new(),
            client_name: req.client_name,
            requester_email: req.requester_email,
            admin_username: req.admin_username,
            admin_email: req.admin_email,
            redirect_uris: req.redirect_uris,
            scope: req.scope,
            domain: req.domain,
        }
    }
}

/// Builder for [`CreateTenantRequest`].
#[derive(Debug, Clone)]
pub struct CreateTenantRequestBuilder {
    request: CreateTenantRequest,
}

impl CreateTenantRequestBuilder {
    /// Set the requester email.
    #[must_use]
    pub fn requester_email(mut self, email: impl Into<String>) -> Self {
        self.request.requester_email = email.into();
        self
    }

    /// Set the administrator username.
    #[must_use]
    pub fn admin_username(mut self, username: impl Into<String>) -> Self {
        self.request.admin_username = username.into();
        self
    }

    /// Set the administrator email.
    #[must_use]
    pub fn admin_email(mut self, email: impl Into<String>) -> Self {
        self.request.admin_email = email.into();
        self
    }

    /// Register an OAuth redirect URI.
    #[must_use]
    pub fn redirect_uri(mut self, uri: impl Into<String>) -> Self {
        self.request.redirect_uris.push(uri.into());
        self
    }

    /// Set the requested scopes.
    #[must_use]
    pub fn scope(mut self, scope: impl Into<String>) -> Self {
        self.request.scope = scope.into();
        self
    }

    /// Set the tenant domain.
    #[must_use]
    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.request.domain = domain.into();
        self
    }

    /// Build the request.
    #[must_use]
    pub fn build(self) -> CreateTenantRequest {
        self.request
    }
}

/// Credential issued for a newly registered tenant.
#[derive(Debug, Clone)]
pub struct CreateTenantResponse {
    /// The generated client id.
    pub client_id: String,
    /// The generated client secret.
    pub client_secret: String,
    /// Issue timestamp (unix seconds).
    pub client_id_issued_at: i64,
    /// Whether the tenant is already activated.
    pub is_activated: bool,
}

impl From<ProtoCreateTenantResponse> for CreateTenantResponse {
    fn from(proto: ProtoCreateTenantResponse) -> Self {
        Self {
            client_id: proto.client_id,
            client_secret: proto.client_secret,
            client_id_issued_at: proto.client_id_issued_at,
            is_activated: proto.is_activated,
        }
    }
}

/// A tenant's registered profile.
#[derive(Debug, Clone)]
pub struct TenantProfile {
    /// The tenant's client id.
    pub client_id: String,
    /// Human-readable tenant name.
    pub client_name: String,
    /// Email of the person who requested the tenant.
    pub requester_email: String,
    /// Username of the tenant administrator.
    pub admin_username: String,
    /// Email of the tenant administrator.
    pub admin_email: String,
    /// OAuth redirect URIs registered for the tenant.
    pub redirect_uris: Vec<String>,
    /// Scopes the tenant may request.
    pub scope: String,
    /// Tenant domain.
    pub domain: String,
}

impl From<ProtoTenant> for TenantProfile {
    fn from(proto: ProtoTenant) -> Self {
        Self {
            client_id: proto.client_id,
            client_name: proto.client_name,
            requester_email: proto.requester_email,
            admin_username: proto.admin_username,
            admin_email: proto.admin_email,
            redirect_uris: proto.redirect_uris,
            scope: proto.scope,
            domain: proto.domain,
        }
    }
}
