// SPDX-License-Identifier: MIT OR Apache-2.0

//! The high-level Custos client.
//!
//! [`CustosClient::connect`] runs the full secure-channel bootstrap (agent
//! credential, cached certificate, TLS channel) and then exposes typed
//! wrappers over the identity, tenant and group services. Raw generated
//! stubs remain reachable through [`CustosClient::identity`] and friends for
//! calls the wrappers do not cover.

mod bootstrap;

pub use bootstrap::ChannelBootstrapper;

use tonic::transport::Channel;
use tracing::info;

use crate::api::group::group_service_client::GroupServiceClient;
use crate::api::group::{Group as ProtoGroup, GroupRequest, MembershipRequest};
use crate::api::identity::identity_service_client::IdentityServiceClient;
use crate::api::identity::{AuthToken, EndSessionRequest, GetTokenRequest};
use crate::api::tenant::tenant_service_client::TenantServiceClient;
use crate::api::tenant::{GetTenantRequest, Tenant as ProtoTenant};
use crate::cert::{CertificateSource, HttpCertificateFetcher};
use crate::config::ServerSettings;
use crate::credentials::{encode_credential, BearerToken};
use crate::error::Result;
use crate::resources::{
    CreateTenantRequest, CreateTenantResponse, GroupDefinition, GroupMembership, GroupRecord,
    TenantProfile, Token, TokenRequest,
};
use crate::runtime::RequestLogger;

/// A connected Custos client.
///
/// Cheap to clone is not a goal here; hold one client per deployment and
/// share it behind an `Arc` if needed. The underlying [`Channel`] multiplexes
/// concurrent calls.
///
/// # Example
///
/// ```no_run
/// use custos_api_rs::{CustosClient, ServerSettings};
/// use custos_api_rs::resources::TokenRequest;
///
/// # async fn run() -> Result<(), custos_api_rs::CustosError> {
/// let settings = ServerSettings::load_default()?;
/// let client = CustosClient::connect(settings).await?;
/// let token = client.get_token(TokenRequest::password("jdoe", "hunter2")).await?;
/// # Ok(())
/// # }
/// ```
pub struct CustosClient {
    settings: ServerSettings,
    token: BearerToken,
    channel: Channel,
    logger: RequestLogger,
}

impl CustosClient {
    /// Bootstrap a secure channel and connect, fetching the server
    /// certificate over HTTPS when the cached copy is missing or expired.
    pub async fn connect(settings: ServerSettings) -> Result<Self> {
        let fetcher = HttpCertificateFetcher::for_settings(&settings)?;
        Self::connect_with_source(settings, &fetcher).await
    }

    /// Connect using a caller-supplied certificate source.
    ///
    /// This is the seam for tests and for deployments that distribute the
    /// server certificate out of band.
    pub async fn connect_with_source<S: CertificateSource + ?Sized>(
        settings: ServerSettings,
        source: &S,
    ) -> Result<Self> {
        // Several rustls backends may be linked; pick ring once, globally.
        // A second install attempt is fine and ignored.
        let _ = rustls::crypto::ring::default_provider().install_default();

        let token = encode_credential(&settings.client_id, &settings.client_secret)?;

        let bootstrapper = ChannelBootstrapper::new(settings.clone());
        let channel = bootstrapper.ensure_channel(source).await?;

        info!(
            target: "custos_api::client",
            endpoint = %settings.endpoint(),
            "connected to Custos"
        );

        Ok(Self {
            settings,
            token,
            channel,
            logger: RequestLogger::new(),
        })
    }

    /// The settings this client was built from.
    #[must_use]
    pub fn settings(&self) -> &ServerSettings {
        &self.settings
    }

    /// The encoded agent credential used on every call.
    #[must_use]
    pub fn agent_token(&self) -> &BearerToken {
        &self.token
    }

    /// Raw generated stub for the identity service.
    #[must_use]
    pub fn identity(&self) -> IdentityServiceClient<Channel> {
        IdentityServiceClient::new(self.channel.clone())
    }

    /// Raw generated stub for the tenant service.
    #[must_use]
    pub fn tenant(&self) -> TenantServiceClient<Channel> {
        TenantServiceClient::new(self.channel.clone())
    }

    /// Raw generated stub for the group service.
    #[must_use]
    pub fn group(&self) -> GroupServiceClient<Channel> {
        GroupServiceClient::new(self.channel.clone())
    }

    /// Obtain a token from the identity service.
    ///
    /// The agent credential from the settings is attached to the request;
    /// callers only supply the grant-specific fields.
    pub async fn get_token(&self, request: TokenRequest) -> Result<Token> {
        let span = self.logger.start("GetToken");

        let mut proto: GetTokenRequest = request.into();
        proto.client_id = self.settings.client_id.clone();
        proto.client_secret = self.settings.client_secret.clone();

        match self.identity().get_token(self.token.authorize(proto)?).await {
            Ok(response) => {
                self.logger.finish_success(span);
                Ok(response.into_inner().into())
            }
            Err(status) => {
                self.logger.finish_error(span, &status.to_string());
                Err(status.into())
            }
        }
    }

    /// Check whether a user access token is still valid.
    pub async fn is_authenticated(&self, access_token: &BearerToken) -> Result<bool> {
        let span = self.logger.start("IsAuthenticated");

        let proto = AuthToken {
            access_token: access_token.as_str().to_string(),
        };

        match self
            .identity()
            .is_authenticated(self.token.authorize(proto)?)
            .await
        {
            Ok(response) => {
                self.logger.finish_success(span);
                Ok(response.into_inner().authenticated)
            }
            Err(status) => {
                self.logger.finish_error(span, &status.to_string());
                Err(status.into())
            }
        }
    }

    /// Terminate a user session identified by its refresh token.
    pub async fn end_user_session(&self, refresh_token: &str) -> Result<bool> {
        let span = self.logger.start("EndUserSession");

        let proto = EndSessionRequest {
            refresh_token: refresh_token.to_string(),
        };

        match self
            .identity()
            .end_user_session(self.token.authorize(proto)?)
            .await
        {
            Ok(response) => {
                self.logger.finish_success(span);
                Ok(response.into_inner().status)
            }
            Err(status) => {
                self.logger.finish_error(span, &status.to_string());
                Err(status.into())
            }
        }
    }

    /// Register a new tenant and return its generated credential.
    pub async fn create_tenant(
        &self,
        request: CreateTenantRequest,
    ) -> Result<CreateTenantResponse> {
        let span = self.logger.start("CreateTenant");

        let proto: ProtoTenant = request.into();

        match self.tenant().create_tenant(self.token.authorize(proto)?).await {
            Ok(response) => {
                self.logger.finish_success(span);
                Ok(response.into_inner().into())
            }
            Err(status) => {
                self.logger.finish_error(span, &status.to_string());
                Err(status.into())
            }
        }
    }

    /// Look up a tenant's profile by client id.
    pub async fn get_tenant(&self, client_id: &str) -> Result<TenantProfile> {
        let span = self.logger.start("GetTenant");

        let proto = GetTenantRequest {
            client_id: client_id.to_string(),
        };

        match self.tenant().get_tenant(self.token.authorize(proto)?).await {
            Ok(response) => {
                self.logger.finish_success(span);
                Ok(response.into_inner().into())
            }
            Err(status) => {
                self.logger.finish_error(span, &status.to_string());
                Err(status.into())
            }
        }
    }

    /// Create a group on behalf of the given user.
    pub async fn create_group(
        &self,
        definition: GroupDefinition,
        user_token: &BearerToken,
    ) -> Result<GroupRecord> {
        let span = self.logger.start("CreateGroup");

        let proto: ProtoGroup = definition.into();

        match self.group().create_group(user_token.authorize(proto)?).await {
            Ok(response) => {
                self.logger.finish_success(span);
                Ok(response.into_inner().into())
            }
            Err(status) => {
                self.logger.finish_error(span, &status.to_string());
                Err(status.into())
            }
        }
    }

    /// Look up a group by id on behalf of the given user.
    pub async fn get_group(&self, group_id: &str, user_token: &BearerToken) -> Result<GroupRecord> {
        let span = self.logger.start("GetGroup");

        let proto = GroupRequest {
            group_id: group_id.to_string(),
        };

        match self.group().get_group(user_token.authorize(proto)?).await {
            Ok(response) => {
                self.logger.finish_success(span);
                Ok(response.into_inner().into())
            }
            Err(status) => {
                self.logger.finish_error(span, &status.to_string());
                Err(status.into())
            }
        }
    }

    /// Add a user to a group.
    pub async fn add_user_to_group(
        &self,
        membership: GroupMembership,
        user_token: &BearerToken,
    ) -> Result<bool> {
        let span = self.logger.start("AddUserToGroup");

        let proto: MembershipRequest = membership.into();

        match self
            .group()
            .add_user_to_group(user_token.authorize(proto)?)
            .await
        {
            Ok(response) => {
                self.logger.finish_success(span);
                Ok(response.into_inner().status)
            }
            Err(status) => {
                self.logger.finish_error(span, &status.to_string());
                Err(status.into())
            }
        }
    }

    /// Remove a user from a group.
    pub async fn remove_user_from_group(
        &self,
        membership: GroupMembership,
        user_token: &BearerToken,
    ) -> Result<bool> {
        let span = self.logger.start("RemoveUserFromGroup");

        let proto: MembershipRequest = membership.into();

        match self
            .group()
            .remove_user_from_group(user_token.authorize(proto)?)
            .await
        {
            Ok(response) => {
                self.logger.finish_success(span);
                Ok(response.into_inner().status)
            }
            Err(status) => {
                self.logger.finish_error(span, &status.to_string());
                Err(status.into())
            }
        }
    }

    /// Per-client call counters.
    #[must_use]
    pub fn metrics(&self) -> &crate::runtime::CallMetrics {
        self.logger.metrics()
    }
}

#[cfg(test)]
mod tests;
