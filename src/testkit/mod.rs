// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-process mock services for exercising the client.
//!
//! [`MockCustosServer`] serves canned identity/tenant/group responses over
//! h2c or TLS; [`MockSecretEndpoint`] plays the resource-secret REST endpoint
//! and records what the fetcher sent.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::transport::{Identity, Server, ServerTlsConfig};
use tonic::{Request, Response, Status};

use crate::api::group::group_service_server::{GroupService, GroupServiceServer};
use crate::api::group::{
    Group, GroupRequest, MembershipRequest, OperationStatus as GroupStatus,
};
use crate::api::identity::identity_service_server::{IdentityService, IdentityServiceServer};
use crate::api::identity::{
    AuthToken, EndSessionRequest, GetTokenRequest, IsAuthenticatedResponse, OperationStatus,
    TokenResponse,
};
use crate::api::tenant::tenant_service_server::{TenantService, TenantServiceServer};
use crate::api::tenant::{CreateTenantResponse, GetTenantRequest, Tenant};

/// Access token issued by the mock identity service.
pub const MOCK_ACCESS_TOKEN: &str = "mock-access-token";
/// Refresh token issued by the mock identity service.
pub const MOCK_REFRESH_TOKEN: &str = "mock-refresh-token";

struct MockIdentityService;

#[tonic::async_trait]
impl IdentityService for MockIdentityService {
    async fn get_token(
        &self,
        request: Request<GetTokenRequest>,
    ) -> std::result::Result<Response<TokenResponse>, Status> {
        let req = request.into_inner();
        if req.client_id.is_empty() || req.client_secret.is_empty() {
            return Err(Status::unauthenticated("missing agent credential"));
        }
        match req.grant_type.as_str() {
            "password" if req.username.is_empty() || req.password.is_empty() => {
                return Err(Status::invalid_argument("missing username or password"));
            }
            "refresh_token" if req.refresh_token.is_empty() => {
                return Err(Status::invalid_argument("missing refresh token"));
            }
            _ => {}
        }

        Ok(Response::new(TokenResponse {
            access_token: MOCK_ACCESS_TOKEN.to_string(),
            refresh_token: MOCK_REFRESH_TOKEN.to_string(),
            id_token: String::new(),
            expires_in: 1800,
            token_type: "Bearer".to_string(),
            scope: "openid".to_string(),
        }))
    }

    async fn is_authenticated(
        &self,
        request: Request<AuthToken>,
    ) -> std::result::Result<Response<IsAuthenticatedResponse>, Status> {
        let authenticated = request.into_inner().access_token == MOCK_ACCESS_TOKEN;
        Ok(Response::new(IsAuthenticatedResponse { authenticated }))
    }

    async fn end_user_session(
        &self,
        request: Request<EndSessionRequest>,
    ) -> std::result::Result<Response<OperationStatus>, Status> {
        let status = !request.into_inner().refresh_token.is_empty();
        Ok(Response::new(OperationStatus { status }))
    }
}

struct MockTenantService;

#[tonic::async_trait]
impl TenantService for MockTenantService {
    async fn create_tenant(
        &self,
        request: Request<Tenant>,
    ) -> std::result::Result<Response<CreateTenantResponse>, Status> {
        let tenant = request.into_inner();
        if tenant.client_name.is_empty() {
            return Err(Status::invalid_argument("client_name is required"));
        }

        Ok(Response::new(CreateTenantResponse {
            client_id: format!("custos-{}", tenant.client_name),
            client_secret: "generated-secret".to_string(),
            client_id_issued_at: 1_700_000_000,
            is_activated: false,
        }))
    }

    async fn get_tenant(
        &self,
        request: Request<GetTenantRequest>,
    ) -> std::result::Result<Response<Tenant>, Status> {
        let req = request.into_inner();
        Ok(Response::new(Tenant {
            client_id: req.client_id,
            client_name: "mock-tenant".to_string(),
            requester_email: "requester@example.org".to_string(),
            admin_username: "admin".to_string(),
            admin_email: "admin@example.org".to_string(),
            redirect_uris: vec![],
            scope: "openid".to_string(),
            domain: "example.org".to_string(),
        }))
    }
}

struct MockGroupService;

#[tonic::async_trait]
impl GroupService for MockGroupService {
    async fn create_group(
        &self,
        request: Request<Group>,
    ) -> std::result::Result<Response<Group>, Status> {
        let mut group = request.into_inner();
        if group.name.is_empty() {
            return Err(Status::invalid_argument("name is required"));
        }
        group.id = format!("{}-id", group.name);
        Ok(Response::new(group))
    }

    async fn get_group(
        &self,
        request: Request<GroupRequest>,
    ) -> std::result::Result<Response<Group>, Status> {
        let req = request.into_inner();
        Ok(Response::new(Group {
            id: req.group_id,
            name: "mock-group".to_string(),
            description: String::new(),
            owner_id: "owner-1".to_string(),
        }))
    }

    async fn add_user_to_group(
        &self,
        request: Request<MembershipRequest>,
    ) -> std::result::Result<Response<GroupStatus>, Status> {
        let req = request.into_inner();
        let status = !req.group_id.is_empty() && !req.username.is_empty();
        Ok(Response::new(GroupStatus { status }))
    }

    async fn remove_user_from_group(
        &self,
        request: Request<MembershipRequest>,
    ) -> std::result::Result<Response<GroupStatus>, Status> {
        let req = request.into_inner();
        let status = !req.group_id.is_empty() && !req.username.is_empty();
        Ok(Response::new(GroupStatus { status }))
    }
}

/// A mock Custos deployment bound to an ephemeral local port.
pub struct MockCustosServer {
    addr: SocketAddr,
    handle: tokio::task::JoinHandle<()>,
}

impl MockCustosServer {
    /// Spawn the mock services over plain h2c.
    pub async fn spawn() -> Self {
        Self::start(None).await
    }

    /// Spawn the mock services behind TLS with the given PEM identity.
    pub async fn spawn_tls(cert_pem: &str, key_pem: &str) -> Self {
        Self::start(Some(Identity::from_pem(cert_pem, key_pem))).await
    }

    async fn start(identity: Option<Identity>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock server");
        let addr = listener.local_addr().expect("mock server addr");

        let mut builder = Server::builder();
        if let Some(identity) = identity {
            builder = builder
                .tls_config(ServerTlsConfig::new().identity(identity))
                .expect("mock server TLS config");
        }

        let router = builder
            .add_service(IdentityServiceServer::new(MockIdentityService))
            .add_service(TenantServiceServer::new(MockTenantService))
            .add_service(GroupServiceServer::new(MockGroupService));

        let handle = tokio::spawn(async move {
            let _ = router
                .serve_with_incoming(TcpListenerStream::new(listener))
                .await;
        });

        Self { addr, handle }
    }

    /// The bound address.
    #[must_use]
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// The bound port.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.addr.port()
    }
}

impl Drop for MockCustosServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// A canned-response stand-in for the resource-secret REST endpoint.
///
/// Serves the configured raw HTTP response to every request, counting hits
/// and retaining the most recent request head for assertions.
pub struct MockSecretEndpoint {
    addr: SocketAddr,
    hits: Arc<AtomicUsize>,
    last_request: Arc<Mutex<Option<String>>>,
    handle: tokio::task::JoinHandle<()>,
}

impl MockSecretEndpoint {
    /// Spawn the endpoint, answering every request with `response`.
    pub async fn spawn(response: String) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock endpoint");
        let addr = listener.local_addr().expect("mock endpoint addr");

        let hits = Arc::new(AtomicUsize::new(0));
        let last_request = Arc::new(Mutex::new(None));
        let task_hits = Arc::clone(&hits);
        let task_last = Arc::clone(&last_request);

        let handle = tokio::spawn(async move {
            loop {
                let Ok((mut stream, _)) = listener.accept().await else {
                    break;
                };

                // Read the request head; GET requests carry no body
                let mut buf = Vec::new();
                let mut chunk = [0u8; 1024];
                while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
                    match stream.read(&mut chunk).await {
                        Ok(0) | Err(_) => break,
                        Ok(n) => buf.extend_from_slice(&chunk[..n]),
                    }
                }

                if let Ok(mut last) = task_last.lock() {
                    *last = Some(String::from_utf8_lossy(&buf).into_owned());
                }
                task_hits.fetch_add(1, Ordering::SeqCst);

                let _ = stream.write_all(response.as_bytes()).await;
                let _ = stream.shutdown().await;
            }
        });

        Self {
            addr,
            hits,
            last_request,
            handle,
        }
    }

    /// A 200 response whose JSON body carries the given secret value.
    #[must_use]
    pub fn json_value(value: &str) -> String {
        let body = serde_json::json!({ "value": value }).to_string();
        format!(
            "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
            body.len(),
            body
        )
    }

    /// URL of the endpoint for the given path.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Number of requests served so far.
    #[must_use]
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    /// The head of the most recent request, if any.
    #[must_use]
    pub fn last_request(&self) -> Option<String> {
        self.last_request.lock().ok().and_then(|last| last.clone())
    }
}

impl Drop for MockSecretEndpoint {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
