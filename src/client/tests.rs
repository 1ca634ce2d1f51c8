// SPDX-License-Identifier: MIT OR Apache-2.0

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::*;
use crate::cert::CertificateSource;
use crate::error::CustosError;
use crate::resources::{GroupDefinition, GroupMembership, TokenRequest};
use crate::testkit::{MockCustosServer, MOCK_ACCESS_TOKEN, MOCK_REFRESH_TOKEN};

/// PEM material for a test deployment: a private CA and a server identity
/// for `localhost` signed by it.
struct TestPki {
    ca_pem: String,
    server_cert_pem: String,
    server_key_pem: String,
}

fn test_pki() -> TestPki {
    let ca_key = rcgen::KeyPair::generate().unwrap();
    let mut ca_params = rcgen::CertificateParams::new(vec![]).unwrap();
    ca_params.is_ca = rcgen::IsCa::Ca(rcgen::BasicConstraints::Unconstrained);
    ca_params.not_before = rcgen::date_time_ymd(2020, 1, 1);
    ca_params.not_after = rcgen::date_time_ymd(2099, 1, 1);
    let ca_cert = ca_params.self_signed(&ca_key).unwrap();

    let server_key = rcgen::KeyPair::generate().unwrap();
    let mut server_params =
        rcgen::CertificateParams::new(vec!["localhost".to_string()]).unwrap();
    server_params.not_before = rcgen::date_time_ymd(2020, 1, 1);
    server_params.not_after = rcgen::date_time_ymd(2099, 1, 1);
    let server_cert = server_params
        .signed_by(&server_key, &ca_cert, &ca_key)
        .unwrap();

    TestPki {
        ca_pem: ca_cert.pem(),
        server_cert_pem: server_cert.pem(),
        server_key_pem: server_key.serialize_pem(),
    }
}

struct CountingSource {
    pem: String,
    calls: AtomicUsize,
}

impl CountingSource {
    fn new(pem: impl Into<String>) -> Self {
        Self {
            pem: pem.into(),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl CertificateSource for CountingSource {
    async fn fetch(&self) -> crate::error::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.pem.clone())
    }
}

struct FailingSource;

#[async_trait]
impl CertificateSource for FailingSource {
    async fn fetch(&self) -> crate::error::Result<String> {
        Err(CustosError::CertificateFetch("secret endpoint down".to_string()))
    }
}

fn settings(port: u16, cert_path: &std::path::Path) -> ServerSettings {
    ServerSettings::new("localhost", port, "agent-id", "agent-secret", cert_path).unwrap()
}

#[tokio::test]
async fn test_connect_fetch_failure_surfaces() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("server.pem");

    let result = CustosClient::connect_with_source(settings(1, &path), &FailingSource).await;
    assert!(matches!(result, Err(CustosError::CertificateFetch(_))));
}

#[tokio::test]
async fn test_connect_refused_surfaces_bootstrap_error() {
    let pki = test_pki();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("server.pem");
    std::fs::write(&path, &pki.ca_pem).unwrap();

    // A valid trust anchor is on disk, but nothing listens on port 1
    let result = CustosClient::connect_with_source(settings(1, &path), &FailingSource).await;
    assert!(matches!(result, Err(CustosError::Bootstrap(_))));
}

#[tokio::test]
async fn test_connect_fetches_anchor_and_opens_tls_channel() {
    let pki = test_pki();
    let server = MockCustosServer::spawn_tls(&pki.server_cert_pem, &pki.server_key_pem).await;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("server.pem");
    let source = CountingSource::new(pki.ca_pem.clone());

    let client = CustosClient::connect_with_source(settings(server.port(), &path), &source)
        .await
        .unwrap();

    assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    assert_eq!(std::fs::read_to_string(&path).unwrap(), pki.ca_pem);

    let token = client
        .get_token(TokenRequest::password("jdoe", "hunter2"))
        .await
        .unwrap();
    assert_eq!(token.access_token, MOCK_ACCESS_TOKEN);
    assert_eq!(token.refresh_token, MOCK_REFRESH_TOKEN);
    assert_eq!(client.metrics().succeeded(), 1);
}

#[tokio::test]
async fn test_connect_with_cached_anchor_skips_fetch() {
    let pki = test_pki();
    let server = MockCustosServer::spawn_tls(&pki.server_cert_pem, &pki.server_key_pem).await;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("server.pem");
    std::fs::write(&path, &pki.ca_pem).unwrap();

    let source = CountingSource::new(pki.ca_pem.clone());
    let client = CustosClient::connect_with_source(settings(server.port(), &path), &source)
        .await
        .unwrap();

    assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    assert!(client
        .is_authenticated(&BearerToken::new(MOCK_ACCESS_TOKEN))
        .await
        .unwrap());
}

#[tokio::test]
async fn test_identity_session_lifecycle() {
    let pki = test_pki();
    let server = MockCustosServer::spawn_tls(&pki.server_cert_pem, &pki.server_key_pem).await;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("server.pem");
    let source = CountingSource::new(pki.ca_pem.clone());
    let client = CustosClient::connect_with_source(settings(server.port(), &path), &source)
        .await
        .unwrap();

    let token = client
        .get_token(TokenRequest::password("jdoe", "hunter2"))
        .await
        .unwrap();
    assert!(client.is_authenticated(&token.bearer()).await.unwrap());
    assert!(!client
        .is_authenticated(&BearerToken::new("stale-token"))
        .await
        .unwrap());

    let refreshed = client
        .get_token(TokenRequest::refresh(&token.refresh_token))
        .await
        .unwrap();
    assert_eq!(refreshed.access_token, MOCK_ACCESS_TOKEN);

    assert!(client.end_user_session(&token.refresh_token).await.unwrap());
}

#[tokio::test]
async fn test_get_token_rejects_incomplete_password_grant() {
    let pki = test_pki();
    let server = MockCustosServer::spawn_tls(&pki.server_cert_pem, &pki.server_key_pem).await;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("server.pem");
    let source = CountingSource::new(pki.ca_pem.clone());
    let client = CustosClient::connect_with_source(settings(server.port(), &path), &source)
        .await
        .unwrap();

    let result = client.get_token(TokenRequest::password("jdoe", "")).await;
    assert!(matches!(result, Err(CustosError::Api(_))));
    assert_eq!(client.metrics().failed(), 1);
}

#[tokio::test]
async fn test_tenant_operations() {
    let pki = test_pki();
    let server = MockCustosServer::spawn_tls(&pki.server_cert_pem, &pki.server_key_pem).await;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("server.pem");
    let source = CountingSource::new(pki.ca_pem.clone());
    let client = CustosClient::connect_with_source(settings(server.port(), &path), &source)
        .await
        .unwrap();

    let created = client
        .create_tenant(
            CreateTenantRequest::builder("gateway-portal")
                .requester_email("admin@example.org")
                .build(),
        )
        .await
        .unwrap();
    assert_eq!(created.client_id, "custos-gateway-portal");
    assert!(!created.client_secret.is_empty());

    let profile = client.get_tenant(&created.client_id).await.unwrap();
    assert_eq!(profile.client_id, created.client_id);
}

#[tokio::test]
async fn test_group_operations() {
    let pki = test_pki();
    let server = MockCustosServer::spawn_tls(&pki.server_cert_pem, &pki.server_key_pem).await;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("server.pem");
    let source = CountingSource::new(pki.ca_pem.clone());
    let client = CustosClient::connect_with_source(settings(server.port(), &path), &source)
        .await
        .unwrap();

    let user = BearerToken::new(MOCK_ACCESS_TOKEN);

    let group = client
        .create_group(GroupDefinition::new("analysts").with_owner("user-1"), &user)
        .await
        .unwrap();
    assert_eq!(group.id, "analysts-id");

    let fetched = client.get_group(&group.id, &user).await.unwrap();
    assert_eq!(fetched.id, group.id);

    assert!(client
        .add_user_to_group(GroupMembership::new(&group.id, "jdoe"), &user)
        .await
        .unwrap());
    assert!(client
        .remove_user_from_group(GroupMembership::new(&group.id, "jdoe"), &user)
        .await
        .unwrap());
}
