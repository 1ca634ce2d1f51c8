// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end bootstrap tests: certificate fetch over HTTP, cache on disk,
//! TLS channel and RPC calls against in-process mock services.

use std::path::Path;

use anyhow::Result;

use custos_api_rs::cert::SECRET_ENDPOINT_PATH;
use custos_api_rs::resources::TokenRequest;
use custos_api_rs::testkit::{MockCustosServer, MockSecretEndpoint, MOCK_ACCESS_TOKEN};
use custos_api_rs::{CustosClient, HttpCertificateFetcher, ServerSettings};

/// A private CA plus a `localhost` server identity signed by it.
struct TestPki {
    ca_pem: String,
    server_cert_pem: String,
    server_key_pem: String,
}

fn test_pki() -> Result<TestPki> {
    let ca_key = rcgen::KeyPair::generate()?;
    let mut ca_params = rcgen::CertificateParams::new(vec![])?;
    ca_params.is_ca = rcgen::IsCa::Ca(rcgen::BasicConstraints::Unconstrained);
    ca_params.not_before = rcgen::date_time_ymd(2020, 1, 1);
    ca_params.not_after = rcgen::date_time_ymd(2099, 1, 1);
    let ca_cert = ca_params.self_signed(&ca_key)?;

    let server_key = rcgen::KeyPair::generate()?;
    let mut server_params = rcgen::CertificateParams::new(vec!["localhost".to_string()])?;
    server_params.not_before = rcgen::date_time_ymd(2020, 1, 1);
    server_params.not_after = rcgen::date_time_ymd(2099, 1, 1);
    let server_cert = server_params.signed_by(&server_key, &ca_cert, &ca_key)?;

    Ok(TestPki {
        ca_pem: ca_cert.pem(),
        server_cert_pem: server_cert.pem(),
        server_key_pem: server_key.serialize_pem(),
    })
}

fn expired_pem() -> Result<String> {
    let key = rcgen::KeyPair::generate()?;
    let mut params = rcgen::CertificateParams::new(vec!["localhost".to_string()])?;
    params.not_before = rcgen::date_time_ymd(2019, 1, 1);
    params.not_after = rcgen::date_time_ymd(2020, 1, 1);
    Ok(params.self_signed(&key)?.pem())
}

fn init_logging() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn settings(port: u16, cert_path: &Path) -> Result<ServerSettings> {
    Ok(ServerSettings::new(
        "localhost",
        port,
        "agent-id",
        "agent-secret",
        cert_path,
    )?)
}

async fn connect(
    grpc_port: u16,
    secret: &MockSecretEndpoint,
    cert_path: &Path,
) -> Result<CustosClient> {
    let settings = settings(grpc_port, cert_path)?;
    let fetcher = HttpCertificateFetcher::with_endpoint(
        secret.url(SECRET_ENDPOINT_PATH),
        custos_api_rs::encode_credential("agent-id", "agent-secret")?,
    )?;
    Ok(CustosClient::connect_with_source(settings, &fetcher).await?)
}

#[tokio::test]
async fn test_first_bootstrap_fetches_caches_and_calls() -> Result<()> {
    init_logging();
    let pki = test_pki()?;
    let grpc = MockCustosServer::spawn_tls(&pki.server_cert_pem, &pki.server_key_pem).await;
    let secret = MockSecretEndpoint::spawn(MockSecretEndpoint::json_value(&pki.ca_pem)).await;

    let dir = tempfile::tempdir()?;
    let cert_path = dir.path().join("server.pem");

    let client = connect(grpc.port(), &secret, &cert_path).await?;

    // One fetch, authenticated and filtered to the server certificate secret
    assert_eq!(secret.hits(), 1);
    let request = secret.last_request().unwrap();
    assert!(request.contains("Bearer "));
    assert!(request.contains("metadata.owner_type=CUSTOS"));
    assert!(request.contains("metadata.resource_type=SERVER_CERTIFICATE"));

    // The fetched certificate is cached verbatim
    assert_eq!(std::fs::read_to_string(&cert_path)?, pki.ca_pem);

    // The TLS channel is live
    let token = client
        .get_token(TokenRequest::password("jdoe", "hunter2"))
        .await?;
    assert_eq!(token.access_token, MOCK_ACCESS_TOKEN);

    Ok(())
}

#[tokio::test]
async fn test_second_bootstrap_reuses_cached_certificate() -> Result<()> {
    init_logging();
    let pki = test_pki()?;
    let grpc = MockCustosServer::spawn_tls(&pki.server_cert_pem, &pki.server_key_pem).await;
    let secret = MockSecretEndpoint::spawn(MockSecretEndpoint::json_value(&pki.ca_pem)).await;

    let dir = tempfile::tempdir()?;
    let cert_path = dir.path().join("server.pem");

    let first = connect(grpc.port(), &secret, &cert_path).await?;
    assert_eq!(secret.hits(), 1);
    drop(first);

    let second = connect(grpc.port(), &secret, &cert_path).await?;
    assert_eq!(secret.hits(), 1);

    assert!(second
        .is_authenticated(&custos_api_rs::BearerToken::new(MOCK_ACCESS_TOKEN))
        .await?);

    Ok(())
}

#[tokio::test]
async fn test_expired_cached_certificate_is_refetched() -> Result<()> {
    init_logging();
    let pki = test_pki()?;
    let grpc = MockCustosServer::spawn_tls(&pki.server_cert_pem, &pki.server_key_pem).await;
    let secret = MockSecretEndpoint::spawn(MockSecretEndpoint::json_value(&pki.ca_pem)).await;

    let dir = tempfile::tempdir()?;
    let cert_path = dir.path().join("server.pem");
    std::fs::write(&cert_path, expired_pem()?)?;

    let client = connect(grpc.port(), &secret, &cert_path).await?;

    assert_eq!(secret.hits(), 1);
    assert_eq!(std::fs::read_to_string(&cert_path)?, pki.ca_pem);

    let token = client
        .get_token(TokenRequest::password("jdoe", "hunter2"))
        .await?;
    assert_eq!(token.access_token, MOCK_ACCESS_TOKEN);

    Ok(())
}
