// SPDX-License-Identifier: MIT OR Apache-2.0

//! Secure-channel bootstrap.
//!
//! Bootstrapping obtains a trusted copy of the server certificate and opens
//! a TLS channel that trusts exactly that certificate - no system trust
//! store is consulted. While the cached certificate remains valid, repeated
//! bootstraps perform no network I/O beyond opening the channel itself.

use std::sync::Arc;

use hyper_util::rt::TokioIo;
use rustls::pki_types::{CertificateDer, ServerName};
use tokio::sync::Mutex;
use tonic::transport::{Channel, Endpoint};
use tracing::debug;

use crate::cert::{CertificateSource, CertificateStore};
use crate::config::ServerSettings;
use crate::error::{CustosError, Result};

/// Orchestrates certificate validity, refresh and channel construction.
pub struct ChannelBootstrapper {
    settings: ServerSettings,
    store: CertificateStore,
    refresh_lock: Mutex<()>,
}

impl ChannelBootstrapper {
    /// Create a bootstrapper for the given settings.
    #[must_use]
    pub fn new(settings: ServerSettings) -> Self {
        let store = CertificateStore::new(settings.cert_path.clone());
        Self {
            settings,
            store,
            refresh_lock: Mutex::new(()),
        }
    }

    /// The certificate store backing this bootstrapper.
    #[must_use]
    pub fn store(&self) -> &CertificateStore {
        &self.store
    }

    /// Ensure a valid certificate is on disk and return its PEM bytes.
    ///
    /// Refreshes from `source` when the cached certificate is missing,
    /// malformed or expired. The validity check and the write are one
    /// critical section: concurrent bootstraps against the same store
    /// serialize here instead of racing check-then-act.
    pub async fn ensure_trust_anchor<S: CertificateSource + ?Sized>(
        &self,
        source: &S,
    ) -> Result<Vec<u8>> {
        let _guard = self.refresh_lock.lock().await;

        if !self.store.is_valid() {
            debug!(
                target: "custos_api::bootstrap",
                path = %self.store.path().display(),
                "cached certificate missing or expired, fetching a fresh one"
            );
            let pem = source.fetch().await?;
            self.store.write(pem.as_bytes())?;
        }

        self.store.read()
    }

    /// Ensure a valid trust anchor and open a TLS channel over it.
    ///
    /// # Errors
    ///
    /// `CertificateFetch` if the refresh fails; `Bootstrap` if the TCP
    /// connect or TLS handshake fails. Neither is retried internally.
    pub async fn ensure_channel<S: CertificateSource + ?Sized>(
        &self,
        source: &S,
    ) -> Result<Channel> {
        let pem = self.ensure_trust_anchor(source).await?;
        self.connect(&pem).await
    }

    async fn connect(&self, ca_pem: &[u8]) -> Result<Channel> {
        let mut root_store = rustls::RootCertStore::empty();
        for cert in Self::load_pem_certs(ca_pem)? {
            root_store.add(cert).map_err(|e| {
                CustosError::Bootstrap(format!("Failed to add trust anchor: {e}"))
            })?;
        }

        let mut tls_config = rustls::ClientConfig::builder()
            .with_root_certificates(root_store)
            .with_no_client_auth();

        // gRPC requires ALPN h2
        tls_config.alpn_protocols = vec![b"h2".to_vec()];
        let connector = tokio_rustls::TlsConnector::from(Arc::new(tls_config));

        let host = self.settings.host.clone();
        let port = self.settings.port;

        // The connector below handles TLS itself, so the endpoint URI stays http://
        let endpoint_for_connector = format!("http://{}:{}", host, port);

        let channel = Endpoint::from_shared(endpoint_for_connector)
            .map_err(|e| CustosError::Config(e.to_string()))?
            .connect_with_connector(tower::service_fn(move |uri: http::Uri| {
                let connector = connector.clone();
                let host = host.clone();
                async move {
                    let uri_host = uri.host().map(str::to_string).unwrap_or_else(|| host.clone());
                    let uri_port = uri.port_u16().unwrap_or(port);
                    let addr = format!("{}:{}", uri_host, uri_port);

                    let tcp = tokio::net::TcpStream::connect(addr).await?;

                    // SNI must carry the configured host so the fetched
                    // certificate verifies
                    let server_name = ServerName::try_from(host.clone())
                        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;

                    let tls_stream = connector.connect(server_name, tcp).await?;
                    Ok::<_, std::io::Error>(TokioIo::new(tls_stream))
                }
            }))
            .await
            .map_err(|e| {
                CustosError::Bootstrap(format!(
                    "Failed to open channel to {}: {}",
                    self.settings.endpoint(),
                    e
                ))
            })?;

        Ok(channel)
    }

    /// Load PEM-encoded certificates
    #[allow(clippy::result_large_err)]
    fn load_pem_certs(pem_data: &[u8]) -> Result<Vec<CertificateDer<'static>>> {
        let mut reader = std::io::BufReader::new(pem_data);
        let certs: Vec<CertificateDer<'static>> = rustls_pemfile::certs(&mut reader)
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| {
                CustosError::Bootstrap(format!("Failed to parse PEM certificates: {e}"))
            })?;
        if certs.is_empty() {
            return Err(CustosError::Bootstrap(
                "No certificates found in PEM data".to_string(),
            ));
        }
        Ok(certs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubSource {
        pem: String,
        calls: AtomicUsize,
    }

    impl StubSource {
        fn new(pem: impl Into<String>) -> Self {
            Self {
                pem: pem.into(),
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CertificateSource for StubSource {
        async fn fetch(&self) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.pem.clone())
        }
    }

    struct FailingSource;

    #[async_trait]
    impl CertificateSource for FailingSource {
        async fn fetch(&self) -> Result<String> {
            Err(CustosError::CertificateFetch("endpoint unreachable".to_string()))
        }
    }

    /// Source that stays in flight long enough for other bootstraps to pile
    /// up on the refresh lock.
    struct SlowSource {
        pem: String,
        calls: AtomicUsize,
    }

    impl SlowSource {
        fn new(pem: impl Into<String>) -> Self {
            Self {
                pem: pem.into(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl CertificateSource for SlowSource {
        async fn fetch(&self) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            Ok(self.pem.clone())
        }
    }

    fn self_signed_pem(not_after_year: i32) -> String {
        let key = rcgen::KeyPair::generate().unwrap();
        let mut params = rcgen::CertificateParams::new(vec!["localhost".to_string()]).unwrap();
        params.not_before = rcgen::date_time_ymd(2019, 1, 1);
        params.not_after = rcgen::date_time_ymd(not_after_year, 1, 1);
        params.self_signed(&key).unwrap().pem()
    }

    fn settings(cert_path: &std::path::Path) -> ServerSettings {
        ServerSettings::new("localhost", 1, "id", "sec", cert_path).unwrap()
    }

    #[tokio::test]
    async fn test_empty_store_fetches_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("server.pem");
        let source = StubSource::new(self_signed_pem(2099));

        let bootstrapper = ChannelBootstrapper::new(settings(&path));
        let anchor = bootstrapper.ensure_trust_anchor(&source).await.unwrap();

        assert_eq!(source.calls(), 1);
        assert_eq!(anchor, source.pem.as_bytes());
        assert_eq!(std::fs::read(&path).unwrap(), source.pem.as_bytes());
    }

    #[tokio::test]
    async fn test_valid_store_skips_fetch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("server.pem");
        let existing = self_signed_pem(2099);
        std::fs::write(&path, &existing).unwrap();

        let source = StubSource::new(self_signed_pem(2098));
        let bootstrapper = ChannelBootstrapper::new(settings(&path));
        let anchor = bootstrapper.ensure_trust_anchor(&source).await.unwrap();

        assert_eq!(source.calls(), 0);
        assert_eq!(anchor, existing.as_bytes());
    }

    #[tokio::test]
    async fn test_repeated_bootstrap_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("server.pem");
        let source = StubSource::new(self_signed_pem(2099));
        let bootstrapper = ChannelBootstrapper::new(settings(&path));

        for _ in 0..3 {
            bootstrapper.ensure_trust_anchor(&source).await.unwrap();
        }
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_bootstraps_fetch_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("server.pem");
        let source = Arc::new(SlowSource::new(self_signed_pem(2099)));
        let bootstrapper = Arc::new(ChannelBootstrapper::new(settings(&path)));

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let bootstrapper = Arc::clone(&bootstrapper);
                let source = Arc::clone(&source);
                tokio::spawn(
                    async move { bootstrapper.ensure_trust_anchor(source.as_ref()).await },
                )
            })
            .collect();

        for task in tasks {
            let anchor = task.await.unwrap().unwrap();
            assert_eq!(anchor, source.pem.as_bytes());
        }

        // The first caller holds the lock through fetch and write; the rest
        // find a valid certificate and never fetch
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        assert_eq!(std::fs::read(&path).unwrap(), source.pem.as_bytes());
    }

    #[tokio::test]
    async fn test_expired_certificate_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("server.pem");
        std::fs::write(&path, self_signed_pem(2020)).unwrap();

        let source = StubSource::new(self_signed_pem(2099));
        let bootstrapper = ChannelBootstrapper::new(settings(&path));
        let anchor = bootstrapper.ensure_trust_anchor(&source).await.unwrap();

        assert_eq!(source.calls(), 1);
        assert_eq!(anchor, source.pem.as_bytes());
        assert_eq!(std::fs::read(&path).unwrap(), source.pem.as_bytes());
    }

    #[tokio::test]
    async fn test_corrupt_certificate_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("server.pem");
        std::fs::write(&path, b"not a certificate").unwrap();

        let source = StubSource::new(self_signed_pem(2099));
        let bootstrapper = ChannelBootstrapper::new(settings(&path));
        bootstrapper.ensure_trust_anchor(&source).await.unwrap();

        assert_eq!(source.calls(), 1);
        assert_eq!(std::fs::read(&path).unwrap(), source.pem.as_bytes());
    }

    #[tokio::test]
    async fn test_fetch_failure_propagates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("server.pem");

        let bootstrapper = ChannelBootstrapper::new(settings(&path));
        let result = bootstrapper.ensure_trust_anchor(&FailingSource).await;

        assert!(matches!(result, Err(CustosError::CertificateFetch(_))));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_connect_refused_is_bootstrap_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("server.pem");
        let source = StubSource::new(self_signed_pem(2099));

        // Port 1 is never listening
        let bootstrapper = ChannelBootstrapper::new(settings(&path));
        let result = bootstrapper.ensure_channel(&source).await;

        assert!(matches!(result, Err(CustosError::Bootstrap(_))));
        // The trust anchor was still refreshed before the connect failed
        assert_eq!(source.calls(), 1);
    }
}
