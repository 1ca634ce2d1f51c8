// SPDX-License-Identifier: MIT OR Apache-2.0

//! Certificate cache and retrieval.
//!
//! The Custos server's TLS certificate is the trust anchor for every gRPC
//! call, and is itself obtained from the server's resource-secret endpoint.
//! [`CertificateStore`] caches it on disk and answers validity queries;
//! [`HttpCertificateFetcher`] retrieves a fresh copy when the cache is
//! missing, corrupt or expired.

mod fetcher;
mod store;

pub use fetcher::{CertificateSource, HttpCertificateFetcher, SECRET_ENDPOINT_PATH};
pub use store::CertificateStore;
