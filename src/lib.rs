// SPDX-License-Identifier: MIT OR Apache-2.0

pub mod api;
pub mod cert;
pub mod client;
pub mod config;
pub mod credentials;
pub mod error;
pub mod resources;
pub mod runtime;
pub mod testkit;

pub use cert::{CertificateSource, CertificateStore, HttpCertificateFetcher};
pub use client::{ChannelBootstrapper, CustosClient};
pub use config::ServerSettings;
pub use credentials::{encode_credential, BearerToken};
pub use error::CustosError;
pub use resources::{GrantType, Token, TokenRequest};
