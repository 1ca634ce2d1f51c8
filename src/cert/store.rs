// SPDX-License-Identifier: MIT OR Apache-2.0

//! On-disk cache for the server TLS certificate.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::debug;

use crate::error::{CustosError, Result};

/// Reads and writes the single PEM certificate cached at a fixed path.
///
/// A missing, unreadable or malformed file is reported as "not valid", never
/// as an error: every such condition is recoverable by re-fetching.
#[derive(Debug, Clone)]
pub struct CertificateStore {
    path: PathBuf,
}

impl CertificateStore {
    /// Create a store over the given certificate path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The certificate path this store manages.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check whether the stored certificate exists and has not expired.
    ///
    /// Returns `true` iff the file parses as a PEM X.509 certificate and the
    /// current time is strictly before its not-valid-after timestamp. A
    /// certificate expiring exactly now is already invalid.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(i64::MAX);
        self.is_valid_at(now)
    }

    pub(crate) fn is_valid_at(&self, now: i64) -> bool {
        let pem = match std::fs::read(&self.path) {
            Ok(pem) => pem,
            Err(_) => return false,
        };

        match Self::not_after(&pem) {
            Some(expiry) => now < expiry,
            None => {
                debug!(
                    target: "custos_api::cert",
                    path = %self.path.display(),
                    "stored certificate is malformed, treating as invalid"
                );
                false
            }
        }
    }

    /// Read the raw PEM bytes of the stored certificate.
    ///
    /// # Errors
    ///
    /// Returns a `Bootstrap` error if the file cannot be read; callers invoke
    /// this only after the store has been refreshed.
    #[allow(clippy::result_large_err)]
    pub fn read(&self) -> Result<Vec<u8>> {
        std::fs::read(&self.path).map_err(|e| {
            CustosError::Bootstrap(format!(
                "Failed to read certificate {}: {}",
                self.path.display(),
                e
            ))
        })
    }

    /// Replace the stored certificate.
    ///
    /// Writes to a temporary file in the same directory and renames it over
    /// the target, so a concurrent validity check never observes a partial
    /// write. Last writer wins.
    #[allow(clippy::result_large_err)]
    pub fn write(&self, pem: &[u8]) -> Result<()> {
        let dir = self.path.parent().filter(|p| !p.as_os_str().is_empty());
        if let Some(dir) = dir {
            std::fs::create_dir_all(dir).map_err(|e| {
                CustosError::CertificateFetch(format!(
                    "Failed to create certificate directory {}: {}",
                    dir.display(),
                    e
                ))
            })?;
        }

        let mut tmp = tempfile::NamedTempFile::new_in(dir.unwrap_or_else(|| Path::new(".")))
            .map_err(|e| {
                CustosError::CertificateFetch(format!("Failed to stage certificate: {}", e))
            })?;
        tmp.write_all(pem).map_err(|e| {
            CustosError::CertificateFetch(format!("Failed to stage certificate: {}", e))
        })?;
        tmp.persist(&self.path).map_err(|e| {
            CustosError::CertificateFetch(format!(
                "Failed to persist certificate {}: {}",
                self.path.display(),
                e
            ))
        })?;

        debug!(
            target: "custos_api::cert",
            path = %self.path.display(),
            "stored server certificate"
        );
        Ok(())
    }

    /// Parse the not-valid-after timestamp (unix seconds) from PEM bytes.
    ///
    /// Returns `None` for anything that is not a well-formed PEM X.509
    /// certificate.
    pub(crate) fn not_after(pem: &[u8]) -> Option<i64> {
        let (_, parsed) = x509_parser::pem::parse_x509_pem(pem).ok()?;
        let cert = parsed.parse_x509().ok()?;
        Some(cert.validity().not_after.timestamp())
    }
}
