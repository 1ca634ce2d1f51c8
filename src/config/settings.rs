// SPDX-License-Identifier: MIT OR Apache-2.0

//! Custos settings file parser
//!
//! This module parses the Custos client settings file (typically
//! `~/.custos/config`), which carries the connection coordinates and agent
//! credential for one Custos deployment. The key names match the upstream
//! settings file format.
//!
//! # Example
//!
//! ```no_run
//! use custos_api_rs::config::ServerSettings;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = ServerSettings::load_from_path("/etc/custos/config")?;
//! println!("Endpoint: {}", settings.endpoint());
//! # Ok(())
//! # }
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{CustosError, Result};

/// Path to the settings file.
pub const ENV_CUSTOS_CONFIG: &str = "CUSTOS_CONFIG";
/// Overrides the server host.
pub const ENV_CUSTOS_SERVER_HOST: &str = "CUSTOS_SERVER_HOST";
/// Overrides the server port.
pub const ENV_CUSTOS_SERVER_SSL_PORT: &str = "CUSTOS_SERVER_SSL_PORT";
/// Overrides the client id.
pub const ENV_CUSTOS_CLIENT_ID: &str = "CUSTOS_CLIENT_ID";
/// Overrides the client secret.
pub const ENV_CUSTOS_CLIENT_SEC: &str = "CUSTOS_CLIENT_SEC";
/// Overrides the certificate cache path.
pub const ENV_CUSTOS_CERT_PATH: &str = "CUSTOS_CERT_PATH";

/// On-disk settings file structure (upstream key names).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct SettingsFile {
    #[serde(rename = "SERVER_HOST")]
    server_host: String,

    #[serde(rename = "SERVER_SSL_PORT")]
    server_ssl_port: u16,

    #[serde(rename = "CLIENT_ID")]
    client_id: String,

    #[serde(rename = "CLIENT_SEC")]
    client_sec: String,

    #[serde(rename = "CERT_PATH", skip_serializing_if = "Option::is_none")]
    cert_path: Option<PathBuf>,
}

/// Connection settings for a Custos deployment.
///
/// Immutable once constructed; create one per client instance and pass it
/// explicitly (there is no process-wide configuration singleton).
#[derive(Debug, Clone, PartialEq)]
pub struct ServerSettings {
    /// Custos server host (DNS name or IP address).
    pub host: String,

    /// Custos server TLS port.
    pub port: u16,

    /// Agent/tenant client id.
    pub client_id: String,

    /// Agent/tenant client secret.
    pub client_secret: String,

    /// Path where the fetched server certificate is cached.
    pub cert_path: PathBuf,
}

impl ServerSettings {
    /// Create settings from explicit arguments.
    ///
    /// # Errors
    ///
    /// Returns a `Config` error if the host, client id or client secret is
    /// empty, or the port is zero.
    #[allow(clippy::result_large_err)]
    pub fn new(
        host: impl Into<String>,
        port: u16,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        cert_path: impl Into<PathBuf>,
    ) -> Result<Self> {
        let settings = Self {
            host: host.into(),
            port,
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            cert_path: cert_path.into(),
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from the default location (`~/.custos/config`).
    #[allow(clippy::result_large_err)]
    pub fn load_default() -> Result<Self> {
        Self::load_from_path(Self::default_path()?)
    }

    /// Load settings from a specific path.
    ///
    /// # Errors
    ///
    /// Returns a `Config` error if the file cannot be read, is malformed, or
    /// fails validation.
    #[allow(clippy::result_large_err)]
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            CustosError::Config(format!(
                "Failed to read settings file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        Self::from_yaml(&content)
    }

    /// Parse settings from a YAML string.
    #[allow(clippy::result_large_err)]
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let file: SettingsFile = serde_yaml::from_str(yaml)
            .map_err(|e| CustosError::Config(format!("Failed to parse settings YAML: {}", e)))?;

        let cert_path = match file.cert_path {
            Some(path) => path,
            None => Self::default_cert_path()?,
        };

        Self::new(
            file.server_host,
            file.server_ssl_port,
            file.client_id,
            file.client_sec,
            cert_path,
        )
    }

    /// Load settings respecting environment variable overrides.
    ///
    /// Reads the file named by `CUSTOS_CONFIG` (falling back to the default
    /// location), then applies any per-field `CUSTOS_*` overrides.
    #[allow(clippy::result_large_err)]
    pub fn load_with_env() -> Result<Self> {
        let path = match std::env::var(ENV_CUSTOS_CONFIG) {
            Ok(env_path) => PathBuf::from(env_path),
            Err(_) => Self::default_path()?,
        };
        let mut settings = Self::load_from_path(path)?;

        if let Ok(host) = std::env::var(ENV_CUSTOS_SERVER_HOST) {
            settings.host = host;
        }
        if let Ok(port) = std::env::var(ENV_CUSTOS_SERVER_SSL_PORT) {
            settings.port = port
                .parse()
                .map_err(|e| CustosError::Config(format!("Invalid port override: {}", e)))?;
        }
        if let Ok(client_id) = std::env::var(ENV_CUSTOS_CLIENT_ID) {
            settings.client_id = client_id;
        }
        if let Ok(client_secret) = std::env::var(ENV_CUSTOS_CLIENT_SEC) {
            settings.client_secret = client_secret;
        }
        if let Ok(cert_path) = std::env::var(ENV_CUSTOS_CERT_PATH) {
            settings.cert_path = PathBuf::from(cert_path);
        }

        settings.validate()?;
        Ok(settings)
    }

    /// Get the default settings file path (`~/.custos/config`).
    #[allow(clippy::result_large_err)]
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| CustosError::Config("Could not determine home directory".to_string()))?;

        Ok(home.join(".custos").join("config"))
    }

    /// Get the default certificate cache path (`~/.custos/server.pem`).
    #[allow(clippy::result_large_err)]
    pub fn default_cert_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| CustosError::Config("Could not determine home directory".to_string()))?;

        Ok(home.join(".custos").join("server.pem"))
    }

    /// The gRPC endpoint URL for this deployment.
    #[must_use]
    pub fn endpoint(&self) -> String {
        format!("https://{}:{}", self.host, self.port)
    }

    #[allow(clippy::result_large_err)]
    fn validate(&self) -> Result<()> {
        if self.host.is_empty() {
            return Err(CustosError::Config("SERVER_HOST must not be empty".to_string()));
        }
        if self.port == 0 {
            return Err(CustosError::Config("SERVER_SSL_PORT must not be zero".to_string()));
        }
        if self.client_id.is_empty() {
            return Err(CustosError::Config("CLIENT_ID must not be empty".to_string()));
        }
        if self.client_secret.is_empty() {
            return Err(CustosError::Config("CLIENT_SEC must not be empty".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_SETTINGS: &str = r#"
SERVER_HOST: custos.example.org
SERVER_SSL_PORT: 31499
CLIENT_ID: custos-abc123-10000000
CLIENT_SEC: s3cr3t
CERT_PATH: /var/lib/custos/server.pem
"#;

    #[test]
    fn test_parse_settings_file() {
        let settings = ServerSettings::from_yaml(SAMPLE_SETTINGS).unwrap();

        assert_eq!(settings.host, "custos.example.org");
        assert_eq!(settings.port, 31499);
        assert_eq!(settings.client_id, "custos-abc123-10000000");
        assert_eq!(settings.client_secret, "s3cr3t");
        assert_eq!(settings.cert_path, PathBuf::from("/var/lib/custos/server.pem"));
    }

    #[test]
    fn test_endpoint() {
        let settings = ServerSettings::from_yaml(SAMPLE_SETTINGS).unwrap();
        assert_eq!(settings.endpoint(), "https://custos.example.org:31499");
    }

    #[test]
    fn test_new_rejects_empty_host() {
        let result = ServerSettings::new("", 31499, "id", "sec", "/tmp/server.pem");
        assert!(matches!(result, Err(CustosError::Config(_))));
    }

    #[test]
    fn test_new_rejects_zero_port() {
        let result = ServerSettings::new("host", 0, "id", "sec", "/tmp/server.pem");
        assert!(matches!(result, Err(CustosError::Config(_))));
    }

    #[test]
    fn test_new_rejects_empty_credential() {
        assert!(ServerSettings::new("host", 1, "", "sec", "/tmp/server.pem").is_err());
        assert!(ServerSettings::new("host", 1, "id", "", "/tmp/server.pem").is_err());
    }

    #[test]
    fn test_malformed_yaml() {
        let result = ServerSettings::from_yaml("SERVER_HOST: [nope");
        assert!(matches!(result, Err(CustosError::Config(_))));
    }

    #[test]
    fn test_missing_field() {
        let result = ServerSettings::from_yaml("SERVER_HOST: host\nSERVER_SSL_PORT: 1");
        assert!(matches!(result, Err(CustosError::Config(_))));
    }

    #[test]
    fn test_load_missing_file() {
        let result = ServerSettings::load_from_path("/nonexistent/custos/config_12345");
        assert!(matches!(result, Err(CustosError::Config(_))));
    }

    // Environment variables are process-global, so the whole override layer
    // is exercised in one test; no other test touches CUSTOS_* variables.
    #[test]
    fn test_env_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("config");
        fs::write(&config_path, SAMPLE_SETTINGS).unwrap();

        std::env::set_var(ENV_CUSTOS_CONFIG, &config_path);
        std::env::set_var(ENV_CUSTOS_SERVER_HOST, "override.example.org");
        std::env::set_var(ENV_CUSTOS_SERVER_SSL_PORT, "4443");
        std::env::set_var(ENV_CUSTOS_CLIENT_ID, "override-id");
        std::env::set_var(ENV_CUSTOS_CLIENT_SEC, "override-sec");
        std::env::set_var(ENV_CUSTOS_CERT_PATH, "/tmp/override.pem");

        let settings = ServerSettings::load_with_env().unwrap();
        assert_eq!(settings.host, "override.example.org");
        assert_eq!(settings.port, 4443);
        assert_eq!(settings.client_id, "override-id");
        assert_eq!(settings.client_secret, "override-sec");
        assert_eq!(settings.cert_path, PathBuf::from("/tmp/override.pem"));

        // Unset overrides fall back to the file's values
        std::env::remove_var(ENV_CUSTOS_SERVER_HOST);
        let settings = ServerSettings::load_with_env().unwrap();
        assert_eq!(settings.host, "custos.example.org");
        assert_eq!(settings.port, 4443);

        // A non-numeric port override is a configuration error
        std::env::set_var(ENV_CUSTOS_SERVER_SSL_PORT, "not-a-port");
        let result = ServerSettings::load_with_env();
        assert!(matches!(result, Err(CustosError::Config(_))));

        for var in [
            ENV_CUSTOS_CONFIG,
            ENV_CUSTOS_SERVER_HOST,
            ENV_CUSTOS_SERVER_SSL_PORT,
            ENV_CUSTOS_CLIENT_ID,
            ENV_CUSTOS_CLIENT_SEC,
            ENV_CUSTOS_CERT_PATH,
        ] {
            std::env::remove_var(var);
        }
    }
}
