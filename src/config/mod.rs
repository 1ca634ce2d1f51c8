// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration management for Custos clients
//!
//! This module provides utilities for loading client settings from a
//! settings file or from explicit constructor arguments.
//!
//! # Environment Variables
//!
//! The following environment variables are supported:
//!
//! - `CUSTOS_CONFIG` - Path to the settings file (default: `~/.custos/config`)
//! - `CUSTOS_SERVER_HOST` - Override the server host
//! - `CUSTOS_SERVER_SSL_PORT` - Override the server port
//! - `CUSTOS_CLIENT_ID` - Override the client id
//! - `CUSTOS_CLIENT_SEC` - Override the client secret
//! - `CUSTOS_CERT_PATH` - Override the certificate cache path
//!
//! # Example
//!
//! ```no_run
//! use custos_api_rs::config::ServerSettings;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Load with environment variable overrides
//! let settings = ServerSettings::load_with_env()?;
//! println!("Connecting to {}", settings.endpoint());
//! # Ok(())
//! # }
//! ```

mod settings;

pub use settings::{
    ServerSettings, ENV_CUSTOS_CONFIG, ENV_CUSTOS_CERT_PATH, ENV_CUSTOS_CLIENT_ID,
    ENV_CUSTOS_CLIENT_SEC, ENV_CUSTOS_SERVER_HOST, ENV_CUSTOS_SERVER_SSL_PORT,
};
