// SPDX-License-Identifier: MIT OR Apache-2.0

//! Runtime utilities for observability.
//!
//! Every high-level RPC wrapper on the client routes through the
//! [`RequestLogger`] here, so failures are logged before being re-raised.

mod logging;

pub use logging::{CallMetrics, LogLevel, LoggingConfig, RequestLogger, RequestSpan};
