// SPDX-License-Identifier: MIT OR Apache-2.0

//! Request logging for Custos RPC calls.
//!
//! The client wraps each RPC in a [`RequestSpan`] so both outcomes carry the
//! method name and elapsed time. Token material never reaches the log: the
//! wrappers only hand over method names and status text.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use tracing::{debug, error, info, trace, warn};

const LOG_TARGET: &str = "custos_api::grpc";

/// Log level used for request/response events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    /// Trace level - most verbose.
    Trace,
    /// Debug level.
    Debug,
    /// Info level.
    #[default]
    Info,
    /// Warn level.
    Warn,
    /// Error level - only errors.
    Error,
    /// Disabled - no logging.
    Off,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LogLevel::Trace => "TRACE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
            LogLevel::Off => "OFF",
        };
        f.write_str(name)
    }
}

/// Configuration for the request logger.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level for completed requests.
    pub success_level: LogLevel,
    /// Log level for failed requests.
    pub error_level: LogLevel,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            success_level: LogLevel::Debug,
            error_level: LogLevel::Error,
        }
    }
}

impl LoggingConfig {
    /// Create a new logging configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the success log level.
    #[must_use]
    pub fn with_success_level(mut self, level: LogLevel) -> Self {
        self.success_level = level;
        self
    }

    /// Set the error log level.
    #[must_use]
    pub fn with_error_level(mut self, level: LogLevel) -> Self {
        self.error_level = level;
        self
    }

    /// Quiet configuration: only warn on failures.
    #[must_use]
    pub fn quiet() -> Self {
        Self {
            success_level: LogLevel::Off,
            error_level: LogLevel::Warn,
        }
    }
}

/// Counters kept by the request logger.
#[derive(Debug, Default)]
pub struct CallMetrics {
    total: AtomicU64,
    succeeded: AtomicU64,
    failed: AtomicU64,
}

impl CallMetrics {
    fn record_success(&self) {
        self.total.fetch_add(1, Ordering::Relaxed);
        self.succeeded.fetch_add(1, Ordering::Relaxed);
    }

    fn record_failure(&self) {
        self.total.fetch_add(1, Ordering::Relaxed);
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Total number of completed calls.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }

    /// Number of successful calls.
    #[must_use]
    pub fn succeeded(&self) -> u64 {
        self.succeeded.load(Ordering::Relaxed)
    }

    /// Number of failed calls.
    #[must_use]
    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }
}

/// Logs request outcomes with timing and keeps per-client counters.
#[derive(Debug, Default)]
pub struct RequestLogger {
    config: LoggingConfig,
    metrics: CallMetrics,
}

impl RequestLogger {
    /// Create a request logger with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a request logger with a custom configuration.
    #[must_use]
    pub fn with_config(config: LoggingConfig) -> Self {
        Self {
            config,
            metrics: CallMetrics::default(),
        }
    }

    /// The logger's counters.
    #[must_use]
    pub fn metrics(&self) -> &CallMetrics {
        &self.metrics
    }

    /// Start tracking a request.
    #[must_use]
    pub fn start(&self, method: &str) -> RequestSpan {
        RequestSpan {
            method: method.to_string(),
            start: Instant::now(),
        }
    }

    /// Record a completed request.
    pub fn finish_success(&self, span: RequestSpan) {
        self.metrics.record_success();
        emit(
            self.config.success_level,
            &format!("{} completed in {:?}", span.method, span.start.elapsed()),
        );
    }

    /// Record a failed request before re-raising the error.
    pub fn finish_error(&self, span: RequestSpan, error: &str) {
        self.metrics.record_failure();
        emit(
            self.config.error_level,
            &format!(
                "{} failed in {:?}: {}",
                span.method,
                span.start.elapsed(),
                error
            ),
        );
    }
}

/// An in-flight request being timed.
#[derive(Debug)]
pub struct RequestSpan {
    method: String,
    start: Instant,
}

impl RequestSpan {
    /// The method name being tracked.
    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Elapsed time since the request started.
    #[must_use]
    pub fn elapsed(&self) -> std::time::Duration {
        self.start.elapsed()
    }
}

fn emit(level: LogLevel, message: &str) {
    match level {
        LogLevel::Trace => trace!(target: LOG_TARGET, "{}", message),
        LogLevel::Debug => debug!(target: LOG_TARGET, "{}", message),
        LogLevel::Info => info!(target: LOG_TARGET, "{}", message),
        LogLevel::Warn => warn!(target: LOG_TARGET, "{}", message),
        LogLevel::Error => error!(target: LOG_TARGET, "{}", message),
        LogLevel::Off => {}
    }
}
