//! Fakebook-Crawler: an authenticated flag-hunting web crawler
//!
//! This crate implements a crawler that speaks raw HTTP/1.1 over a TLS
//! socket, logs into the Fakebook site, then breadth-first traverses its
//! internal link graph until a quota of secret flags has been collected.

pub mod auth;
pub mod config;
pub mod crawler;
pub mod http;

use thiserror::Error;

/// Main error type for crawler operations
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Could not connect to {host}:{port}: {message}")]
    Connect {
        host: String,
        port: u16,
        message: String,
    },

    #[error("Wire protocol error: {0}")]
    Codec(#[from] CodecError),

    #[error("Could not fetch {path}: server answered {status}")]
    UnexpectedStatus { path: String, status: u16 },

    #[error("Server never set required cookie '{name}' during {step}")]
    MissingCookie { name: &'static str, step: String },

    #[error("Login page carried no csrfmiddlewaretoken input")]
    MissingToken,

    #[error("Connection made no further progress after {failures} consecutive failures")]
    ConnectionStalled { failures: u32 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Errors raised while reassembling a response from the byte stream
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Peer closed the connection before a complete response header arrived")]
    ConnectionClosed,

    #[error("Malformed status line: {0:?}")]
    BadStatusLine(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CodecError {
    /// Whether this error is a read-timeout expiry rather than a hard
    /// stream failure. Timeouts degrade to a per-page fetch failure.
    pub fn is_timeout(&self) -> bool {
        match self {
            CodecError::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
            ),
            _ => false,
        }
    }
}

/// Result type alias for crawler operations
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use auth::{authenticate, Credentials};
pub use config::Config;
pub use crawler::{CrawlReport, Crawler};
pub use http::{Connection, CookieJar, HttpResponse};
