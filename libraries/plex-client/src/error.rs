//! Error types for the Plex client.

use std::fmt;
use thiserror::Error;

/// Socket-level cause of a failed request, when one can be identified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// The host actively refused the connection
    ConnectionRefused,
    /// The hostname could not be resolved
    HostNotFound,
    /// The request did not complete within the configured timeout
    TimedOut,
}

impl ErrorCode {
    /// Conventional errno-style name of the code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ConnectionRefused => "ECONNREFUSED",
            ErrorCode::HostNotFound => "ENOTFOUND",
            ErrorCode::TimedOut => "ETIMEDOUT",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single failed request against the media server.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// No connection could be established
    #[error("Connection failed: {message}")]
    Connect {
        code: Option<ErrorCode>,
        message: String,
    },

    /// The request exceeded the transport timeout
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Server answered with a non-success status
    #[error("Request failed with status code {status}")]
    Status { status: u16, body: String },

    /// Response body could not be decoded
    #[error("Failed to parse response: {0}")]
    Decode(String),

    /// Any other request failure (broken connection, invalid request, ...)
    #[error("HTTP request failed: {0}")]
    Request(String),
}

impl TransportError {
    /// Shorthand for a refused connection.
    pub fn refused(message: impl Into<String>) -> Self {
        TransportError::Connect {
            code: Some(ErrorCode::ConnectionRefused),
            message: message.into(),
        }
    }

    /// Shorthand for a non-success HTTP status with an empty body.
    pub fn status(status: u16) -> Self {
        TransportError::Status {
            status,
            body: String::new(),
        }
    }

    /// Socket-level error code, if known.
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            TransportError::Connect { code, .. } => *code,
            TransportError::Timeout(_) => Some(ErrorCode::TimedOut),
            _ => None,
        }
    }

    /// HTTP status returned by the server, if it answered.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True when the request provably never reached the server.
    pub fn is_unsent(&self) -> bool {
        matches!(self, TransportError::Connect { .. })
    }
}

/// Errors that can occur when talking to a Plex Media Server.
#[derive(Error, Debug)]
pub enum PlexClientError {
    /// Malformed construction input
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Connectivity test failed on every probe and every retry
    #[error("{message}")]
    Connection {
        message: String,
        /// Ordered hints for the user, most likely fix first
        troubleshooting: Vec<String>,
        code: Option<ErrorCode>,
        status: Option<u16>,
        /// Base URL that was being tested
        url: String,
        #[source]
        source: TransportError,
    },

    /// A library or playlist operation failed
    #[error("Failed to {action}: {source}")]
    Operation {
        action: &'static str,
        #[source]
        source: TransportError,
    },

    /// Local precondition failed; nothing was sent
    #[error("{0}")]
    Validation(String),

    /// A referenced playlist or library does not exist on the server
    #[error("{0}")]
    NotFound(String),
}

impl PlexClientError {
    pub(crate) fn operation(action: &'static str) -> impl FnOnce(TransportError) -> Self {
        move |source| PlexClientError::Operation { action, source }
    }

    /// Troubleshooting hints; empty for every kind but `Connection`.
    pub fn troubleshooting(&self) -> &[String] {
        match self {
            PlexClientError::Connection {
                troubleshooting, ..
            } => troubleshooting,
            _ => &[],
        }
    }

    /// Underlying socket-level code, if any.
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            PlexClientError::Connection { code, .. } => *code,
            PlexClientError::Operation { source, .. } => source.code(),
            _ => None,
        }
    }

    /// Underlying HTTP status, if any.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            PlexClientError::Connection { status, .. } => *status,
            PlexClientError::Operation { source, .. } => source.http_status(),
            _ => None,
        }
    }
}

/// Result type for Plex client operations.
pub type Result<T> = std::result::Result<T, PlexClientError>;

/// Diagnosis of a failed connectivity test.
pub(crate) struct Diagnosis {
    pub message: String,
    pub troubleshooting: Vec<String>,
}

/// Match the last failure against the hint table. First match wins.
pub(crate) fn diagnose(error: &TransportError) -> Diagnosis {
    match (error.code(), error.http_status()) {
        (Some(ErrorCode::ConnectionRefused), _) => hint(
            "Connection refused - Plex server is not running or not accessible",
            &[
                "Verify Plex Media Server is running",
                "Check if the server URL is correct",
                "Ensure the port (usually 32400) is not blocked by firewall",
                "Try accessing the server URL in a web browser",
            ],
        ),
        (Some(ErrorCode::HostNotFound), _) => hint(
            "Server not found - hostname could not be resolved",
            &[
                "Check if the server hostname/IP is correct",
                "Verify network connectivity",
                "Try using IP address instead of hostname",
            ],
        ),
        (Some(ErrorCode::TimedOut), _) => hint(
            "Connection timeout - server is not responding",
            &[
                "Check network connectivity",
                "Verify server is not overloaded",
                "Try increasing timeout in settings",
            ],
        ),
        (_, Some(401)) => hint(
            "Authentication failed - invalid Plex token",
            &[
                "Verify your Plex token is correct",
                "Generate a new token if needed",
                "Check token has proper permissions",
            ],
        ),
        (_, Some(403)) => hint(
            "Access forbidden - insufficient permissions",
            &[
                "Check if your Plex account has admin privileges",
                "Verify token permissions",
                "Ensure server allows remote connections",
            ],
        ),
        (_, Some(404)) => hint(
            "Endpoint not found - server URL or Plex version mismatch",
            &[
                "Check the server URL points at Plex Media Server",
                "Verify the Plex Media Server version supports this API",
            ],
        ),
        _ => Diagnosis {
            message: error.to_string(),
            troubleshooting: Vec::new(),
        },
    }
}

fn hint(message: &str, troubleshooting: &[&str]) -> Diagnosis {
    Diagnosis {
        message: message.to_string(),
        troubleshooting: troubleshooting.iter().map(|h| (*h).to_string()).collect(),
    }
}
