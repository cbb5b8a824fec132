//! Error types for request construction and transport.
//!
//! Errors fall into two families. Configuration errors (bad URL, method,
//! header or body) are raised while a request is being built, before any
//! network I/O happens. Connection errors are raised by a [`Transport`] when
//! the remote engine could not be reached at all. An HTTP error status is
//! *not* an error: it comes back as an ordinary [`Response`].
//!
//! [`Transport`]: crate::Transport
//! [`Response`]: crate::Response
//!
//! # Examples
//!
//! ```no_run
//! use qengine_client::{Client, Error};
//!
//! # async fn example() -> Result<(), Error> {
//! let client = Client::builder()
//!     .base_url("https://engine.example.com/api")?
//!     .build()?;
//!
//! match client.send(client.get("/info")).await {
//!     Ok(response) => println!("{} -> {}", response.status_line, response.body),
//!     Err(e) if e.is_timeout() => eprintln!("engine did not answer in time"),
//!     Err(e) => eprintln!("request failed: {}", e),
//! }
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::path::PathBuf;

/// The main error type for building and sending engine requests.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The URL could not be parsed into components.
    #[error("Malformed URL {url:?}: {reason}")]
    MalformedUrl {
        /// The rejected input
        url: String,
        /// Why it was rejected
        reason: String,
    },

    /// The URL scheme is neither `http` nor `https`.
    #[error("Unsupported scheme {0:?}, expected http or https")]
    UnsupportedScheme(String),

    /// The method string is outside the supported set.
    #[error("Unsupported method {0:?}")]
    UnsupportedMethod(String),

    /// The protocol version string is not HTTP/1.0 or HTTP/1.1.
    #[error("Unsupported protocol version {0:?}")]
    UnsupportedProtocolVersion(String),

    /// A header name or value cannot be carried on the wire.
    #[error("Invalid header {name:?}: {reason}")]
    InvalidHeader {
        /// The header name as supplied
        name: String,
        /// Why it was rejected
        reason: String,
    },

    /// The body is neither a string nor a JSON object.
    #[error("Unsupported body type {0}, expected a JSON object or a string")]
    UnsupportedBodyType(&'static str),

    /// A string body is neither JSON nor a well-formed query string.
    #[error("Malformed body input, expected a JSON object or key=value&key=value: {0:?}")]
    MalformedBodyInput(String),

    /// A file attachment could not be read.
    #[error("Failed to read attachment {path}: {source}")]
    FileRead {
        /// The path that was read
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The JSON body could not be serialized.
    #[error("Failed to serialize request body: {0}")]
    SerializationFailed(String),

    /// Invalid client or engine configuration.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// The engine could not be reached, or stopped answering.
    ///
    /// Covers DNS failures, refused connections, TLS failures and timeouts.
    #[error("Connection error ({kind}): {source}")]
    Connection {
        /// What kind of transport failure occurred
        kind: ConnectionFailure,
        /// The underlying client error
        #[source]
        source: reqwest::Error,
    },
}

/// Classification of a [`Error::Connection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionFailure {
    /// The connect or overall timeout elapsed.
    Timeout,
    /// The connection could not be established (DNS, refused, TLS).
    Connect,
    /// Any other transport-level failure, such as a reset mid-body.
    Other,
}

impl fmt::Display for ConnectionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionFailure::Timeout => write!(f, "timeout"),
            ConnectionFailure::Connect => write!(f, "connect"),
            ConnectionFailure::Other => write!(f, "transport"),
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(source: reqwest::Error) -> Self {
        let kind = if source.is_timeout() {
            ConnectionFailure::Timeout
        } else if source.is_connect() {
            ConnectionFailure::Connect
        } else {
            ConnectionFailure::Other
        };
        Error::Connection { kind, source }
    }
}

impl Error {
    /// Returns `true` if this error was raised before any network I/O.
    ///
    /// Such errors will not go away on retry; the input has to be fixed.
    ///
    /// # Examples
    ///
    /// ```
    /// use qengine_client::Error;
    ///
    /// let err = Error::UnsupportedMethod("FETCH".to_string());
    /// assert!(err.is_configuration());
    /// assert!(!err.is_connection());
    /// ```
    pub fn is_configuration(&self) -> bool {
        !self.is_connection()
    }

    /// Returns `true` for transport-level failures.
    pub fn is_connection(&self) -> bool {
        matches!(self, Error::Connection { .. })
    }

    /// Returns `true` if the transport gave up because the timeout elapsed.
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Error::Connection {
                kind: ConnectionFailure::Timeout,
                ..
            }
        )
    }

    /// Returns the connection failure kind, if this is a connection error.
    pub fn connection_failure(&self) -> Option<ConnectionFailure> {
        match self {
            Error::Connection { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

/// A specialized `Result` type for engine requests.
pub type Result<T> = std::result::Result<T, Error>;
