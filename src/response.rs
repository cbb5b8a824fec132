//! Raw response returned by a transport.
//!
//! A [`Response`] is produced for every reply the engine sends, whatever
//! its status. Interpreting the body is left to
//! [`normalize`](crate::normalize::normalize).

use http::{HeaderMap, StatusCode, Version};
use std::time::Duration;

/// The status, headers and body of one HTTP reply.
///
/// # Examples
///
/// ```
/// # use qengine_client::Response;
/// # use http::{HeaderMap, StatusCode, HeaderValue, Version};
/// # use std::time::Duration;
/// let mut headers = HeaderMap::new();
/// headers.insert("content-type", HeaderValue::from_static("application/json"));
///
/// let response = Response::new(
///     StatusCode::NOT_FOUND,
///     Version::HTTP_11,
///     headers,
///     "{}".to_string(),
///     Duration::from_millis(12),
/// );
///
/// assert_eq!(response.status_line, "HTTP/1.1 404 Not Found");
/// assert_eq!(response.header("content-type"), Some("application/json"));
/// assert!(!response.is_success());
/// ```
#[derive(Debug, Clone)]
pub struct Response {
    /// The HTTP status code.
    pub status: StatusCode,

    /// The status line, e.g. `HTTP/1.1 200 OK`.
    pub status_line: String,

    /// The response headers.
    pub headers: HeaderMap,

    /// The response body, decoded as UTF-8 (lossy).
    pub body: String,

    /// Time from sending the request until the body was read.
    pub latency: Duration,
}

impl Response {
    pub fn new(
        status: StatusCode,
        version: Version,
        headers: HeaderMap,
        body: String,
        latency: Duration,
    ) -> Self {
        Self {
            status,
            status_line: status_line(version, status),
            headers,
            body,
            latency,
        }
    }

    /// Returns the numeric status code.
    pub fn status_code(&self) -> u16 {
        self.status.as_u16()
    }

    /// Returns `true` for 2xx statuses.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Returns a header value by name, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)?.to_str().ok()
    }
}

fn status_line(version: Version, status: StatusCode) -> String {
    let version = match version {
        Version::HTTP_09 => "HTTP/0.9",
        Version::HTTP_10 => "HTTP/1.0",
        Version::HTTP_2 => "HTTP/2",
        Version::HTTP_3 => "HTTP/3",
        _ => "HTTP/1.1",
    };
    match status.canonical_reason() {
        Some(reason) => format!("{} {} {}", version, status.as_u16(), reason),
        None => format!("{} {}", version, status.as_u16()),
    }
}
