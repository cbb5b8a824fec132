//! Sending built requests over HTTP.
//!
//! [`Transport`] is the seam between request construction and the network.
//! [`HttpTransport`] is the `reqwest`-backed implementation; it returns a
//! [`Response`] for every status the engine sends and only fails with
//! [`Error::Connection`] when no reply could be obtained within the
//! request's timeout. [`LoggingTransport`] wraps any transport and records
//! each call before and after it runs.
//!
//! [`Request::to_wire`] is a diagnostic rendering only. `HttpTransport` sends
//! headers through `http::HeaderMap`, so names go out lower-cased and values
//! without the stored leading space.

use std::future::Future;
use std::time::{Duration, Instant};

use crate::{Error, Request, Response, Result};

/// Executes one request and returns the raw reply.
///
/// Implementations must not treat 4xx/5xx statuses as errors and must not
/// retry.
pub trait Transport: Send + Sync {
    fn send(&self, request: &Request) -> impl Future<Output = Result<Response>> + Send;
}

/// HTTP transport built on `reqwest`.
///
/// The overall timeout of each call is the [`Request::timeout`], which also
/// bounds connection setup. A shorter connect timeout can be configured on
/// the builder.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Creates a transport with default settings.
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    pub fn builder() -> HttpTransportBuilder {
        HttpTransportBuilder::default()
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: &Request) -> impl Future<Output = Result<Response>> + Send {
        async move {
            let url = reqwest::Url::parse(&request.url.assemble()).map_err(|e| {
                Error::MalformedUrl {
                    url: request.url.assemble(),
                    reason: e.to_string(),
                }
            })?;
            let headers = request.headers.to_header_map()?;
            let body = request.body_bytes()?;

            tracing::debug!(
                method = %request.method,
                url = %url,
                timeout_ms = request.timeout.as_millis(),
                "Executing HTTP request"
            );

            let mut builder = self
                .client
                .request(request.method.to_http(), url)
                .version(request.version.to_http())
                .headers(headers)
                .timeout(request.timeout);
            if !body.is_empty() {
                builder = builder.body(body);
            }

            let start = Instant::now();
            let reply = builder.send().await.map_err(|e| {
                let err = Error::from(e);
                tracing::error!(
                    error = %err,
                    method = %request.method,
                    url = %request.url,
                    "Engine could not be reached"
                );
                err
            })?;

            let status = reply.status();
            let version = reply.version();
            let headers = reply.headers().clone();
            let bytes = reply.bytes().await?;
            let latency = start.elapsed();

            tracing::info!(
                status = status.as_u16(),
                latency_ms = latency.as_millis(),
                "Received HTTP response"
            );

            Ok(Response::new(
                status,
                version,
                headers,
                String::from_utf8_lossy(&bytes).into_owned(),
                latency,
            ))
        }
    }
}

/// Builder for [`HttpTransport`].
#[derive(Debug, Clone, Default)]
pub struct HttpTransportBuilder {
    connect_timeout: Option<Duration>,
    accept_invalid_certs: bool,
}

impl HttpTransportBuilder {
    /// Limits connection setup separately from the overall request timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Skips TLS certificate verification, for engines with self-signed certificates.
    pub fn accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    pub fn build(self) -> Result<HttpTransport> {
        let mut builder =
            reqwest::Client::builder().danger_accept_invalid_certs(self.accept_invalid_certs);
        if let Some(timeout) = self.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        let client = builder.build().map_err(|e| {
            Error::ConfigurationError(format!("Failed to build HTTP client: {}", e))
        })?;
        Ok(HttpTransport { client })
    }
}

/// Transport decorator that logs every call.
///
/// Before the call: method, URL, header count and body length (the body
/// itself at `trace` level). After it: status and elapsed seconds, or the
/// error and elapsed seconds.
#[derive(Debug, Clone)]
pub struct LoggingTransport<T> {
    inner: T,
}

impl<T> LoggingTransport<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }

    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T: Transport> Transport for LoggingTransport<T> {
    fn send(&self, request: &Request) -> impl Future<Output = Result<Response>> + Send {
        async move {
            let body = request.body_bytes().unwrap_or_default();
            tracing::debug!(
                method = %request.method,
                url = %request.url,
                headers = request.headers.len(),
                body_len = body.len(),
                "Calling engine"
            );
            tracing::trace!(body = %String::from_utf8_lossy(&body), "Request body");

            let start = Instant::now();
            let result = self.inner.send(request).await;
            let elapsed = format_elapsed(start.elapsed());

            match &result {
                Ok(response) => {
                    tracing::info!(
                        method = %request.method,
                        url = %request.url,
                        status = response.status_code(),
                        elapsed_s = %elapsed,
                        "Call succeeded after {}s",
                        elapsed
                    );
                    tracing::trace!(body = %response.body, "Response body");
                }
                Err(e) => {
                    tracing::error!(
                        method = %request.method,
                        url = %request.url,
                        error = %e,
                        elapsed_s = %elapsed,
                        "Call failed after {}s",
                        elapsed
                    );
                }
            }
            result
        }
    }
}

fn format_elapsed(elapsed: Duration) -> String {
    format!("{:.4}", elapsed.as_secs_f64())
}
