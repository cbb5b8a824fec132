//! Engine client: request defaults plus a transport.
//!
//! The [`Client`] type is the main entry point. It resolves paths against a
//! base URL, applies default headers, timeout and protocol version to every
//! request, and hands the built request to its [`Transport`]. Use
//! [`ClientBuilder`] to configure and create clients.

use std::sync::Arc;
use std::time::Duration;

use crate::{
    headers::HeaderList,
    normalize::{normalize, NormalizedResult},
    request::{Method, ProtocolVersion, RequestBuilder, DEFAULT_TIMEOUT},
    transport::{HttpTransport, LoggingTransport, Transport},
    Error, Request, RequestUrl, Response, Result,
};

/// A client for one question engine.
///
/// Cheap to clone; clones share the transport. Each call builds its own
/// [`Request`], so a client can be used from several tasks at once.
///
/// # Examples
///
/// ```no_run
/// use qengine_client::{Client, NormalizedResult};
/// use serde_json::json;
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), qengine_client::Error> {
/// let client = Client::builder()
///     .base_url("https://engine.example.com/api")?
///     .timeout(Duration::from_secs_f64(2.5))
///     .build()?;
///
/// let info = client.call(client.get("/info")).await?;
/// if let NormalizedResult::Decoded(value) = info {
///     println!("Engine: {}", value);
/// }
///
/// let started = client
///     .call(client.post("/session").json(json!({"questionID": "q1"}))?)
///     .await?;
/// println!("{:?}", started);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Client<T = HttpTransport> {
    inner: Arc<ClientInner<T>>,
}

#[derive(Debug)]
struct ClientInner<T> {
    transport: T,
    base_url: RequestUrl,
    default_headers: HeaderList,
    timeout: Duration,
    version: ProtocolVersion,
}

impl<T> Clone for Client<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl Client<HttpTransport> {
    /// Creates a new `ClientBuilder` for configuring a client.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }
}

impl<T: Transport> Client<T> {
    /// Starts a request for `path`, resolved against the base URL.
    ///
    /// A `?query` suffix on `path` becomes the request's query string.
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let (path, query) = match path.split_once('?') {
            Some((path, query)) => (path, query),
            None => (path, ""),
        };
        let mut url = self.inner.base_url.join_path(path);
        url.set_query(query);

        RequestBuilder::new(method, url)
            .headers(self.inner.default_headers.clone())
            .timeout(self.inner.timeout)
            .protocol_version(self.inner.version)
    }

    pub fn get(&self, path: &str) -> RequestBuilder {
        self.request(Method::Get, path)
    }

    pub fn post(&self, path: &str) -> RequestBuilder {
        self.request(Method::Post, path)
    }

    pub fn put(&self, path: &str) -> RequestBuilder {
        self.request(Method::Put, path)
    }

    pub fn delete(&self, path: &str) -> RequestBuilder {
        self.request(Method::Delete, path)
    }

    /// Builds and sends a request, returning the raw reply.
    ///
    /// # Errors
    ///
    /// Configuration errors from [`RequestBuilder::build`] are returned
    /// before any I/O; [`Error::Connection`] if the engine cannot be reached.
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response> {
        let request = builder.build()?;
        self.execute(&request).await
    }

    /// Sends an already built request.
    pub async fn execute(&self, request: &Request) -> Result<Response> {
        self.inner.transport.send(request).await
    }

    /// Builds and sends a request, then normalises the reply.
    pub async fn call(&self, builder: RequestBuilder) -> Result<NormalizedResult> {
        let response = self.send(builder).await?;
        Ok(normalize(&response))
    }

    pub fn base_url(&self) -> &RequestUrl {
        &self.inner.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.inner.timeout
    }

    pub fn transport(&self) -> &T {
        &self.inner.transport
    }
}

/// Builder for configuring and creating a [`Client`].
///
/// # Examples
///
/// ```no_run
/// use qengine_client::{ClientBuilder, ProtocolVersion};
/// use std::time::Duration;
///
/// # fn example() -> Result<(), qengine_client::Error> {
/// let client = ClientBuilder::new()
///     .base_url("https://engine.example.com/api")?
///     .timeout(Duration::from_secs(10))
///     .connect_timeout(Duration::from_secs(2))
///     .protocol_version(ProtocolVersion::Http10)
///     .default_header("Accept", "application/json")?
///     .build_with_logging()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ClientBuilder {
    base_url: Option<RequestUrl>,
    default_headers: HeaderList,
    timeout: Duration,
    connect_timeout: Option<Duration>,
    version: ProtocolVersion,
    accept_invalid_certs: bool,
}

impl ClientBuilder {
    /// Creates a new `ClientBuilder` with default settings.
    pub fn new() -> Self {
        Self {
            base_url: None,
            default_headers: HeaderList::new(),
            timeout: DEFAULT_TIMEOUT,
            connect_timeout: None,
            version: ProtocolVersion::default(),
            accept_invalid_certs: false,
        }
    }

    /// Sets the engine's base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is malformed or not http/https.
    pub fn base_url(mut self, url: impl AsRef<str>) -> Result<Self> {
        self.base_url = Some(RequestUrl::parse(url.as_ref())?);
        Ok(self)
    }

    /// Adds a header sent with every request.
    ///
    /// # Errors
    ///
    /// Returns an error if the header name or value is invalid.
    pub fn default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Result<Self> {
        let mut single = HeaderList::new();
        single.insert(name, value);
        single.validate()?;
        for (name, value) in single.iter() {
            self.default_headers.insert(name, value);
        }
        Ok(self)
    }

    /// Sets the per-request timeout covering connect, send and receive.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets a separate, usually shorter, connect timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    pub fn protocol_version(mut self, version: ProtocolVersion) -> Self {
        self.version = version;
        self
    }

    /// Skips TLS certificate verification.
    pub fn accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    /// Builds a client over [`HttpTransport`].
    ///
    /// # Errors
    ///
    /// Returns an error if no base URL was provided, the timeout is zero, or
    /// the HTTP client cannot be created.
    pub fn build(self) -> Result<Client<HttpTransport>> {
        let transport = self.http_transport()?;
        self.build_with_transport(transport)
    }

    /// Builds a client whose calls are logged by [`LoggingTransport`].
    pub fn build_with_logging(self) -> Result<Client<LoggingTransport<HttpTransport>>> {
        let transport = LoggingTransport::new(self.http_transport()?);
        self.build_with_transport(transport)
    }

    /// Builds a client over a caller-supplied transport.
    pub fn build_with_transport<T: Transport>(self, transport: T) -> Result<Client<T>> {
        let base_url = self
            .base_url
            .ok_or_else(|| Error::ConfigurationError("Base URL is required".to_string()))?;
        if self.timeout.is_zero() {
            return Err(Error::ConfigurationError(
                "Timeout must be greater than zero".to_string(),
            ));
        }

        Ok(Client {
            inner: Arc::new(ClientInner {
                transport,
                base_url,
                default_headers: self.default_headers,
                timeout: self.timeout,
                version: self.version,
            }),
        })
    }

    fn http_transport(&self) -> Result<HttpTransport> {
        let mut builder = HttpTransport::builder().accept_invalid_certs(self.accept_invalid_certs);
        if let Some(timeout) = self.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        builder.build()
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
