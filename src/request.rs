//! Request construction and validation.
//!
//! [`RequestBuilder`] gathers method, URL, headers, body and attachments and
//! turns them into an immutable [`Request`]. Building:
//!
//! 1. encodes the body together with any attachments;
//! 2. forces `Content-Type` to `multipart/form-data; boundary=...` when files
//!    are attached, or to `application/json` for a non-empty object body,
//!    overriding whatever the caller set;
//! 3. sets the fixed [`USER_AGENT`];
//! 4. runs [`Request::validate`] and logs each [`Warning`]. Warnings never
//!    stop the request from being built.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde_json::Value;

use crate::body::{Body, BodyPayload, FileAttachment};
use crate::headers::HeaderList;
use crate::url::{RequestUrl, Scheme};
use crate::{Error, Result};

/// User agent sent with every request.
pub const USER_AGENT: &str = concat!("qengine-client/", env!("CARGO_PKG_VERSION"));

/// Timeout applied when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Supported HTTP methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Head,
    Options,
    Patch,
    Post,
    Put,
    Delete,
    Trace,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Options => "OPTIONS",
            Method::Patch => "PATCH",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Trace => "TRACE",
        }
    }

    pub fn to_http(self) -> http::Method {
        match self {
            Method::Get => http::Method::GET,
            Method::Head => http::Method::HEAD,
            Method::Options => http::Method::OPTIONS,
            Method::Patch => http::Method::PATCH,
            Method::Post => http::Method::POST,
            Method::Put => http::Method::PUT,
            Method::Delete => http::Method::DELETE,
            Method::Trace => http::Method::TRACE,
        }
    }

    fn discourages_body(self) -> bool {
        matches!(self, Method::Get | Method::Head | Method::Delete)
    }

    fn discourages_query(self) -> bool {
        matches!(self, Method::Post | Method::Put | Method::Delete)
    }
}

impl FromStr for Method {
    type Err = Error;

    /// Parses a method name, ignoring case.
    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Method::Get),
            "HEAD" => Ok(Method::Head),
            "OPTIONS" => Ok(Method::Options),
            "PATCH" => Ok(Method::Patch),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "DELETE" => Ok(Method::Delete),
            "TRACE" => Ok(Method::Trace),
            _ => Err(Error::UnsupportedMethod(s.to_string())),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// HTTP protocol version used on the request line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProtocolVersion {
    Http10,
    #[default]
    Http11,
}

impl ProtocolVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProtocolVersion::Http10 => "1.0",
            ProtocolVersion::Http11 => "1.1",
        }
    }

    pub fn to_http(self) -> http::Version {
        match self {
            ProtocolVersion::Http10 => http::Version::HTTP_10,
            ProtocolVersion::Http11 => http::Version::HTTP_11,
        }
    }
}

impl FromStr for ProtocolVersion {
    type Err = Error;

    /// Accepts `1`, `1.0`, `1.1`, with or without an `http/` prefix.
    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "1" | "1.0" | "http/1" | "http/1.0" => Ok(ProtocolVersion::Http10),
            "1.1" | "http/1.1" => Ok(ProtocolVersion::Http11),
            _ => Err(Error::UnsupportedProtocolVersion(s.to_string())),
        }
    }
}

/// Non-fatal problems found while validating a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// A body is sent with GET, HEAD or DELETE.
    BodyWithBodilessMethod(Method),
    /// A query string is sent with POST, PUT or DELETE.
    QueryWithBodyMethod(Method),
    /// A password is sent in the URL over plain HTTP.
    CredentialsOverPlaintext,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::BodyWithBodilessMethod(method) => {
                write!(f, "indeterminate request, {} should not carry body content", method)
            }
            Warning::QueryWithBodyMethod(method) => {
                write!(f, "indeterminate request, {} should not carry a query string", method)
            }
            Warning::CredentialsOverPlaintext => {
                write!(f, "insecure request, credentials should not be sent over http")
            }
        }
    }
}

/// A fully built request, consumed by a [`Transport`](crate::Transport).
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub url: RequestUrl,
    pub headers: HeaderList,
    pub body: BodyPayload,
    pub timeout: Duration,
    pub version: ProtocolVersion,
    /// Warnings raised while the request was built.
    pub warnings: Vec<Warning>,
    allow_insecure_credentials: bool,
}

impl Request {
    /// Starts building a request.
    pub fn builder(method: Method, url: RequestUrl) -> RequestBuilder {
        RequestBuilder::new(method, url)
    }

    /// Checks the request against the lenient method policy.
    pub fn validate(&self) -> Vec<Warning> {
        let mut warnings = Vec::new();
        if !self.body.is_empty() && self.method.discourages_body() {
            warnings.push(Warning::BodyWithBodilessMethod(self.method));
        }
        if self.url.query().is_some() && self.method.discourages_query() {
            warnings.push(Warning::QueryWithBodyMethod(self.method));
        }
        if self.url.scheme() == Scheme::Http
            && self.url.pass().is_some()
            && !self.allow_insecure_credentials
        {
            warnings.push(Warning::CredentialsOverPlaintext);
        }
        warnings
    }

    /// Returns the encoded body.
    pub fn body_bytes(&self) -> Result<Vec<u8>> {
        self.body.to_bytes()
    }

    /// Renders the request as it appears on the wire.
    ///
    /// ```text
    /// METHOD path[?query] HTTP/1.x\r\n
    /// Name: Value\r\n
    /// \r\n
    /// body
    /// ```
    pub fn to_wire(&self) -> Result<Vec<u8>> {
        let mut out = format!(
            "{} {} HTTP/{}\r\n",
            self.method,
            self.url.request_target(),
            self.version.as_str()
        )
        .into_bytes();
        out.extend_from_slice(self.headers.render().as_bytes());
        out.extend_from_slice(b"\r\n");
        out.extend_from_slice(&self.body_bytes()?);
        Ok(out)
    }
}

/// Builder for [`Request`].
///
/// # Examples
///
/// ```
/// use qengine_client::{Method, Request, RequestUrl};
/// use serde_json::json;
///
/// let url = RequestUrl::parse("http://localhost:8080/api/session").unwrap();
/// let request = Request::builder(Method::Post, url)
///     .header("Content-Type", "text/plain")
///     .json(json!({"questionID": "q1", "questionVersion": "1.0"}))
///     .unwrap()
///     .build()
///     .unwrap();
///
/// assert_eq!(request.headers.get("content-type"), Some("application/json"));
/// assert!(request.warnings.is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    method: Method,
    url: RequestUrl,
    headers: HeaderList,
    body: Body,
    files: Vec<FileAttachment>,
    timeout: Duration,
    version: ProtocolVersion,
    allow_insecure_credentials: bool,
}

impl RequestBuilder {
    pub fn new(method: Method, url: RequestUrl) -> Self {
        Self {
            method,
            url,
            headers: HeaderList::new(),
            body: Body::Empty,
            files: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
            version: ProtocolVersion::default(),
            allow_insecure_credentials: false,
        }
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Sets a header, replacing one with the same name.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Adds a header from a raw `"Name: value"` line.
    pub fn header_line(mut self, line: &str) -> Result<Self> {
        self.headers.insert_line(line)?;
        Ok(self)
    }

    /// Replaces all headers.
    pub fn headers(mut self, headers: HeaderList) -> Self {
        self.headers = headers;
        self
    }

    pub fn body(mut self, body: Body) -> Self {
        self.body = body;
        self
    }

    /// Sets the body from a JSON value (object, string or null).
    pub fn json(mut self, value: Value) -> Result<Self> {
        self.body = Body::from_value(value)?;
        Ok(self)
    }

    /// Sets the body from a JSON object string or a `key=value&...` string.
    pub fn body_str(mut self, input: &str) -> Result<Self> {
        self.body = Body::parse(input)?;
        Ok(self)
    }

    /// Sets a pre-serialised body that is sent untouched.
    pub fn raw_body(mut self, raw: impl Into<String>) -> Self {
        self.body = Body::Raw(raw.into());
        self
    }

    pub fn file(mut self, file: FileAttachment) -> Self {
        self.files.push(file);
        self
    }

    pub fn files(mut self, files: impl IntoIterator<Item = FileAttachment>) -> Self {
        self.files.extend(files);
        self
    }

    /// Sets the URL query string (without `?`).
    pub fn query(mut self, query: impl Into<String>) -> Self {
        self.url.set_query(query);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn protocol_version(mut self, version: ProtocolVersion) -> Self {
        self.version = version;
        self
    }

    /// Sets a basic `Authorization` header.
    pub fn basic_auth(mut self, user: &str, pass: &str) -> Self {
        self.headers.set_authentication(user, pass, "Basic");
        self
    }

    /// Drops the `Authorization` header and any URL credentials.
    pub fn remove_authentication(mut self) -> Self {
        self.headers.remove_authentication();
        self.url.clear_credentials();
        self
    }

    /// Silences the credentials-over-http warning for this request.
    pub fn allow_insecure_credentials(mut self, allow: bool) -> Self {
        self.allow_insecure_credentials = allow;
        self
    }

    /// Builds the request.
    ///
    /// # Errors
    ///
    /// Fails without touching the network if an attachment cannot be read,
    /// the body cannot be serialised or a header is not valid on the wire.
    pub fn build(self) -> Result<Request> {
        let body = BodyPayload::new(self.body, &self.files)?;

        let mut headers = self.headers;
        if let Some(content_type) = body.content_type() {
            headers.insert("Content-Type", content_type);
        }
        headers.insert("User-Agent", USER_AGENT);
        headers.validate()?;

        let mut request = Request {
            method: self.method,
            url: self.url,
            headers,
            body,
            timeout: self.timeout,
            version: self.version,
            warnings: Vec::new(),
            allow_insecure_credentials: self.allow_insecure_credentials,
        };

        request.warnings = request.validate();
        for warning in &request.warnings {
            tracing::warn!(
                method = %request.method,
                url = %request.url,
                "{}",
                warning
            );
        }

        tracing::debug!(
            method = %request.method,
            url = %request.url,
            headers = request.headers.len(),
            "Built request"
        );

        Ok(request)
    }
}
