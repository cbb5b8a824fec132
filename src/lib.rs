//! # qengine-client - An HTTP client for remote question engines
//!
//! qengine-client builds, encodes and sends HTTP requests to a remote
//! question engine and turns the replies into something a caller can branch
//! on. It is built on top of `reqwest`, and every piece of request
//! construction (URL, headers, body, multipart attachments) is exposed so
//! requests can be inspected or sent over another [`Transport`].
//!
//! ## Quick Start
//!
//! ```no_run
//! use qengine_client::{Client, NormalizedResult};
//! use serde_json::json;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), qengine_client::Error> {
//!     let client = Client::builder()
//!         .base_url("https://engine.example.com/api")?
//!         .timeout(Duration::from_secs(5))
//!         .build()?;
//!
//!     // Engine status
//!     match client.call(client.get("/info?passKey=secret")).await? {
//!         NormalizedResult::Decoded(info) => println!("Engine: {}", info),
//!         NormalizedResult::Error { status, raw_body } => {
//!             eprintln!("Engine replied {} with {}", status, raw_body)
//!         }
//!     }
//!
//!     // Start a session
//!     let session = client
//!         .call(client.post("/session").json(json!({
//!             "questionID": "mu120.module5",
//!             "questionVersion": "1.2",
//!         }))?)
//!         .await?;
//!     println!("{}", session.into_value());
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Component URLs** - Parse, edit and reassemble URLs one component at a time
//! - **Ordered headers** - Case-insensitive header list with raw `Name: value` lines and basic auth
//! - **Body encoding** - JSON, pre-serialised strings, or `multipart/form-data` with file attachments
//! - **MIME lookup** - Extension table with content sniffing as a fallback
//! - **Lenient validation** - Odd method/body combinations are logged as warnings, not rejected
//! - **Response normalisation** - Non-JSON replies become a structured error carrying status and body
//! - **Question engine endpoints** - Typed calls for info, question metadata and sessions
//! - **Logging** - Structured logging with `tracing`
//!
//! ## Building Requests
//!
//! Requests can be built and inspected without a client:
//!
//! ```
//! use qengine_client::{FileAttachment, Method, Request, RequestUrl};
//!
//! let url = RequestUrl::parse("http://localhost:8080/api/question/bank/q1/1.0").unwrap();
//! let request = Request::builder(Method::Post, url)
//!     .body_str("questionFile=q1.xml&passKey=abc")
//!     .unwrap()
//!     .file(FileAttachment::from_bytes("q1.xml", "<question/>"))
//!     .build()
//!     .unwrap();
//!
//! let content_type = request.headers.get("content-type").unwrap();
//! assert!(content_type.starts_with("multipart/form-data; boundary="));
//! ```
//!
//! ## Error Handling
//!
//! Errors raised while building a request are reported before any network
//! I/O; HTTP error statuses are ordinary responses:
//!
//! ```no_run
//! use qengine_client::{Client, ConnectionFailure, Error};
//!
//! # async fn example() -> Result<(), Error> {
//! # let client = Client::builder().base_url("https://engine.example.com/api")?.build()?;
//! match client.send(client.get("/info")).await {
//!     Ok(response) if !response.is_success() => {
//!         eprintln!("{}: {}", response.status_line, response.body);
//!     }
//!     Ok(response) => println!("{}", response.body),
//!     Err(Error::Connection { kind: ConnectionFailure::Timeout, .. }) => {
//!         eprintln!("Engine did not answer in time");
//!     }
//!     Err(e) if e.is_configuration() => eprintln!("Bad request: {}", e),
//!     Err(e) => eprintln!("Engine unreachable: {}", e),
//! }
//! # Ok(())
//! # }
//! ```

mod body;
mod client;
mod config;
mod engine;
mod error;
mod headers;
pub mod mime;
mod normalize;
mod request;
mod response;
mod soap;
mod transport;
mod url;

pub use body::{
    encode, parse_body_input, AttachmentSource, Body, BodyPayload, FileAttachment, FilePart,
    Multipart,
};
pub use client::{Client, ClientBuilder};
pub use config::EngineConfig;
pub use engine::{QuestionEngine, StartSession};
pub use error::{ConnectionFailure, Error, Result};
pub use headers::{Credentials, HeaderList};
pub use normalize::{normalize, NormalizedResult};
pub use request::{
    Method, ProtocolVersion, Request, RequestBuilder, Warning, DEFAULT_TIMEOUT, USER_AGENT,
};
pub use response::Response;
pub use soap::SoapCall;
pub use transport::{HttpTransport, HttpTransportBuilder, LoggingTransport, Transport};
pub use self::url::{RequestUrl, Scheme};
