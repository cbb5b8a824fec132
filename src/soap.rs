//! SOAP over HTTP.
//!
//! Only the transport half: the caller supplies a complete envelope and gets
//! the raw reply body back, whatever the status. Building and parsing
//! envelopes is out of scope.

use std::time::Duration;

use crate::{
    client::Client,
    request::{Method, Request},
    transport::Transport,
    RequestUrl, Result,
};

/// One SOAP call: endpoint, optional action and a pre-built envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct SoapCall {
    pub location: RequestUrl,
    pub action: Option<String>,
    pub envelope: String,
}

impl SoapCall {
    pub fn new(location: RequestUrl, envelope: impl Into<String>) -> Self {
        Self {
            location,
            action: None,
            envelope: envelope.into(),
        }
    }

    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    /// Builds the POST carrying the envelope.
    ///
    /// `SOAPAction` is the literal `none` when no action is set; some engines
    /// reject requests without the header.
    pub fn to_request(&self, timeout: Duration) -> Result<Request> {
        let action = self
            .action
            .as_deref()
            .filter(|a| !a.is_empty())
            .unwrap_or("none");
        Request::builder(Method::Post, self.location.clone())
            .header("Content-Type", "text/xml")
            .header("SOAPAction", action)
            .raw_body(self.envelope.clone())
            .timeout(timeout)
            .build()
    }

    /// Sends the call over `transport` and returns the raw reply body.
    pub async fn send<T: Transport>(&self, transport: &T, timeout: Duration) -> Result<String> {
        let request = self.to_request(timeout)?;
        let response = transport.send(&request).await?;
        Ok(response.body)
    }
}

impl<T: Transport> Client<T> {
    /// Sends a SOAP call with this client's timeout.
    pub async fn soap(&self, call: &SoapCall) -> Result<String> {
        call.send(self.transport(), self.timeout()).await
    }
}
