//! Engine definitions.
//!
//! An [`EngineConfig`] describes one question engine as an administrator
//! configures it: a pool of equivalent engine URLs, optional question bank
//! URLs, the per-request timeout and the shared passkey salt.

use std::time::Duration;

use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

fn default_timeout() -> f64 {
    5.0
}

/// Configuration of one question engine.
///
/// # Examples
///
/// ```
/// use qengine_client::EngineConfig;
/// use std::time::Duration;
///
/// let mut config = EngineConfig::from_json(r#"{
///     "question_engines": ["http://engine-a.local/api", "http://engine-b.local/api"],
///     "question_banks": ["http://bank.local/questions"],
///     "timeout": 2.5
/// }"#).unwrap();
///
/// assert_eq!(config.timeout().unwrap(), Duration::from_millis(2500));
/// let url = config.choose_url().unwrap();
/// assert_eq!(config.url_used.as_deref(), Some(url.as_str()));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Equivalent engine URLs; one is picked per connection.
    pub question_engines: Vec<String>,

    /// Question bank URLs passed to the engine as the question base URL.
    #[serde(default)]
    pub question_banks: Vec<String>,

    /// Per-request timeout in seconds. Fractions are allowed.
    #[serde(default = "default_timeout")]
    pub timeout: f64,

    /// Shared secret used by the caller to derive pass keys.
    #[serde(default)]
    pub passkey: Option<String>,

    /// Engine URL chosen by an earlier connection, reused when set.
    #[serde(default)]
    pub url_used: Option<String>,
}

impl EngineConfig {
    /// Creates a configuration with a single engine URL and defaults.
    pub fn new(engine_url: impl Into<String>) -> Self {
        Self {
            question_engines: vec![engine_url.into()],
            question_banks: Vec::new(),
            timeout: default_timeout(),
            passkey: None,
            url_used: None,
        }
    }

    /// Parses a configuration from JSON.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text)
            .map_err(|e| Error::ConfigurationError(format!("Invalid engine configuration: {}", e)))
    }

    /// Returns the timeout as a `Duration`.
    ///
    /// # Errors
    ///
    /// Returns an error unless the timeout is a positive, finite number.
    pub fn timeout(&self) -> Result<Duration> {
        if self.timeout.is_nan() || self.timeout <= 0.0 {
            return Err(Error::ConfigurationError(format!(
                "Timeout must be a positive number of seconds, got {}",
                self.timeout
            )));
        }
        Duration::try_from_secs_f64(self.timeout)
            .map_err(|e| Error::ConfigurationError(format!("Invalid timeout: {}", e)))
    }

    /// Returns the engine URL to use, picking one at random on first use.
    ///
    /// The choice is remembered in `url_used` so later connections stick to
    /// the same engine.
    pub fn choose_url(&mut self) -> Result<String> {
        if let Some(url) = self.url_used.as_ref().filter(|u| !u.is_empty()) {
            return Ok(url.clone());
        }
        let url = self
            .question_engines
            .choose(&mut rand::thread_rng())
            .cloned()
            .ok_or_else(|| Error::ConfigurationError("No question engine URL configured".to_string()))?;
        self.url_used = Some(url.clone());
        Ok(url)
    }
}
