//! REST question engine endpoints.
//!
//! [`QuestionEngine`] issues the engine's REST calls and normalises every
//! reply. A reply that is not JSON (an unsupported endpoint, a proxy error
//! page) comes back as [`NormalizedResult::Error`] rather than an `Err`.
//!
//! | call                      | request                                   |
//! |---------------------------|-------------------------------------------|
//! | [`get_engine_info`]       | `GET /info[?passKey=]`                    |
//! | [`get_question_metadata`] | `GET /question/{bank}/{id}/{version}`     |
//! | [`post_question_file`]    | `POST /question/{bank}/{id}/{version}`    |
//! | [`start`]                 | `POST /session`                           |
//! | [`process`]               | `POST /session/{id}`                      |
//! | [`stop`]                  | `DELETE /session/{id}[?passKey=]`         |
//!
//! [`get_engine_info`]: QuestionEngine::get_engine_info
//! [`get_question_metadata`]: QuestionEngine::get_question_metadata
//! [`post_question_file`]: QuestionEngine::post_question_file
//! [`start`]: QuestionEngine::start
//! [`process`]: QuestionEngine::process
//! [`stop`]: QuestionEngine::stop

use rand::seq::SliceRandom;
use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::{
    client::{Client, ClientBuilder},
    config::EngineConfig,
    normalize::NormalizedResult,
    request::RequestBuilder,
    transport::{HttpTransport, Transport},
    Body, Result,
};

/// Body of `POST /session`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StartSession {
    #[serde(rename = "questionID")]
    pub question_id: String,
    #[serde(rename = "questionVersion")]
    pub question_version: String,
    /// Left empty to use a random configured question bank.
    #[serde(rename = "questionBaseURL")]
    pub question_base_url: String,
    #[serde(rename = "initialParamNames")]
    pub initial_param_names: Vec<String>,
    #[serde(rename = "initialParamValues")]
    pub initial_param_values: Vec<String>,
    #[serde(rename = "cachedResources")]
    pub cached_resources: Vec<String>,
}

impl StartSession {
    pub fn new(question_id: impl Into<String>, question_version: impl Into<String>) -> Self {
        Self {
            question_id: question_id.into(),
            question_version: question_version.into(),
            ..Self::default()
        }
    }

    /// Adds an initial parameter, keeping names and values aligned.
    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.initial_param_names.push(name.into());
        self.initial_param_values.push(value.into());
        self
    }
}

/// Client for one REST question engine.
///
/// # Examples
///
/// ```no_run
/// use qengine_client::{EngineConfig, QuestionEngine, StartSession};
///
/// # async fn example() -> Result<(), qengine_client::Error> {
/// let mut config = EngineConfig::new("https://engine.example.com/api");
/// config.question_banks.push("https://bank.example.com/".to_string());
/// let engine = QuestionEngine::connect(&mut config)?;
///
/// let session = engine
///     .start(StartSession::new("mu120.module5", "1.2").param("randomseed", "42"))
///     .await?;
/// println!("{}", session.into_value());
/// # Ok(())
/// # }
/// ```
pub struct QuestionEngine<T = HttpTransport> {
    client: Client<T>,
    question_banks: Vec<String>,
}

impl QuestionEngine<HttpTransport> {
    /// Connects to the engine described by `config`.
    ///
    /// Picks (and records in `config.url_used`) the engine URL and applies
    /// the configured timeout.
    pub fn connect(config: &mut EngineConfig) -> Result<Self> {
        let url = config.choose_url()?;
        let client = ClientBuilder::new()
            .base_url(&url)?
            .timeout(config.timeout()?)
            .build()?;
        tracing::debug!(url = %url, "Connected to question engine");
        Ok(Self::with_client(client, config.question_banks.clone()))
    }
}

impl<T: Transport> QuestionEngine<T> {
    pub fn with_client(client: Client<T>, question_banks: Vec<String>) -> Self {
        Self {
            client,
            question_banks,
        }
    }

    pub fn client(&self) -> &Client<T> {
        &self.client
    }

    /// `GET /info`: engine status and capabilities.
    pub async fn get_engine_info(&self, pass_key: Option<&str>) -> Result<NormalizedResult> {
        let builder = with_pass_key(self.client.get("/info"), pass_key);
        self.client.call(builder).await
    }

    /// `GET /question/{bank}/{id}/{version}`: question metadata.
    pub async fn get_question_metadata(
        &self,
        remote_id: &str,
        remote_version: &str,
        pass_key: Option<&str>,
    ) -> Result<NormalizedResult> {
        let path = self.question_path(remote_id, remote_version);
        let builder = with_pass_key(self.client.get(&path), pass_key);
        self.client.call(builder).await
    }

    /// `POST /question/{bank}/{id}/{version}`: uploads a question definition.
    ///
    /// The pass key travels in the body rather than the query string.
    pub async fn post_question_file(
        &self,
        question_file: &str,
        remote_id: &str,
        remote_version: &str,
        pass_key: Option<&str>,
    ) -> Result<NormalizedResult> {
        let mut fields = Map::new();
        fields.insert("questionFile".to_string(), Value::String(question_file.to_string()));
        if let Some(pk) = pass_key.filter(|pk| !pk.is_empty()) {
            fields.insert("passKey".to_string(), Value::String(pk.to_string()));
        }

        let path = self.question_path(remote_id, remote_version);
        let builder = self.client.post(&path).body(Body::from(fields));
        self.client.call(builder).await
    }

    /// `POST /session`: starts a question session.
    pub async fn start(&self, mut session: StartSession) -> Result<NormalizedResult> {
        if session.question_base_url.is_empty() {
            session.question_base_url = self.question_base_url();
        }
        let value = serde_json::to_value(&session)
            .map_err(|e| crate::Error::SerializationFailed(e.to_string()))?;
        let builder = self.client.post("/session").json(value)?;
        self.client.call(builder).await
    }

    /// `POST /session/{id}`: submits responses to a running session.
    pub async fn process(
        &self,
        session_id: &str,
        names: &[String],
        values: &[String],
    ) -> Result<NormalizedResult> {
        let builder = self
            .client
            .post(&format!("/session/{}", session_id))
            .json(json!({ "names": names, "values": values }))?;
        self.client.call(builder).await
    }

    /// `DELETE /session/{id}`: ends a session. Engines usually reply with an
    /// empty body, which normalises to an error result carrying the status.
    pub async fn stop(&self, session_id: &str, pass_key: Option<&str>) -> Result<NormalizedResult> {
        let builder = with_pass_key(
            self.client.delete(&format!("/session/{}", session_id)),
            pass_key,
        );
        self.client.call(builder).await
    }

    fn question_path(&self, remote_id: &str, remote_version: &str) -> String {
        format!(
            "/question/{}/{}/{}",
            self.question_base_url(),
            remote_id,
            remote_version
        )
    }

    /// A random configured question bank, or the empty string.
    fn question_base_url(&self) -> String {
        self.question_banks
            .choose(&mut rand::thread_rng())
            .cloned()
            .unwrap_or_default()
    }
}

fn with_pass_key(builder: RequestBuilder, pass_key: Option<&str>) -> RequestBuilder {
    match pass_key.filter(|pk| !pk.is_empty()) {
        Some(pk) => builder.query(format!("passKey={}", pk)),
        None => builder,
    }
}
