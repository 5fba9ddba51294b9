//! GraphQL query executor
//!
//! This module handles every request the crawler sends to the remote API:
//! - Building the HTTP client with user agent and timeouts
//! - POSTing `{query, variables}` with bearer authentication
//! - Classifying transport failures, non-success statuses and GraphQL error lists
//! - Handing back the raw `data` payload for lazy decoding

use crate::config::CrawlConfig;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Errors from a single remote query
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("Request timed out: {0}")]
    Timeout(#[source] reqwest::Error),

    #[error("Transport error: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("GraphQL errors: {}", format_errors(.0))]
    GraphQl(Vec<GraphQlError>),

    #[error("Response contains no data")]
    MissingData,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl From<reqwest::Error> for QueryError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout(e)
        } else {
            Self::Transport(e)
        }
    }
}

fn format_errors(errors: &[GraphQlError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Named query variables
///
/// Backed by a sorted map, so two sets built in different orders compare
/// and serialize identically.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Variables(BTreeMap<String, Value>);

impl Variables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a variable, builder style
    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: &str, value: impl Into<Value>) {
        self.0.insert(name.to_string(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Returns the variables as a JSON object
    pub fn to_value(&self) -> Value {
        Value::Object(
            self.0
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )
    }
}

/// An undecoded response payload
///
/// Holds the exact JSON text of the response's `data` member. Stages decode
/// it into the shape they need with [`RawPayload::decode`].
#[derive(Debug, Clone)]
pub struct RawPayload(Box<RawValue>);

impl RawPayload {
    pub fn from_raw(raw: Box<RawValue>) -> Self {
        Self(raw)
    }

    /// Validates and wraps a JSON document
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        RawValue::from_string(json.to_string()).map(Self)
    }

    pub fn as_raw(&self) -> &RawValue {
        &self.0
    }

    pub fn as_str(&self) -> &str {
        self.0.get()
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.get().as_bytes()
    }

    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_str(self.0.get())
    }
}

impl PartialEq for RawPayload {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

/// Request body sent to the endpoint
#[derive(Debug, Serialize)]
struct GraphQlRequest<'a> {
    query: &'a str,
    variables: &'a Variables,
}

/// Response envelope returned by the endpoint
#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    #[serde(default)]
    data: Option<Box<RawValue>>,
    #[serde(default)]
    errors: Option<Vec<GraphQlError>>,
}

/// One entry of a GraphQL error list
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GraphQlError {
    pub message: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub path: Option<Vec<Value>>,
    #[serde(default)]
    pub locations: Option<Vec<ErrorLocation>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ErrorLocation {
    pub line: u32,
    pub column: u32,
}

impl fmt::Display for GraphQlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            Some(kind) => write!(f, "{} ({})", self.message, kind),
            None => f.write_str(&self.message),
        }
    }
}

/// Issues a single logical query against the remote API
#[allow(async_fn_in_trait)]
pub trait QueryExecutor {
    /// Executes `query` with `variables` and returns the raw `data` payload
    async fn execute(&self, query: &str, variables: &Variables) -> Result<RawPayload, QueryError>;
}

/// Builds an HTTP client with proper configuration
///
/// # Example
///
/// ```no_run
/// use stargraph::crawler::build_http_client;
/// use std::time::Duration;
///
/// let client = build_http_client("stargraph/0.1", Duration::from_secs(30)).unwrap();
/// ```
pub fn build_http_client(user_agent: &str, timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// GraphQL executor over HTTP
#[derive(Debug, Clone)]
pub struct GraphQlClient {
    client: Client,
    endpoint: String,
    token: String,
}

impl GraphQlClient {
    pub fn new(config: &CrawlConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(&config.user_agent, config.timeout)?,
            endpoint: config.endpoint.clone(),
            token: config.token.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl QueryExecutor for GraphQlClient {
    async fn execute(&self, query: &str, variables: &Variables) -> Result<RawPayload, QueryError> {
        let request = GraphQlRequest { query, variables };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.token)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            return Err(QueryError::Status {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        decode_response(&body)
    }
}

/// Splits a response envelope into its payload or a failure
///
/// A non-empty error list fails the call even when `data` is present.
pub fn decode_response(body: &[u8]) -> Result<RawPayload, QueryError> {
    let envelope: GraphQlResponse = serde_json::from_slice(body)?;

    if let Some(errors) = envelope.errors.filter(|errors| !errors.is_empty()) {
        tracing::debug!("GraphQL errors: {:?}", errors);
        return Err(QueryError::GraphQl(errors));
    }

    envelope
        .data
        .map(RawPayload::from_raw)
        .ok_or(QueryError::MissingData)
}

fn truncate_body(body: &[u8]) -> String {
    const LIMIT: usize = 512;
    let text = String::from_utf8_lossy(body);
    match text.char_indices().nth(LIMIT) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.into_owned(),
    }
}
