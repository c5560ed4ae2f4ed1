use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use url::Url;

use crate::config::AppConfig;

/// Shared transport handle for every backend API: base endpoint, project
/// header, and the active session secret (set on sign-in, cleared on
/// sign-out). Cheap to clone; all clones share the session slot.
#[derive(Clone)]
pub struct Connection {
    client: reqwest::Client,
    base: Url,
    project_id: String,
    session: Arc<RwLock<Option<String>>>,
}

impl Connection {
    pub fn new(config: &AppConfig) -> Result<Self, BackendError> {
        let base = Url::parse(&config.endpoint)
            .map_err(|err| BackendError::config(format!("invalid endpoint: {}", err)))?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_seconds))
            .build()
            .map_err(BackendError::Transport)?;

        Ok(Self {
            client,
            base,
            project_id: config.project_id.clone(),
            session: Arc::new(RwLock::new(None)),
        })
    }

    /// Absolute URL for an API path ("/v1/...").
    pub fn url_for(&self, path: &str) -> Url {
        let mut url = self.base.clone();
        url.set_path(path);
        url.set_query(None);
        url
    }

    pub fn set_session(&self, secret: Option<String>) {
        *self.session.write().expect("session slot poisoned") = secret;
    }

    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let mut builder = self
            .client
            .request(method, self.url_for(path))
            .header("X-Project", &self.project_id);
        if let Some(secret) = self.session.read().expect("session slot poisoned").as_ref() {
            builder = builder.header("X-Session", secret);
        }
        builder
    }

    pub async fn recv_json<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
    ) -> Result<T, BackendError> {
        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::from_response(status, response.text().await.ok()));
        }
        response.json::<T>().await.map_err(BackendError::Transport)
    }

    pub async fn recv_unit(&self, builder: RequestBuilder) -> Result<(), BackendError> {
        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::from_response(status, response.text().await.ok()));
        }
        Ok(())
    }
}

/// Failure at the backend boundary: either the transport broke, or the
/// API answered with a non-success status.
#[derive(Debug)]
pub enum BackendError {
    Transport(reqwest::Error),
    Api { status: StatusCode, message: String },
    Config(String),
}

impl BackendError {
    fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    fn from_response(status: StatusCode, body: Option<String>) -> Self {
        let message = body
            .as_deref()
            .and_then(|text| serde_json::from_str::<serde_json::Value>(text).ok())
            .and_then(|value| value["error"].as_str().map(str::to_string))
            .unwrap_or_else(|| status.to_string());
        Self::Api { status, message }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Api { status, .. } if *status == StatusCode::NOT_FOUND)
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Api { status, .. } if *status == StatusCode::UNAUTHORIZED)
    }
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport(err) => write!(f, "transport error: {}", err),
            Self::Api { status, message } => write!(f, "backend error {}: {}", status, message),
            Self::Config(message) => write!(f, "config error: {}", message),
        }
    }
}

impl std::error::Error for BackendError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Transport(err) => Some(err),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err)
    }
}
