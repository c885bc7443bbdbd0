use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use url::Url;

#[derive(Debug, Clone)]
pub struct ApiClientConfig {
    pub base_url: Url,
    pub timeout: Duration,
    pub user_agent: String,
}

impl ApiClientConfig {
    pub fn try_from_url(url: &str) -> Result<Self, ApiError> {
        let base_url = Url::parse(url)?;
        Ok(Self::new(base_url))
    }

    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            timeout: Duration::from_secs(15),
            user_agent: format!("dcpu-ide-panels/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Expected shape of a response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    Json,
    #[default]
    Markup,
    /// Init scripts travel as JSON step lists.
    Script,
}

/// Describes one fetch: where, what format, and whether caches may answer it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub path: String,
    pub format: Format,
    pub refresh: bool,
}

impl Request {
    pub fn new(path: impl Into<String>, format: Format) -> Self {
        Self {
            path: path.into(),
            format,
            refresh: false,
        }
    }

    pub fn json(path: impl Into<String>) -> Self {
        Self::new(path, Format::Json)
    }

    pub fn markup(path: impl Into<String>) -> Self {
        Self::new(path, Format::Markup)
    }

    pub fn script(path: impl Into<String>) -> Self {
        Self::new(path, Format::Script)
    }

    pub fn refreshed(mut self) -> Self {
        self.refresh = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Json(Value),
    Markup(String),
}

impl Payload {
    pub fn into_markup(self) -> String {
        match self {
            Payload::Markup(text) => text,
            Payload::Json(value) => value.to_string(),
        }
    }
}

/// Fetches resources for the panels. Blocking callers drive the future with
/// their runtime's `block_on`.
#[async_trait]
pub trait RequestClient: Send + Sync {
    async fn request(&self, request: &Request) -> Result<Payload, ApiError>;
}

#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    config: ApiClientConfig,
}

impl HttpClient {
    pub fn new(config: ApiClientConfig) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(ApiError::Request)?;

        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> Result<Url, ApiError> {
        self.config.base_url.join(path).map_err(ApiError::from)
    }

    pub async fn fetch(&self, request: &Request) -> Result<Payload, ApiError> {
        let url = self.url(&request.path)?;
        let mut builder = self.client.get(url);
        if request.refresh {
            builder = builder
                .header(header::CACHE_CONTROL, "no-cache")
                .header(header::PRAGMA, "no-cache");
        }

        let response = builder.send().await.map_err(ApiError::Request)?;
        let status = response.status();
        let body = response.text().await.map_err(ApiError::Request)?;

        if !status.is_success() {
            return Err(ApiError::HttpStatus { status, body });
        }

        match request.format {
            Format::Markup => Ok(Payload::Markup(body)),
            Format::Json | Format::Script => serde_json::from_str(&body)
                .map(Payload::Json)
                .map_err(|source| ApiError::Deserialize { source, body }),
        }
    }
}

#[async_trait]
impl RequestClient for HttpClient {
    async fn request(&self, request: &Request) -> Result<Payload, ApiError> {
        self.fetch(request).await
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),
    #[error("HTTP {status}: {body}")]
    HttpStatus { status: StatusCode, body: String },
    #[error("failed to deserialize response: {source}")]
    Deserialize {
        source: serde_json::Error,
        body: String,
    },
}

impl ApiError {
    /// HTTP status of the failed exchange, when the server answered at all.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::HttpStatus { status, .. } => Some(*status),
            ApiError::Request(err) => err.status(),
            _ => None,
        }
    }
}
