pub mod auth;
pub mod params;
pub mod school_years;
pub mod tenants;
pub mod waitlist;

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::domain::FieldError;
use crate::session::SessionHandle;

pub use params::QueryParams;

/// Default per-request timeout; no individual operation defines its own.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Tagged error constructed once at the transport boundary and consumed
/// uniformly everywhere else.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{message}")]
    Validation {
        message: String,
        field_errors: Vec<FieldError>,
    },
    #[error("network error: {0}")]
    Transport(String),
    #[error("authentication rejected with status {status}")]
    Auth { status: u16 },
    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },
}

impl ApiError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Auth { status: 401 })
    }

    pub fn is_forbidden(&self) -> bool {
        matches!(self, Self::Auth { status: 403 })
    }

    /// Message surfaced in a transient notice: the server's own words when it
    /// provided any, otherwise a distinct fallback per failure class.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation { message, .. } => message.clone(),
            Self::Transport(_) => {
                "Network unreachable. Check your connection and try again.".to_string()
            }
            Self::Auth { status: 401 } => {
                "Your session has expired. Please sign in again.".to_string()
            }
            Self::Auth { .. } => "You do not have permission to perform this action.".to_string(),
            Self::Server { status, message } => {
                if !message.trim().is_empty() {
                    message.clone()
                } else if *status == 404 {
                    "The requested record was not found.".to_string()
                } else {
                    "The server ran into a problem. Try again later.".to_string()
                }
            }
        }
    }
}

/// Error body shapes the backend uses; both `message` and `error` spellings
/// appear across services.
#[derive(Debug, Deserialize)]
struct WireError {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default, rename = "fieldErrors")]
    field_errors: Vec<WireFieldError>,
}

#[derive(Debug, Deserialize)]
struct WireFieldError {
    field: String,
    message: String,
}

/// HTTP plumbing shared by every resource client: base URL, bearer token,
/// fixed timeout, and the error mapping above.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: Arc<SessionHandle>,
}

impl ApiClient {
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        session: Arc<SessionHandle>,
    ) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|err| ApiError::Transport(format!("failed to build HTTP client: {err}")))?;

        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self {
            http,
            base_url,
            session,
        })
    }

    pub fn session(&self) -> &Arc<SessionHandle> {
        &self.session
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn prepare(&self, method: Method, path: &str, params: &QueryParams) -> RequestBuilder {
        let mut builder = self.http.request(method, self.url(path));
        if !params.is_empty() {
            builder = builder.query(params.pairs());
        }
        if let Some(token) = self.session.token() {
            builder = builder.bearer_auth(token);
        }
        builder
    }

    async fn execute(&self, builder: RequestBuilder) -> Result<Response, ApiError> {
        let response = builder
            .send()
            .await
            .map_err(|err| ApiError::Transport(err.to_string()))?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.bytes().await.unwrap_or_default();
        Err(Self::map_failure(status, &body))
    }

    fn map_failure(status: StatusCode, body: &[u8]) -> ApiError {
        let wire: Option<WireError> = serde_json::from_slice(body).ok();
        let message = wire
            .as_ref()
            .and_then(|err| err.message.clone().or_else(|| err.error.clone()))
            .unwrap_or_default();

        match status.as_u16() {
            401 | 403 => ApiError::Auth {
                status: status.as_u16(),
            },
            400 | 422 => {
                let field_errors = wire
                    .map(|err| {
                        err.field_errors
                            .into_iter()
                            .map(|entry| FieldError::new(entry.field, entry.message))
                            .collect()
                    })
                    .unwrap_or_default();
                ApiError::Validation {
                    message: if message.is_empty() {
                        "The request was rejected as invalid.".to_string()
                    } else {
                        message
                    },
                    field_errors,
                }
            }
            code => ApiError::Server {
                status: code,
                message,
            },
        }
    }

    async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        response
            .json::<T>()
            .await
            .map_err(|err| ApiError::Transport(format!("malformed response body: {err}")))
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &QueryParams,
    ) -> Result<T, ApiError> {
        let response = self.execute(self.prepare(Method::GET, path, params)).await?;
        Self::read_json(response).await
    }

    pub(crate) async fn send_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let builder = self
            .prepare(method, path, &QueryParams::new())
            .json(body);
        let response = self.execute(builder).await?;
        Self::read_json(response).await
    }

    pub(crate) async fn send_empty<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
    ) -> Result<T, ApiError> {
        let response = self
            .execute(self.prepare(method, path, &QueryParams::new()))
            .await?;
        Self::read_json(response).await
    }

    /// For endpoints whose response body carries nothing the caller needs.
    pub(crate) async fn send_unit<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<(), ApiError> {
        let mut builder = self.prepare(method, path, &QueryParams::new());
        if let Some(body) = body {
            builder = builder.json(body);
        }
        self.execute(builder).await?;
        Ok(())
    }
}
