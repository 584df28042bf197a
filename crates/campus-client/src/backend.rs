use reqwest::Method;

use crate::error::Result;
use crate::http::HttpClient;
use crate::types::{ModuleCompletion, ProgressSummary, Session, TokenRequest, TokenResponse};

pub const BACKEND_URL_VAR: &str = "CAMPUS_BACKEND_URL";
pub const BACKEND_TOKEN_VAR: &str = "CAMPUS_BACKEND_TOKEN";
const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";

/// Client for the external progress and session backend
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: HttpClient,
}

impl BackendClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Ok(Self {
            http: HttpClient::builder().base_url(base_url).build()?,
        })
    }

    /// Client that sends `Authorization: Bearer <token>` on every call
    pub fn with_token(base_url: impl Into<String>, token: impl Into<String>) -> Result<Self> {
        Ok(Self {
            http: HttpClient::builder()
                .base_url(base_url)
                .bearer_token(token)
                .build()?,
        })
    }

    /// Client for `CAMPUS_BACKEND_URL`, authenticated with `CAMPUS_BACKEND_TOKEN` when set
    pub fn from_env() -> Result<Self> {
        let mut builder =
            HttpClient::builder().base_url_from_env(BACKEND_URL_VAR, DEFAULT_BACKEND_URL);
        if let Some(token) = std::env::var(BACKEND_TOKEN_VAR)
            .ok()
            .filter(|t| !t.is_empty())
        {
            builder = builder.bearer_token(token);
        }
        Ok(Self {
            http: builder.build()?,
        })
    }

    pub fn from_http(http: HttpClient) -> Self {
        Self { http }
    }

    pub async fn progress_summary(&self, user_id: &str) -> Result<ProgressSummary> {
        self.http
            .get_json(&["api", "progress", "users", user_id, "summary"])
            .await
    }

    pub async fn check_module_completion(&self, module_id: &str) -> Result<ModuleCompletion> {
        self.http
            .get_json(&["api", "progress", "modules", module_id, "check-completion"])
            .await
    }

    /// Exchange credentials for an access token
    pub async fn issue_token(&self, request: &TokenRequest) -> Result<TokenResponse> {
        self.http
            .send_json(Method::POST, &["api", "auth", "token"], request)
            .await
    }

    /// Session of the bearer token this client was built with
    pub async fn current_session(&self) -> Result<Session> {
        self.http.get_json(&["api", "auth", "session"]).await
    }
}
