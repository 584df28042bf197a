use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of `GET /cache`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    pub key: String,
    pub data: Value,
    pub expires_at: DateTime<Utc>,
}

/// Body of `POST /cache`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheReceipt {
    pub key: String,
    pub expires_at: DateTime<Utc>,
}

/// Body of `GET /health`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
    #[serde(default)]
    pub services: HashMap<String, String>,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

/// Learner progress as reported by the backend
///
/// Unknown fields are kept in `extra` so backend additions pass through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSummary {
    pub user_id: String,
    #[serde(default)]
    pub completed_modules: u32,
    #[serde(default)]
    pub total_modules: u32,
    #[serde(default)]
    pub xp: u64,
    #[serde(default = "default_level")]
    pub level: u32,
    #[serde(default)]
    pub streak_days: u32,
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

fn default_level() -> u32 {
    1
}

impl ProgressSummary {
    /// Share of completed modules in `[0, 1]`
    pub fn completion_ratio(&self) -> f64 {
        if self.total_modules == 0 {
            return 0.0;
        }
        (self.completed_modules as f64 / self.total_modules as f64).min(1.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleCompletion {
    pub module_id: String,
    pub completed: bool,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub user_id: String,
    pub username: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    pub expires_in: u64,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}
