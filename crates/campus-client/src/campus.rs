use reqwest::Method;
use serde_json::{json, Value};

use campus_persist::{
    Conversation, MemberRole, Message, MessageContent, NewThread, Thread, ThreadFilter,
    ThreadMember, ThreadUpdate,
};

use crate::error::Result;
use crate::http::HttpClient;
use crate::types::{CacheEntry, CacheReceipt, HealthStatus};

pub const API_URL_VAR: &str = "CAMPUS_API_URL";
const DEFAULT_API_URL: &str = "http://localhost:8080";

/// Typed client for the community API
#[derive(Debug, Clone)]
pub struct CampusClient {
    http: HttpClient,
}

impl CampusClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Ok(Self {
            http: HttpClient::builder().base_url(base_url).build()?,
        })
    }

    /// Client for the URL in `CAMPUS_API_URL`, defaulting to a local server
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            http: HttpClient::builder()
                .base_url_from_env(API_URL_VAR, DEFAULT_API_URL)
                .build()?,
        })
    }

    pub fn from_http(http: HttpClient) -> Self {
        Self { http }
    }

    pub async fn health(&self) -> Result<HealthStatus> {
        self.http.get_json(&["health"]).await
    }

    // Threads

    /// Threads matching `filter`; unset fields are left out of the query
    pub async fn list_threads(&self, filter: &ThreadFilter) -> Result<Vec<Thread>> {
        self.http.get_json_query(&["threads"], filter).await
    }

    pub async fn create_thread(&self, thread: &NewThread) -> Result<Thread> {
        self.http
            .send_json(Method::POST, &["threads"], thread)
            .await
    }

    pub async fn get_thread(&self, thread_id: &str) -> Result<Thread> {
        self.http.get_json(&["threads", thread_id]).await
    }

    pub async fn update_thread(&self, thread_id: &str, update: &ThreadUpdate) -> Result<Thread> {
        self.http
            .send_json(Method::PUT, &["threads", thread_id], update)
            .await
    }

    pub async fn delete_thread(&self, thread_id: &str) -> Result<()> {
        self.http.delete(&["threads", thread_id]).await
    }

    // Conversations

    pub async fn list_conversations(&self, thread_id: &str) -> Result<Vec<Conversation>> {
        self.http
            .get_json(&["threads", thread_id, "conversations"])
            .await
    }

    pub async fn create_conversation(
        &self,
        thread_id: &str,
        title: &str,
        participant_ids: &[String],
    ) -> Result<Conversation> {
        let mut body = json!({ "title": title });
        if !participant_ids.is_empty() {
            body["participantIds"] = json!(participant_ids);
        }
        self.http
            .send_json(Method::POST, &["threads", thread_id, "conversations"], &body)
            .await
    }

    // Messages

    pub async fn list_messages(&self, conversation_id: &str) -> Result<Vec<Message>> {
        self.http
            .get_json(&["conversations", conversation_id, "messages"])
            .await
    }

    pub async fn post_message(
        &self,
        conversation_id: &str,
        content: &MessageContent,
        reply_to_message_id: Option<&str>,
    ) -> Result<Message> {
        let mut body = json!({
            "content": content,
            "messageType": content.kind(),
        });
        if let Some(reply_to) = reply_to_message_id {
            body["replyToMessageId"] = Value::from(reply_to);
        }
        self.http
            .send_json(
                Method::POST,
                &["conversations", conversation_id, "messages"],
                &body,
            )
            .await
    }

    // Members

    pub async fn list_members(&self, thread_id: &str) -> Result<Vec<ThreadMember>> {
        self.http.get_json(&["threads", thread_id, "members"]).await
    }

    pub async fn add_member(
        &self,
        thread_id: &str,
        user_id: &str,
        role: Option<MemberRole>,
    ) -> Result<ThreadMember> {
        let mut body = json!({ "userId": user_id });
        if let Some(role) = role {
            body["role"] = json!(role);
        }
        self.http
            .send_json(Method::POST, &["threads", thread_id, "members"], &body)
            .await
    }

    pub async fn join_thread(&self, thread_id: &str) -> Result<ThreadMember> {
        self.http.post_empty(&["threads", thread_id, "join"]).await
    }

    pub async fn leave_thread(&self, thread_id: &str) -> Result<ThreadMember> {
        self.http.post_empty(&["threads", thread_id, "leave"]).await
    }

    // Cache

    pub async fn cache_get(&self, key: &str) -> Result<CacheEntry> {
        self.http.get_json_query(&["cache"], &[("key", key)]).await
    }

    /// Store a value; `expiration_secs` falls back to the server default
    pub async fn cache_set(
        &self,
        key: &str,
        data: &Value,
        expiration_secs: Option<u64>,
    ) -> Result<CacheReceipt> {
        let mut body = json!({ "key": key, "data": data });
        if let Some(secs) = expiration_secs {
            body["expiration"] = json!(secs);
        }
        self.http.send_json(Method::POST, &["cache"], &body).await
    }
}
