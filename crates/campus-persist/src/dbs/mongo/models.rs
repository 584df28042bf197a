use bson::serde_helpers::chrono_datetime_as_bson_datetime;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{
    Conversation, MemberRole, Message, MessageContent, MessageType, Thread, ThreadMember, User,
};

/// MongoDB-specific Thread document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoThread {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub description: String,
    pub parent_thread_id: Option<String>,
    pub related_course_ids: Vec<String>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    pub active: bool,
    pub sub_thread_ids: Vec<String>,
    pub concept_tags: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoConversation {
    #[serde(rename = "_id")]
    pub id: String,
    pub thread_id: String,
    pub title: String,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub started_at: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub last_activity_at: DateTime<Utc>,
    pub participant_ids: Vec<String>,
    pub concept_tags: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoMessage {
    #[serde(rename = "_id")]
    pub id: String,
    pub thread_id: String,
    pub conversation_id: String,
    pub user_id: String,
    pub content: MessageContent,
    #[serde(rename = "type")]
    pub message_type: MessageType,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to_message_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concept_tags: Option<Vec<String>>,
}

/// Membership document. `_id` is `{thread_id}:{user_id}` so the unique
/// primary key rejects duplicate joins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoMember {
    #[serde(rename = "_id")]
    pub key: String,
    pub thread_id: String,
    pub user_id: String,
    pub username: String,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub joined_at: DateTime<Utc>,
    pub role: MemberRole,
    pub level: u32,
}

impl MongoMember {
    pub fn key(thread_id: &str, user_id: &str) -> String {
        format!("{}:{}", thread_id, user_id)
    }

    pub fn from_member(thread_id: &str, member: ThreadMember) -> Self {
        Self {
            key: Self::key(thread_id, &member.id),
            thread_id: thread_id.to_string(),
            user_id: member.id,
            username: member.username,
            joined_at: member.joined_at,
            role: member.role,
            level: member.level,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoUser {
    #[serde(rename = "_id")]
    pub id: String,
    pub username: String,
    pub level: u32,
}

// Conversions between database-agnostic and MongoDB-specific models

impl From<Thread> for MongoThread {
    fn from(t: Thread) -> Self {
        Self {
            id: t.id,
            name: t.name,
            description: t.description,
            parent_thread_id: t.parent_thread_id,
            related_course_ids: t.related_course_ids,
            created_at: t.created_at,
            active: t.active,
            sub_thread_ids: t.sub_thread_ids,
            concept_tags: t.concept_tags,
        }
    }
}

impl From<MongoThread> for Thread {
    fn from(t: MongoThread) -> Self {
        Self {
            id: t.id,
            name: t.name,
            description: t.description,
            parent_thread_id: t.parent_thread_id,
            related_course_ids: t.related_course_ids,
            created_at: t.created_at,
            active: t.active,
            sub_thread_ids: t.sub_thread_ids,
            concept_tags: t.concept_tags,
        }
    }
}

impl From<Conversation> for MongoConversation {
    fn from(c: Conversation) -> Self {
        Self {
            id: c.id,
            thread_id: c.thread_id,
            title: c.title,
            started_at: c.started_at,
            last_activity_at: c.last_activity_at,
            participant_ids: c.participant_ids,
            concept_tags: c.concept_tags,
        }
    }
}

impl From<MongoConversation> for Conversation {
    fn from(c: MongoConversation) -> Self {
        Self {
            id: c.id,
            thread_id: c.thread_id,
            title: c.title,
            started_at: c.started_at,
            last_activity_at: c.last_activity_at,
            participant_ids: c.participant_ids,
            concept_tags: c.concept_tags,
        }
    }
}

impl From<Message> for MongoMessage {
    fn from(m: Message) -> Self {
        Self {
            id: m.id,
            thread_id: m.thread_id,
            conversation_id: m.conversation_id,
            user_id: m.user_id,
            content: m.content,
            message_type: m.message_type,
            timestamp: m.timestamp,
            reply_to_message_id: m.reply_to_message_id,
            concept_tags: m.concept_tags,
        }
    }
}

impl From<MongoMessage> for Message {
    fn from(m: MongoMessage) -> Self {
        Self {
            id: m.id,
            thread_id: m.thread_id,
            conversation_id: m.conversation_id,
            user_id: m.user_id,
            content: m.content,
            message_type: m.message_type,
            timestamp: m.timestamp,
            reply_to_message_id: m.reply_to_message_id,
            concept_tags: m.concept_tags,
        }
    }
}

impl From<MongoMember> for ThreadMember {
    fn from(m: MongoMember) -> Self {
        Self {
            id: m.user_id,
            username: m.username,
            joined_at: m.joined_at,
            role: m.role,
            level: m.level,
        }
    }
}

impl From<User> for MongoUser {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            username: u.username,
            level: u.level,
        }
    }
}

impl From<MongoUser> for User {
    fn from(u: MongoUser) -> Self {
        Self {
            id: u.id,
            username: u.username,
            level: u.level,
        }
    }
}
