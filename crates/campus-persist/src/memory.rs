use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::error::{PersistError, Result};
use crate::models::{
    Conversation, Message, NewMessage, Thread, ThreadFilter, ThreadMember, ThreadUpdate, User,
};
use crate::seed::Fixtures;
use crate::trait_client::CommunityStore;

#[derive(Default)]
struct Collections {
    threads: Vec<Thread>,
    conversations: Vec<Conversation>,
    messages: Vec<Message>,
    members: HashMap<String, Vec<ThreadMember>>,
    users: HashMap<String, User>,
}

impl Collections {
    fn thread_mut(&mut self, thread_id: &str) -> Option<&mut Thread> {
        self.threads.iter_mut().find(|t| t.id == thread_id)
    }

    fn has_thread(&self, thread_id: &str) -> bool {
        self.threads.iter().any(|t| t.id == thread_id)
    }
}

/// Process-memory store, reset on restart
///
/// One lock guards every collection so reference checks and the write that
/// depends on them happen atomically.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with fixture data. Fixtures are trusted and
    /// loaded as-is.
    pub fn with_fixtures(fixtures: Fixtures) -> Self {
        let collections = Collections {
            threads: fixtures.threads,
            conversations: fixtures.conversations,
            messages: fixtures.messages,
            members: fixtures.members,
            users: fixtures
                .users
                .into_iter()
                .map(|user| (user.id.clone(), user))
                .collect(),
        };

        Self {
            inner: RwLock::new(collections),
        }
    }
}

#[async_trait]
impl CommunityStore for MemoryStore {
    async fn get_thread(&self, thread_id: &str) -> Result<Option<Thread>> {
        let inner = self.inner.read().await;
        Ok(inner.threads.iter().find(|t| t.id == thread_id).cloned())
    }

    async fn list_threads(&self, filter: &ThreadFilter) -> Result<Vec<Thread>> {
        let inner = self.inner.read().await;
        let mut threads: Vec<Thread> = inner
            .threads
            .iter()
            .filter(|t| filter.matches(t))
            .cloned()
            .collect();
        threads.sort_by_key(|t| t.created_at);
        Ok(threads)
    }

    async fn insert_thread(&self, thread: Thread) -> Result<Thread> {
        let mut inner = self.inner.write().await;

        if inner.has_thread(&thread.id) {
            return Err(PersistError::Validation(format!(
                "thread id already in use: {}",
                thread.id
            )));
        }

        if let Some(parent_id) = &thread.parent_thread_id {
            let parent = inner
                .thread_mut(parent_id)
                .ok_or_else(|| PersistError::ThreadNotFound(parent_id.clone()))?;
            parent.sub_thread_ids.push(thread.id.clone());
        }

        inner.threads.push(thread.clone());
        tracing::debug!(thread_id = %thread.id, "Thread inserted");
        Ok(thread)
    }

    async fn update_thread(&self, thread_id: &str, update: ThreadUpdate) -> Result<Thread> {
        if update.is_empty() {
            return self
                .get_thread(thread_id)
                .await?
                .ok_or_else(|| PersistError::ThreadNotFound(thread_id.to_string()));
        }

        let mut inner = self.inner.write().await;
        let thread = inner
            .thread_mut(thread_id)
            .ok_or_else(|| PersistError::ThreadNotFound(thread_id.to_string()))?;
        thread.apply(update);
        Ok(thread.clone())
    }

    async fn delete_thread(&self, thread_id: &str) -> Result<Thread> {
        let mut inner = self.inner.write().await;
        let index = inner
            .threads
            .iter()
            .position(|t| t.id == thread_id)
            .ok_or_else(|| PersistError::ThreadNotFound(thread_id.to_string()))?;
        let removed = inner.threads.remove(index);

        // Keep the hierarchy consistent: unlink from the parent, detach children
        for thread in inner.threads.iter_mut() {
            thread.sub_thread_ids.retain(|id| id != thread_id);
            if thread.parent_thread_id.as_deref() == Some(thread_id) {
                thread.parent_thread_id = None;
            }
        }
        inner.members.remove(thread_id);

        tracing::debug!(thread_id = %thread_id, "Thread deleted");
        Ok(removed)
    }

    async fn list_conversations(&self, thread_id: &str) -> Result<Vec<Conversation>> {
        let inner = self.inner.read().await;
        Ok(inner
            .conversations
            .iter()
            .filter(|c| c.thread_id == thread_id)
            .cloned()
            .collect())
    }

    async fn get_conversation(&self, conversation_id: &str) -> Result<Option<Conversation>> {
        let inner = self.inner.read().await;
        Ok(inner
            .conversations
            .iter()
            .find(|c| c.id == conversation_id)
            .cloned())
    }

    async fn insert_conversation(&self, conversation: Conversation) -> Result<Conversation> {
        let mut inner = self.inner.write().await;

        if !inner.has_thread(&conversation.thread_id) {
            return Err(PersistError::ThreadNotFound(conversation.thread_id));
        }
        if inner.conversations.iter().any(|c| c.id == conversation.id) {
            return Err(PersistError::Validation(format!(
                "conversation id already in use: {}",
                conversation.id
            )));
        }

        inner.conversations.push(conversation.clone());
        Ok(conversation)
    }

    async fn list_messages(&self, conversation_id: &str) -> Result<Vec<Message>> {
        let inner = self.inner.read().await;
        let mut messages: Vec<Message> = inner
            .messages
            .iter()
            .filter(|m| m.conversation_id == conversation_id)
            .cloned()
            .collect();
        // Stable: equal timestamps keep insertion order
        messages.sort_by_key(|m| m.timestamp);
        Ok(messages)
    }

    async fn insert_message(&self, message: NewMessage) -> Result<Message> {
        let mut inner = self.inner.write().await;

        let thread_id = inner
            .conversations
            .iter()
            .find(|c| c.id == message.conversation_id)
            .map(|c| c.thread_id.clone())
            .ok_or_else(|| PersistError::ConversationNotFound(message.conversation_id.clone()))?;

        if let Some(reply_to) = &message.reply_to_message_id {
            let parent_exists = inner
                .messages
                .iter()
                .any(|m| &m.id == reply_to && m.conversation_id == message.conversation_id);
            if !parent_exists {
                return Err(PersistError::MessageNotFound(reply_to.clone()));
            }
        }

        let message = message.into_message(thread_id);

        if let Some(conversation) = inner
            .conversations
            .iter_mut()
            .find(|c| c.id == message.conversation_id)
        {
            if message.timestamp > conversation.last_activity_at {
                conversation.last_activity_at = message.timestamp;
            }
        }

        inner.messages.push(message.clone());
        Ok(message)
    }

    async fn list_members(&self, thread_id: &str) -> Result<Vec<ThreadMember>> {
        let inner = self.inner.read().await;
        Ok(inner.members.get(thread_id).cloned().unwrap_or_default())
    }

    async fn add_member(&self, thread_id: &str, member: ThreadMember) -> Result<ThreadMember> {
        let mut inner = self.inner.write().await;

        if !inner.has_thread(thread_id) {
            return Err(PersistError::ThreadNotFound(thread_id.to_string()));
        }
        if !inner.users.contains_key(&member.id) {
            return Err(PersistError::UserNotFound(member.id));
        }

        let members = inner.members.entry(thread_id.to_string()).or_default();
        if members.iter().any(|m| m.id == member.id) {
            return Err(PersistError::MemberExists {
                thread_id: thread_id.to_string(),
                user_id: member.id,
            });
        }

        members.push(member.clone());
        Ok(member)
    }

    async fn remove_member(&self, thread_id: &str, user_id: &str) -> Result<ThreadMember> {
        let mut inner = self.inner.write().await;
        let not_member = || PersistError::MemberNotFound {
            thread_id: thread_id.to_string(),
            user_id: user_id.to_string(),
        };

        let members = inner.members.get_mut(thread_id).ok_or_else(not_member)?;
        let index = members
            .iter()
            .position(|m| m.id == user_id)
            .ok_or_else(not_member)?;
        Ok(members.remove(index))
    }

    async fn get_user(&self, user_id: &str) -> Result<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner.users.get(user_id).cloned())
    }

    async fn insert_user(&self, user: User) -> Result<User> {
        let mut inner = self.inner.write().await;
        inner.users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    async fn ping(&self) -> Result<DateTime<Utc>> {
        let _inner = self.inner.read().await;
        Ok(Utc::now())
    }
}
