use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::{
    Conversation, Message, NewMessage, Thread, ThreadFilter, ThreadMember, ThreadUpdate, User,
};

/// Storage operations for the community data
///
/// Implementations validate references at write time: a conversation needs
/// an existing thread, a message needs an existing conversation, a member
/// needs an existing thread and user.
#[async_trait]
pub trait CommunityStore: Send + Sync {
    /// Get a thread by id
    async fn get_thread(&self, thread_id: &str) -> Result<Option<Thread>>;

    /// List threads ordered by creation time
    async fn list_threads(&self, filter: &ThreadFilter) -> Result<Vec<Thread>>;

    /// Insert a thread and link it into its parent's sub-threads
    async fn insert_thread(&self, thread: Thread) -> Result<Thread>;

    /// Merge a partial update into a thread
    async fn update_thread(&self, thread_id: &str, update: ThreadUpdate) -> Result<Thread>;

    /// Delete a thread. Conversations and messages under it are left in place.
    async fn delete_thread(&self, thread_id: &str) -> Result<Thread>;

    /// Conversations of a thread in creation order (empty for unknown threads)
    async fn list_conversations(&self, thread_id: &str) -> Result<Vec<Conversation>>;

    async fn get_conversation(&self, conversation_id: &str) -> Result<Option<Conversation>>;

    async fn insert_conversation(&self, conversation: Conversation) -> Result<Conversation>;

    /// Messages of a conversation, ascending by timestamp
    async fn list_messages(&self, conversation_id: &str) -> Result<Vec<Message>>;

    /// Insert a message and bump the conversation's last activity
    async fn insert_message(&self, message: NewMessage) -> Result<Message>;

    /// Members of a thread (empty for unknown threads)
    async fn list_members(&self, thread_id: &str) -> Result<Vec<ThreadMember>>;

    /// Add a member; fails with `MemberExists` when already present
    async fn add_member(&self, thread_id: &str, member: ThreadMember) -> Result<ThreadMember>;

    /// Remove exactly one membership entry
    async fn remove_member(&self, thread_id: &str, user_id: &str) -> Result<ThreadMember>;

    async fn get_user(&self, user_id: &str) -> Result<Option<User>>;

    async fn insert_user(&self, user: User) -> Result<User>;

    /// Cheap round-trip used by health checks
    async fn ping(&self) -> Result<DateTime<Utc>>;
}
