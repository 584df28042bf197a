use async_trait::async_trait;
use bson::{doc, Bson, Document};
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::ReturnDocument;
use mongodb::{Client, Collection, Database};

use super::models::{MongoConversation, MongoMember, MongoMessage, MongoThread, MongoUser};
use crate::error::{PersistError, Result};
use crate::models::{
    Conversation, Message, NewMessage, Thread, ThreadFilter, ThreadMember, ThreadUpdate, User,
};
use crate::seed::Fixtures;
use crate::trait_client::CommunityStore;

const DUPLICATE_KEY: i32 = 11000;

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write_error)) if write_error.code == DUPLICATE_KEY
    )
}

fn update_document(update: &ThreadUpdate) -> Result<Document> {
    let mut set = Document::new();
    if let Some(name) = &update.name {
        set.insert("name", name.as_str());
    }
    if let Some(description) = &update.description {
        set.insert("description", description.as_str());
    }
    if let Some(related_course_ids) = &update.related_course_ids {
        set.insert("related_course_ids", bson::to_bson(related_course_ids)?);
    }
    if let Some(active) = update.active {
        set.insert("active", active);
    }
    if let Some(concept_tags) = &update.concept_tags {
        set.insert("concept_tags", bson::to_bson(concept_tags)?);
    }
    Ok(set)
}

/// MongoDB-backed store
///
/// Reference checks run as separate queries before the write, so they are
/// not transactional. Duplicate memberships are rejected by the primary key.
pub struct MongoStore {
    database: Database,
    threads: Collection<MongoThread>,
    conversations: Collection<MongoConversation>,
    messages: Collection<MongoMessage>,
    members: Collection<MongoMember>,
    users: Collection<MongoUser>,
}

impl MongoStore {
    /// Connect to MongoDB and create the store
    pub async fn connect(mongodb_uri: &str, database: &str) -> Result<Self> {
        let client = Client::with_uri_str(mongodb_uri)
            .await
            .map_err(|e| PersistError::Connection(e.to_string()))?;
        let database = client.database(database);

        Ok(Self {
            threads: database.collection("threads"),
            conversations: database.collection("conversations"),
            messages: database.collection("messages"),
            members: database.collection("members"),
            users: database.collection("users"),
            database,
        })
    }

    /// Load fixtures into empty collections. Collections that already hold
    /// documents are left untouched.
    pub async fn seed(&self, fixtures: Fixtures) -> Result<()> {
        if self.threads.estimated_document_count().await? > 0 {
            tracing::info!("MongoDB already populated, skipping seed");
            return Ok(());
        }

        let users: Vec<MongoUser> = fixtures.users.into_iter().map(Into::into).collect();
        let threads: Vec<MongoThread> = fixtures.threads.into_iter().map(Into::into).collect();
        let conversations: Vec<MongoConversation> =
            fixtures.conversations.into_iter().map(Into::into).collect();
        let messages: Vec<MongoMessage> = fixtures.messages.into_iter().map(Into::into).collect();
        let members: Vec<MongoMember> = fixtures
            .members
            .into_iter()
            .flat_map(|(thread_id, members)| {
                members
                    .into_iter()
                    .map(move |m| MongoMember::from_member(&thread_id, m))
            })
            .collect();

        if !users.is_empty() {
            self.users.insert_many(users).await?;
        }
        if !threads.is_empty() {
            self.threads.insert_many(threads).await?;
        }
        if !conversations.is_empty() {
            self.conversations.insert_many(conversations).await?;
        }
        if !messages.is_empty() {
            self.messages.insert_many(messages).await?;
        }
        if !members.is_empty() {
            self.members.insert_many(members).await?;
        }

        tracing::info!("MongoDB seeded with fixtures");
        Ok(())
    }

    async fn thread_exists(&self, thread_id: &str) -> Result<bool> {
        let count = self
            .threads
            .count_documents(doc! { "_id": thread_id })
            .await?;
        Ok(count > 0)
    }
}

#[async_trait]
impl CommunityStore for MongoStore {
    async fn get_thread(&self, thread_id: &str) -> Result<Option<Thread>> {
        let thread = self.threads.find_one(doc! { "_id": thread_id }).await?;
        Ok(thread.map(Into::into))
    }

    async fn list_threads(&self, filter: &ThreadFilter) -> Result<Vec<Thread>> {
        let mut query = Document::new();
        if let Some(parent) = &filter.parent_thread_id {
            query.insert("parent_thread_id", parent.as_str());
        }
        if let Some(active) = filter.active {
            query.insert("active", active);
        }

        let threads: Vec<MongoThread> = self
            .threads
            .find(query)
            .sort(doc! { "created_at": 1 })
            .await?
            .try_collect()
            .await?;
        Ok(threads.into_iter().map(Into::into).collect())
    }

    async fn insert_thread(&self, thread: Thread) -> Result<Thread> {
        if let Some(parent_id) = &thread.parent_thread_id {
            if !self.thread_exists(parent_id).await? {
                return Err(PersistError::ThreadNotFound(parent_id.clone()));
            }
        }

        let document: MongoThread = thread.clone().into();
        self.threads.insert_one(document).await.map_err(|e| {
            if is_duplicate_key(&e) {
                PersistError::Validation(format!("thread id already in use: {}", thread.id))
            } else {
                e.into()
            }
        })?;

        // Link into the parent only after the child is stored
        if let Some(parent_id) = &thread.parent_thread_id {
            let linked = self
                .threads
                .update_one(
                    doc! { "_id": parent_id.as_str() },
                    doc! { "$addToSet": { "sub_thread_ids": thread.id.as_str() } },
                )
                .await?;
            if linked.matched_count == 0 {
                // Parent vanished between the check and the link
                self.threads
                    .delete_one(doc! { "_id": thread.id.as_str() })
                    .await?;
                return Err(PersistError::ThreadNotFound(parent_id.clone()));
            }
        }
        Ok(thread)
    }

    async fn update_thread(&self, thread_id: &str, update: ThreadUpdate) -> Result<Thread> {
        let updated = if update.is_empty() {
            self.threads.find_one(doc! { "_id": thread_id }).await?
        } else {
            let set = update_document(&update)?;
            self.threads
                .find_one_and_update(doc! { "_id": thread_id }, doc! { "$set": set })
                .return_document(ReturnDocument::After)
                .await?
        };

        updated
            .map(Into::into)
            .ok_or_else(|| PersistError::ThreadNotFound(thread_id.to_string()))
    }

    async fn delete_thread(&self, thread_id: &str) -> Result<Thread> {
        let removed = self
            .threads
            .find_one_and_delete(doc! { "_id": thread_id })
            .await?
            .ok_or_else(|| PersistError::ThreadNotFound(thread_id.to_string()))?;

        self.threads
            .update_many(
                doc! { "sub_thread_ids": thread_id },
                doc! { "$pull": { "sub_thread_ids": thread_id } },
            )
            .await?;
        self.threads
            .update_many(
                doc! { "parent_thread_id": thread_id },
                doc! { "$set": { "parent_thread_id": Bson::Null } },
            )
            .await?;
        self.members
            .delete_many(doc! { "thread_id": thread_id })
            .await?;

        Ok(removed.into())
    }

    async fn list_conversations(&self, thread_id: &str) -> Result<Vec<Conversation>> {
        let conversations: Vec<MongoConversation> = self
            .conversations
            .find(doc! { "thread_id": thread_id })
            .sort(doc! { "started_at": 1 })
            .await?
            .try_collect()
            .await?;
        Ok(conversations.into_iter().map(Into::into).collect())
    }

    async fn get_conversation(&self, conversation_id: &str) -> Result<Option<Conversation>> {
        let conversation = self
            .conversations
            .find_one(doc! { "_id": conversation_id })
            .await?;
        Ok(conversation.map(Into::into))
    }

    async fn insert_conversation(&self, conversation: Conversation) -> Result<Conversation> {
        if !self.thread_exists(&conversation.thread_id).await? {
            return Err(PersistError::ThreadNotFound(conversation.thread_id));
        }

        let document: MongoConversation = conversation.clone().into();
        self.conversations.insert_one(document).await?;
        Ok(conversation)
    }

    async fn list_messages(&self, conversation_id: &str) -> Result<Vec<Message>> {
        let messages: Vec<MongoMessage> = self
            .messages
            .find(doc! { "conversation_id": conversation_id })
            .sort(doc! { "timestamp": 1 })
            .await?
            .try_collect()
            .await?;
        Ok(messages.into_iter().map(Into::into).collect())
    }

    async fn insert_message(&self, message: NewMessage) -> Result<Message> {
        let conversation = self
            .conversations
            .find_one(doc! { "_id": message.conversation_id.as_str() })
            .await?
            .ok_or_else(|| PersistError::ConversationNotFound(message.conversation_id.clone()))?;

        if let Some(reply_to) = &message.reply_to_message_id {
            let parent = self
                .messages
                .count_documents(doc! {
                    "_id": reply_to.as_str(),
                    "conversation_id": message.conversation_id.as_str(),
                })
                .await?;
            if parent == 0 {
                return Err(PersistError::MessageNotFound(reply_to.clone()));
            }
        }

        let message = message.into_message(conversation.thread_id);
        let document: MongoMessage = message.clone().into();
        self.messages.insert_one(document).await?;

        self.conversations
            .update_one(
                doc! { "_id": message.conversation_id.as_str() },
                doc! { "$max": { "last_activity_at": bson::DateTime::from_chrono(message.timestamp) } },
            )
            .await?;

        Ok(message)
    }

    async fn list_members(&self, thread_id: &str) -> Result<Vec<ThreadMember>> {
        let members: Vec<MongoMember> = self
            .members
            .find(doc! { "thread_id": thread_id })
            .sort(doc! { "joined_at": 1 })
            .await?
            .try_collect()
            .await?;
        Ok(members.into_iter().map(Into::into).collect())
    }

    async fn add_member(&self, thread_id: &str, member: ThreadMember) -> Result<ThreadMember> {
        if !self.thread_exists(thread_id).await? {
            return Err(PersistError::ThreadNotFound(thread_id.to_string()));
        }
        if self.users.find_one(doc! { "_id": member.id.as_str() }).await?.is_none() {
            return Err(PersistError::UserNotFound(member.id));
        }

        let user_id = member.id.clone();
        let document = MongoMember::from_member(thread_id, member.clone());
        self.members.insert_one(document).await.map_err(|e| {
            if is_duplicate_key(&e) {
                PersistError::MemberExists {
                    thread_id: thread_id.to_string(),
                    user_id,
                }
            } else {
                e.into()
            }
        })?;
        Ok(member)
    }

    async fn remove_member(&self, thread_id: &str, user_id: &str) -> Result<ThreadMember> {
        self.members
            .find_one_and_delete(doc! { "_id": MongoMember::key(thread_id, user_id) })
            .await?
            .map(Into::into)
            .ok_or_else(|| PersistError::MemberNotFound {
                thread_id: thread_id.to_string(),
                user_id: user_id.to_string(),
            })
    }

    async fn get_user(&self, user_id: &str) -> Result<Option<User>> {
        let user = self.users.find_one(doc! { "_id": user_id }).await?;
        Ok(user.map(Into::into))
    }

    async fn insert_user(&self, user: User) -> Result<User> {
        let document: MongoUser = user.clone().into();
        self.users
            .replace_one(doc! { "_id": user.id.as_str() }, document)
            .upsert(true)
            .await?;
        Ok(user)
    }

    async fn ping(&self) -> Result<DateTime<Utc>> {
        self.database.run_command(doc! { "ping": 1 }).await?;
        Ok(Utc::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewThread;

    /// Store on a scratch database, or `None` when `MONGODB_TEST_URI` is unset
    async fn scratch_store() -> Option<MongoStore> {
        let uri = std::env::var("MONGODB_TEST_URI").ok()?;
        let database = format!("campus_test_{}", uuid::Uuid::new_v4().simple());
        Some(MongoStore::connect(&uri, &database).await.unwrap())
    }

    fn thread(id: &str, parent: Option<&str>) -> Thread {
        let new = NewThread {
            name: format!("Thread {}", id),
            description: String::new(),
            parent_thread_id: parent.map(str::to_string),
            related_course_ids: vec![],
            active: true,
            concept_tags: vec![],
        };
        Thread::from_new(id.to_string(), new, Utc::now())
    }

    #[test]
    fn test_update_document_sets_only_present_fields() {
        let update = ThreadUpdate {
            name: Some("Renamed".to_string()),
            active: Some(false),
            ..Default::default()
        };
        let set = update_document(&update).unwrap();

        assert_eq!(set.get_str("name").unwrap(), "Renamed");
        assert!(!set.get_bool("active").unwrap());
        assert!(!set.contains_key("description"));
    }

    #[tokio::test]
    async fn test_duplicate_child_leaves_single_parent_link() {
        let Some(store) = scratch_store().await else {
            return;
        };
        store.insert_thread(thread("root", None)).await.unwrap();
        store.insert_thread(thread("child", Some("root"))).await.unwrap();

        let result = store.insert_thread(thread("child", Some("root"))).await;
        assert!(matches!(result, Err(PersistError::Validation(_))));

        let orphan = store.insert_thread(thread("orphan", Some("missing"))).await;
        assert!(matches!(orphan, Err(PersistError::ThreadNotFound(_))));
        assert!(store.get_thread("orphan").await.unwrap().is_none());

        let root = store.get_thread("root").await.unwrap().unwrap();
        assert_eq!(root.sub_thread_ids, vec!["child".to_string()]);

        store.database.drop().await.unwrap();
    }
}
