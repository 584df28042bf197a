use thiserror::Error;

#[derive(Error, Debug)]
pub enum PersistError {
    #[cfg(feature = "mongodb")]
    #[error("Database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[cfg(feature = "mongodb")]
    #[error("BSON serialization error: {0}")]
    BsonSerialization(#[from] bson::ser::Error),

    #[error("Thread not found: {0}")]
    ThreadNotFound(String),

    #[error("Conversation not found: {0}")]
    ConversationNotFound(String),

    #[error("Message not found: {0}")]
    MessageNotFound(String),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("User {user_id} is not a member of thread {thread_id}")]
    MemberNotFound { thread_id: String, user_id: String },

    #[error("User {user_id} is already a member of thread {thread_id}")]
    MemberExists { thread_id: String, user_id: String },

    #[error("Invalid data: {0}")]
    Validation(String),

    #[error("Connection error: {0}")]
    Connection(String),
}

pub type Result<T> = std::result::Result<T, PersistError>;
