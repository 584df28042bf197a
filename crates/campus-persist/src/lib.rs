pub mod error;
pub mod ids;
pub mod memory;
pub mod models;
pub mod seed;
pub mod trait_client;

mod dbs;

pub use error::{PersistError, Result};
pub use ids::{IdGenerator, SequenceGenerator, UuidGenerator};
pub use memory::MemoryStore;
pub use models::{
    Conversation, MemberRole, Message, MessageContent, MessageType, NewConversation, NewMessage,
    NewThread, Thread, ThreadFilter, ThreadMember, ThreadUpdate, User,
};
pub use seed::Fixtures;
pub use trait_client::CommunityStore;

#[cfg(feature = "mongodb")]
pub use dbs::mongo::MongoStore;
