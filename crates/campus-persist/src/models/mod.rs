mod conversation;
mod member;
mod message;
mod thread;

// Export database-agnostic models
pub use conversation::{Conversation, NewConversation};
pub use member::{MemberRole, ThreadMember, User};
pub use message::{Message, MessageContent, MessageType, NewMessage};
pub use thread::{NewThread, Thread, ThreadFilter, ThreadUpdate};
