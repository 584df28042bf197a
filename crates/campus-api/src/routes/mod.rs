pub mod cache;
pub mod conversations;
pub mod health;
pub mod members;
pub mod messages;
pub mod threads;
