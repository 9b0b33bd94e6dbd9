pub mod chats;
pub mod error_handler;
pub mod health;
