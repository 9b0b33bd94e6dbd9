pub mod connection;
pub mod handler;
pub mod messages;
