pub mod codec;
pub mod commands;
pub mod connection;
pub mod frame;
pub mod pattern;
pub mod server;
pub mod skiplist;
pub mod store;
pub mod zset;

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Result<T> = std::result::Result<T, Error>;
