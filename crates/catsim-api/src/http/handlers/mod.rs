pub mod chat;
pub mod stats;
