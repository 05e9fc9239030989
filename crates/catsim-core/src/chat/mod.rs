//! Conversation log persistence and the retrieval facade.
//!
//! - `repository`: the `ConversationTable` storage port.
//! - `store`: ordered append/list over a table, with normalization.
//! - `service`: the request-facing `ChatService`.

pub mod repository;
pub mod service;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;
