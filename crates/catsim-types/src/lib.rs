//! Shared domain types for the cat simulator chat log.
//!
//! This crate contains the types passed between the log store, the retrieval
//! facade and the storage adapters: stored message records, their loosely
//! typed inputs, configuration, and the error taxonomy.
//!
//! Zero infrastructure dependencies -- only serde, chrono, thiserror.

pub mod chat;
pub mod config;
pub mod error;
pub mod llm;
