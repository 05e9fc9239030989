//! Business logic and storage ports for the cat simulator chat log.
//!
//! This crate defines the "ports" (the conversation table and chat model
//! traits) that the infrastructure layer implements, plus the logic that
//! sits on top of them: record normalization, expiry policy, the ordered
//! conversation log, and the retrieval facade. It depends only on
//! `catsim-types` -- never on `catsim-infra` or any database/IO crate.

pub mod chat;
pub mod llm;
pub mod record;
