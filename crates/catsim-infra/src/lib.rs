//! Infrastructure layer for the cat simulator.
//!
//! Contains implementations of the ports defined in `catsim-core`: the
//! SQLite conversation table, the Bedrock and offline chat models, the
//! configuration loader and the background expiry sweeper.

pub mod config;
pub mod llm;
pub mod sqlite;
pub mod sweeper;
