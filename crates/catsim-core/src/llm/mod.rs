//! Language-model collaborator port.
//!
//! The model is opaque to the chat log: it receives the prior conversation
//! plus the new turn and returns a payload to append as an assistant turn.

pub mod provider;
