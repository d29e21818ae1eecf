//! API Module
//!
//! Provider-neutral chat types.

pub mod chat;

pub use chat::{CallResult, ChatMessage, Role};
