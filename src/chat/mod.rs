//! Conversation with a remote completion endpoint.

mod backend;
mod controller;
mod message;

pub use backend::{
    BackendError, ChatBackend, ChatRequest, ChatResponse, Choice, HttpChatBackend, Provider,
    UnknownProvider,
};
pub use controller::{ConversationController, FALLBACK_REPLY};
pub use message::{Author, ChatMessage};
