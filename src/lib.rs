//! Streaming chat front-end for a locally hosted Ollama model.
//!
//! The crate is thin glue between three collaborators: a chat surface that
//! renders the conversation (terminal UI or stdout), a question-answering
//! pipeline (prompt template composed with a streaming model call), and the
//! Ollama backend that performs inference.

pub mod chat;
pub mod cli;
pub mod logging;
pub mod pipeline;
pub mod tui;
