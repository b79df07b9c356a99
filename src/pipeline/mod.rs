// Re-export the public API
mod ollama;

pub use ollama::OllamaPipeline;

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use ollama_rs::generation::chat::ChatMessage;
use thiserror::Error;

/// Incremental text chunks produced by a streaming model call.
pub type TokenStream = Pin<Box<dyn Stream<Item = Result<String, PipelineError>> + Send>>;

/// Failure modes of a pipeline invocation.
///
/// Missing pipeline, failed request start, and mid-stream abort stay
/// distinguishable even though the handlers report them through one path.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("no pipeline is ready for this session")]
    NotReady,
    #[error("the model backend rejected the request: {0}")]
    Backend(String),
    #[error("the model backend aborted the response stream")]
    Stream,
}

/// One composed unit of prompt rendering, model call, and text extraction.
#[async_trait]
pub trait Answerer: Send + Sync {
    /// Stream the answer to a single question.
    async fn stream_answer(&self, question: &str) -> Result<TokenStream, PipelineError>;
}

/// Two-turn chat prompt: a fixed system instruction plus the user's question.
pub struct PromptTemplate {
    system: String,
}

impl PromptTemplate {
    pub fn new(system: impl Into<String>) -> Self {
        Self {
            system: system.into(),
        }
    }

    /// Fill the question slot and produce the chat turns for one request.
    pub fn render(&self, question: &str) -> Vec<ChatMessage> {
        vec![
            ChatMessage::system(self.system.clone()),
            ChatMessage::user(question.to_string()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ollama_rs::generation::chat::MessageRole;

    #[test]
    fn template_renders_system_then_question() {
        let template = PromptTemplate::new("Be helpful.");
        let turns = template.render("What is Rust?");

        assert_eq!(turns.len(), 2);
        assert!(matches!(turns[0].role, MessageRole::System));
        assert_eq!(turns[0].content, "Be helpful.");
        assert!(matches!(turns[1].role, MessageRole::User));
        assert_eq!(turns[1].content, "What is Rust?");
    }
}
