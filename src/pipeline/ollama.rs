use async_trait::async_trait;
use futures::StreamExt;
use ollama_rs::{
    generation::chat::{request::ChatMessageRequest, ChatMessageResponseStream},
    Ollama,
};

use crate::pipeline::{Answerer, PipelineError, PromptTemplate, TokenStream};

/// Map an Ollama response stream into a [`TokenStream`].
fn map_stream(stream: ChatMessageResponseStream) -> TokenStream {
    let mapped = stream.map(|res| match res {
        Ok(resp) => {
            let chunk = resp.message.content;
            tracing::trace!(%chunk, "token chunk");
            Ok(chunk)
        }
        Err(e) => {
            tracing::error!(?e, "ollama stream error");
            Err(PipelineError::Stream)
        }
    });
    Box::pin(mapped)
}

/// [`Answerer`] backed by a named model on a local Ollama server.
pub struct OllamaPipeline {
    client: Ollama,
    model: String,
    prompt: PromptTemplate,
}

impl OllamaPipeline {
    pub fn new(client: Ollama, model: impl Into<String>, prompt: PromptTemplate) -> Self {
        Self {
            client,
            model: model.into(),
            prompt,
        }
    }
}

#[async_trait]
impl Answerer for OllamaPipeline {
    async fn stream_answer(&self, question: &str) -> Result<TokenStream, PipelineError> {
        tracing::debug!(model = %self.model, "starting streamed chat request");
        let request = ChatMessageRequest::new(self.model.clone(), self.prompt.render(question));
        let stream = self
            .client
            .send_chat_messages_stream(request)
            .await
            .map_err(|e| PipelineError::Backend(e.to_string()))?;
        Ok(map_stream(stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use reqwest::Client;
    use url::Url;

    fn pipeline_for(server: &MockServer) -> OllamaPipeline {
        let http = Client::builder()
            .pool_max_idle_per_host(10)
            .build()
            .unwrap();
        let url = Url::parse(&server.base_url()).unwrap();
        let host = format!("{}://{}", url.scheme(), url.host_str().unwrap());
        let port = url.port_or_known_default().unwrap();
        let client = Ollama::new_with_client(host, port, http);
        OllamaPipeline::new(client, "m", PromptTemplate::new("Be helpful."))
    }

    #[tokio::test]
    async fn yields_all_tokens() {
        let server = MockServer::start_async().await;
        let body = concat!(
            "{\"model\":\"m\",\"created_at\":\"n\",\"message\":{\"role\":\"assistant\",\"content\":\"Hel\"},\"done\":false}\n",
            "{\"model\":\"m\",\"created_at\":\"n\",\"message\":{\"role\":\"assistant\",\"content\":\"lo\"},\"done\":true}"
        );
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/chat");
                then.status(200).body(body);
            })
            .await;

        let pipeline = pipeline_for(&server);
        let mut stream = pipeline.stream_answer("hi").await.unwrap();
        let mut collected = String::new();
        while let Some(chunk) = stream.next().await {
            collected.push_str(&chunk.unwrap());
        }
        assert_eq!(collected, "Hello");
    }

    #[tokio::test]
    async fn unreachable_backend_is_a_backend_error() {
        // Nothing listens on port 1, so the request cannot start.
        let client = Ollama::new("http://127.0.0.1".to_string(), 1);
        let pipeline = OllamaPipeline::new(client, "m", PromptTemplate::new("Be helpful."));

        let result = pipeline.stream_answer("hi").await;
        assert!(matches!(result, Err(PipelineError::Backend(_))));
    }
}
