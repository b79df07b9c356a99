use std::env;
use std::path::{Path, PathBuf};

use anyhow::Result;
use futures::StreamExt;
use ollama_rs::Ollama;
use tracing::Instrument;

use crate::chat::surface::{ChatSurface, ImageAttachment, OutgoingMessage};
use crate::pipeline::{Answerer, OllamaPipeline, PipelineError, PromptTemplate};

pub const WELCOME_TEXT: &str = "Hello there, I am Parley. How can I help you?";
pub const INVALID_INPUT_PROMPT: &str = "Please enter a valid question.";

const SYSTEM_INSTRUCTION: &str =
    "You're a very knowledgeable chatbot who provides accurate and eloquent answers to questions.";
const WELCOME_IMAGE_NAME: &str = "welcome";

/// Backend and asset settings for one chat session.
pub struct ChatConfig {
    pub host: String,
    pub port: u16,
    pub model: String,
    pub welcome_image: PathBuf,
}

impl ChatConfig {
    /// Read the Ollama connection settings from the environment, falling
    /// back to a local default server and model.
    pub fn from_env() -> Self {
        let host = env::var("OLLAMA_HOST").unwrap_or_else(|_| "http://localhost".to_string());
        let port = env::var("OLLAMA_PORT")
            .unwrap_or_else(|_| "11434".to_string())
            .parse::<u16>()
            .unwrap_or(11434);
        let model = env::var("OLLAMA_MODEL").unwrap_or_else(|_| "llama3.2:latest".to_string());

        Self {
            host,
            port,
            model,
            welcome_image: PathBuf::from("assets/welcome.png"),
        }
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }
}

/// Per-session state: the pipeline built by a successful session start.
///
/// Each session owns exactly one context; handlers receive it explicitly
/// instead of reaching into keyed session storage.
#[derive(Default)]
pub struct SessionContext {
    pipeline: Option<Box<dyn Answerer>>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_ready(&self) -> bool {
        self.pipeline.is_some()
    }

    pub fn set_pipeline(&mut self, pipeline: Box<dyn Answerer>) {
        self.pipeline = Some(pipeline);
    }

    fn pipeline(&self) -> Result<&dyn Answerer, PipelineError> {
        self.pipeline.as_deref().ok_or(PipelineError::NotReady)
    }
}

/// True iff the text contains at least one non-whitespace character.
pub fn validate_input(text: &str) -> bool {
    !text.trim().is_empty()
}

/// Log an error and surface it to the user as a chat message.
///
/// The single error policy for the whole system: no retries, no sanitizing
/// of the underlying error text.
pub async fn report_error<U: ChatSurface>(
    ui: &mut U,
    context: &str,
    error: &anyhow::Error,
) -> Result<()> {
    let text = format!("An error occurred in {context}: {error}");
    tracing::error!(context, error = %error, "handler failed");
    ui.send_message(OutgoingMessage::text(text)).await
}

/// Session start handler: greet the user and build the session's pipeline.
///
/// Any failure is reported through [`report_error`] and leaves the session
/// without a pipeline; only a failure to deliver to the surface escapes.
pub async fn on_chat_start<U: ChatSurface>(
    ctx: &mut SessionContext,
    ui: &mut U,
    config: &ChatConfig,
) -> Result<()> {
    match init_session(ctx, ui, config).await {
        Ok(()) => {
            tracing::info!(model = %config.model, "session started, pipeline stored");
            Ok(())
        }
        Err(e) => report_error(ui, "chat initialization", &e).await,
    }
}

async fn init_session<U: ChatSurface>(
    ctx: &mut SessionContext,
    ui: &mut U,
    config: &ChatConfig,
) -> Result<()> {
    let image = load_welcome_image(&config.welcome_image)?;
    ui.send_message(OutgoingMessage::text(WELCOME_TEXT).with_attachment(image))
        .await?;

    let prompt = PromptTemplate::new(SYSTEM_INSTRUCTION);
    let client = Ollama::new(config.host.clone(), config.port);
    let pipeline = OllamaPipeline::new(client, config.model.clone(), prompt);
    ctx.set_pipeline(Box::new(pipeline));
    Ok(())
}

fn load_welcome_image(path: &Path) -> Result<ImageAttachment> {
    if !path.is_file() {
        anyhow::bail!("welcome image not found at {}", path.display());
    }
    Ok(ImageAttachment::inline(WELCOME_IMAGE_NAME, path))
}

/// Message handler: validate, stream the pipeline's answer to the surface,
/// and log the processed message.
///
/// Empty input gets a corrective prompt and never reaches the backend. Every
/// other failure is reported through [`report_error`] after abandoning the
/// partially built response.
pub async fn on_message<U: ChatSurface>(
    ctx: &SessionContext,
    ui: &mut U,
    text: &str,
) -> Result<()> {
    if !validate_input(text) {
        return ui.send_message(OutgoingMessage::text(INVALID_INPUT_PROMPT)).await;
    }

    match answer(ctx, ui, text).await {
        Ok(()) => {
            tracing::info!(%text, "processed message");
            Ok(())
        }
        Err(e) => report_error(ui, "message processing", &e).await,
    }
}

async fn answer<U: ChatSurface>(ctx: &SessionContext, ui: &mut U, text: &str) -> Result<()> {
    let pipeline = ctx.pipeline()?;
    ui.begin_message().await?;
    // The span ties every token chunk back to the invocation it belongs to.
    let span = tracing::info_span!("pipeline", question = %text);
    match forward_stream(pipeline, ui, text).instrument(span).await {
        Ok(()) => ui.finish_message().await,
        Err(e) => {
            // The partial text must not survive as a finished answer.
            ui.abandon_message().await.ok();
            Err(e)
        }
    }
}

async fn forward_stream<U: ChatSurface>(
    pipeline: &dyn Answerer,
    ui: &mut U,
    question: &str,
) -> Result<()> {
    let mut stream = pipeline.stream_answer(question).await?;
    while let Some(chunk) = stream.next().await {
        ui.append_token(&chunk?).await?;
    }
    Ok(())
}
