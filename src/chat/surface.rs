use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::Result;
use async_trait::async_trait;

/// How an attached image should be presented by the surface.
///
/// The full set is part of the surface contract; richer surfaces place
/// attachments beside the message or on their own page, while the built-in
/// terminal surfaces render every mode as an inline placeholder line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayMode {
    /// Rendered with the message content.
    Inline,
    /// Rendered next to the conversation.
    Side,
    /// Rendered on a separate page or pane.
    Page,
}

/// A static image shipped with a message, identified by name and file path.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageAttachment {
    pub name: String,
    pub display: DisplayMode,
    pub path: PathBuf,
}

impl ImageAttachment {
    pub fn inline(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            display: DisplayMode::Inline,
            path: path.into(),
        }
    }
}

/// A complete message sent to the user in one piece.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OutgoingMessage {
    pub content: String,
    pub attachments: Vec<ImageAttachment>,
}

impl OutgoingMessage {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            attachments: Vec::new(),
        }
    }

    pub fn with_attachment(mut self, attachment: ImageAttachment) -> Self {
        self.attachments.push(attachment);
        self
    }
}

/// Message primitives of the chat user interface.
///
/// `begin_message`, `append_token`, and `finish_message` bracket one streamed
/// response; `abandon_message` drops a placeholder whose stream failed before
/// completion.
#[async_trait]
pub trait ChatSurface: Send {
    async fn send_message(&mut self, message: OutgoingMessage) -> Result<()>;
    async fn begin_message(&mut self) -> Result<()>;
    async fn append_token(&mut self, chunk: &str) -> Result<()>;
    async fn finish_message(&mut self) -> Result<()>;
    async fn abandon_message(&mut self) -> Result<()>;
}

/// Surface for one-shot command-line use; tokens go straight to stdout.
pub struct StdoutSurface;

#[async_trait]
impl ChatSurface for StdoutSurface {
    async fn send_message(&mut self, message: OutgoingMessage) -> Result<()> {
        for attachment in &message.attachments {
            println!("[image: {} ({})]", attachment.name, attachment.path.display());
        }
        println!("{}", message.content);
        Ok(())
    }

    async fn begin_message(&mut self) -> Result<()> {
        Ok(())
    }

    async fn append_token(&mut self, chunk: &str) -> Result<()> {
        print!("{chunk}");
        io::stdout().flush()?;
        Ok(())
    }

    async fn finish_message(&mut self) -> Result<()> {
        println!();
        Ok(())
    }

    async fn abandon_message(&mut self) -> Result<()> {
        println!();
        Ok(())
    }
}
