// Re-export the public API
mod app;
mod message;
mod ui;

pub use app::{run, ChannelSurface, UiEvent};

// The public modules and types users need
pub use message::{MessageRole, UiMessage};
