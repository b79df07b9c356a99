// Re-export the public API
mod session;
mod surface;

pub use session::{
    on_chat_start, on_message, report_error, validate_input, ChatConfig, SessionContext,
    INVALID_INPUT_PROMPT, WELCOME_TEXT,
};
pub use surface::{ChatSurface, DisplayMode, ImageAttachment, OutgoingMessage, StdoutSurface};
