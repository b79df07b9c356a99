use anyhow::Result;
use async_trait::async_trait;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::{
    io,
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::mpsc;

use crate::chat::{self, ChatConfig, ChatSurface, OutgoingMessage, SessionContext};
use crate::tui::{message::UiMessage, ui::render_ui};

/// Input mode for the TUI
enum InputMode {
    Normal,
    Editing,
}

/// One surface call forwarded from a handler task to the render loop.
#[derive(Debug)]
pub enum UiEvent {
    Message(OutgoingMessage),
    BeginStream,
    Token(String),
    FinishStream,
    AbandonStream,
    HandlerDone,
}

/// [`ChatSurface`] that hands every call to the render loop over a channel.
pub struct ChannelSurface {
    tx: mpsc::UnboundedSender<UiEvent>,
}

impl ChannelSurface {
    pub fn new(tx: mpsc::UnboundedSender<UiEvent>) -> Self {
        Self { tx }
    }

    fn emit(&self, event: UiEvent) -> Result<()> {
        self.tx
            .send(event)
            .map_err(|_| anyhow::anyhow!("chat surface closed"))
    }
}

#[async_trait]
impl ChatSurface for ChannelSurface {
    async fn send_message(&mut self, message: OutgoingMessage) -> Result<()> {
        self.emit(UiEvent::Message(message))
    }

    async fn begin_message(&mut self) -> Result<()> {
        self.emit(UiEvent::BeginStream)
    }

    async fn append_token(&mut self, chunk: &str) -> Result<()> {
        self.emit(UiEvent::Token(chunk.to_string()))
    }

    async fn finish_message(&mut self) -> Result<()> {
        self.emit(UiEvent::FinishStream)
    }

    async fn abandon_message(&mut self) -> Result<()> {
        self.emit(UiEvent::AbandonStream)
    }
}

/// TUI Application state
pub struct ChatApp {
    // Session state shared with handler tasks
    ctx: Arc<SessionContext>,
    model: String,

    // Rendered conversation
    messages: Vec<UiMessage>,

    // Input state
    input: String,
    input_history: Vec<String>,
    input_history_index: usize,

    // Loading state
    is_loading: bool,

    // Sender cloned into each spawned message handler
    events_tx: mpsc::UnboundedSender<UiEvent>,
}

impl ChatApp {
    fn new(ctx: Arc<SessionContext>, model: String, events_tx: mpsc::UnboundedSender<UiEvent>) -> Self {
        Self {
            ctx,
            model,
            messages: Vec::new(),
            input: String::new(),
            input_history: Vec::new(),
            input_history_index: 0,
            is_loading: false,
            events_tx,
        }
    }

    /// Get the current message history
    pub fn messages(&self) -> &[UiMessage] {
        &self.messages
    }

    /// Get the current input text
    pub fn input(&self) -> &str {
        &self.input
    }

    /// Check if a response is still streaming in
    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    /// Get the model name
    pub fn model_name(&self) -> &str {
        &self.model
    }

    /// Add a character to the input
    fn handle_input(&mut self, c: char) {
        self.input.push(c);
    }

    /// Remove the last character from the input
    fn backspace(&mut self) {
        self.input.pop();
    }

    /// Go to the previous input in history
    fn previous_input(&mut self) {
        if self.input_history.is_empty() {
            return;
        }

        if self.input_history_index > 0 {
            self.input_history_index -= 1;
            self.input = self.input_history[self.input_history_index].clone();
        }
    }

    /// Go to the next input in history
    fn next_input(&mut self) {
        if self.input_history.is_empty() {
            return;
        }

        if self.input_history_index < self.input_history.len() - 1 {
            self.input_history_index += 1;
            self.input = self.input_history[self.input_history_index].clone();
        } else {
            self.input_history_index = self.input_history.len();
            self.input.clear();
        }
    }

    /// Submit the current input and spawn the message handler for it
    fn submit_message(&mut self) {
        if self.input.is_empty() || self.is_loading {
            return;
        }

        let text = std::mem::take(&mut self.input);
        self.messages.push(UiMessage::user(text.clone()));
        self.input_history.push(text.clone());
        self.input_history_index = self.input_history.len();
        self.is_loading = true;

        let ctx = Arc::clone(&self.ctx);
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let mut surface = ChannelSurface::new(tx.clone());
            if let Err(e) = chat::on_message(ctx.as_ref(), &mut surface, &text).await {
                tracing::error!(error = %e, "message handler failed");
            }
            let _ = tx.send(UiEvent::HandlerDone);
        });
    }

    /// Apply one surface call to the rendered conversation
    fn apply_event(&mut self, event: UiEvent) {
        match event {
            UiEvent::Message(message) => {
                self.messages
                    .push(UiMessage::assistant(message.content, message.attachments));
            }
            UiEvent::BeginStream => {
                self.messages.push(UiMessage::streaming());
            }
            UiEvent::Token(chunk) => {
                if let Some(msg) = self.messages.iter_mut().rev().find(|m| m.pending) {
                    msg.content.push_str(&chunk);
                }
            }
            UiEvent::FinishStream => {
                if let Some(msg) = self.messages.iter_mut().rev().find(|m| m.pending) {
                    msg.pending = false;
                }
            }
            UiEvent::AbandonStream => {
                if let Some(index) = self.messages.iter().rposition(|m| m.pending) {
                    self.messages.remove(index);
                }
            }
            UiEvent::HandlerDone => {
                self.is_loading = false;
            }
        }
    }
}

/// TUI-specific state
struct TuiState {
    input_mode: InputMode,
    last_tick: Instant,
}

impl Default for TuiState {
    fn default() -> Self {
        Self {
            input_mode: InputMode::Editing, // Start in editing mode
            last_tick: Instant::now(),
        }
    }
}

/// Run the TUI application
pub async fn run(config: ChatConfig) -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel();

    // Initialize the session before entering the alternate screen; the
    // welcome message lands in the channel and is drained by the first tick.
    let mut ctx = SessionContext::new();
    let mut surface = ChannelSurface::new(tx.clone());
    chat::on_chat_start(&mut ctx, &mut surface, &config).await?;
    let ctx = Arc::new(ctx);

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Create app state
    let mut app = ChatApp::new(ctx, config.model.clone(), tx);

    // Start the main loop
    let tick_rate = Duration::from_millis(100);
    let result = run_app(&mut terminal, &mut app, &mut rx, tick_rate).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

/// Main application loop
async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut ChatApp,
    events: &mut mpsc::UnboundedReceiver<UiEvent>,
    tick_rate: Duration,
) -> Result<()> {
    let mut state = TuiState::default();

    loop {
        // Drain handler output before drawing
        while let Ok(event) = events.try_recv() {
            app.apply_event(event);
        }

        // Draw the UI
        terminal.draw(|f| render_ui(f, app))?;

        // Handle events with timeout
        let timeout = tick_rate
            .checked_sub(state.last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));

        if crossterm::event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match state.input_mode {
                        InputMode::Normal => match key.code {
                            KeyCode::Char('e') => {
                                state.input_mode = InputMode::Editing;
                            }
                            KeyCode::Char('q') => {
                                return Ok(());
                            }
                            _ => {}
                        },
                        InputMode::Editing => match key.code {
                            KeyCode::Enter => {
                                app.submit_message();
                            }
                            KeyCode::Esc => {
                                state.input_mode = InputMode::Normal;
                            }
                            KeyCode::Char(c) => {
                                app.handle_input(c);
                            }
                            KeyCode::Backspace => {
                                app.backspace();
                            }
                            KeyCode::Up => {
                                app.previous_input();
                            }
                            KeyCode::Down => {
                                app.next_input();
                            }
                            _ => {}
                        },
                    }
                }
            }
        }

        // Update tick
        if state.last_tick.elapsed() >= tick_rate {
            state.last_tick = Instant::now();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::ImageAttachment;
    use crate::tui::message::MessageRole;

    fn test_app() -> (ChatApp, mpsc::UnboundedReceiver<UiEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let app = ChatApp::new(Arc::new(SessionContext::new()), "m".to_string(), tx);
        (app, rx)
    }

    #[test]
    fn tokens_accumulate_in_the_streaming_placeholder() {
        let (mut app, _rx) = test_app();

        app.apply_event(UiEvent::BeginStream);
        app.apply_event(UiEvent::Token("Hel".to_string()));
        app.apply_event(UiEvent::Token("lo".to_string()));
        app.apply_event(UiEvent::FinishStream);

        assert_eq!(app.messages().len(), 1);
        assert_eq!(app.messages()[0].content, "Hello");
        assert!(!app.messages()[0].pending);
    }

    #[test]
    fn abandoned_stream_removes_the_placeholder() {
        let (mut app, _rx) = test_app();

        app.apply_event(UiEvent::BeginStream);
        app.apply_event(UiEvent::Token("Hel".to_string()));
        app.apply_event(UiEvent::AbandonStream);
        app.apply_event(UiEvent::Message(OutgoingMessage::text("failed")));

        assert_eq!(app.messages().len(), 1);
        assert_eq!(app.messages()[0].content, "failed");
    }

    #[test]
    fn complete_messages_keep_their_attachments() {
        let (mut app, _rx) = test_app();

        let welcome = OutgoingMessage::text("hi")
            .with_attachment(ImageAttachment::inline("welcome", "assets/welcome.png"));
        app.apply_event(UiEvent::Message(welcome));

        assert_eq!(app.messages()[0].role, MessageRole::Assistant);
        assert_eq!(app.messages()[0].attachments.len(), 1);
    }

    #[tokio::test]
    async fn handler_done_clears_the_loading_flag() {
        let (mut app, mut rx) = test_app();

        app.input.push_str("hello");
        app.submit_message();
        assert!(app.is_loading());
        assert_eq!(app.messages().len(), 1);
        assert_eq!(app.messages()[0].role, MessageRole::User);

        // The context has no pipeline, so the spawned handler reports an
        // error message and completes.
        let mut saw_done = false;
        while let Some(event) = rx.recv().await {
            let done = matches!(event, UiEvent::HandlerDone);
            app.apply_event(event);
            if done {
                saw_done = true;
                break;
            }
        }
        assert!(saw_done);
        assert!(!app.is_loading());
        assert!(app
            .messages()
            .iter()
            .any(|m| m.content.contains("message processing")));
    }
}
