use tracing::Level;

/// Process-wide logging settings.
pub struct LogConfig {
    pub level: Level,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self { level: Level::INFO }
    }
}

/// Install the global tracing subscriber.
///
/// Logs go to stderr so the terminal UI on stdout stays intact. Calling this
/// more than once keeps the first subscriber.
pub fn init(config: &LogConfig) {
    tracing_subscriber::fmt()
        .with_max_level(config.level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .ok();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_init_is_a_no_op() {
        init(&LogConfig::default());
        init(&LogConfig { level: Level::DEBUG });
    }
}
