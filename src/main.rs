use anyhow::Result;
use clap::Parser;

use parley::chat::{self, ChatConfig, SessionContext, StdoutSurface};
use parley::cli::{Cli, Commands};
use parley::logging::{self, LogConfig};
use parley::tui;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    logging::init(&LogConfig::default());

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Ask { question, model }) => {
            let mut config = ChatConfig::from_env();
            if let Some(model) = model {
                config = config.with_model(&model);
            }

            let mut ctx = SessionContext::new();
            let mut surface = StdoutSurface;
            chat::on_chat_start(&mut ctx, &mut surface, &config).await?;
            chat::on_message(&ctx, &mut surface, &question.join(" ")).await?;
        }
        None => {
            tui::run(ChatConfig::from_env()).await?;
        }
    }

    Ok(())
}
