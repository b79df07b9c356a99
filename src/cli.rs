use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional command to run
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Ask a single question and stream the answer to stdout
    Ask {
        /// The question to ask
        #[arg(required = true)]
        question: Vec<String>,

        /// Ollama model to use instead of the configured default
        #[arg(short, long)]
        model: Option<String>,
    },
}
