//! Console client for tether.

pub mod repl;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use repl::{run_repl, ReplCommand};

/// Talk to a persistent agent from the terminal
#[derive(Parser, Debug)]
#[command(name = "tether", version, about = "Console client for a persistent agent")]
pub struct Cli {
    /// Path to a TOML config file (defaults to the user config directory)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Interactive conversation with the agent
    Chat,
    /// Send a single message, print the reply and clean up
    Ask(AskArgs),
}

/// Arguments for the `ask` subcommand.
#[derive(Parser, Debug)]
pub struct AskArgs {
    /// Message to send
    pub prompt: String,

    /// Keep the agent on the platform after answering
    #[arg(long)]
    pub keep_agent: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_chat_with_config() {
        let cli = Cli::try_parse_from(["tether", "--config", "tether.toml", "chat"]).unwrap();
        assert!(matches!(cli.command, Commands::Chat));
        assert_eq!(cli.config, Some(PathBuf::from("tether.toml")));
    }

    #[test]
    fn parse_ask_prompt() {
        let cli = Cli::try_parse_from(["tether", "ask", "2+2?", "--keep-agent"]).unwrap();
        match cli.command {
            Commands::Ask(args) => {
                assert_eq!(args.prompt, "2+2?");
                assert!(args.keep_agent);
            }
            other => panic!("expected Ask, got {other:?}"),
        }
        assert!(cli.config.is_none());
    }

    #[test]
    fn parse_missing_subcommand_is_error() {
        assert!(Cli::try_parse_from(["tether"]).is_err());
    }

    #[test]
    fn parse_ask_missing_prompt_is_error() {
        assert!(Cli::try_parse_from(["tether", "ask"]).is_err());
    }
}
