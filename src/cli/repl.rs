//! Interactive read-eval-print loop over a [`ConversationService`].

use std::io::Write;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::info;
use uuid::Uuid;

use crate::session::ConversationService;

/// A line typed at the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Exit,
    Clear,
    Help,
    Blank,
    Message(String),
}

impl ReplCommand {
    /// Commands are matched case-insensitively after trimming; anything else
    /// is sent to the agent as typed.
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Self::Blank;
        }
        match trimmed.to_lowercase().as_str() {
            "exit" | "quit" => Self::Exit,
            "clear" => Self::Clear,
            "help" => Self::Help,
            _ => Self::Message(line.to_string()),
        }
    }
}

const BANNER: &str = "=== tether console ===
Type your messages and press Enter to send them to the agent.
Type 'exit' or 'quit' to end the conversation.
Type 'clear' to start a new conversation.
Type 'help' for more commands.
";

const HELP: &str = "
Available commands:
  exit, quit - Exit the application
  clear      - Start a new conversation
  help       - Show this help message

Configuration (config.toml or TETHER_* environment variables):
  project_endpoint  / TETHER_PROJECT_ENDPOINT  - AI Foundry project endpoint
  agent_name        / TETHER_AGENT_NAME        - Name of the agent to reuse or create
  model_deployment  / TETHER_MODEL_DEPLOYMENT  - Model deployment for a new agent
  instructions_file / TETHER_INSTRUCTIONS_FILE - Prompty file with system instructions
";

fn new_conversation_id() -> String {
    Uuid::new_v4().to_string()
}

/// Run the REPL until `exit`/`quit` or end of input.
///
/// The current conversation is cleaned up on exit; disposing the service is
/// left to the caller.
pub async fn run_repl<R, W>(
    service: &ConversationService,
    input: R,
    output: &mut W,
) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    writeln!(output, "{BANNER}")?;
    let mut conversation_id = new_conversation_id();
    info!(conversation_id = %conversation_id, "started new conversation");

    let mut lines = input.lines();
    loop {
        write!(output, "You: ")?;
        output.flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };

        match ReplCommand::parse(&line) {
            ReplCommand::Blank => continue,
            ReplCommand::Exit => {
                writeln!(output, "Goodbye!")?;
                break;
            }
            ReplCommand::Clear => {
                service.cleanup_conversation(&conversation_id).await;
                conversation_id = new_conversation_id();
                writeln!(output, "Started new conversation.")?;
                info!(conversation_id = %conversation_id, "started new conversation");
            }
            ReplCommand::Help => writeln!(output, "{HELP}")?,
            ReplCommand::Message(text) => {
                writeln!(output, "Agent: Thinking...")?;
                output.flush()?;
                let reply = service.process_turn(&text, &conversation_id).await;
                writeln!(output, "Agent: {reply}\n")?;
            }
        }
    }

    service.cleanup_conversation(&conversation_id).await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_are_case_insensitive() {
        assert_eq!(ReplCommand::parse("  EXIT "), ReplCommand::Exit);
        assert_eq!(ReplCommand::parse("Quit"), ReplCommand::Exit);
        assert_eq!(ReplCommand::parse("clear"), ReplCommand::Clear);
        assert_eq!(ReplCommand::parse("Help"), ReplCommand::Help);
    }

    #[test]
    fn blank_lines_are_ignored() {
        assert_eq!(ReplCommand::parse("   "), ReplCommand::Blank);
        assert_eq!(ReplCommand::parse(""), ReplCommand::Blank);
    }

    #[test]
    fn other_text_is_a_message() {
        assert_eq!(
            ReplCommand::parse("exit strategy?"),
            ReplCommand::Message("exit strategy?".to_string())
        );
    }
}
