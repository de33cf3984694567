//! tether console client entry point.

use std::sync::Arc;

use clap::Parser;
use tether::cli::{run_repl, AskArgs, Cli, Commands};
use tether::config::TetherConfig;
use tether::platform::FoundryClient;
use tether::session::ConversationService;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use uuid::Uuid;

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut resolved = TetherConfig::load(cli.config.as_deref())?.resolve()?;
    if matches!(cli.command, Commands::Ask(AskArgs { keep_agent: true, .. })) {
        resolved.service.delete_agent_on_dispose = false;
    }

    let platform = Arc::new(FoundryClient::from_config(&resolved)?);
    let service = ConversationService::initialize(platform, resolved.service).await?;

    let outcome = match cli.command {
        Commands::Chat => {
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            run_repl(&service, stdin, &mut std::io::stdout()).await
        }
        Commands::Ask(args) => {
            let conversation_id = Uuid::new_v4().to_string();
            let reply = service.process_turn(&args.prompt, &conversation_id).await;
            println!("{reply}");
            service.cleanup_conversation(&conversation_id).await;
            Ok(())
        }
    };

    service.dispose_all().await;
    outcome?;
    Ok(())
}
