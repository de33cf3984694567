//! tether: conversation session manager for a remote persistent-agent platform.
//!
//! Keeps one remote thread per conversation so a single long-lived agent
//! retains context across turns. Turns are submitted as runs, polled to
//! completion, and reduced to plain reply text; sessions and the agent are
//! torn down best-effort.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use tether::prelude::*;
//!
//! # async fn example() -> tether::error::Result<()> {
//! let config = TetherConfig::load(None)?.resolve()?;
//! let platform = Arc::new(FoundryClient::from_config(&config)?);
//! let service = ConversationService::initialize(platform, config.service).await?;
//!
//! let reply = service.process_turn("What is 2+2?", "conversation-1").await;
//! println!("{reply}");
//!
//! service.cleanup_conversation("conversation-1").await;
//! service.dispose_all().await;
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod platform;
pub mod prelude;
pub mod session;

#[cfg(feature = "cli")]
pub mod cli;
