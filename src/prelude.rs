//! Convenience re-exports.

pub use crate::config::{ResolvedConfig, TetherConfig};
pub use crate::error::{Result, TetherError};
pub use crate::platform::{AgentPlatform, FoundryClient};
pub use crate::session::{ConversationService, PollPolicy, ServiceSettings, ERROR_REPLY, NO_REPLY};
pub use tokio_util::sync::CancellationToken;
