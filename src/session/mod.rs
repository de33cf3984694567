//! Conversation session manager.
//!
//! Maps conversation identifiers to remote sessions, runs turns against the
//! single resolved agent, and tears sessions down. [`ConversationService`] is
//! the entry point for callers such as the console client or a bot adapter.

pub mod registry;
pub mod service;
pub mod table;
pub mod turn;

pub use registry::{resolve_or_create_agent, AgentSpec};
pub use service::{ConversationService, DisposeReport, ServiceSettings, ERROR_REPLY, NO_REPLY};
pub use table::SessionTable;
pub use turn::{extract_reply, PollPolicy, TurnExecutor, TurnReply};
