//! Remote agent platform API and its REST binding.

pub mod foundry;
pub mod http;
pub mod types;

pub use foundry::FoundryClient;
pub use types::{
    Agent, Message, MessageContent, MessageRole, NewAgent, Run, RunError, RunStatus, Session,
    SortOrder, TextContent,
};

use async_trait::async_trait;

use crate::error::TetherError;

/// Operations the session manager needs from the agent platform.
#[async_trait]
pub trait AgentPlatform: Send + Sync {
    /// All agents visible to the caller's credentials.
    async fn list_agents(&self) -> Result<Vec<Agent>, TetherError>;

    async fn create_agent(&self, agent: &NewAgent) -> Result<Agent, TetherError>;

    async fn delete_agent(&self, agent_id: &str) -> Result<(), TetherError>;

    async fn create_session(&self) -> Result<Session, TetherError>;

    async fn delete_session(&self, session_id: &str) -> Result<(), TetherError>;

    async fn post_message(
        &self,
        session_id: &str,
        role: MessageRole,
        text: &str,
    ) -> Result<Message, TetherError>;

    async fn start_run(&self, session_id: &str, agent_id: &str) -> Result<Run, TetherError>;

    async fn get_run(&self, session_id: &str, run_id: &str) -> Result<Run, TetherError>;

    /// Ask the platform to stop a pending run.
    async fn cancel_run(&self, session_id: &str, run_id: &str) -> Result<Run, TetherError>;

    async fn list_messages(
        &self,
        session_id: &str,
        order: SortOrder,
    ) -> Result<Vec<Message>, TetherError>;
}
