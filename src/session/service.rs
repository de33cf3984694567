//! Conversation service: agent startup, turns, cleanup and disposal.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bon::Builder;
use futures::future::join_all;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::error::{Result, TetherError};
use crate::platform::{Agent, AgentPlatform};

use super::registry::{resolve_or_create_agent, AgentSpec};
use super::table::SessionTable;
use super::turn::{PollPolicy, TurnExecutor, TurnReply};

/// Reply shown when a turn fails for any reason.
pub const ERROR_REPLY: &str =
    "I'm sorry, I encountered an error processing your request. Please try again.";

/// Reply shown when a run completes without agent text.
pub const NO_REPLY: &str = "I'm sorry, I couldn't generate a response. Please try again.";

/// Settings for [`ConversationService::initialize`].
#[derive(Debug, Clone, Builder)]
pub struct ServiceSettings {
    pub agent: AgentSpec,
    #[builder(default)]
    pub poll: PollPolicy,
    /// Delete the agent during [`ConversationService::dispose_all`].
    #[builder(default = true)]
    pub delete_agent_on_dispose: bool,
}

/// Summary of a [`ConversationService::dispose_all`] pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DisposeReport {
    pub sessions_deleted: usize,
    pub sessions_failed: usize,
    pub agent_deleted: bool,
}

/// Brokers conversations with the single remote agent.
///
/// Startup failures are returned from [`initialize`](Self::initialize). After
/// that nothing fails outward: turns always produce display text, cleanup and
/// disposal log and swallow platform errors. Once disposed, turns fail fast.
pub struct ConversationService {
    platform: Arc<dyn AgentPlatform>,
    agent: Agent,
    sessions: SessionTable,
    executor: TurnExecutor,
    delete_agent_on_dispose: bool,
    disposed: AtomicBool,
}

impl ConversationService {
    /// Resolve or create the agent and build the service.
    pub async fn initialize(
        platform: Arc<dyn AgentPlatform>,
        settings: ServiceSettings,
    ) -> Result<Self> {
        info!(agent_name = %settings.agent.name, "initializing conversation service");
        let agent = resolve_or_create_agent(platform.as_ref(), &settings.agent).await?;
        info!(agent_id = %agent.id, "conversation service initialized");
        Ok(Self {
            platform,
            agent,
            sessions: SessionTable::new(),
            executor: TurnExecutor::new(settings.poll),
            delete_agent_on_dispose: settings.delete_agent_on_dispose,
            disposed: AtomicBool::new(false),
        })
    }

    pub fn agent(&self) -> &Agent {
        &self.agent
    }

    pub fn sessions(&self) -> &SessionTable {
        &self.sessions
    }

    /// Number of conversations with a session slot.
    pub fn active_conversations(&self) -> usize {
        self.sessions.len()
    }

    /// Whether [`dispose_all`](Self::dispose_all) has run.
    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    /// Run one turn and return the text to show the user.
    pub async fn process_turn(&self, user_text: &str, conversation_id: &str) -> String {
        self.process_turn_with_cancel(user_text, conversation_id, &CancellationToken::new())
            .await
    }

    /// Like [`process_turn`](Self::process_turn), stopping early when `cancel`
    /// fires.
    pub async fn process_turn_with_cancel(
        &self,
        user_text: &str,
        conversation_id: &str,
        cancel: &CancellationToken,
    ) -> String {
        debug!(conversation_id, "processing turn");
        match self.try_turn(user_text, conversation_id, cancel).await {
            Ok(TurnReply::Text(reply)) => reply,
            Ok(TurnReply::RunFailed { status, detail }) => {
                error!(
                    conversation_id,
                    status = %status,
                    detail = detail.as_deref().unwrap_or("none"),
                    "agent run failed"
                );
                ERROR_REPLY.to_string()
            }
            Ok(TurnReply::Empty) => {
                warn!(conversation_id, "agent produced no reply text");
                NO_REPLY.to_string()
            }
            Err(e) => {
                error!(
                    conversation_id,
                    error = %e,
                    category = ?e.category(),
                    retryable = e.is_retryable(),
                    "error processing message"
                );
                ERROR_REPLY.to_string()
            }
        }
    }

    async fn try_turn(
        &self,
        user_text: &str,
        conversation_id: &str,
        cancel: &CancellationToken,
    ) -> Result<TurnReply> {
        if self.is_disposed() {
            warn!(conversation_id, "turn rejected, service is disposed");
            return Err(TetherError::Canceled);
        }
        let platform = self.platform.as_ref();
        let session = self
            .sessions
            .get_or_create(conversation_id, || async move {
                let session = platform.create_session().await?;
                info!(conversation_id, session_id = %session.id, "created session");
                Ok::<_, TetherError>(session)
            })
            .await?;
        // Disposal raced with creation: the table no longer tracks this session.
        if self.is_disposed() {
            self.sessions.remove(conversation_id);
            warn!(conversation_id, session_id = %session.id, "service disposed during turn, deleting session");
            if let Err(e) = self.platform.delete_session(&session.id).await {
                debug!(session_id = %session.id, error = %e, "session already gone");
            }
            return Err(TetherError::Canceled);
        }
        self.executor
            .run_turn(platform, &self.agent, &session, user_text, cancel)
            .await
    }

    /// Forget `conversation_id` and delete its remote session.
    ///
    /// Safe to call for unknown or already cleaned-up conversations.
    pub async fn cleanup_conversation(&self, conversation_id: &str) {
        let Some(session) = self.sessions.remove(conversation_id) else {
            debug!(conversation_id, "no session to clean up");
            return;
        };
        match self.platform.delete_session(&session.id).await {
            Ok(()) => info!(conversation_id, session_id = %session.id, "cleaned up session"),
            Err(e) => warn!(
                conversation_id,
                session_id = %session.id,
                error = %e,
                "error cleaning up session"
            ),
        }
    }

    /// Delete every session, then the agent. Each deletion is independent:
    /// failures are logged and the remaining deletions still run.
    ///
    /// Turns started afterwards fail fast, and a session whose creation was
    /// still in flight is deleted by the turn that created it.
    pub async fn dispose_all(&self) -> DisposeReport {
        self.disposed.store(true, Ordering::SeqCst);
        let mut report = DisposeReport::default();

        let sessions = self.sessions.remove_all();
        let deletions = sessions
            .iter()
            .map(|session| self.platform.delete_session(&session.id));
        for (session, outcome) in sessions.iter().zip(join_all(deletions).await) {
            match outcome {
                Ok(()) => report.sessions_deleted += 1,
                Err(e) => {
                    report.sessions_failed += 1;
                    warn!(session_id = %session.id, error = %e, "error deleting session during disposal");
                }
            }
        }

        if self.delete_agent_on_dispose {
            match self.platform.delete_agent(&self.agent.id).await {
                Ok(()) => report.agent_deleted = true,
                Err(e) => {
                    warn!(agent_id = %self.agent.id, error = %e, "error deleting agent during disposal")
                }
            }
        }

        info!(
            agent_id = %self.agent.id,
            sessions_deleted = report.sessions_deleted,
            sessions_failed = report.sessions_failed,
            agent_deleted = report.agent_deleted,
            "disposed conversation service"
        );
        report
    }
}
