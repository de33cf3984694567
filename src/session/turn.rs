//! One turn: post the user message, run the agent, poll, extract the reply.

use std::time::Duration;

use bon::Builder;
use tokio::time::{sleep, sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::{Result, TetherError};
use crate::platform::{Agent, AgentPlatform, Message, MessageRole, Run, RunStatus, Session, SortOrder};

/// Polling discipline for a run.
///
/// `deadline` bounds the total time spent waiting for a run to leave the
/// pending states; `None` polls until the platform reports a terminal status.
///
/// ```
/// use std::time::Duration;
/// use tether::session::PollPolicy;
///
/// let policy = PollPolicy::builder()
///     .interval(Duration::from_millis(250))
///     .deadline(Duration::from_secs(60))
///     .build();
/// assert_eq!(policy.deadline, Some(Duration::from_secs(60)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Builder)]
pub struct PollPolicy {
    #[builder(default = Duration::from_millis(500))]
    pub interval: Duration,
    pub deadline: Option<Duration>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(500),
            deadline: Some(Duration::from_secs(300)),
        }
    }
}

/// Outcome of a turn that reached the platform without transport errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnReply {
    /// Text of the agent's newest message.
    Text(String),
    /// The run ended in a non-completed state; messages were not read.
    RunFailed {
        status: RunStatus,
        detail: Option<String>,
    },
    /// The run completed but left no agent text.
    Empty,
}

/// Executes turns against the platform using a [`PollPolicy`].
#[derive(Debug, Clone, Default)]
pub struct TurnExecutor {
    policy: PollPolicy,
}

impl TurnExecutor {
    pub fn new(policy: PollPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &PollPolicy {
        &self.policy
    }

    /// Run one turn of `session` with `user_text`.
    ///
    /// Transport and platform errors are returned as `Err`; run-level failure
    /// is reported as [`TurnReply::RunFailed`]. Hitting the deadline or a
    /// cancellation asks the platform to cancel the run before returning
    /// [`TetherError::Timeout`] or [`TetherError::Canceled`].
    pub async fn run_turn(
        &self,
        platform: &dyn AgentPlatform,
        agent: &Agent,
        session: &Session,
        user_text: &str,
        cancel: &CancellationToken,
    ) -> Result<TurnReply> {
        platform
            .post_message(&session.id, MessageRole::User, user_text)
            .await?;
        let run = platform.start_run(&session.id, &agent.id).await?;
        debug!(session_id = %session.id, run_id = %run.id, status = %run.status, "run started");

        let run = self.wait_for_run(platform, session, run, cancel).await?;
        if run.status != RunStatus::Completed {
            let detail = run.last_error.and_then(|e| e.message);
            debug!(
                session_id = %session.id,
                run_id = %run.id,
                status = %run.status,
                "agent run did not complete"
            );
            return Ok(TurnReply::RunFailed {
                status: run.status,
                detail,
            });
        }

        let messages = platform
            .list_messages(&session.id, SortOrder::Desc)
            .await?;
        Ok(match extract_reply(&messages) {
            Some(text) => TurnReply::Text(text),
            None => TurnReply::Empty,
        })
    }

    async fn wait_for_run(
        &self,
        platform: &dyn AgentPlatform,
        session: &Session,
        mut run: Run,
        cancel: &CancellationToken,
    ) -> Result<Run> {
        let deadline_at = self.policy.deadline.map(|d| Instant::now() + d);
        let mut polls: u32 = 0;

        while run.status.is_pending() {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    abandon_run(platform, session, &run).await;
                    return Err(TetherError::Canceled);
                }
                _ = deadline_reached(deadline_at) => {
                    abandon_run(platform, session, &run).await;
                    let waited = self.policy.deadline.unwrap_or_default();
                    return Err(TetherError::Timeout(waited.as_millis() as u64));
                }
                _ = sleep(self.policy.interval) => {}
            }

            run = platform.get_run(&session.id, &run.id).await?;
            polls += 1;
            debug!(run_id = %run.id, status = %run.status, polls, "polled run");
        }
        Ok(run)
    }
}

/// Text of the newest non-user message in a newest-first listing.
///
/// Only that one message is considered; `None` if there is no such message or
/// it carries no text.
pub fn extract_reply(messages_newest_first: &[Message]) -> Option<String> {
    let latest = messages_newest_first
        .iter()
        .find(|m| m.role != MessageRole::User)?;
    let text = latest.text();
    (!text.is_empty()).then_some(text)
}

async fn deadline_reached(at: Option<Instant>) {
    match at {
        Some(at) => sleep_until(at).await,
        None => std::future::pending().await,
    }
}

async fn abandon_run(platform: &dyn AgentPlatform, session: &Session, run: &Run) {
    if let Err(e) = platform.cancel_run(&session.id, &run.id).await {
        warn!(session_id = %session.id, run_id = %run.id, error = %e, "failed to cancel abandoned run");
    }
}
