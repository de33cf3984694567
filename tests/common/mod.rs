//! Shared test helpers and a scripted in-memory platform.
#![allow(dead_code)]

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use tether::error::TetherError;
use tether::platform::{
    Agent, AgentPlatform, Message, MessageContent, MessageRole, NewAgent, Run, RunError,
    RunStatus, Session, SortOrder,
};
use tether::session::{AgentSpec, PollPolicy, ServiceSettings};

/// In-memory platform whose run outcomes and replies are queued by the test.
///
/// `get_run` pops scripted runs front to back and keeps returning the last one
/// once the script is down to a single entry. Deleting an unknown session or
/// agent fails with `NotFound`, like the real platform.
#[derive(Default)]
pub struct MockPlatform {
    agents: Mutex<Vec<Agent>>,
    live_sessions: Mutex<HashSet<String>>,
    run_script: Mutex<VecDeque<Run>>,
    messages: Mutex<Vec<Message>>,
    posted: Mutex<Vec<(String, MessageRole, String)>>,
    failing_session_deletes: Mutex<HashSet<String>>,
    create_session_delay: Mutex<Option<Duration>>,
    pub sessions_created: AtomicUsize,
    pub agents_created: AtomicUsize,
    pub list_agents_calls: AtomicUsize,
    pub runs_started: AtomicUsize,
    pub get_run_calls: AtomicUsize,
    pub cancel_calls: AtomicUsize,
    pub list_messages_calls: AtomicUsize,
    pub deleted_sessions: Mutex<Vec<String>>,
    pub deleted_agents: Mutex<Vec<String>>,
    pub fail_list_agents: AtomicBool,
    pub fail_create_agent: AtomicBool,
    pub fail_create_session: AtomicBool,
    pub fail_post_message: AtomicBool,
    pub fail_agent_delete: AtomicBool,
}

impl MockPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-existing agent visible to `list_agents`.
    pub fn with_agent(self, id: &str, name: &str) -> Self {
        self.agents.lock().unwrap().push(Agent {
            id: id.to_string(),
            name: Some(name.to_string()),
            model: "gpt-4o".to_string(),
            instructions: None,
        });
        self
    }

    /// Statuses returned by successive `get_run` calls.
    pub fn with_run_statuses(self, statuses: &[RunStatus]) -> Self {
        {
            let mut script = self.run_script.lock().unwrap();
            for status in statuses {
                script.push_back(run(*status, None));
            }
        }
        self
    }

    /// Script a failed run with an error message.
    pub fn with_failed_run(self, message: &str) -> Self {
        self.run_script.lock().unwrap().push_back(run(
            RunStatus::Failed,
            Some(RunError {
                code: Some("server_error".to_string()),
                message: Some(message.to_string()),
            }),
        ));
        self
    }

    /// Messages returned by `list_messages`, newest first.
    pub fn with_messages(self, messages: Vec<Message>) -> Self {
        *self.messages.lock().unwrap() = messages;
        self
    }

    pub fn with_create_session_delay(self, delay: Duration) -> Self {
        *self.create_session_delay.lock().unwrap() = Some(delay);
        self
    }

    pub fn fail_delete_of(&self, session_id: &str) {
        self.failing_session_deletes
            .lock()
            .unwrap()
            .insert(session_id.to_string());
    }

    pub fn posted(&self) -> Vec<(String, MessageRole, String)> {
        self.posted.lock().unwrap().clone()
    }

    pub fn live_session_count(&self) -> usize {
        self.live_sessions.lock().unwrap().len()
    }

    pub fn agent_count(&self) -> usize {
        self.agents.lock().unwrap().len()
    }
}

pub fn run(status: RunStatus, last_error: Option<RunError>) -> Run {
    Run {
        id: "run_1".to_string(),
        status,
        last_error,
    }
}

pub fn message(role: MessageRole, parts: &[&str]) -> Message {
    Message {
        id: format!("msg_{}", parts.concat()),
        role,
        created_at: None,
        content: parts.iter().map(|p| MessageContent::text(*p)).collect(),
    }
}

pub fn agent_reply(text: &str) -> Vec<Message> {
    vec![
        message(MessageRole::Agent, &[text]),
        message(MessageRole::User, &["question"]),
    ]
}

pub fn settings(poll: PollPolicy) -> ServiceSettings {
    ServiceSettings::builder()
        .agent(AgentSpec {
            name: "helper".to_string(),
            model: "gpt-4o".to_string(),
            instructions: "Answer briefly.".to_string(),
        })
        .poll(poll)
        .build()
}

pub fn fast_poll() -> PollPolicy {
    PollPolicy::builder()
        .interval(Duration::from_millis(5))
        .deadline(Duration::from_secs(5))
        .build()
}

#[async_trait]
impl AgentPlatform for MockPlatform {
    async fn list_agents(&self) -> Result<Vec<Agent>, TetherError> {
        self.list_agents_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_list_agents.load(Ordering::SeqCst) {
            return Err(TetherError::api(503, "listing unavailable"));
        }
        Ok(self.agents.lock().unwrap().clone())
    }

    async fn create_agent(&self, agent: &NewAgent) -> Result<Agent, TetherError> {
        if self.fail_create_agent.load(Ordering::SeqCst) {
            return Err(TetherError::api(400, "model deployment not found"));
        }
        let n = self.agents_created.fetch_add(1, Ordering::SeqCst);
        let created = Agent {
            id: format!("asst_new_{n}"),
            name: Some(agent.name.clone()),
            model: agent.model.clone(),
            instructions: Some(agent.instructions.clone()),
        };
        self.agents.lock().unwrap().push(created.clone());
        Ok(created)
    }

    async fn delete_agent(&self, agent_id: &str) -> Result<(), TetherError> {
        if self.fail_agent_delete.load(Ordering::SeqCst) {
            return Err(TetherError::api(500, "agent delete failed"));
        }
        let mut agents = self.agents.lock().unwrap();
        let before = agents.len();
        agents.retain(|a| a.id != agent_id);
        if agents.len() == before {
            return Err(TetherError::NotFound(format!("agent {agent_id}")));
        }
        self.deleted_agents.lock().unwrap().push(agent_id.to_string());
        Ok(())
    }

    async fn create_session(&self) -> Result<Session, TetherError> {
        if self.fail_create_session.load(Ordering::SeqCst) {
            return Err(TetherError::api(500, "thread creation failed"));
        }
        let delay = *self.create_session_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let n = self.sessions_created.fetch_add(1, Ordering::SeqCst);
        let id = format!("thread_{n}");
        self.live_sessions.lock().unwrap().insert(id.clone());
        Ok(Session { id })
    }

    async fn delete_session(&self, session_id: &str) -> Result<(), TetherError> {
        if self.failing_session_deletes.lock().unwrap().contains(session_id) {
            return Err(TetherError::api(500, "thread delete failed"));
        }
        if !self.live_sessions.lock().unwrap().remove(session_id) {
            return Err(TetherError::NotFound(format!("thread {session_id}")));
        }
        self.deleted_sessions
            .lock()
            .unwrap()
            .push(session_id.to_string());
        Ok(())
    }

    async fn post_message(
        &self,
        session_id: &str,
        role: MessageRole,
        text: &str,
    ) -> Result<Message, TetherError> {
        if self.fail_post_message.load(Ordering::SeqCst) {
            return Err(TetherError::api(400, "thread is locked"));
        }
        self.posted
            .lock()
            .unwrap()
            .push((session_id.to_string(), role, text.to_string()));
        Ok(message(role, &[text]))
    }

    async fn start_run(&self, _session_id: &str, _agent_id: &str) -> Result<Run, TetherError> {
        self.runs_started.fetch_add(1, Ordering::SeqCst);
        Ok(run(RunStatus::Queued, None))
    }

    async fn get_run(&self, _session_id: &str, _run_id: &str) -> Result<Run, TetherError> {
        self.get_run_calls.fetch_add(1, Ordering::SeqCst);
        let mut script = self.run_script.lock().unwrap();
        let next = if script.len() > 1 {
            script.pop_front()
        } else {
            script.front().cloned()
        };
        Ok(next.unwrap_or_else(|| run(RunStatus::Completed, None)))
    }

    async fn cancel_run(&self, _session_id: &str, _run_id: &str) -> Result<Run, TetherError> {
        self.cancel_calls.fetch_add(1, Ordering::SeqCst);
        Ok(run(RunStatus::Cancelling, None))
    }

    async fn list_messages(
        &self,
        _session_id: &str,
        order: SortOrder,
    ) -> Result<Vec<Message>, TetherError> {
        assert_eq!(order, SortOrder::Desc, "replies are read newest first");
        self.list_messages_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.messages.lock().unwrap().clone())
    }
}
