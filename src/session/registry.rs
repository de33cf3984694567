//! Resolution of the long-lived remote agent.

use tracing::{error, info};

use crate::error::Result;
use crate::platform::{Agent, AgentPlatform, NewAgent};

/// Identity of the agent this service drives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentSpec {
    pub name: String,
    pub model: String,
    /// May be empty.
    pub instructions: String,
}

/// Reuse the first agent whose name matches `spec.name` exactly, or create one.
///
/// Listing and creation failures propagate: the service cannot run without an
/// agent.
pub async fn resolve_or_create_agent(
    platform: &dyn AgentPlatform,
    spec: &AgentSpec,
) -> Result<Agent> {
    info!(agent_name = %spec.name, "resolving agent");
    let agents = platform.list_agents().await.map_err(|e| {
        error!(agent_name = %spec.name, error = %e, "failed to list agents");
        e
    })?;

    if let Some(existing) = agents
        .into_iter()
        .find(|a| a.name.as_deref() == Some(spec.name.as_str()))
    {
        info!(agent_name = %spec.name, agent_id = %existing.id, "found existing agent");
        return Ok(existing);
    }

    info!(agent_name = %spec.name, model = %spec.model, "no existing agent, creating one");
    let request = NewAgent {
        model: spec.model.clone(),
        name: spec.name.clone(),
        instructions: spec.instructions.clone(),
    };
    let created = platform.create_agent(&request).await.map_err(|e| {
        error!(agent_name = %spec.name, error = %e, "failed to create agent");
        e
    })?;
    info!(agent_name = %spec.name, agent_id = %created.id, "created agent");
    Ok(created)
}
