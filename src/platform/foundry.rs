//! REST binding of the persistent-agents API of an AI Foundry project.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::auth::{credential_from_config, TokenCredential};
use crate::config::ResolvedConfig;
use crate::error::TetherError;

use super::http::{bearer_headers, read_json, shared_client};
use super::types::{Agent, Message, MessageRole, NewAgent, Run, Session, SortOrder};
use super::AgentPlatform;

const DEFAULT_API_VERSION: &str = "v1";
const PAGE_LIMIT: &str = "100";

/// Client for `{project_endpoint}/assistants` and `{project_endpoint}/threads`.
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
/// use tether::auth::StaticTokenCredential;
/// use tether::platform::{AgentPlatform, FoundryClient};
///
/// # async fn example() -> tether::error::Result<()> {
/// let client = FoundryClient::new(
///     "https://myhub.services.ai.azure.com/api/projects/demo",
///     Arc::new(StaticTokenCredential::new("token")),
/// );
/// let agents = client.list_agents().await?;
/// # Ok(())
/// # }
/// ```
pub struct FoundryClient {
    client: reqwest::Client,
    endpoint: String,
    api_version: String,
    credential: Arc<dyn TokenCredential>,
}

#[derive(Deserialize)]
struct ListResponse<T> {
    data: Vec<T>,
    #[serde(default)]
    has_more: bool,
    #[serde(default)]
    last_id: Option<String>,
}

#[derive(Deserialize)]
struct DeletionStatus {
    #[serde(default)]
    deleted: bool,
}

impl FoundryClient {
    pub fn new(endpoint: impl Into<String>, credential: Arc<dyn TokenCredential>) -> Self {
        Self {
            client: shared_client().clone(),
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            credential,
        }
    }

    /// Build a client from validated configuration, including its credential.
    pub fn from_config(config: &ResolvedConfig) -> Result<Self, TetherError> {
        let credential = credential_from_config(&config.credential)?;
        Ok(Self::new(config.project_endpoint.clone(), credential)
            .with_api_version(config.api_version.clone()))
    }

    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.endpoint, path)
    }

    async fn headers(&self) -> Result<HeaderMap, TetherError> {
        let token = self.credential.access_token().await?;
        Ok(bearer_headers(&token.token))
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, TetherError> {
        debug!(path, "foundry GET");
        let resp = self
            .client
            .get(self.url(path))
            .headers(self.headers().await?)
            .query(&[("api-version", self.api_version.as_str())])
            .query(query)
            .send()
            .await?;
        read_json(resp).await
    }

    async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, TetherError> {
        debug!(path, "foundry POST");
        let resp = self
            .client
            .post(self.url(path))
            .headers(self.headers().await?)
            .query(&[("api-version", self.api_version.as_str())])
            .json(body)
            .send()
            .await?;
        read_json(resp).await
    }

    async fn delete(&self, path: &str) -> Result<(), TetherError> {
        debug!(path, "foundry DELETE");
        let resp = self
            .client
            .delete(self.url(path))
            .headers(self.headers().await?)
            .query(&[("api-version", self.api_version.as_str())])
            .send()
            .await?;
        let status: DeletionStatus = read_json(resp).await?;
        if !status.deleted {
            return Err(TetherError::InvalidResponse(format!(
                "platform did not confirm deletion of {path}"
            )));
        }
        Ok(())
    }

    /// Collect every page of a cursor-paginated listing.
    async fn list_all<T: DeserializeOwned>(
        &self,
        path: &str,
        order: SortOrder,
    ) -> Result<Vec<T>, TetherError> {
        let mut items = Vec::new();
        let mut after: Option<String> = None;
        loop {
            let mut query = vec![
                ("limit", PAGE_LIMIT.to_string()),
                ("order", order.to_string()),
            ];
            if let Some(ref cursor) = after {
                query.push(("after", cursor.clone()));
            }
            let page: ListResponse<T> = self.get(path, &query).await?;
            let exhausted = !page.has_more || page.data.is_empty() || page.last_id.is_none();
            items.extend(page.data);
            if exhausted {
                return Ok(items);
            }
            after = page.last_id;
        }
    }
}

#[async_trait]
impl AgentPlatform for FoundryClient {
    async fn list_agents(&self) -> Result<Vec<Agent>, TetherError> {
        self.list_all("assistants", SortOrder::Asc).await
    }

    async fn create_agent(&self, agent: &NewAgent) -> Result<Agent, TetherError> {
        self.post("assistants", agent).await
    }

    async fn delete_agent(&self, agent_id: &str) -> Result<(), TetherError> {
        self.delete(&format!("assistants/{agent_id}")).await
    }

    async fn create_session(&self) -> Result<Session, TetherError> {
        self.post("threads", &json!({})).await
    }

    async fn delete_session(&self, session_id: &str) -> Result<(), TetherError> {
        self.delete(&format!("threads/{session_id}")).await
    }

    async fn post_message(
        &self,
        session_id: &str,
        role: MessageRole,
        text: &str,
    ) -> Result<Message, TetherError> {
        let body = json!({ "role": role.to_string(), "content": text });
        self.post(&format!("threads/{session_id}/messages"), &body)
            .await
    }

    async fn start_run(&self, session_id: &str, agent_id: &str) -> Result<Run, TetherError> {
        let body = json!({ "assistant_id": agent_id });
        self.post(&format!("threads/{session_id}/runs"), &body).await
    }

    async fn get_run(&self, session_id: &str, run_id: &str) -> Result<Run, TetherError> {
        self.get(&format!("threads/{session_id}/runs/{run_id}"), &[])
            .await
    }

    async fn cancel_run(&self, session_id: &str, run_id: &str) -> Result<Run, TetherError> {
        self.post(
            &format!("threads/{session_id}/runs/{run_id}/cancel"),
            &json!({}),
        )
        .await
    }

    async fn list_messages(
        &self,
        session_id: &str,
        order: SortOrder,
    ) -> Result<Vec<Message>, TetherError> {
        self.list_all(&format!("threads/{session_id}/messages"), order)
            .await
    }
}
