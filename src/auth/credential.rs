use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::debug;

use crate::config::{CredentialConfig, CredentialKind};

use super::error::AuthError;
use super::token::AccessToken;
use super::DEFAULT_SCOPE;

const DEFAULT_AUTHORITY_HOST: &str = "https://login.microsoftonline.com";
const DEFAULT_IDENTITY_ENDPOINT: &str = "http://169.254.169.254/metadata/identity/oauth2/token";
const IDENTITY_API_VERSION: &str = "2018-02-01";

/// Source of bearer tokens for platform requests.
#[async_trait]
pub trait TokenCredential: Send + Sync {
    async fn access_token(&self) -> Result<AccessToken, AuthError>;
}

/// Fixed bearer token, e.g. one minted by `az account get-access-token`.
pub struct StaticTokenCredential {
    token: String,
}

impl StaticTokenCredential {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl TokenCredential for StaticTokenCredential {
    async fn access_token(&self) -> Result<AccessToken, AuthError> {
        Ok(AccessToken::new(self.token.clone(), None))
    }
}

/// OAuth2 client-credentials grant for a service principal.
///
/// # Example
/// ```no_run
/// use tether::auth::{ClientSecretCredential, TokenCredential};
///
/// # async fn example() -> Result<(), tether::auth::AuthError> {
/// let credential = ClientSecretCredential::new("tenant", "client-id", "client-secret");
/// let token = credential.access_token().await?;
/// # Ok(())
/// # }
/// ```
pub struct ClientSecretCredential {
    client: reqwest::Client,
    authority_host: String,
    tenant_id: String,
    client_id: String,
    client_secret: String,
    scope: String,
}

impl ClientSecretCredential {
    pub fn new(
        tenant_id: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            authority_host: DEFAULT_AUTHORITY_HOST.to_string(),
            tenant_id: tenant_id.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            scope: DEFAULT_SCOPE.to_string(),
        }
    }

    pub fn with_authority_host(mut self, host: impl Into<String>) -> Self {
        self.authority_host = host.into();
        self
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    fn token_url(&self) -> String {
        format!(
            "{}/{}/oauth2/v2.0/token",
            self.authority_host.trim_end_matches('/'),
            self.tenant_id
        )
    }
}

#[async_trait]
impl TokenCredential for ClientSecretCredential {
    async fn access_token(&self) -> Result<AccessToken, AuthError> {
        debug!(tenant_id = %self.tenant_id, client_id = %self.client_id, "requesting client-secret token");
        let resp = self
            .client
            .post(self.token_url())
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("scope", self.scope.as_str()),
            ])
            .send()
            .await?;
        read_token_response(resp).await
    }
}

/// Token from the instance metadata service of the hosting compute.
///
/// `client_id` selects a user-assigned identity; without it the system-assigned
/// identity is used.
pub struct ManagedIdentityCredential {
    client: reqwest::Client,
    endpoint: String,
    client_id: Option<String>,
    resource: String,
}

impl ManagedIdentityCredential {
    pub fn new(client_id: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: DEFAULT_IDENTITY_ENDPOINT.to_string(),
            client_id,
            resource: scope_to_resource(DEFAULT_SCOPE),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_scope(mut self, scope: &str) -> Self {
        self.resource = scope_to_resource(scope);
        self
    }
}

#[async_trait]
impl TokenCredential for ManagedIdentityCredential {
    async fn access_token(&self) -> Result<AccessToken, AuthError> {
        debug!(client_id = ?self.client_id, "requesting managed identity token");
        let mut query = vec![
            ("api-version", IDENTITY_API_VERSION),
            ("resource", self.resource.as_str()),
        ];
        if let Some(ref client_id) = self.client_id {
            query.push(("client_id", client_id.as_str()));
        }
        let resp = self
            .client
            .get(&self.endpoint)
            .header("Metadata", "true")
            .query(&query)
            .send()
            .await?;
        read_token_response(resp).await
    }
}

/// Reuses a token until it is within `refresh_margin` of expiry.
///
/// The cache lock is held across the refresh so concurrent callers share a
/// single token request.
pub struct CachedCredential<C> {
    inner: C,
    cached: Mutex<Option<AccessToken>>,
    refresh_margin: Duration,
}

impl<C: TokenCredential> CachedCredential<C> {
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            cached: Mutex::new(None),
            refresh_margin: Duration::minutes(5),
        }
    }

    pub fn with_refresh_margin(mut self, margin: Duration) -> Self {
        self.refresh_margin = margin;
        self
    }
}

#[async_trait]
impl<C: TokenCredential> TokenCredential for CachedCredential<C> {
    async fn access_token(&self) -> Result<AccessToken, AuthError> {
        let mut cached = self.cached.lock().await;
        if let Some(ref token) = *cached {
            if !token.expires_within(self.refresh_margin) {
                return Ok(token.clone());
            }
        }
        let fresh = self.inner.access_token().await?;
        *cached = Some(fresh.clone());
        Ok(fresh)
    }
}

/// Build the credential described by `config`.
pub fn credential_from_config(
    config: &CredentialConfig,
) -> Result<Arc<dyn TokenCredential>, AuthError> {
    let scope = config.scope.as_deref().unwrap_or(DEFAULT_SCOPE);
    match config.resolved_kind() {
        CredentialKind::Token => {
            let token = config
                .token
                .clone()
                .ok_or(AuthError::MissingSetting("credential.token"))?;
            Ok(Arc::new(StaticTokenCredential::new(token)))
        }
        CredentialKind::ClientSecret => {
            let tenant_id = config
                .tenant_id
                .clone()
                .ok_or(AuthError::MissingSetting("credential.tenant_id"))?;
            let client_id = config
                .client_id
                .clone()
                .ok_or(AuthError::MissingSetting("credential.client_id"))?;
            let client_secret = config
                .client_secret
                .clone()
                .ok_or(AuthError::MissingSetting("credential.client_secret"))?;
            let mut credential =
                ClientSecretCredential::new(tenant_id, client_id, client_secret).with_scope(scope);
            if let Some(ref host) = config.authority_host {
                credential = credential.with_authority_host(host.clone());
            }
            Ok(Arc::new(CachedCredential::new(credential)))
        }
        CredentialKind::ManagedIdentity => {
            let mut credential =
                ManagedIdentityCredential::new(config.managed_identity_client_id.clone())
                    .with_scope(scope);
            if let Some(ref endpoint) = config.identity_endpoint {
                credential = credential.with_endpoint(endpoint.clone());
            }
            Ok(Arc::new(CachedCredential::new(credential)))
        }
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct TokenErrorResponse {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

async fn read_token_response(resp: reqwest::Response) -> Result<AccessToken, AuthError> {
    let status = resp.status();
    let body = resp.text().await?;
    if !status.is_success() {
        let message = serde_json::from_str::<TokenErrorResponse>(&body)
            .ok()
            .and_then(|e| e.error_description.or(e.error))
            .unwrap_or(body);
        return Err(AuthError::Rejected {
            status: status.as_u16(),
            message,
        });
    }
    let payload: TokenResponse = serde_json::from_str(&body)?;
    if payload.access_token.is_empty() {
        return Err(AuthError::InvalidResponse("empty access_token".into()));
    }
    // Instance metadata reports expires_in as a string, the login endpoint as a number.
    let expires_in = payload.expires_in.as_ref().and_then(|v| match v {
        serde_json::Value::Number(n) => n.as_i64(),
        serde_json::Value::String(s) => s.parse().ok(),
        _ => None,
    });
    Ok(match expires_in {
        Some(seconds) => AccessToken::expiring_in(payload.access_token, seconds),
        None => AccessToken::new(payload.access_token, None),
    })
}

fn scope_to_resource(scope: &str) -> String {
    scope.trim_end_matches("/.default").to_string()
}
