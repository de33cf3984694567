//! Configuration system (layered: env > `.env` > TOML file).

pub mod instructions;

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::{Result, TetherError};
use crate::session::{AgentSpec, PollPolicy, ServiceSettings};

const DEFAULT_API_VERSION: &str = "v1";
const DEFAULT_POLL_INTERVAL_MS: u64 = 500;
const DEFAULT_TURN_TIMEOUT_SECS: u64 = 300;

/// Which credential scheme authenticates platform requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CredentialKind {
    Token,
    ClientSecret,
    ManagedIdentity,
}

/// Credential settings. Unset `kind` is inferred from which fields are present.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CredentialConfig {
    pub kind: Option<CredentialKind>,
    pub token: Option<String>,
    pub tenant_id: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub managed_identity_client_id: Option<String>,
    pub authority_host: Option<String>,
    pub identity_endpoint: Option<String>,
    pub scope: Option<String>,
}

impl CredentialConfig {
    /// Explicit kind, else token, else client secret, else managed identity.
    pub fn resolved_kind(&self) -> CredentialKind {
        if let Some(kind) = self.kind {
            return kind;
        }
        if self.token.is_some() {
            CredentialKind::Token
        } else if self.tenant_id.is_some()
            && self.client_id.is_some()
            && self.client_secret.is_some()
        {
            CredentialKind::ClientSecret
        } else {
            CredentialKind::ManagedIdentity
        }
    }
}

impl fmt::Debug for CredentialConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialConfig")
            .field("kind", &self.kind)
            .field("token", &self.token.as_ref().map(|_| ".."))
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| ".."))
            .field("managed_identity_client_id", &self.managed_identity_client_id)
            .field("authority_host", &self.authority_host)
            .field("identity_endpoint", &self.identity_endpoint)
            .field("scope", &self.scope)
            .finish()
    }
}

/// Raw configuration as read from file and environment.
///
/// Every field is optional here; [`TetherConfig::resolve`] checks the required
/// ones and applies defaults.
///
/// ```toml
/// project_endpoint = "https://myhub.services.ai.azure.com/api/projects/demo"
/// agent_name = "support-bot"
/// model_deployment = "gpt-4o"
/// instructions_file = "instructions.prompty"
///
/// [credential]
/// tenant_id = "..."
/// managed_identity_client_id = "..."
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TetherConfig {
    pub project_endpoint: Option<String>,
    pub agent_name: Option<String>,
    pub model_deployment: Option<String>,
    pub api_version: Option<String>,
    pub instructions: Option<String>,
    pub instructions_file: Option<PathBuf>,
    pub poll_interval_ms: Option<u64>,
    pub turn_timeout_secs: Option<u64>,
    pub delete_agent_on_dispose: Option<bool>,
    pub credential: CredentialConfig,
}

/// Validated configuration ready to build the platform client and service.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub project_endpoint: String,
    pub api_version: String,
    pub service: ServiceSettings,
    pub credential: CredentialConfig,
}

impl TetherConfig {
    /// Default config file location (`<config dir>/tether/config.toml`).
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "tether")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| TetherError::Configuration(format!("invalid config: {e}")))
    }

    /// Read a TOML config file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            TetherError::Configuration(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&raw)
    }

    /// Load the full layered configuration.
    ///
    /// An explicit `path` must exist; the default path is optional. `.env` is
    /// loaded if present, then environment variables override file values.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path() {
                Some(default) if default.exists() => Self::from_file(&default)?,
                _ => Self::default(),
            },
        };
        let _ = dotenvy::dotenv(); // load .env if present, ignore error
        config.apply_env_from(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Override fields from `TETHER_*` variables supplied by `lookup`.
    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        let string_mappings: [(&str, &mut Option<String>); 11] = [
            ("TETHER_PROJECT_ENDPOINT", &mut self.project_endpoint),
            ("TETHER_AGENT_NAME", &mut self.agent_name),
            ("TETHER_MODEL_DEPLOYMENT", &mut self.model_deployment),
            ("TETHER_API_VERSION", &mut self.api_version),
            ("TETHER_INSTRUCTIONS", &mut self.instructions),
            ("TETHER_ACCESS_TOKEN", &mut self.credential.token),
            ("TETHER_TENANT_ID", &mut self.credential.tenant_id),
            ("TETHER_CLIENT_ID", &mut self.credential.client_id),
            ("TETHER_CLIENT_SECRET", &mut self.credential.client_secret),
            (
                "TETHER_MANAGED_IDENTITY_CLIENT_ID",
                &mut self.credential.managed_identity_client_id,
            ),
            ("TETHER_IDENTITY_ENDPOINT", &mut self.credential.identity_endpoint),
        ];
        for (var, field) in string_mappings {
            if let Some(value) = lookup(var).filter(|v| !v.is_empty()) {
                *field = Some(value);
            }
        }

        if let Some(path) = lookup("TETHER_INSTRUCTIONS_FILE").filter(|v| !v.is_empty()) {
            self.instructions_file = Some(PathBuf::from(path));
        }
        if let Some(value) = lookup("TETHER_POLL_INTERVAL_MS").filter(|v| !v.trim().is_empty()) {
            self.poll_interval_ms = Some(parse_env("TETHER_POLL_INTERVAL_MS", &value)?);
        }
        if let Some(value) = lookup("TETHER_TURN_TIMEOUT_SECS").filter(|v| !v.trim().is_empty()) {
            self.turn_timeout_secs = Some(parse_env("TETHER_TURN_TIMEOUT_SECS", &value)?);
        }
        if let Some(value) = lookup("TETHER_DELETE_AGENT_ON_DISPOSE").filter(|v| !v.trim().is_empty()) {
            self.delete_agent_on_dispose =
                Some(parse_env("TETHER_DELETE_AGENT_ON_DISPOSE", &value)?);
        }
        if let Some(value) = lookup("TETHER_CREDENTIAL_KIND").filter(|v| !v.trim().is_empty()) {
            self.credential.kind = Some(parse_env("TETHER_CREDENTIAL_KIND", &value)?);
        }
        Ok(())
    }

    /// Names of required settings that are missing or blank.
    pub fn missing_required(&self) -> Vec<&'static str> {
        let required = [
            ("project_endpoint", &self.project_endpoint),
            ("agent_name", &self.agent_name),
            ("model_deployment", &self.model_deployment),
        ];
        required
            .into_iter()
            .filter(|(_, value)| value.as_deref().map_or(true, |v| v.trim().is_empty()))
            .map(|(name, _)| name)
            .collect()
    }

    /// Validate and apply defaults. Inline `instructions` win over
    /// `instructions_file`.
    pub fn resolve(&self) -> Result<ResolvedConfig> {
        let missing = self.missing_required();
        if !missing.is_empty() {
            return Err(TetherError::Configuration(format!(
                "missing required settings: {}",
                missing.join(", ")
            )));
        }

        let instructions = match (&self.instructions, &self.instructions_file) {
            (Some(text), _) => text.clone(),
            (None, Some(path)) => instructions::load_instructions_file(path),
            (None, None) => String::new(),
        };

        let interval_ms = self.poll_interval_ms.unwrap_or(DEFAULT_POLL_INTERVAL_MS);
        if interval_ms == 0 {
            return Err(TetherError::Configuration(
                "poll_interval_ms must be greater than zero".to_string(),
            ));
        }
        let timeout_secs = self.turn_timeout_secs.unwrap_or(DEFAULT_TURN_TIMEOUT_SECS);
        let poll = PollPolicy::builder()
            .interval(Duration::from_millis(interval_ms))
            .maybe_deadline((timeout_secs > 0).then(|| Duration::from_secs(timeout_secs)))
            .build();

        let agent = AgentSpec {
            name: self.agent_name.clone().unwrap_or_default(),
            model: self.model_deployment.clone().unwrap_or_default(),
            instructions,
        };

        Ok(ResolvedConfig {
            project_endpoint: self
                .project_endpoint
                .clone()
                .unwrap_or_default()
                .trim_end_matches('/')
                .to_string(),
            api_version: self
                .api_version
                .clone()
                .unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
            service: ServiceSettings::builder()
                .agent(agent)
                .poll(poll)
                .delete_agent_on_dispose(self.delete_agent_on_dispose.unwrap_or(true))
                .build(),
            credential: self.credential.clone(),
        })
    }
}

fn parse_env<T: FromStr>(var: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| TetherError::Configuration(format!("invalid value for {var}: '{value}'")))
}
