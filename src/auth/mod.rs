//! Credential acquisition for the agent platform.
//!
//! Every platform request carries a bearer token obtained from a
//! [`TokenCredential`]. Three schemes are supported: a static token, the
//! OAuth2 client-credentials grant, and the instance-metadata managed
//! identity endpoint. [`CachedCredential`] wraps any of them so tokens are
//! reused until shortly before they expire.

pub mod credential;
pub mod error;
pub mod token;

pub use credential::{
    credential_from_config, CachedCredential, ClientSecretCredential, ManagedIdentityCredential,
    StaticTokenCredential, TokenCredential,
};
pub use error::AuthError;
pub use token::AccessToken;

/// Token scope for the AI Foundry data plane.
pub const DEFAULT_SCOPE: &str = "https://ai.azure.com/.default";
