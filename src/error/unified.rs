//! Error classification and platform error payloads.

use serde::{Deserialize, Serialize};

/// Broad error category for routing recovery logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Authentication,
    NotFound,
    RateLimit,
    Network,
    Timeout,
    Canceled,
    Server,
    Api,
    Serialization,
    Unknown,
}

/// Error envelope returned by the agent platform on non-2xx responses.
///
/// The platform nests the detail under `error`: `{"error": {"code": .., "message": ..}}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlatformErrorBody {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Deserialize)]
struct Envelope {
    error: PlatformErrorBody,
}

impl PlatformErrorBody {
    /// Parse a platform error body, returning `None` for anything unrecognised.
    pub fn parse(body: &str) -> Option<Self> {
        serde_json::from_str::<Envelope>(body).ok().map(|e| e.error)
    }
}
