use chrono::{DateTime, Duration, Utc};

/// Bearer token issued by a credential.
///
/// # Example
/// ```
/// use tether::auth::AccessToken;
///
/// let token = AccessToken::new("secret", None);
/// assert!(!token.expires_within(chrono::Duration::minutes(5)));
/// ```
#[derive(Clone)]
pub struct AccessToken {
    pub token: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl AccessToken {
    pub fn new(token: impl Into<String>, expires_at: Option<DateTime<Utc>>) -> Self {
        Self {
            token: token.into(),
            expires_at,
        }
    }

    /// Token that expires `seconds` from now.
    pub fn expiring_in(token: impl Into<String>, seconds: i64) -> Self {
        Self::new(token, Some(Utc::now() + Duration::seconds(seconds)))
    }

    /// Whether the token expires within `margin` from now. Tokens without an
    /// expiry never do.
    pub fn expires_within(&self, margin: Duration) -> bool {
        self.expires_at
            .map(|exp| exp - margin <= Utc::now())
            .unwrap_or(false)
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &"..")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}
