//! Bearer credential issued by the FitWear API.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Opaque bearer token proving an authenticated session.
///
/// The client never inspects the token; it only stores it and replays it in
/// the `Authorization` header. `Debug` is redacted so the token never ends up
/// in logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessToken(String);

impl AccessToken {
    /// Wrap a token string.
    #[must_use]
    pub const fn new(token: String) -> Self {
        Self(token)
    }

    /// The raw token, for the `Authorization` header and durable storage only.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Whether the server handed back an empty token.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken([REDACTED])")
    }
}

impl From<String> for AccessToken {
    fn from(token: String) -> Self {
        Self(token)
    }
}

impl From<&str> for AccessToken {
    fn from(token: &str) -> Self {
        Self(token.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_is_redacted() {
        let token = AccessToken::from("eyJhbGciOiJIUzI1NiJ9.secret");
        let debug = format!("{token:?}");
        assert!(debug.contains("REDACTED"));
        assert!(!debug.contains("secret"));
    }

    #[test]
    fn test_blank_token_is_empty() {
        assert!(AccessToken::from("  ").is_empty());
        assert!(!AccessToken::from("abc").is_empty());
    }
}
