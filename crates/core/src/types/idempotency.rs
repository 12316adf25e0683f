//! Client-generated idempotency keys for purchase submission.
//!
//! A key is minted when a checkout attempt starts and is reused for every
//! retry of that attempt, so a server that honours the `Idempotency-Key`
//! header can collapse duplicate submissions into one purchase.

use core::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// HTTP header carrying the key.
pub const IDEMPOTENCY_KEY_HEADER: &str = "Idempotency-Key";

/// Random UUID v4 identifying one checkout attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdempotencyKey(Uuid);

impl IdempotencyKey {
    /// Generate a fresh key.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for IdempotencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.hyphenated().fmt(f)
    }
}
