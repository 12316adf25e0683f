//! Core types for FitWear.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod credential;
pub mod email;
pub mod id;
pub mod idempotency;
pub mod price;
pub mod role;
pub mod status;

pub use credential::AccessToken;
pub use email::{Email, EmailError};
pub use id::*;
pub use idempotency::{IDEMPOTENCY_KEY_HEADER, IdempotencyKey};
pub use price::Price;
pub use role::{Role, RoleParseError};
pub use status::*;
