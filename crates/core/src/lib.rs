//! FitWear Core - Shared domain types.
//!
//! This crate provides the types shared by every FitWear component:
//! - `client` - Session, cart, route guard and checkout state for the web client
//! - `cli` - Terminal front-end driving the client against a live API
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no storage,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Type-safe IDs, prices, emails, roles, statuses and tokens

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
