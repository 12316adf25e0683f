//! FitWear client state core.
//!
//! Everything the FitWear web client shares across screens lives here:
//! who is signed in, what is in the cart, which screens the current actor
//! may open, and how a cart becomes a submitted purchase. Views read these
//! stores and call their operations; every network round trip goes through
//! the [`api::ApiClient`] gateway.
//!
//! # Components
//!
//! - [`session::SessionStore`] - current user + bearer credential, rehydrated at startup
//! - [`cart::CartStore`] - in-progress line items, persisted across reloads
//! - [`navigation::RouteGuard`] - allow / login / forbidden decisions per route
//! - [`checkout::CheckoutFlow`] - cart to purchase state machine
//! - [`state::AppState`] - one instance of each, built once at startup

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod cart;
pub mod checkout;
pub mod config;
pub mod error;
pub mod models;
pub mod navigation;
pub mod session;
pub mod state;
pub mod storage;
