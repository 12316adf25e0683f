//! Records exchanged with the FitWear API.
//!
//! Response types mirror the API's JSON; request types are what the client
//! sends. Secrets in request types are `SecretString` and only exposed when
//! the body is built.

pub mod product;
pub mod purchase;
pub mod user;

pub use product::{Product, ProductPage, ProductQuery};
pub use purchase::{Purchase, PurchaseItem, PurchaseItemRequest, PurchasePage, PurchaseRequest};
pub use user::{Credentials, PasswordChange, ProfileUpdate, Registration, User};
