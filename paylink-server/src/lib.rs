//! Paylink Server
//!
//! Backend for a business website: contact-form submissions, payment
//! registrations, per-client expiring payment links, and the admin
//! endpoints that manage them.

pub mod config;
pub mod error;
pub mod links;
pub mod routes;
pub mod state;
pub mod store;

pub use config::Config;
pub use error::ApiError;
pub use links::PaymentDefaults;
pub use state::AppState;
pub use store::{SqliteStore, Store};
