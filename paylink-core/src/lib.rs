//! Paylink Core Library
//!
//! Domain rules for the business website backend:
//! - Clients receive time-limited, token-bearing payment links
//! - Contact and payment submissions are validated field by field
//! - Payment registrations carry a human-readable reference id

pub mod error;
pub mod pagination;
pub mod payment;
pub mod reference;
pub mod search;
pub mod token;
pub mod validation;

pub use error::Error;
pub use pagination::{PageRequest, Pagination};
pub use payment::PaymentStatus;
pub use reference::ReferenceId;
pub use search::SearchQuery;
pub use token::{LinkToken, LinkWindow};
pub use validation::FieldErrors;

/// Result type for paylink-core operations
pub type Result<T> = std::result::Result<T, Error>;
