//! Shared application state

use crate::links::PaymentDefaults;
use crate::store::Store;

/// State handed to every request handler.
///
/// Holds no per-request data; the store is the only shared resource.
pub struct AppState<S> {
    pub store: S,
    /// Prefix for the URLs of issued client links
    pub public_base_url: String,
    pub payment_defaults: PaymentDefaults,
}

impl<S: Store> AppState<S> {
    pub fn new(
        store: S,
        public_base_url: impl Into<String>,
        payment_defaults: PaymentDefaults,
    ) -> Self {
        Self {
            store,
            public_base_url: public_base_url.into(),
            payment_defaults,
        }
    }
}
