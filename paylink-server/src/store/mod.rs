//! Storage abstractions for the backend

pub mod models;
pub mod sqlite;

pub use models::*;
pub use sqlite::SqliteStore;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use paylink_core::validation::{NewClient, NewContact, NewPayment};
use paylink_core::{PageRequest, PaymentStatus, ReferenceId, SearchQuery};

use crate::error::ApiError;

/// Result type for store operations
pub type StoreResult<T> = Result<T, ApiError>;

/// Contact-form submissions
pub trait ContactStore: Send + Sync {
    /// Insert a validated submission and return the stored row
    fn create_contact(&self, contact: &NewContact) -> StoreResult<ContactSubmission>;

    /// All submissions, newest first
    fn list_contacts(&self) -> StoreResult<Vec<ContactSubmission>>;
}

/// Payment registrations
pub trait PaymentStore: Send + Sync {
    /// Insert a registration under the given reference id.
    /// Fails with `ReferenceCollision` if the reference id is taken.
    fn create_payment(
        &self,
        payment: &NewPayment,
        reference_id: &ReferenceId,
    ) -> StoreResult<Payment>;

    fn get_payment(&self, id: i64) -> StoreResult<Option<Payment>>;

    /// One page of registrations, newest first, plus the total row count for the filter
    fn list_payments(
        &self,
        status: Option<PaymentStatus>,
        page: PageRequest,
    ) -> StoreResult<(Vec<Payment>, u64)>;

    /// Fails with `PaymentNotFound` if no registration has that id
    fn set_payment_status(&self, id: i64, status: PaymentStatus) -> StoreResult<Payment>;

    /// Case-insensitive substring search over names, client id and reference id
    fn search_payments(&self, query: &SearchQuery) -> StoreResult<Vec<Payment>>;

    /// Most recent registration whose client id matches the given client
    fn latest_payment_for_client(&self, client_id: ClientId) -> StoreResult<Option<Payment>>;
}

/// Clients managed by the admin
pub trait ClientStore: Send + Sync {
    fn create_client(&self, client: &NewClient) -> StoreResult<Client>;

    fn get_client(&self, client_id: ClientId) -> StoreResult<Option<Client>>;

    /// All clients, newest first, each joined with its newest link usable at `now`
    fn list_clients_with_current_link(&self, now: DateTime<Utc>)
        -> StoreResult<Vec<ClientWithLink>>;

    /// Delete a client and, by cascade, all of its links
    fn delete_client(&self, client_id: ClientId) -> StoreResult<()>;
}

/// Client links and the legacy fixed link
pub trait LinkStore: Send + Sync {
    /// Insert a new link. Fails with `TokenCollision` if the token already exists
    /// and `ClientNotFound` if the client does not.
    fn create_link(&self, link: &NewClientLink) -> StoreResult<ClientLink>;

    fn get_link(&self, token: &str) -> StoreResult<Option<ClientLink>>;

    /// Set the active flag and return the row. Fails with `LinkNotFound`.
    fn set_link_active(&self, token: &str, active: bool) -> StoreResult<ClientLink>;

    /// Every link of a client, newest first
    fn list_links_for_client(&self, client_id: ClientId) -> StoreResult<Vec<ClientLink>>;

    fn get_legacy_link(&self, token: &str) -> StoreResult<Option<LegacyLink>>;

    /// Fails with `LinkNotFound` if no legacy link has that token
    fn set_legacy_link_active(&self, token: &str, active: bool) -> StoreResult<LegacyLink>;
}

/// Everything the HTTP layer needs from storage
pub trait Store: ContactStore + PaymentStore + ClientStore + LinkStore {}

impl<T> Store for T where T: ContactStore + PaymentStore + ClientStore + LinkStore {}

// Let an `Arc` of a store be used wherever a store is expected, so tests can
// keep a handle on the same store the router uses.
impl<T: ContactStore + ?Sized> ContactStore for Arc<T> {
    fn create_contact(&self, contact: &NewContact) -> StoreResult<ContactSubmission> {
        (**self).create_contact(contact)
    }

    fn list_contacts(&self) -> StoreResult<Vec<ContactSubmission>> {
        (**self).list_contacts()
    }
}

impl<T: PaymentStore + ?Sized> PaymentStore for Arc<T> {
    fn create_payment(
        &self,
        payment: &NewPayment,
        reference_id: &ReferenceId,
    ) -> StoreResult<Payment> {
        (**self).create_payment(payment, reference_id)
    }

    fn get_payment(&self, id: i64) -> StoreResult<Option<Payment>> {
        (**self).get_payment(id)
    }

    fn list_payments(
        &self,
        status: Option<PaymentStatus>,
        page: PageRequest,
    ) -> StoreResult<(Vec<Payment>, u64)> {
        (**self).list_payments(status, page)
    }

    fn set_payment_status(&self, id: i64, status: PaymentStatus) -> StoreResult<Payment> {
        (**self).set_payment_status(id, status)
    }

    fn search_payments(&self, query: &SearchQuery) -> StoreResult<Vec<Payment>> {
        (**self).search_payments(query)
    }

    fn latest_payment_for_client(&self, client_id: ClientId) -> StoreResult<Option<Payment>> {
        (**self).latest_payment_for_client(client_id)
    }
}

impl<T: ClientStore + ?Sized> ClientStore for Arc<T> {
    fn create_client(&self, client: &NewClient) -> StoreResult<Client> {
        (**self).create_client(client)
    }

    fn get_client(&self, client_id: ClientId) -> StoreResult<Option<Client>> {
        (**self).get_client(client_id)
    }

    fn list_clients_with_current_link(
        &self,
        now: DateTime<Utc>,
    ) -> StoreResult<Vec<ClientWithLink>> {
        (**self).list_clients_with_current_link(now)
    }

    fn delete_client(&self, client_id: ClientId) -> StoreResult<()> {
        (**self).delete_client(client_id)
    }
}

impl<T: LinkStore + ?Sized> LinkStore for Arc<T> {
    fn create_link(&self, link: &NewClientLink) -> StoreResult<ClientLink> {
        (**self).create_link(link)
    }

    fn get_link(&self, token: &str) -> StoreResult<Option<ClientLink>> {
        (**self).get_link(token)
    }

    fn set_link_active(&self, token: &str, active: bool) -> StoreResult<ClientLink> {
        (**self).set_link_active(token, active)
    }

    fn list_links_for_client(&self, client_id: ClientId) -> StoreResult<Vec<ClientLink>> {
        (**self).list_links_for_client(client_id)
    }

    fn get_legacy_link(&self, token: &str) -> StoreResult<Option<LegacyLink>> {
        (**self).get_legacy_link(token)
    }

    fn set_legacy_link_active(&self, token: &str, active: bool) -> StoreResult<LegacyLink> {
        (**self).set_legacy_link_active(token, active)
    }
}
