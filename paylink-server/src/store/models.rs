//! Data models for persisted records

use chrono::{DateTime, NaiveDate, Utc};
use paylink_core::token::is_link_usable;
use paylink_core::{LinkToken, LinkWindow, PaymentStatus};
use serde::{Deserialize, Serialize};

/// Storage-assigned client identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(pub i64);

/// A contact-form submission
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactSubmission {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub subject: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// A payment registration submitted by a client
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: i64,
    pub client_name: String,
    pub project_name: String,
    /// Free-form client reference as typed into the payment form
    pub client_id: String,
    pub amount: f64,
    pub due_date: NaiveDate,
    pub receipt_url: Option<String>,
    pub reference_id: String,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A client managed from the admin panel
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: ClientId,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub company: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A client together with its newest usable link, if any
#[derive(Debug, Clone)]
pub struct ClientWithLink {
    pub client: Client,
    pub current_link: Option<ClientLink>,
}

/// A token-bearing link granting a client time-limited access to their payment details
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientLink {
    pub id: i64,
    pub client_id: ClientId,
    pub token: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl ClientLink {
    pub fn is_usable_at(&self, now: DateTime<Utc>) -> bool {
        is_link_usable(self.active, self.expires_at, now)
    }
}

/// A client link about to be inserted
#[derive(Debug, Clone)]
pub struct NewClientLink {
    pub client_id: ClientId,
    pub token: LinkToken,
    pub window: LinkWindow,
}

/// The single statically seeded payment link that predates per-client links
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyLink {
    pub id: i64,
    pub token: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
