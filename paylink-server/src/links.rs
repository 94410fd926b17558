//! Client link issuance, verification and activation
//!
//! A client link gives one client time-limited access to their payment
//! details. Links are issued active with a 24 hour lifetime and are never
//! deleted; a link stops working when it is deactivated or its expiry passes.
//! Expiry is only checked here, at verification time; no sweep ever flips
//! expired rows to inactive.
//!
//! Verification reads the link, then the client, then the latest payment as
//! separate statements. A link deactivated (or a client deleted) between
//! those reads may still resolve once; the details returned are eventually
//! consistent, not a transactional snapshot.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use paylink_core::token::link_url;
use paylink_core::{LinkToken, LinkWindow, PaymentStatus};
use serde::Serialize;

use crate::error::ApiError;
use crate::store::{ClientId, ClientLink, ClientStore, LinkStore, NewClientLink, PaymentStore, StoreResult};

/// What a client sees before any payment has been registered for them
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaymentDefaults {
    pub amount: f64,
    pub due_in_days: i64,
}

impl Default for PaymentDefaults {
    fn default() -> Self {
        Self {
            amount: 1000.0,
            due_in_days: 7,
        }
    }
}

/// A freshly issued client link
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedLink {
    pub client_id: ClientId,
    pub token: String,
    pub url: String,
    pub expires_at: DateTime<Utc>,
}

/// Client profile merged with their payment details, as shown behind a link
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientDetails {
    pub client_id: ClientId,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub company: Option<String>,
    pub amount: f64,
    pub due_date: NaiveDate,
    /// False when amount and due date are the configured defaults
    pub payment_registered: bool,
    pub project_name: Option<String>,
    pub reference_id: Option<String>,
    pub status: Option<PaymentStatus>,
    pub receipt_url: Option<String>,
    pub link_expires_at: DateTime<Utc>,
}

/// Issue a new link for an existing client.
///
/// Earlier links of the same client are left untouched, so several links may
/// be usable at once. A token collision is reported, never overwritten.
pub fn issue_link<S>(
    store: &S,
    public_base_url: &str,
    client_id: ClientId,
    now: DateTime<Utc>,
) -> StoreResult<IssuedLink>
where
    S: ClientStore + LinkStore,
{
    if store.get_client(client_id)?.is_none() {
        return Err(ApiError::ClientNotFound);
    }

    let token = LinkToken::generate();
    let link = store.create_link(&NewClientLink {
        client_id,
        token: token.clone(),
        window: LinkWindow::starting_at(now),
    })?;

    tracing::info!(
        client_id = client_id.0,
        token_prefix = token.prefix(),
        expires_at = %link.expires_at,
        "Issued client link"
    );

    Ok(IssuedLink {
        client_id,
        url: link_url(public_base_url, token.as_str()),
        token: link.token,
        expires_at: link.expires_at,
    })
}

/// Resolve a presented token to the client's payment details.
///
/// Unknown, inactive and expired tokens all fail the same way.
pub fn verify_link<S>(
    store: &S,
    defaults: PaymentDefaults,
    token: &str,
    now: DateTime<Utc>,
) -> StoreResult<ClientDetails>
where
    S: ClientStore + LinkStore + PaymentStore,
{
    let token = LinkToken::parse(token)?;

    let link = store
        .get_link(token.as_str())?
        .filter(|link| link.is_usable_at(now))
        .ok_or_else(|| {
            tracing::debug!(token_prefix = token.prefix(), "Rejected client link");
            ApiError::LinkNotFoundOrExpired
        })?;

    // The client may have been deleted since the link was read
    let client = store
        .get_client(link.client_id)?
        .ok_or(ApiError::LinkNotFoundOrExpired)?;

    let payment = store.latest_payment_for_client(client.id)?;

    let details = match payment {
        Some(payment) => ClientDetails {
            client_id: client.id,
            name: client.name,
            email: client.email,
            phone: client.phone,
            company: client.company,
            amount: payment.amount,
            due_date: payment.due_date,
            payment_registered: true,
            project_name: Some(payment.project_name),
            reference_id: Some(payment.reference_id),
            status: Some(payment.status),
            receipt_url: payment.receipt_url,
            link_expires_at: link.expires_at,
        },
        None => ClientDetails {
            client_id: client.id,
            name: client.name,
            email: client.email,
            phone: client.phone,
            company: client.company,
            amount: defaults.amount,
            due_date: (now + Duration::days(defaults.due_in_days)).date_naive(),
            payment_registered: false,
            project_name: None,
            reference_id: None,
            status: None,
            receipt_url: None,
            link_expires_at: link.expires_at,
        },
    };

    Ok(details)
}

/// Activate or deactivate a link. Setting the current state again is a no-op that succeeds.
pub fn set_link_active<S: LinkStore>(store: &S, token: &str, active: bool) -> StoreResult<ClientLink> {
    let link = store.set_link_active(token, active)?;

    tracing::info!(
        client_id = link.client_id.0,
        token_prefix = &link.token[..link.token.len().min(8)],
        active,
        "Updated client link"
    );

    Ok(link)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteStore;
    use paylink_core::validation::{NewClient, NewPayment};
    use paylink_core::ReferenceId;

    const BASE_URL: &str = "https://pay.example.com";

    fn store_with_client() -> (SqliteStore, ClientId) {
        let store = SqliteStore::open_in_memory().unwrap();
        store.migrate("legacy").unwrap();
        let client = store
            .create_client(&NewClient {
                name: "Acme".to_string(),
                email: "ops@acme.test".to_string(),
                phone: "9876543210".to_string(),
                company: Some("Acme Corp".to_string()),
            })
            .unwrap();
        (store, client.id)
    }

    #[test]
    fn test_issue_builds_url_and_expiry() {
        let (store, client_id) = store_with_client();
        let now = Utc::now();

        let issued = issue_link(&store, BASE_URL, client_id, now).unwrap();

        assert_eq!(issued.url, format!("{}/payment/{}", BASE_URL, issued.token));
        assert_eq!(issued.token.len(), 64);
        let ttl = issued.expires_at - now;
        assert!(ttl <= Duration::hours(24) && ttl > Duration::hours(24) - Duration::seconds(1));
    }

    #[test]
    fn test_issue_for_missing_client() {
        let (store, _) = store_with_client();
        let result = issue_link(&store, BASE_URL, ClientId(404), Utc::now());
        assert!(matches!(result, Err(ApiError::ClientNotFound)));
    }

    #[test]
    fn test_two_links_both_verify() {
        let (store, client_id) = store_with_client();
        let now = Utc::now();

        let first = issue_link(&store, BASE_URL, client_id, now).unwrap();
        let second = issue_link(&store, BASE_URL, client_id, now).unwrap();
        assert_ne!(first.token, second.token);

        for token in [&first.token, &second.token] {
            let details = verify_link(&store, PaymentDefaults::default(), token, now).unwrap();
            assert_eq!(details.client_id, client_id);
        }
    }

    #[test]
    fn test_verify_respects_expiry_boundary() {
        let (store, client_id) = store_with_client();
        let now = Utc::now();
        let issued = issue_link(&store, BASE_URL, client_id, now).unwrap();

        let just_before = issued.expires_at - Duration::microseconds(1);
        assert!(verify_link(&store, PaymentDefaults::default(), &issued.token, just_before).is_ok());

        let at_expiry = verify_link(&store, PaymentDefaults::default(), &issued.token, issued.expires_at);
        assert!(matches!(at_expiry, Err(ApiError::LinkNotFoundOrExpired)));
    }

    #[test]
    fn test_deactivated_link_fails_until_reactivated() {
        let (store, client_id) = store_with_client();
        let now = Utc::now();
        let issued = issue_link(&store, BASE_URL, client_id, now).unwrap();

        set_link_active(&store, &issued.token, false).unwrap();
        let result = verify_link(&store, PaymentDefaults::default(), &issued.token, now);
        assert!(matches!(result, Err(ApiError::LinkNotFoundOrExpired)));

        set_link_active(&store, &issued.token, true).unwrap();
        assert!(verify_link(&store, PaymentDefaults::default(), &issued.token, now).is_ok());
    }

    #[test]
    fn test_unknown_and_malformed_tokens_look_alike() {
        let (store, _) = store_with_client();
        let now = Utc::now();

        for token in ["not-a-token".to_string(), "0".repeat(64)] {
            let result = verify_link(&store, PaymentDefaults::default(), &token, now);
            assert!(matches!(result, Err(ApiError::LinkNotFoundOrExpired)));
        }
    }

    #[test]
    fn test_defaults_without_payment() {
        let (store, client_id) = store_with_client();
        let now = Utc::now();
        let issued = issue_link(&store, BASE_URL, client_id, now).unwrap();
        let defaults = PaymentDefaults {
            amount: 250.0,
            due_in_days: 7,
        };

        let details = verify_link(&store, defaults, &issued.token, now).unwrap();

        assert!(!details.payment_registered);
        assert_eq!(details.amount, 250.0);
        assert_eq!(details.due_date, (now + Duration::days(7)).date_naive());
        assert_eq!(details.company.as_deref(), Some("Acme Corp"));
    }

    #[test]
    fn test_latest_payment_used() {
        let (store, client_id) = store_with_client();
        let now = Utc::now();
        let due_date = NaiveDate::from_ymd_opt(2026, 12, 24).unwrap();
        store
            .create_payment(
                &NewPayment {
                    client_name: "Acme".to_string(),
                    project_name: "Storefront".to_string(),
                    client_id: client_id.0.to_string(),
                    amount: 4200.0,
                    due_date,
                    receipt_url: Some("/receipts/acme.pdf".to_string()),
                },
                &ReferenceId::generate(now),
            )
            .unwrap();
        let issued = issue_link(&store, BASE_URL, client_id, now).unwrap();

        let details = verify_link(&store, PaymentDefaults::default(), &issued.token, now).unwrap();

        assert!(details.payment_registered);
        assert_eq!(details.amount, 4200.0);
        assert_eq!(details.due_date, due_date);
        assert_eq!(details.status, Some(PaymentStatus::Pending));
        assert_eq!(details.project_name.as_deref(), Some("Storefront"));
    }

    #[test]
    fn test_set_active_unknown_token() {
        let (store, _) = store_with_client();
        let result = set_link_active(&store, "missing", false);
        assert!(matches!(result, Err(ApiError::LinkNotFound)));
    }
}
