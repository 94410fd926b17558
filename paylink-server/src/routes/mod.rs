//! HTTP routes for the backend

mod client;
mod contact;
mod extract;
mod health;
mod link;
mod payment;

use std::sync::Arc;

use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::store::Store;

/// Success envelope shared by every JSON endpoint
#[derive(Debug, Serialize)]
pub struct DataResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> DataResponse<T> {
    pub fn new(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data,
        })
    }
}

/// Create the router with all routes
pub fn create_router<S>(state: Arc<AppState<S>>) -> Router
where
    S: Store + 'static,
{
    Router::new()
        .route("/health", get(health::health))
        // Public website
        .route("/api/contact/submit", post(contact::submit_contact::<S>))
        .route("/api/payment/submit", post(payment::submit_payment::<S>))
        .route("/api/client-details/:token", get(link::get_client_details::<S>))
        .route("/api/payment-link/:token", get(link::get_legacy_link::<S>))
        // Admin panel
        .route("/api/contacts", get(contact::list_contacts::<S>))
        .route("/api/admin/payments", get(payment::list_payments::<S>))
        .route("/api/admin/payments/search", get(payment::search_payments::<S>))
        .route("/api/admin/payments/:id", get(payment::get_payment::<S>))
        .route(
            "/api/admin/payments/:id/status",
            put(payment::update_payment_status::<S>),
        )
        .route("/api/admin/payment-link/:token", put(link::set_legacy_link_active::<S>))
        .route(
            "/api/admin/clients",
            post(client::create_client::<S>).get(client::list_clients::<S>),
        )
        .route(
            "/api/admin/clients/:id",
            get(client::get_client::<S>).delete(client::delete_client::<S>),
        )
        .route("/api/admin/clients/:id/links", get(client::list_client_links::<S>))
        .route("/api/admin/client-links", post(link::issue_client_link::<S>))
        .route(
            "/api/admin/client-links/:token",
            put(link::set_client_link_active::<S>),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
