//! Client link and legacy payment link endpoints

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use paylink_core::validation::LinkRequestForm;
use serde::{Deserialize, Serialize};

use super::extract::{ApiJson, ApiPath};
use super::DataResponse;
use crate::error::ApiError;
use crate::links::{self, ClientDetails, IssuedLink};
use crate::state::AppState;
use crate::store::{ClientId, ClientLink, LegacyLink, Store};

/// POST /api/admin/client-links
/// Issue a new 24 hour link for a client
pub async fn issue_client_link<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    ApiJson(form): ApiJson<LinkRequestForm>,
) -> Result<(StatusCode, Json<DataResponse<IssuedLink>>), ApiError> {
    let client_id = ClientId(form.validate()?);
    let issued = links::issue_link(&state.store, &state.public_base_url, client_id, Utc::now())?;
    Ok((StatusCode::CREATED, DataResponse::new(issued)))
}

#[derive(Deserialize)]
pub struct SetActiveRequest {
    pub active: bool,
}

/// PUT /api/admin/client-links/:token
pub async fn set_client_link_active<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    ApiPath(token): ApiPath<String>,
    ApiJson(req): ApiJson<SetActiveRequest>,
) -> Result<Json<DataResponse<ClientLink>>, ApiError> {
    let link = links::set_link_active(&state.store, &token, req.active)?;
    Ok(DataResponse::new(link))
}

/// GET /api/client-details/:token
/// Payment details for the client a link belongs to
pub async fn get_client_details<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    ApiPath(token): ApiPath<String>,
) -> Result<Json<DataResponse<ClientDetails>>, ApiError> {
    let details = links::verify_link(&state.store, state.payment_defaults, &token, Utc::now())?;
    Ok(DataResponse::new(details))
}

#[derive(Serialize)]
pub struct LegacyStatusResponse {
    pub success: bool,
    pub active: bool,
}

/// GET /api/payment-link/:token
/// Reports the stored active flag of the legacy link
pub async fn get_legacy_link<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    ApiPath(token): ApiPath<String>,
) -> Result<Json<LegacyStatusResponse>, ApiError> {
    let link = state
        .store
        .get_legacy_link(&token)?
        .ok_or(ApiError::LinkNotFound)?;

    Ok(Json(LegacyStatusResponse {
        success: true,
        active: link.active,
    }))
}

/// PUT /api/admin/payment-link/:token
pub async fn set_legacy_link_active<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    ApiPath(token): ApiPath<String>,
    ApiJson(req): ApiJson<SetActiveRequest>,
) -> Result<Json<DataResponse<LegacyLink>>, ApiError> {
    let link = state.store.set_legacy_link_active(&token, req.active)?;

    tracing::info!(active = link.active, "Legacy payment link updated");

    Ok(DataResponse::new(link))
}
