//! Admin client endpoints

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use paylink_core::token::link_url;
use paylink_core::validation::ClientForm;
use serde::Serialize;

use super::extract::{ApiJson, ApiPath};
use super::DataResponse;
use crate::error::ApiError;
use crate::state::AppState;
use crate::store::{Client, ClientId, ClientLink, Store};

/// POST /api/admin/clients
pub async fn create_client<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    ApiJson(form): ApiJson<ClientForm>,
) -> Result<(StatusCode, Json<DataResponse<Client>>), ApiError> {
    let client = form.validate()?;
    let stored = state.store.create_client(&client)?;

    tracing::info!(client_id = stored.id.0, "Client created");

    Ok((StatusCode::CREATED, DataResponse::new(stored)))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentLink {
    pub token: String,
    pub url: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientListItem {
    #[serde(flatten)]
    pub client: Client,
    pub current_link: Option<CurrentLink>,
}

/// GET /api/admin/clients
/// Every client with its newest active, unexpired link
pub async fn list_clients<S: Store>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<DataResponse<Vec<ClientListItem>>>, ApiError> {
    let clients = state.store.list_clients_with_current_link(Utc::now())?;

    let items = clients
        .into_iter()
        .map(|entry| ClientListItem {
            client: entry.client,
            current_link: entry.current_link.map(|link| current_link(&state.public_base_url, link)),
        })
        .collect();

    Ok(DataResponse::new(items))
}

fn current_link(base_url: &str, link: ClientLink) -> CurrentLink {
    CurrentLink {
        url: link_url(base_url, &link.token),
        token: link.token,
        expires_at: link.expires_at,
    }
}

/// GET /api/admin/clients/:id
pub async fn get_client<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<DataResponse<Client>>, ApiError> {
    let client = state
        .store
        .get_client(ClientId(id))?
        .ok_or(ApiError::ClientNotFound)?;
    Ok(DataResponse::new(client))
}

#[derive(Serialize)]
pub struct DeleteResponse {
    pub success: bool,
}

/// DELETE /api/admin/clients/:id
/// Removes the client and all of its links
pub async fn delete_client<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<DeleteResponse>, ApiError> {
    state.store.delete_client(ClientId(id))?;

    tracing::info!(client_id = id, "Client deleted");

    Ok(Json(DeleteResponse { success: true }))
}

/// GET /api/admin/clients/:id/links
/// Every link ever issued to the client, newest first, usable or not
pub async fn list_client_links<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<DataResponse<Vec<ClientLink>>>, ApiError> {
    let client_id = ClientId(id);
    if state.store.get_client(client_id)?.is_none() {
        return Err(ApiError::ClientNotFound);
    }
    let links = state.store.list_links_for_client(client_id)?;
    Ok(DataResponse::new(links))
}
