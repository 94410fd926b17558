//! Contact form endpoints

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use paylink_core::validation::ContactForm;

use super::extract::ApiJson;
use super::DataResponse;
use crate::error::ApiError;
use crate::state::AppState;
use crate::store::{ContactSubmission, Store};

/// POST /api/contact/submit
/// Validate and store a contact-form submission
pub async fn submit_contact<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    ApiJson(form): ApiJson<ContactForm>,
) -> Result<(StatusCode, Json<DataResponse<ContactSubmission>>), ApiError> {
    let contact = form.validate()?;
    let stored = state.store.create_contact(&contact)?;

    tracing::info!(contact_id = stored.id, "Contact submission received");

    Ok((StatusCode::CREATED, DataResponse::new(stored)))
}

/// GET /api/contacts
/// All submissions, newest first
pub async fn list_contacts<S: Store>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<DataResponse<Vec<ContactSubmission>>>, ApiError> {
    let contacts = state.store.list_contacts()?;
    Ok(DataResponse::new(contacts))
}
