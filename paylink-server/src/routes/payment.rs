//! Payment registration and admin payment endpoints

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use paylink_core::validation::PaymentForm;
use paylink_core::{PageRequest, Pagination, PaymentStatus, ReferenceId, SearchQuery};
use serde::{Deserialize, Serialize};

use super::extract::{ApiJson, ApiPath, ApiQuery};
use super::DataResponse;
use crate::error::ApiError;
use crate::state::AppState;
use crate::store::{Payment, Store};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentCreatedResponse {
    pub success: bool,
    pub data: Payment,
    pub reference_id: String,
}

/// POST /api/payment/submit
/// Register a payment under a freshly generated reference id
pub async fn submit_payment<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    ApiJson(form): ApiJson<PaymentForm>,
) -> Result<(StatusCode, Json<PaymentCreatedResponse>), ApiError> {
    let payment = form.validate()?;
    let reference_id = ReferenceId::generate(Utc::now());
    let stored = state.store.create_payment(&payment, &reference_id)?;

    tracing::info!(
        payment_id = stored.id,
        reference_id = %reference_id,
        "Payment registered"
    );

    Ok((
        StatusCode::CREATED,
        Json(PaymentCreatedResponse {
            success: true,
            reference_id: stored.reference_id.clone(),
            data: stored,
        }),
    ))
}

#[derive(Deserialize)]
pub struct ListPaymentsQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub status: Option<String>,
}

#[derive(Serialize)]
pub struct PaymentListResponse {
    pub success: bool,
    pub data: Vec<Payment>,
    pub pagination: Pagination,
}

/// GET /api/admin/payments?page=&limit=&status=
/// One page of registrations, newest first. `status` may be omitted or `all`.
pub async fn list_payments<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    ApiQuery(query): ApiQuery<ListPaymentsQuery>,
) -> Result<Json<PaymentListResponse>, ApiError> {
    let status = match query.status.as_deref().map(str::trim) {
        None | Some("") | Some("all") => None,
        Some(s) => Some(s.parse::<PaymentStatus>()?),
    };
    let page = PageRequest::new(query.page, query.limit);

    let (payments, total) = state.store.list_payments(status, page)?;

    Ok(Json(PaymentListResponse {
        success: true,
        data: payments,
        pagination: Pagination::new(page, total),
    }))
}

/// GET /api/admin/payments/:id
pub async fn get_payment<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<DataResponse<Payment>>, ApiError> {
    let payment = state
        .store
        .get_payment(id)?
        .ok_or(ApiError::PaymentNotFound)?;
    Ok(DataResponse::new(payment))
}

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

/// PUT /api/admin/payments/:id/status
pub async fn update_payment_status<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(req): ApiJson<UpdateStatusRequest>,
) -> Result<Json<DataResponse<Payment>>, ApiError> {
    let status: PaymentStatus = req.status.parse()?;
    let payment = state.store.set_payment_status(id, status)?;

    tracing::info!(payment_id = id, status = %status, "Payment status updated");

    Ok(DataResponse::new(payment))
}

#[derive(Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub query: String,
}

/// GET /api/admin/payments/search?query=
/// Up to 20 matches; queries under 3 characters are rejected before touching the store
pub async fn search_payments<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    ApiQuery(params): ApiQuery<SearchParams>,
) -> Result<Json<DataResponse<Vec<Payment>>>, ApiError> {
    let query = SearchQuery::parse(&params.query)?;
    let payments = state.store.search_payments(&query)?;
    Ok(DataResponse::new(payments))
}
