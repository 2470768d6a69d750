// Payment lifecycle handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::app::AppState;
use crate::handlers::RequesterId;
use crate::models::Payment;
use crate::services::{RecordPaymentRequest, UpdatePaymentRequest};
use crate::utils::ServiceError;

/// POST /units/{unit_id}/payments
pub async fn record_payment(
    State(state): State<AppState>,
    RequesterId(requester_id): RequesterId,
    Path(unit_id): Path<Uuid>,
    Json(request): Json<RecordPaymentRequest>,
) -> Result<(StatusCode, Json<Payment>), ServiceError> {
    let payment = state
        .payment_service
        .record_payment(unit_id, request, requester_id)
        .await?;

    Ok((StatusCode::CREATED, Json(payment)))
}

/// PUT /payments/{payment_id}
pub async fn update_payment(
    State(state): State<AppState>,
    RequesterId(requester_id): RequesterId,
    Path(payment_id): Path<Uuid>,
    Json(request): Json<UpdatePaymentRequest>,
) -> Result<Json<Payment>, ServiceError> {
    let payment = state
        .payment_service
        .update_payment(payment_id, request, requester_id)
        .await?;

    Ok(Json(payment))
}

/// POST /payments/sweep
///
/// Daily cron trigger. Responds with the number of rows promoted to overdue;
/// running it again immediately reports zero.
pub async fn sweep_overdue(
    State(state): State<AppState>,
) -> Result<Json<Value>, ServiceError> {
    let updated = state.payment_service.mark_overdue(Utc::now()).await?;

    Ok(Json(json!({ "updated": updated })))
}
