// Subscription and access-gate handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::app::AppState;
use crate::handlers::RequesterId;
use crate::models::Subscription;
use crate::services::AccessDecision;
use crate::utils::ServiceError;

#[derive(Debug, Deserialize)]
pub struct StartTrialRequest {
    pub user_id: Uuid,
    pub plan: String,
}

/// POST /subscriptions
pub async fn start_trial(
    State(state): State<AppState>,
    Json(request): Json<StartTrialRequest>,
) -> Result<(StatusCode, Json<Subscription>), ServiceError> {
    let subscription = state
        .subscription_service
        .start_trial(request.user_id, &request.plan, Utc::now())
        .await?;

    Ok((StatusCode::CREATED, Json(subscription)))
}

/// GET /subscriptions/{user_id}/access
///
/// Pure read; the decision is derived from the subscription snapshot on
/// every call and tells the subscriber whether they are in trial (and for
/// how much longer) or blocked.
pub async fn check_access(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<AccessDecision>, ServiceError> {
    let decision = state.access_service.check_access(user_id, Utc::now()).await?;

    Ok(Json(decision))
}

#[derive(Debug, Deserialize)]
pub struct MembershipPaymentRequest {
    pub amount_cents: i64,
}

/// POST /subscriptions/{user_id}/membership-payment
pub async fn record_membership_payment(
    State(state): State<AppState>,
    RequesterId(requester_id): RequesterId,
    Path(user_id): Path<Uuid>,
    Json(request): Json<MembershipPaymentRequest>,
) -> Result<Json<Subscription>, ServiceError> {
    let subscription = state
        .subscription_service
        .record_membership_payment(user_id, request.amount_cents, Utc::now(), requester_id)
        .await?;

    Ok(Json(subscription))
}

/// DELETE /subscriptions/{user_id}/membership-payment
pub async fn revoke_membership_payment(
    State(state): State<AppState>,
    RequesterId(requester_id): RequesterId,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Subscription>, ServiceError> {
    let subscription = state
        .subscription_service
        .revoke_membership_payment(user_id, requester_id)
        .await?;

    Ok(Json(subscription))
}
