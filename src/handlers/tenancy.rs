// Invitation and tenancy handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::app::AppState;
use crate::handlers::RequesterId;
use crate::models::Unit;
use crate::utils::ServiceError;

#[derive(Debug, Deserialize)]
pub struct RedeemInvitationRequest {
    pub token: String,
    pub tenant_id: Uuid,
}

/// Unit view returned to tenants. The invitation token is deliberately
/// omitted: after redemption it belongs to the landlord, not the redeemer.
#[derive(Debug, Serialize)]
pub struct UnitResponse {
    pub unit_id: Uuid,
    pub property_id: Uuid,
    pub unit_number: String,
    pub rent_amount_cents: i64,
    pub is_occupied: bool,
}

impl From<Unit> for UnitResponse {
    fn from(unit: Unit) -> Self {
        Self {
            unit_id: unit.id,
            property_id: unit.property_id,
            unit_number: unit.unit_number,
            rent_amount_cents: unit.rent_amount_cents,
            is_occupied: unit.is_occupied,
        }
    }
}

/// POST /invitations/redeem
pub async fn redeem_invitation(
    State(state): State<AppState>,
    Json(request): Json<RedeemInvitationRequest>,
) -> Result<Json<UnitResponse>, ServiceError> {
    let unit = state
        .invitation_service
        .redeem(&request.token, request.tenant_id)
        .await?;

    Ok(Json(unit.into()))
}

#[derive(Debug, Serialize)]
pub struct RegenerateTokenResponse {
    pub unit_id: Uuid,
    pub invitation_token: String,
}

/// POST /units/{unit_id}/invitation/regenerate
pub async fn regenerate_invitation(
    State(state): State<AppState>,
    RequesterId(requester_id): RequesterId,
    Path(unit_id): Path<Uuid>,
) -> Result<Json<RegenerateTokenResponse>, ServiceError> {
    let invitation_token = state
        .invitation_service
        .regenerate(unit_id, requester_id)
        .await?;

    Ok(Json(RegenerateTokenResponse {
        unit_id,
        invitation_token,
    }))
}

/// DELETE /units/{unit_id}/tenants/{tenant_id}
pub async fn remove_tenant(
    State(state): State<AppState>,
    RequesterId(requester_id): RequesterId,
    Path((unit_id, tenant_id)): Path<(Uuid, Uuid)>,
) -> Result<(StatusCode, Json<Value>), ServiceError> {
    let is_occupied = state
        .occupancy_service
        .remove_tenant(unit_id, tenant_id, requester_id)
        .await?;

    Ok((
        StatusCode::OK,
        Json(json!({
            "unit_id": unit_id,
            "is_occupied": is_occupied
        })),
    ))
}
