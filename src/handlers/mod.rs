// HTTP surface for the tenancy and payment core
// Handlers are thin: validate input, call a service, serialize the result

pub mod payments;
pub mod subscriptions;
pub mod tenancy;

use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    routing::{delete, get, post, put},
    Router,
};
use uuid::Uuid;

use crate::app::AppState;
use crate::utils::ServiceError;

/// Explicit requester identity, taken from the `x-requester-id` header.
///
/// Session handling is an external collaborator; by the time a request
/// reaches this core the gateway has resolved the caller to an id. Taking it
/// as an explicit argument keeps every authorization decision testable
/// without a simulated session.
pub struct RequesterId(pub Uuid);

impl<S> FromRequestParts<S> for RequesterId
where
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get("x-requester-id")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                ServiceError::ValidationError("x-requester-id header is required".to_string())
            })?;

        let id = value.parse::<Uuid>().map_err(|_| {
            ServiceError::ValidationError("x-requester-id must be a UUID".to_string())
        })?;

        Ok(RequesterId(id))
    }
}

// Tenancy routes: invitation redemption, rotation, tenant removal
pub fn tenancy_routes() -> Router<AppState> {
    Router::new()
        .route("/invitations/redeem", post(tenancy::redeem_invitation))
        .route(
            "/units/{unit_id}/invitation/regenerate",
            post(tenancy::regenerate_invitation),
        )
        .route(
            "/units/{unit_id}/tenants/{tenant_id}",
            delete(tenancy::remove_tenant),
        )
}

// Payment routes: recording, edits, and the scheduled overdue sweep
pub fn payment_routes() -> Router<AppState> {
    Router::new()
        .route("/units/{unit_id}/payments", post(payments::record_payment))
        .route("/payments/{payment_id}", put(payments::update_payment))
        .route("/payments/sweep", post(payments::sweep_overdue))
}

// Subscription routes: trial creation, membership payments, access checks
pub fn subscription_routes() -> Router<AppState> {
    Router::new()
        .route("/subscriptions", post(subscriptions::start_trial))
        .route(
            "/subscriptions/{user_id}/access",
            get(subscriptions::check_access),
        )
        .route(
            "/subscriptions/{user_id}/membership-payment",
            post(subscriptions::record_membership_payment)
                .delete(subscriptions::revoke_membership_payment),
        )
}

/// All API routes, mounted under the version prefix by `main`
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(tenancy_routes())
        .merge(payment_routes())
        .merge(subscription_routes())
}
