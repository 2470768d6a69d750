// Application state shared across handlers
use std::sync::Arc;

use crate::{
    db::DieselPool,
    services::{
        AccessService, InvitationService, OccupancyService, PaymentService, SubscriptionService,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub diesel_pool: DieselPool,
    pub invitation_service: Arc<InvitationService>,
    pub occupancy_service: Arc<OccupancyService>,
    pub payment_service: Arc<PaymentService>,
    pub access_service: Arc<AccessService>,
    pub subscription_service: Arc<SubscriptionService>,
    pub max_connections: u32,
}
