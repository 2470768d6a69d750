// Services module for the RentDesk backend core
// Business logic layer: the tenancy and payment lifecycle components

pub mod access;
pub mod invitation;
pub mod occupancy;
pub mod payment;
pub mod subscription;

// Re-export commonly used services
pub use access::{AccessDecision, AccessReason, AccessService};
pub use invitation::InvitationService;
pub use occupancy::OccupancyService;
pub use payment::{
    six_month_bundle_cents, PaymentService, RecordPaymentRequest, UpdatePaymentRequest,
};
pub use subscription::SubscriptionService;
