pub mod payment;
pub mod subscription;
pub mod unit;

// Re-export common types
pub use payment::{NewPayment, Payment, PaymentStatus};
pub use subscription::{NewSubscription, Subscription, SubscriptionStatus};
pub use unit::{NewUnit, NewUnitTenant, Unit, UnitTenant};
