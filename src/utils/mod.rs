// Utility modules for the RentDesk backend core

pub mod audit_logger;
pub mod service_error;

pub use audit_logger::{AuditAction, AuditLogger};
pub use service_error::ServiceError;
