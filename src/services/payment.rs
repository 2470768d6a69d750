// Payment lifecycle: status transitions, paid-date invariant, overdue sweep
//
// Any status may move to any other (administrative corrections are allowed);
// the engine's job is the paid-date invariant and honest edited_at stamping,
// both computed as a pure diff of old record vs requested changes.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::db::DieselPool;
use crate::models::{NewPayment, Payment, PaymentStatus, Unit};
use crate::schema::payments;
use crate::utils::{AuditAction, AuditLogger, ServiceError};

/// Months covered by the discounted advance bundle
const BUNDLE_MONTHS: i64 = 6;

/// Discount applied to the bundle, in percent
const BUNDLE_DISCOUNT_PERCENT: i64 = 15;

/// Price of a six-month advance bundle, in cents, for a given monthly rent.
///
/// `rent * 6 * (1 - 0.15)`, rounded half-up to whole cents. Pure so the
/// quoted amount is always reproducible from the unit's rent.
pub fn six_month_bundle_cents(monthly_rent_cents: i64) -> i64 {
    let gross = monthly_rent_cents * BUNDLE_MONTHS * (100 - BUNDLE_DISCOUNT_PERCENT);
    (gross + 50) / 100
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RecordPaymentRequest {
    pub tenant_id: Uuid,
    /// Amount in cents; omitted when `bundle` is set
    #[validate(range(min = 0))]
    pub amount_cents: Option<i64>,
    /// Price a six-month advance from the unit's rent instead of an explicit
    /// amount
    #[serde(default)]
    pub bundle: bool,
    pub due_date: DateTime<Utc>,
    pub status: PaymentStatus,
    pub paid_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdatePaymentRequest {
    #[validate(range(min = 0))]
    pub amount_cents: Option<i64>,
    pub due_date: Option<DateTime<Utc>>,
    pub status: Option<PaymentStatus>,
    /// Only honored when the (possibly unchanged) status is paid; any other
    /// status forces the paid date clear
    pub paid_date: Option<DateTime<Utc>>,
}

/// Field-level diff applied to a payment row. Built only when at least one
/// field actually changes, so no-op updates never stamp `edited_at`.
#[derive(Debug, AsChangeset)]
#[diesel(table_name = payments)]
pub struct PaymentChanges {
    pub amount_cents: Option<i64>,
    pub due_date: Option<DateTime<Utc>>,
    pub status: Option<String>,
    pub paid_date: Option<Option<DateTime<Utc>>>,
    pub edited_at: Option<DateTime<Utc>>,
}

/// Compute the changeset for an update request against the current record.
///
/// Enforces the paid-date invariant: moving to paid without an explicit paid
/// date stamps `now`; moving anywhere else clears it. Returns `None` when
/// nothing would change ("touched" is not "edited").
pub fn apply_update(
    payment: &Payment,
    request: &UpdatePaymentRequest,
    now: DateTime<Utc>,
) -> Result<Option<PaymentChanges>, ServiceError> {
    let old_status = payment.status_enum().ok_or_else(|| {
        ServiceError::InvariantViolation(format!(
            "payment {} has unknown status {:?}",
            payment.id, payment.status
        ))
    })?;

    let new_status = request.status.unwrap_or(old_status);
    let new_amount = request.amount_cents.unwrap_or(payment.amount_cents);
    let new_due = request.due_date.unwrap_or(payment.due_date);

    let new_paid_date = match new_status {
        PaymentStatus::Paid => Some(request.paid_date.or(payment.paid_date).unwrap_or(now)),
        _ => None,
    };

    let changed = new_status != old_status
        || new_amount != payment.amount_cents
        || new_due != payment.due_date
        || new_paid_date != payment.paid_date;

    if !changed {
        return Ok(None);
    }

    Ok(Some(PaymentChanges {
        amount_cents: Some(new_amount),
        due_date: Some(new_due),
        status: Some(new_status.as_str().to_string()),
        paid_date: Some(new_paid_date),
        edited_at: Some(now),
    }))
}

pub struct PaymentService {
    diesel_pool: DieselPool,
}

impl PaymentService {
    pub fn new(diesel_pool: DieselPool) -> Self {
        Self { diesel_pool }
    }

    /// Record a new payment against a unit the requester owns.
    #[instrument(skip(self, request))]
    pub async fn record_payment(
        &self,
        unit_id: Uuid,
        request: RecordPaymentRequest,
        requester_id: Uuid,
    ) -> Result<Payment, ServiceError> {
        request.validate()?;

        let mut conn = self.diesel_pool.get().await?;

        let unit = Unit::find_by_id(&mut conn, unit_id)
            .await?
            .ok_or(ServiceError::NotFound)?;
        if unit.landlord_id != requester_id {
            return Err(ServiceError::Forbidden);
        }

        let amount_cents = if request.bundle {
            six_month_bundle_cents(unit.rent_amount_cents)
        } else {
            request.amount_cents.ok_or_else(|| {
                ServiceError::ValidationError(
                    "amount_cents is required unless bundle is set".to_string(),
                )
            })?
        };

        // Normalize the paid-date invariant at creation time too
        let paid_date = match request.status {
            PaymentStatus::Paid => Some(request.paid_date.unwrap_or_else(Utc::now)),
            _ => None,
        };

        let payment = Payment::insert(
            &mut conn,
            &NewPayment {
                unit_id,
                tenant_id: request.tenant_id,
                amount_cents,
                due_date: request.due_date,
                paid_date,
                status: request.status.as_str().to_string(),
            },
        )
        .await?;

        info!(
            "Recorded payment {} for unit {} ({} cents, {})",
            payment.id, unit_id, amount_cents, payment.status
        );
        AuditLogger::log_action(
            AuditAction::PaymentRecorded,
            requester_id,
            "payment",
            Some(payment.id.to_string()),
            Some(format!("{} cents, status {}", amount_cents, payment.status)),
        );

        Ok(payment)
    }

    /// Apply an administrative edit to an existing payment.
    #[instrument(skip(self, request))]
    pub async fn update_payment(
        &self,
        payment_id: Uuid,
        request: UpdatePaymentRequest,
        requester_id: Uuid,
    ) -> Result<Payment, ServiceError> {
        request.validate()?;

        let mut conn = self.diesel_pool.get().await?;

        let payment = Payment::find_by_id(&mut conn, payment_id)
            .await?
            .ok_or(ServiceError::NotFound)?;

        let unit = Unit::find_by_id(&mut conn, payment.unit_id)
            .await?
            .ok_or_else(|| {
                ServiceError::InvariantViolation(format!(
                    "payment {} references missing unit {}",
                    payment.id, payment.unit_id
                ))
            })?;
        if unit.landlord_id != requester_id {
            return Err(ServiceError::Forbidden);
        }

        let Some(changes) = apply_update(&payment, &request, Utc::now())? else {
            // Nothing changed; do not stamp edited_at
            return Ok(payment);
        };

        let updated = diesel::update(payments::table.find(payment_id))
            .set(&changes)
            .get_result::<Payment>(&mut conn)
            .await?;

        info!("Updated payment {} (status {})", payment_id, updated.status);
        AuditLogger::log_action(
            AuditAction::PaymentUpdated,
            requester_id,
            "payment",
            Some(payment_id.to_string()),
            Some(format!("status {}", updated.status)),
        );

        Ok(updated)
    }

    /// Promote every pending payment past its due date to overdue.
    ///
    /// One batch statement, no read-then-write loop: a concurrent manual edit
    /// that moves a row away from pending simply drops it out of the WHERE
    /// predicate. Idempotent.
    #[instrument(skip(self))]
    pub async fn mark_overdue(&self, now: DateTime<Utc>) -> Result<u64, ServiceError> {
        use crate::schema::payments::dsl;

        let mut conn = self.diesel_pool.get().await?;

        let updated = diesel::update(
            dsl::payments
                .filter(dsl::status.eq(PaymentStatus::Pending.as_str()))
                .filter(dsl::due_date.lt(now)),
        )
        .set(dsl::status.eq(PaymentStatus::Overdue.as_str()))
        .execute(&mut conn)
        .await? as u64;

        if updated > 0 {
            info!("Marked {} payments overdue", updated);
            AuditLogger::log_action(
                AuditAction::PaymentsMarkedOverdue,
                Uuid::nil(), // system action, no human actor
                "payment",
                None,
                Some(format!("{} payments", updated)),
            );
        }

        Ok(updated)
    }
}
