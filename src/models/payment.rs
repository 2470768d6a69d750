use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schema::payments;

/// One billing instance: a month's rent or a discounted multi-month bundle.
/// `paid_date` is non-null exactly when `status` is paid; `edited_at` is
/// stamped only when a post-creation update actually changed a field.
#[derive(
    Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable, AsChangeset,
)]
#[diesel(table_name = payments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Payment {
    pub id: Uuid,
    pub unit_id: Uuid,
    pub tenant_id: Uuid,
    pub amount_cents: i64, // Amount in minor units (e.g., 51000 for 510.00)
    pub due_date: DateTime<Utc>,
    pub paid_date: Option<DateTime<Utc>>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub edited_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = payments)]
pub struct NewPayment {
    pub unit_id: Uuid,
    pub tenant_id: Uuid,
    pub amount_cents: i64,
    pub due_date: DateTime<Utc>,
    pub paid_date: Option<DateTime<Utc>>,
    pub status: String,
}

/// Closed status enumeration; transition rules live in the payment service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Overdue,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Overdue => "overdue",
        }
    }

    pub fn from_string(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(PaymentStatus::Pending),
            "paid" => Some(PaymentStatus::Paid),
            "overdue" => Some(PaymentStatus::Overdue),
            _ => None,
        }
    }
}

impl Payment {
    pub async fn find_by_id(
        conn: &mut AsyncPgConnection,
        payment_id: Uuid,
    ) -> Result<Option<Self>, diesel::result::Error> {
        use crate::schema::payments::dsl;

        dsl::payments
            .find(payment_id)
            .first::<Self>(conn)
            .await
            .optional()
    }

    pub async fn find_by_unit_id(
        conn: &mut AsyncPgConnection,
        unit: Uuid,
    ) -> Result<Vec<Self>, diesel::result::Error> {
        use crate::schema::payments::dsl;

        dsl::payments
            .filter(dsl::unit_id.eq(unit))
            .order(dsl::due_date.desc())
            .load::<Self>(conn)
            .await
    }

    pub async fn insert(
        conn: &mut AsyncPgConnection,
        new_payment: &NewPayment,
    ) -> Result<Self, diesel::result::Error> {
        diesel::insert_into(payments::table)
            .values(new_payment)
            .get_result::<Self>(conn)
            .await
    }

    pub fn status_enum(&self) -> Option<PaymentStatus> {
        PaymentStatus::from_string(&self.status)
    }
}
