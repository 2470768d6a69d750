use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schema::subscriptions;

/// Per-subscriber trial and membership state. Access is always re-derived
/// from this snapshot by the access gate, never stored as a separate flag.
#[derive(
    Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable, AsChangeset,
)]
#[diesel(table_name = subscriptions)]
#[diesel(primary_key(user_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Subscription {
    pub user_id: Uuid,
    pub plan: String,
    pub status: String,
    pub trial_start_date: Option<DateTime<Utc>>,
    pub trial_end_date: Option<DateTime<Utc>>,
    pub membership_paid: bool,
    pub membership_payment_date: Option<DateTime<Utc>>,
    pub membership_amount_cents: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = subscriptions)]
pub struct NewSubscription {
    pub user_id: Uuid,
    pub plan: String,
    pub status: String,
    pub trial_start_date: Option<DateTime<Utc>>,
    pub trial_end_date: Option<DateTime<Utc>>,
    pub membership_paid: bool,
    pub membership_amount_cents: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    Inactive,
    Cancelled,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Inactive => "inactive",
            SubscriptionStatus::Cancelled => "cancelled",
        }
    }

    pub fn from_string(s: &str) -> Option<Self> {
        match s {
            "active" => Some(SubscriptionStatus::Active),
            "inactive" => Some(SubscriptionStatus::Inactive),
            "cancelled" => Some(SubscriptionStatus::Cancelled),
            _ => None,
        }
    }
}

impl Subscription {
    pub async fn find_by_user_id(
        conn: &mut AsyncPgConnection,
        user: Uuid,
    ) -> Result<Option<Self>, diesel::result::Error> {
        use crate::schema::subscriptions::dsl;

        dsl::subscriptions
            .find(user)
            .first::<Self>(conn)
            .await
            .optional()
    }

    pub async fn insert(
        conn: &mut AsyncPgConnection,
        new_subscription: &NewSubscription,
    ) -> Result<Self, diesel::result::Error> {
        diesel::insert_into(subscriptions::table)
            .values(new_subscription)
            .get_result::<Self>(conn)
            .await
    }
}
