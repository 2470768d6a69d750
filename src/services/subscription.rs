// Subscription administration: trial creation and membership payment state
//
// Membership payment revocation overwrites in place (flag cleared, payment
// date nulled), matching the platform's administrative contract.

use chrono::{DateTime, Duration, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::db::DieselPool;
use crate::models::{NewSubscription, Subscription, SubscriptionStatus};
use crate::utils::{AuditAction, AuditLogger, ServiceError};

pub struct SubscriptionService {
    diesel_pool: DieselPool,
    trial_period_days: i64,
}

impl SubscriptionService {
    pub fn new(diesel_pool: DieselPool, trial_period_days: i64) -> Self {
        Self {
            diesel_pool,
            trial_period_days,
        }
    }

    /// Create a subscription with a fresh trial window starting at `now`.
    /// Conflict when the subscriber already has one.
    #[instrument(skip(self))]
    pub async fn start_trial(
        &self,
        user_id: Uuid,
        plan: &str,
        now: DateTime<Utc>,
    ) -> Result<Subscription, ServiceError> {
        let mut conn = self.diesel_pool.get().await?;

        let subscription = Subscription::insert(
            &mut conn,
            &NewSubscription {
                user_id,
                plan: plan.to_string(),
                status: SubscriptionStatus::Active.as_str().to_string(),
                trial_start_date: Some(now),
                trial_end_date: Some(now + Duration::days(self.trial_period_days)),
                membership_paid: false,
                membership_amount_cents: 0,
            },
        )
        .await?;

        info!(
            "Started {}-day trial for user {} on plan {}",
            self.trial_period_days, user_id, plan
        );
        AuditLogger::log_action(
            AuditAction::TrialStarted,
            user_id,
            "subscription",
            Some(user_id.to_string()),
            Some(format!("plan {}", plan)),
        );

        Ok(subscription)
    }

    /// Record a membership payment: sets the paid flag, stamps the payment
    /// date and amount, and reactivates the subscription.
    #[instrument(skip(self))]
    pub async fn record_membership_payment(
        &self,
        user_id: Uuid,
        amount_cents: i64,
        now: DateTime<Utc>,
        requester_id: Uuid,
    ) -> Result<Subscription, ServiceError> {
        use crate::schema::subscriptions::dsl;

        if amount_cents < 0 {
            return Err(ServiceError::ValidationError(
                "amount_cents must not be negative".to_string(),
            ));
        }

        let mut conn = self.diesel_pool.get().await?;

        let subscription = diesel::update(dsl::subscriptions.find(user_id))
            .set((
                dsl::membership_paid.eq(true),
                dsl::membership_payment_date.eq(Some(now)),
                dsl::membership_amount_cents.eq(amount_cents),
                dsl::status.eq(SubscriptionStatus::Active.as_str()),
                dsl::updated_at.eq(now),
            ))
            .get_result::<Subscription>(&mut conn)
            .await
            .optional()?
            .ok_or(ServiceError::NotFound)?;

        info!(
            "Recorded membership payment of {} cents for user {}",
            amount_cents, user_id
        );
        AuditLogger::log_action(
            AuditAction::MembershipPaymentRecorded,
            requester_id,
            "subscription",
            Some(user_id.to_string()),
            Some(format!("{} cents", amount_cents)),
        );

        Ok(subscription)
    }

    /// Revoke a recorded membership payment. Overwrite-in-place: the paid
    /// flag is cleared and the payment date nulled, which keeps the
    /// membership_paid/payment_date invariant intact.
    #[instrument(skip(self))]
    pub async fn revoke_membership_payment(
        &self,
        user_id: Uuid,
        requester_id: Uuid,
    ) -> Result<Subscription, ServiceError> {
        use crate::schema::subscriptions::dsl;

        let mut conn = self.diesel_pool.get().await?;

        let subscription = diesel::update(dsl::subscriptions.find(user_id))
            .set((
                dsl::membership_paid.eq(false),
                dsl::membership_payment_date.eq(None::<DateTime<Utc>>),
                dsl::updated_at.eq(Utc::now()),
            ))
            .get_result::<Subscription>(&mut conn)
            .await
            .optional()?
            .ok_or(ServiceError::NotFound)?;

        info!("Revoked membership payment for user {}", user_id);
        AuditLogger::log_action(
            AuditAction::MembershipPaymentRevoked,
            requester_id,
            "subscription",
            Some(user_id.to_string()),
            None,
        );

        Ok(subscription)
    }
}
