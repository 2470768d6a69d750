// Access gating: trial window + membership-paid state machine
//
// Pure, side-effect-free predicates over a subscription snapshot. Access is
// re-derived on every request and never stored as a separate flag, so it
// cannot drift the way a cached boolean would.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use uuid::Uuid;

use crate::db::DieselPool;
use crate::models::Subscription;
use crate::utils::ServiceError;

const MILLIS_PER_DAY: i64 = 86_400_000;

/// Whether the subscriber currently has platform access.
///
/// Paid membership is never time-bounded by trial logic; otherwise access
/// requires an intact trial window containing `now`.
pub fn has_access(subscription: Option<&Subscription>, now: DateTime<Utc>) -> bool {
    let Some(sub) = subscription else {
        return false;
    };

    if sub.membership_paid {
        return true;
    }

    match (sub.trial_start_date, sub.trial_end_date) {
        (Some(start), Some(end)) => start <= now && now <= end,
        _ => false,
    }
}

/// Whole trial days remaining: `ceil((trial_end - now) / 1 day)`, floored at
/// zero. Zero when no trial dates are present.
pub fn trial_days_remaining(subscription: &Subscription, now: DateTime<Utc>) -> i64 {
    let Some(end) = subscription.trial_end_date else {
        return 0;
    };

    let millis = (end - now).num_milliseconds();
    if millis <= 0 {
        0
    } else {
        (millis + MILLIS_PER_DAY - 1) / MILLIS_PER_DAY
    }
}

/// Why an access decision came out the way it did. Shown to the subscriber so
/// gating reads as "in trial, N days left" or "trial over", never a flat
/// "unauthorized".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessReason {
    MembershipActive,
    TrialActive,
    TrialExpired,
    NoSubscription,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessDecision {
    pub user_id: Uuid,
    pub has_access: bool,
    pub reason: AccessReason,
    pub trial_days_remaining: i64,
}

/// Evaluate the full decision for a subscription snapshot.
pub fn evaluate(
    user_id: Uuid,
    subscription: Option<&Subscription>,
    now: DateTime<Utc>,
) -> AccessDecision {
    let Some(sub) = subscription else {
        return AccessDecision {
            user_id,
            has_access: false,
            reason: AccessReason::NoSubscription,
            trial_days_remaining: 0,
        };
    };

    let access = has_access(Some(sub), now);
    let reason = if sub.membership_paid {
        AccessReason::MembershipActive
    } else if access {
        AccessReason::TrialActive
    } else {
        AccessReason::TrialExpired
    };

    AccessDecision {
        user_id,
        has_access: access,
        reason,
        trial_days_remaining: trial_days_remaining(sub, now),
    }
}

pub struct AccessService {
    diesel_pool: DieselPool,
}

impl AccessService {
    pub fn new(diesel_pool: DieselPool) -> Self {
        Self { diesel_pool }
    }

    /// Load the subscription and derive the access decision. Read-only; safe
    /// to call on every protected request.
    #[instrument(skip(self))]
    pub async fn check_access(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<AccessDecision, ServiceError> {
        let mut conn = self.diesel_pool.get().await?;
        let subscription = Subscription::find_by_user_id(&mut conn, user_id).await?;
        Ok(evaluate(user_id, subscription.as_ref(), now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn trial_subscription(start: DateTime<Utc>, days: i64) -> Subscription {
        Subscription {
            user_id: Uuid::new_v4(),
            plan: "landlord".to_string(),
            status: "active".to_string(),
            trial_start_date: Some(start),
            trial_end_date: Some(start + Duration::days(days)),
            membership_paid: false,
            membership_payment_date: None,
            membership_amount_cents: 0,
            created_at: start,
            updated_at: start,
        }
    }

    fn trial_start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_absent_subscription_has_no_access() {
        let now = trial_start();
        assert!(!has_access(None, now));

        let decision = evaluate(Uuid::new_v4(), None, now);
        assert!(!decision.has_access);
        assert_eq!(decision.reason, AccessReason::NoSubscription);
        assert_eq!(decision.trial_days_remaining, 0);
    }

    #[test]
    fn test_mid_trial_has_access_with_days_remaining() {
        let start = trial_start();
        let sub = trial_subscription(start, 14);
        let now = start + Duration::days(5);

        assert!(has_access(Some(&sub), now));
        assert_eq!(trial_days_remaining(&sub, now), 9);

        let decision = evaluate(sub.user_id, Some(&sub), now);
        assert!(decision.has_access);
        assert_eq!(decision.reason, AccessReason::TrialActive);
        assert_eq!(decision.trial_days_remaining, 9);
    }

    #[test]
    fn test_expired_trial_is_blocked() {
        let start = trial_start();
        let sub = trial_subscription(start, 14);
        let now = start + Duration::days(20);

        assert!(!has_access(Some(&sub), now));
        assert_eq!(trial_days_remaining(&sub, now), 0);

        let decision = evaluate(sub.user_id, Some(&sub), now);
        assert_eq!(decision.reason, AccessReason::TrialExpired);
    }

    #[test]
    fn test_paid_membership_outlives_trial() {
        let start = trial_start();
        let mut sub = trial_subscription(start, 14);
        sub.membership_paid = true;
        sub.membership_payment_date = Some(start + Duration::days(3));
        let now = start + Duration::days(400);

        assert!(has_access(Some(&sub), now));
        let decision = evaluate(sub.user_id, Some(&sub), now);
        assert_eq!(decision.reason, AccessReason::MembershipActive);
    }

    #[test]
    fn test_trial_boundaries_are_inclusive() {
        let start = trial_start();
        let sub = trial_subscription(start, 14);

        assert!(has_access(Some(&sub), start));
        assert!(has_access(Some(&sub), start + Duration::days(14)));
        assert!(!has_access(Some(&sub), start - Duration::seconds(1)));
        assert!(!has_access(
            Some(&sub),
            start + Duration::days(14) + Duration::seconds(1)
        ));
    }

    #[test]
    fn test_missing_trial_dates_mean_no_trial_access() {
        let start = trial_start();
        let mut sub = trial_subscription(start, 14);
        sub.trial_end_date = None;

        assert!(!has_access(Some(&sub), start));
        assert_eq!(trial_days_remaining(&sub, start), 0);
    }

    #[test]
    fn test_days_remaining_rounds_up_partial_days() {
        let start = trial_start();
        let sub = trial_subscription(start, 14);

        // 13 days and one hour left -> 14
        let now = start + Duration::days(1) - Duration::hours(1);
        assert_eq!(trial_days_remaining(&sub, now), 14);

        // One second left -> 1
        let now = start + Duration::days(14) - Duration::seconds(1);
        assert_eq!(trial_days_remaining(&sub, now), 1);

        // Exactly over -> 0
        let now = start + Duration::days(14);
        assert_eq!(trial_days_remaining(&sub, now), 0);
    }
}
