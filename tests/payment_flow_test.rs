// Payment lifecycle flows against a real database
//
// Requires TEST_DATABASE_URL; tests skip silently when it is unset.

mod common;

use chrono::{Duration, Utc};
use rentdesk_backend_core::models::{Payment, PaymentStatus};
use rentdesk_backend_core::services::{
    six_month_bundle_cents, PaymentService, RecordPaymentRequest, UpdatePaymentRequest,
};
use rentdesk_backend_core::utils::ServiceError;
use serial_test::serial;
use uuid::Uuid;

fn pending_request(tenant_id: Uuid, amount_cents: i64) -> RecordPaymentRequest {
    RecordPaymentRequest {
        tenant_id,
        amount_cents: Some(amount_cents),
        bundle: false,
        due_date: Utc::now() + Duration::days(30),
        status: PaymentStatus::Pending,
        paid_date: None,
    }
}

#[tokio::test]
#[serial]
async fn test_payment_lifecycle_stamps_and_clears_paid_date() {
    let Some(pool) = common::test_pool().await else {
        return;
    };

    let landlord = Uuid::new_v4();
    let tenant = Uuid::new_v4();
    let unit = common::insert_unit(&pool, landlord, 120_000).await;

    let payments = PaymentService::new(pool.clone());

    let payment = payments
        .record_payment(unit.id, pending_request(tenant, 120_000), landlord)
        .await
        .unwrap();
    assert_eq!(payment.status, "pending");
    assert!(payment.paid_date.is_none());
    assert!(payment.edited_at.is_none());

    // Mark paid without an explicit date: paid_date stamped server-side
    let paid = payments
        .update_payment(
            payment.id,
            UpdatePaymentRequest {
                status: Some(PaymentStatus::Paid),
                ..Default::default()
            },
            landlord,
        )
        .await
        .unwrap();
    assert_eq!(paid.status, "paid");
    assert!(paid.paid_date.is_some());
    assert!(paid.edited_at.is_some());

    // Move it back to pending: paid_date cleared again
    let reverted = payments
        .update_payment(
            payment.id,
            UpdatePaymentRequest {
                status: Some(PaymentStatus::Pending),
                ..Default::default()
            },
            landlord,
        )
        .await
        .unwrap();
    assert_eq!(reverted.status, "pending");
    assert!(reverted.paid_date.is_none());

    // A no-op edit leaves edited_at where it was
    let untouched = payments
        .update_payment(payment.id, UpdatePaymentRequest::default(), landlord)
        .await
        .unwrap();
    assert_eq!(untouched.edited_at, reverted.edited_at);
}

#[tokio::test]
#[serial]
async fn test_bundle_payment_prices_from_unit_rent() {
    let Some(pool) = common::test_pool().await else {
        return;
    };

    let landlord = Uuid::new_v4();
    let unit = common::insert_unit(&pool, landlord, 100_000).await;

    let payments = PaymentService::new(pool.clone());

    let payment = payments
        .record_payment(
            unit.id,
            RecordPaymentRequest {
                tenant_id: Uuid::new_v4(),
                amount_cents: None,
                bundle: true,
                due_date: Utc::now() + Duration::days(7),
                status: PaymentStatus::Pending,
                paid_date: None,
            },
            landlord,
        )
        .await
        .unwrap();

    assert_eq!(payment.amount_cents, six_month_bundle_cents(100_000));
    assert_eq!(payment.amount_cents, 510_000);
}

#[tokio::test]
#[serial]
async fn test_payment_writes_require_ownership() {
    let Some(pool) = common::test_pool().await else {
        return;
    };

    let landlord = Uuid::new_v4();
    let unit = common::insert_unit(&pool, landlord, 90_000).await;

    let payments = PaymentService::new(pool.clone());

    let err = payments
        .record_payment(unit.id, pending_request(Uuid::new_v4(), 90_000), Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden));

    let payment = payments
        .record_payment(unit.id, pending_request(Uuid::new_v4(), 90_000), landlord)
        .await
        .unwrap();

    let err = payments
        .update_payment(
            payment.id,
            UpdatePaymentRequest {
                amount_cents: Some(80_000),
                ..Default::default()
            },
            Uuid::new_v4(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden));

    let err = payments
        .update_payment(Uuid::new_v4(), UpdatePaymentRequest::default(), landlord)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound));
}

#[tokio::test]
#[serial]
async fn test_overdue_sweep_is_idempotent_and_targeted() {
    let Some(pool) = common::test_pool().await else {
        return;
    };

    let landlord = Uuid::new_v4();
    let unit = common::insert_unit(&pool, landlord, 100_000).await;

    let payments = PaymentService::new(pool.clone());
    let now = Utc::now();

    // Past-due pending: should flip
    let past_due = payments
        .record_payment(
            unit.id,
            RecordPaymentRequest {
                tenant_id: Uuid::new_v4(),
                amount_cents: Some(100_000),
                bundle: false,
                due_date: now - Duration::days(3),
                status: PaymentStatus::Pending,
                paid_date: None,
            },
            landlord,
        )
        .await
        .unwrap();

    // Future pending and past-due paid: both untouched
    let future = payments
        .record_payment(unit.id, pending_request(Uuid::new_v4(), 100_000), landlord)
        .await
        .unwrap();
    let settled = payments
        .record_payment(
            unit.id,
            RecordPaymentRequest {
                tenant_id: Uuid::new_v4(),
                amount_cents: Some(100_000),
                bundle: false,
                due_date: now - Duration::days(3),
                status: PaymentStatus::Paid,
                paid_date: Some(now - Duration::days(2)),
            },
            landlord,
        )
        .await
        .unwrap();

    let flipped = payments.mark_overdue(Utc::now()).await.unwrap();
    assert!(flipped >= 1);

    let mut conn = pool.get().await.unwrap();
    let past_due = Payment::find_by_id(&mut conn, past_due.id).await.unwrap().unwrap();
    assert_eq!(past_due.status, "overdue");
    // The sweep is a system action, not an edit
    assert!(past_due.edited_at.is_none());

    let future = Payment::find_by_id(&mut conn, future.id).await.unwrap().unwrap();
    assert_eq!(future.status, "pending");

    let settled = Payment::find_by_id(&mut conn, settled.id).await.unwrap().unwrap();
    assert_eq!(settled.status, "paid");
    assert!(settled.paid_date.is_some());

    // Second pass finds nothing left to flip
    drop(conn);
    let flipped_again = payments.mark_overdue(Utc::now()).await.unwrap();
    assert_eq!(flipped_again, 0);
}
