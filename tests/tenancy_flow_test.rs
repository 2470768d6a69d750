// Invitation and occupancy flows against a real database
//
// Requires TEST_DATABASE_URL; tests skip silently when it is unset.

mod common;

use std::sync::Arc;

use rentdesk_backend_core::models::UnitTenant;
use rentdesk_backend_core::services::{occupancy, InvitationService, OccupancyService};
use rentdesk_backend_core::utils::ServiceError;
use serial_test::serial;
use uuid::Uuid;

#[tokio::test]
#[serial]
async fn test_invitation_lifecycle_end_to_end() {
    let Some(pool) = common::test_pool().await else {
        return;
    };

    let landlord = Uuid::new_v4();
    let tenant_a = Uuid::new_v4();
    let tenant_b = Uuid::new_v4();

    let unit = common::insert_unit(&pool, landlord, 120_000).await;
    let tok1 = unit.invitation_token.clone();
    assert!(!unit.is_occupied);

    let invitations = InvitationService::new(pool.clone());
    let occupancy_service = OccupancyService::new(pool.clone());

    // Tenant A redeems the original token: linked, occupied, token rotated
    let after_a = invitations.redeem(&tok1, tenant_a).await.unwrap();
    assert!(after_a.is_occupied);
    let tok2 = after_a.invitation_token.clone();
    assert_ne!(tok2, tok1);

    // The consumed token is dead
    let err = invitations.redeem(&tok1, tenant_b).await.unwrap_err();
    assert!(matches!(err, ServiceError::InvalidToken));

    // Tenant B joins through the replacement token
    let after_b = invitations.redeem(&tok2, tenant_b).await.unwrap();
    assert!(after_b.is_occupied);
    let tok3 = after_b.invitation_token.clone();
    assert_ne!(tok3, tok2);

    {
        let mut conn = pool.get().await.unwrap();
        assert_eq!(UnitTenant::count_for_unit(&mut conn, unit.id).await.unwrap(), 2);
        occupancy::verify(&mut conn, unit.id).await.unwrap();
    }

    // Removing one tenant keeps the unit occupied
    let occupied = occupancy_service
        .remove_tenant(unit.id, tenant_a, landlord)
        .await
        .unwrap();
    assert!(occupied);

    // Removing the last tenant clears the flag
    let occupied = occupancy_service
        .remove_tenant(unit.id, tenant_b, landlord)
        .await
        .unwrap();
    assert!(!occupied);

    {
        let mut conn = pool.get().await.unwrap();
        assert_eq!(UnitTenant::count_for_unit(&mut conn, unit.id).await.unwrap(), 0);
        occupancy::verify(&mut conn, unit.id).await.unwrap();
    }

    // Removal never rotates the token
    let reloaded = common::reload_unit(&pool, unit.id).await;
    assert_eq!(reloaded.invitation_token, tok3);
}

#[tokio::test]
#[serial]
async fn test_redeem_is_idempotent_for_linked_tenant() {
    let Some(pool) = common::test_pool().await else {
        return;
    };

    let landlord = Uuid::new_v4();
    let tenant = Uuid::new_v4();
    let unit = common::insert_unit(&pool, landlord, 90_000).await;

    let invitations = InvitationService::new(pool.clone());

    let after_first = invitations
        .redeem(&unit.invitation_token, tenant)
        .await
        .unwrap();
    let tok2 = after_first.invitation_token.clone();

    // Same tenant, still-valid token: success without a second link or a
    // second rotation
    let after_second = invitations.redeem(&tok2, tenant).await.unwrap();
    assert_eq!(after_second.invitation_token, tok2);

    let mut conn = pool.get().await.unwrap();
    assert_eq!(UnitTenant::count_for_unit(&mut conn, unit.id).await.unwrap(), 1);
}

#[tokio::test]
#[serial]
async fn test_concurrent_redemptions_have_one_winner() {
    let Some(pool) = common::test_pool().await else {
        return;
    };

    let landlord = Uuid::new_v4();
    let unit = common::insert_unit(&pool, landlord, 100_000).await;
    let token = unit.invitation_token.clone();

    let invitations = Arc::new(InvitationService::new(pool.clone()));

    let first = {
        let svc = invitations.clone();
        let tok = token.clone();
        tokio::spawn(async move { svc.redeem(&tok, Uuid::new_v4()).await })
    };
    let second = {
        let svc = invitations.clone();
        let tok = token.clone();
        tokio::spawn(async move { svc.redeem(&tok, Uuid::new_v4()).await })
    };

    let results = [first.await.unwrap(), second.await.unwrap()];
    let wins = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(wins, 1, "exactly one concurrent redemption may succeed");
    assert!(results
        .iter()
        .any(|r| matches!(r, Err(ServiceError::InvalidToken))));

    // The loser's membership insert must have rolled back with it
    let mut conn = pool.get().await.unwrap();
    assert_eq!(UnitTenant::count_for_unit(&mut conn, unit.id).await.unwrap(), 1);
    occupancy::verify(&mut conn, unit.id).await.unwrap();
}

#[tokio::test]
#[serial]
async fn test_regenerate_invalidates_outstanding_token() {
    let Some(pool) = common::test_pool().await else {
        return;
    };

    let landlord = Uuid::new_v4();
    let unit = common::insert_unit(&pool, landlord, 80_000).await;
    let old_token = unit.invitation_token.clone();

    let invitations = InvitationService::new(pool.clone());

    // Only the owning landlord may rotate
    let err = invitations
        .regenerate(unit.id, Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden));

    let fresh = invitations.regenerate(unit.id, landlord).await.unwrap();
    assert_ne!(fresh, old_token);

    // The superseded link is dead immediately
    let err = invitations
        .redeem(&old_token, Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidToken));

    // The fresh one works
    invitations.redeem(&fresh, Uuid::new_v4()).await.unwrap();
}

#[tokio::test]
#[serial]
async fn test_remove_tenant_error_cases() {
    let Some(pool) = common::test_pool().await else {
        return;
    };

    let landlord = Uuid::new_v4();
    let unit = common::insert_unit(&pool, landlord, 80_000).await;

    let occupancy_service = OccupancyService::new(pool.clone());

    // Unknown unit
    let err = occupancy_service
        .remove_tenant(Uuid::new_v4(), Uuid::new_v4(), landlord)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound));

    // Wrong landlord
    let err = occupancy_service
        .remove_tenant(unit.id, Uuid::new_v4(), Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden));

    // Tenant not linked to the unit
    let err = occupancy_service
        .remove_tenant(unit.id, Uuid::new_v4(), landlord)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound));
}
