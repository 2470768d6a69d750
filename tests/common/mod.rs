// Shared helpers for integration tests
//
// These tests need a scratch PostgreSQL database. They skip (not fail) when
// TEST_DATABASE_URL is unset so the suite stays green on machines without
// one.

// Not every test binary uses every helper
#![allow(dead_code)]

use rentdesk_backend_core::db::{create_diesel_pool, DieselDatabaseConfig, DieselPool};
use rentdesk_backend_core::models::{NewUnit, Unit};
use rentdesk_backend_core::services::invitation;
use uuid::Uuid;

/// Build a pool against TEST_DATABASE_URL with migrations applied, or None
/// when no scratch database is configured.
pub async fn test_pool() -> Option<DieselPool> {
    dotenv::dotenv().ok();

    let url = match std::env::var("TEST_DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            eprintln!("Skipping test: TEST_DATABASE_URL not set");
            return None;
        },
    };

    if let Err(e) =
        rentdesk_backend_core::migrations::diesel::run_migrations_for_url(url.clone()).await
    {
        eprintln!("Skipping test: migrations failed: {}", e);
        return None;
    }

    match create_diesel_pool(DieselDatabaseConfig::from_url(url)).await {
        Ok(pool) => Some(pool),
        Err(e) => {
            eprintln!("Skipping test: failed to create pool: {}", e);
            None
        },
    }
}

/// Insert a fixture unit owned by `landlord_id` with a fresh invitation token
pub async fn insert_unit(pool: &DieselPool, landlord_id: Uuid, rent_amount_cents: i64) -> Unit {
    let mut conn = pool.get().await.expect("failed to get connection");

    Unit::insert(
        &mut conn,
        &NewUnit {
            property_id: Uuid::new_v4(),
            landlord_id,
            unit_number: "A-101".to_string(),
            rent_amount_cents,
            invitation_token: invitation::generate_token(),
        },
    )
    .await
    .expect("failed to insert fixture unit")
}

/// Reload a unit by id
pub async fn reload_unit(pool: &DieselPool, unit_id: Uuid) -> Unit {
    let mut conn = pool.get().await.expect("failed to get connection");
    Unit::find_by_id(&mut conn, unit_id)
        .await
        .expect("failed to reload unit")
        .expect("unit vanished")
}
