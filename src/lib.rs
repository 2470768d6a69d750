// Library exports for the RentDesk backend core
// This file exposes modules and functions for library consumers

pub mod app;
pub mod app_config;
pub mod db;
pub mod handlers;
pub mod migrations;
pub mod models;
pub mod schema;
pub mod services;
pub mod utils;

// Re-export commonly used types
pub use app::AppState;
pub use app_config::{AppConfig, CONFIG};
pub use db::{DieselDatabaseConfig, DieselPool};
pub use models::{Payment, PaymentStatus, Subscription, SubscriptionStatus, Unit, UnitTenant};
pub use services::{
    six_month_bundle_cents, AccessDecision, AccessReason, AccessService, InvitationService,
    OccupancyService, PaymentService, RecordPaymentRequest, SubscriptionService,
    UpdatePaymentRequest,
};
pub use utils::ServiceError;

// Re-export route builders
pub use handlers::{api_routes, payment_routes, subscription_routes, tenancy_routes};

use std::sync::Arc;
use tracing::info;

/// Initialize the shared application state: pool, migrations, services.
pub async fn initialize_app_state() -> Result<AppState, Box<dyn std::error::Error>> {
    // Load environment
    dotenv::dotenv().ok();

    // Initialize config
    let config = app_config::config();

    // Initialize database pool
    info!("Initializing database pool...");
    let db_config = db::DieselDatabaseConfig::default();
    let max_connections = db_config.max_connections;
    let diesel_pool = db::create_diesel_pool(db_config).await?;

    // Run migrations if enabled
    if migrations::should_run_migrations() {
        info!("Running embedded migrations...");
        let migration_config = migrations::MigrationConfig::default();
        migrations::run_all_migrations(&diesel_pool, migration_config)
            .await
            .map_err(|e| format!("Migration failed: {}", e))?;
    }

    // Initialize services
    let invitation_service = Arc::new(InvitationService::new(diesel_pool.clone()));
    let occupancy_service = Arc::new(OccupancyService::new(diesel_pool.clone()));
    let payment_service = Arc::new(PaymentService::new(diesel_pool.clone()));
    let access_service = Arc::new(AccessService::new(diesel_pool.clone()));
    let subscription_service = Arc::new(SubscriptionService::new(
        diesel_pool.clone(),
        config.trial_period_days,
    ));

    Ok(AppState {
        diesel_pool,
        invitation_service,
        occupancy_service,
        payment_service,
        access_service,
        subscription_service,
        max_connections,
    })
}

// Health check handler
pub async fn health_check(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> impl axum::response::IntoResponse {
    use axum::http::StatusCode;
    use axum::Json;

    let mut overall_healthy = true;
    let timestamp = chrono::Utc::now().to_rfc3339();

    // Check PostgreSQL
    let postgres_health = match db::check_diesel_health(&state.diesel_pool).await {
        Ok(_) => serde_json::json!({
            "status": "healthy",
            "max_connections": state.max_connections,
            "error": null
        }),
        Err(e) => {
            overall_healthy = false;
            serde_json::json!({
                "status": "unhealthy",
                "error": format!("Database connection failed: {}", e)
            })
        },
    };

    let response = serde_json::json!({
        "status": if overall_healthy { "healthy" } else { "degraded" },
        "service": "rentdesk-backend",
        "timestamp": timestamp,
        "components": {
            "postgresql": postgres_health
        }
    });

    if overall_healthy {
        (StatusCode::OK, Json(response))
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, Json(response))
    }
}
