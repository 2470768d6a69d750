// Occupancy tracking: keeps Unit.is_occupied consistent with membership count
//
// `is_occupied` is a derived value. It is recomputed from a full count inside
// the same transaction as every membership insert/delete, never maintained as
// an incremental counter and never cached, so partial failures cannot leave
// the flag disagreeing with the membership rows.

use chrono::Utc;
use diesel::prelude::*;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::db::DieselPool;
use crate::models::{Unit, UnitTenant};
use crate::utils::{AuditAction, AuditLogger, ServiceError};

/// Recompute `is_occupied` for a unit from its live membership count.
///
/// Must be called on the same connection, inside the same transaction, as the
/// membership write it follows.
pub async fn recompute(conn: &mut AsyncPgConnection, unit: Uuid) -> Result<bool, ServiceError> {
    use crate::schema::units::dsl;

    let count = UnitTenant::count_for_unit(conn, unit).await?;
    let occupied = count > 0;

    let updated = diesel::update(dsl::units.find(unit))
        .set((
            dsl::is_occupied.eq(occupied),
            dsl::updated_at.eq(Utc::now()),
        ))
        .execute(conn)
        .await?;

    if updated != 1 {
        // The unit row disappeared between the membership write and here
        return Err(ServiceError::InvariantViolation(format!(
            "occupancy recompute touched {} rows for unit {}",
            updated, unit
        )));
    }

    debug!("Recomputed occupancy for unit {}: {}", unit, occupied);
    Ok(occupied)
}

/// Defensive check that the stored flag agrees with the membership count.
/// Never used on the hot path; surfaces transaction-boundary bugs in tests.
pub async fn verify(conn: &mut AsyncPgConnection, unit: Uuid) -> Result<(), ServiceError> {
    let stored = Unit::find_by_id(conn, unit)
        .await?
        .ok_or(ServiceError::NotFound)?;
    let count = UnitTenant::count_for_unit(conn, unit).await?;

    if stored.is_occupied != (count > 0) {
        return Err(ServiceError::InvariantViolation(format!(
            "unit {} is_occupied={} but membership count is {}",
            unit, stored.is_occupied, count
        )));
    }

    Ok(())
}

/// Tenancy membership removal, paired with occupancy recompute
pub struct OccupancyService {
    diesel_pool: DieselPool,
}

impl OccupancyService {
    pub fn new(diesel_pool: DieselPool) -> Self {
        Self { diesel_pool }
    }

    /// Remove a tenant from a unit and recompute occupancy, atomically.
    ///
    /// Returns the unit's occupancy after the removal.
    #[instrument(skip(self))]
    pub async fn remove_tenant(
        &self,
        unit_id: Uuid,
        tenant_id: Uuid,
        requester_id: Uuid,
    ) -> Result<bool, ServiceError> {
        let mut conn = self.diesel_pool.get().await?;

        let occupied = conn
            .transaction::<bool, ServiceError, _>(|tx| {
                Box::pin(async move {
                    let unit = Unit::find_by_id(tx, unit_id)
                        .await?
                        .ok_or(ServiceError::NotFound)?;

                    if unit.landlord_id != requester_id {
                        return Err(ServiceError::Forbidden);
                    }

                    let removed = UnitTenant::delete(tx, unit_id, tenant_id).await?;
                    if removed == 0 {
                        return Err(ServiceError::NotFound);
                    }

                    recompute(tx, unit_id).await
                })
            })
            .await?;

        info!(
            "Removed tenant {} from unit {} (occupied: {})",
            tenant_id, unit_id, occupied
        );
        AuditLogger::log_action(
            AuditAction::TenantRemoved,
            requester_id,
            "unit_tenant",
            Some(unit_id.to_string()),
            Some(format!("tenant {} removed", tenant_id)),
        );

        Ok(occupied)
    }
}
