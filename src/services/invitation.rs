// Single-use unit invitation tokens: issue, redeem, rotate
//
// A token is consumed exactly once. Rotation happens in the same transaction
// as the membership insert, via compare-and-swap on the token value, so the
// store's row semantics arbitrate concurrent redemptions: the update's WHERE
// clause is re-evaluated against the committed row, and the loser matches
// zero rows and rolls back.

use chrono::Utc;
use diesel::prelude::*;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use rand::rngs::OsRng;
use rand::RngCore;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::db::DieselPool;
use crate::models::{NewUnitTenant, Unit, UnitTenant};
use crate::services::occupancy;
use crate::utils::{AuditAction, AuditLogger, ServiceError};

/// Token length in random bytes (hex-encoded to twice this many characters)
const TOKEN_BYTES: usize = 32;

/// Generate a fresh invitation token: 256 bits of OS randomness, hex-encoded.
///
/// No collision check here; the unique constraint on the token column is the
/// system of record, and callers retry once on Conflict.
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

pub struct InvitationService {
    diesel_pool: DieselPool,
}

impl InvitationService {
    pub fn new(diesel_pool: DieselPool) -> Self {
        Self { diesel_pool }
    }

    /// Redeem an invitation token for a tenant identity.
    ///
    /// One transaction: token lookup, membership insert, occupancy recompute,
    /// token rotation. Re-redeeming a still-valid token with an
    /// already-linked tenant succeeds idempotently and does not rotate.
    /// Returns the unit as it stands after the redemption.
    #[instrument(skip(self, token))]
    pub async fn redeem(&self, token: &str, tenant_id: Uuid) -> Result<Unit, ServiceError> {
        let mut conn = self.diesel_pool.get().await?;

        let token = token.to_string();
        let unit = conn
            .transaction::<Unit, ServiceError, _>(|tx| {
                Box::pin(async move {
                    let mut unit = Unit::find_by_invitation_token(tx, &token)
                        .await?
                        .ok_or(ServiceError::InvalidToken)?;

                    if UnitTenant::exists(tx, unit.id, tenant_id).await? {
                        // Already linked: idempotent success, no rotation
                        return Ok(unit);
                    }

                    UnitTenant::insert(
                        tx,
                        &NewUnitTenant {
                            unit_id: unit.id,
                            tenant_id,
                        },
                    )
                    .await?;

                    unit.is_occupied = occupancy::recompute(tx, unit.id).await?;
                    unit.invitation_token = rotate_token(tx, unit.id, Some(&token)).await?;

                    Ok(unit)
                })
            })
            .await?;

        info!("Tenant {} joined unit {}", tenant_id, unit.id);
        AuditLogger::log_action(
            AuditAction::InvitationRedeemed,
            tenant_id,
            "unit",
            Some(unit.id.to_string()),
            None,
        );

        Ok(unit)
    }

    /// Landlord-initiated rotation, invalidating any outstanding link
    /// immediately. Returns the replacement token.
    #[instrument(skip(self))]
    pub async fn regenerate(
        &self,
        unit_id: Uuid,
        requester_id: Uuid,
    ) -> Result<String, ServiceError> {
        let mut conn = self.diesel_pool.get().await?;

        let unit = Unit::find_by_id(&mut conn, unit_id)
            .await?
            .ok_or(ServiceError::NotFound)?;

        if unit.landlord_id != requester_id {
            return Err(ServiceError::Forbidden);
        }

        let fresh = rotate_token(&mut conn, unit_id, None).await?;

        info!("Regenerated invitation token for unit {}", unit_id);
        AuditLogger::log_action(
            AuditAction::InvitationTokenRegenerated,
            requester_id,
            "unit",
            Some(unit_id.to_string()),
            None,
        );

        Ok(fresh)
    }
}

/// Replace a unit's invitation token with a freshly generated one.
///
/// When `expected` is given, the update is a compare-and-swap on the current
/// token value: zero rows affected means a concurrent redeem already rotated
/// it, which surfaces as InvalidToken and rolls the caller's transaction
/// back. A unique-constraint collision on the new value is retried once with
/// fresh randomness before surfacing as Conflict.
async fn rotate_token(
    conn: &mut AsyncPgConnection,
    unit_id: Uuid,
    expected: Option<&str>,
) -> Result<String, ServiceError> {
    let expected: Option<String> = expected.map(str::to_string);

    for attempt in 0..2 {
        let fresh = generate_token();

        // Each attempt runs in its own (sub)transaction so a unique-violation
        // rollback only covers the failed statement, not the caller's work.
        let write = fresh.clone();
        let current = expected.clone();
        let result = conn
            .transaction::<usize, diesel::result::Error, _>(|tx| {
                Box::pin(async move { execute_rotation(tx, unit_id, current, write).await })
            })
            .await;

        match result {
            Ok(1) => return Ok(fresh),
            // CAS missed: a concurrent redeem already rotated the token. In
            // the unconditional (regenerate) case the unit itself is gone.
            Ok(_) if expected.is_some() => return Err(ServiceError::InvalidToken),
            Ok(_) => return Err(ServiceError::NotFound),
            Err(diesel::result::Error::DatabaseError(
                diesel::result::DatabaseErrorKind::UniqueViolation,
                _,
            )) if attempt == 0 => {
                warn!("Invitation token collision for unit {}, retrying", unit_id);
                continue;
            },
            Err(e) => return Err(e.into()),
        }
    }

    Err(ServiceError::Conflict)
}

async fn execute_rotation(
    conn: &mut AsyncPgConnection,
    unit_id: Uuid,
    expected: Option<String>,
    fresh: String,
) -> Result<usize, diesel::result::Error> {
    use crate::schema::units::dsl;

    match expected {
        Some(current) => {
            diesel::update(
                dsl::units
                    .find(unit_id)
                    .filter(dsl::invitation_token.eq(current)),
            )
            .set((
                dsl::invitation_token.eq(fresh),
                dsl::updated_at.eq(Utc::now()),
            ))
            .execute(conn)
            .await
        },
        None => {
            diesel::update(dsl::units.find(unit_id))
                .set((
                    dsl::invitation_token.eq(fresh),
                    dsl::updated_at.eq(Utc::now()),
                ))
                .execute(conn)
                .await
        },
    }
}
