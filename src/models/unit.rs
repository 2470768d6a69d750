use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schema::{unit_tenants, units};

/// A rentable space inside a property. `is_occupied` is derived from the
/// unit's memberships and is only ever written by the occupancy recompute.
#[derive(
    Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable, AsChangeset,
)]
#[diesel(table_name = units)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Unit {
    pub id: Uuid,
    pub property_id: Uuid,
    pub landlord_id: Uuid,
    pub unit_number: String,
    pub rent_amount_cents: i64,
    pub is_occupied: bool,
    pub invitation_token: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = units)]
pub struct NewUnit {
    pub property_id: Uuid,
    pub landlord_id: Uuid,
    pub unit_number: String,
    pub rent_amount_cents: i64,
    pub invitation_token: String,
}

/// Membership edge between a unit and a tenant identity. A unit may house
/// several tenants at once; `created_at` carries "first tenant" ordering.
#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = unit_tenants)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UnitTenant {
    pub id: Uuid,
    pub unit_id: Uuid,
    pub tenant_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = unit_tenants)]
pub struct NewUnitTenant {
    pub unit_id: Uuid,
    pub tenant_id: Uuid,
}

impl Unit {
    pub async fn find_by_id(
        conn: &mut AsyncPgConnection,
        unit_id: Uuid,
    ) -> Result<Option<Self>, diesel::result::Error> {
        use crate::schema::units::dsl;

        dsl::units
            .find(unit_id)
            .first::<Self>(conn)
            .await
            .optional()
    }

    pub async fn find_by_invitation_token(
        conn: &mut AsyncPgConnection,
        token: &str,
    ) -> Result<Option<Self>, diesel::result::Error> {
        use crate::schema::units::dsl;

        dsl::units
            .filter(dsl::invitation_token.eq(token))
            .first::<Self>(conn)
            .await
            .optional()
    }

    pub async fn insert(
        conn: &mut AsyncPgConnection,
        new_unit: &NewUnit,
    ) -> Result<Self, diesel::result::Error> {
        diesel::insert_into(units::table)
            .values(new_unit)
            .get_result::<Self>(conn)
            .await
    }
}

impl UnitTenant {
    /// Membership rows ordered oldest first ("first tenant" semantics)
    pub async fn list_for_unit(
        conn: &mut AsyncPgConnection,
        unit: Uuid,
    ) -> Result<Vec<Self>, diesel::result::Error> {
        use crate::schema::unit_tenants::dsl;

        dsl::unit_tenants
            .filter(dsl::unit_id.eq(unit))
            .order(dsl::created_at.asc())
            .load::<Self>(conn)
            .await
    }

    pub async fn count_for_unit(
        conn: &mut AsyncPgConnection,
        unit: Uuid,
    ) -> Result<i64, diesel::result::Error> {
        use crate::schema::unit_tenants::dsl;

        dsl::unit_tenants
            .filter(dsl::unit_id.eq(unit))
            .count()
            .get_result(conn)
            .await
    }

    pub async fn exists(
        conn: &mut AsyncPgConnection,
        unit: Uuid,
        tenant: Uuid,
    ) -> Result<bool, diesel::result::Error> {
        use crate::schema::unit_tenants::dsl;

        let count: i64 = dsl::unit_tenants
            .filter(dsl::unit_id.eq(unit))
            .filter(dsl::tenant_id.eq(tenant))
            .count()
            .get_result(conn)
            .await?;

        Ok(count > 0)
    }

    pub async fn insert(
        conn: &mut AsyncPgConnection,
        membership: &NewUnitTenant,
    ) -> Result<Self, diesel::result::Error> {
        diesel::insert_into(unit_tenants::table)
            .values(membership)
            .get_result::<Self>(conn)
            .await
    }

    /// Delete one membership edge. Returns the number of rows removed (0 or 1
    /// given the unique constraint on the pair).
    pub async fn delete(
        conn: &mut AsyncPgConnection,
        unit: Uuid,
        tenant: Uuid,
    ) -> Result<usize, diesel::result::Error> {
        use crate::schema::unit_tenants::dsl;

        diesel::delete(
            dsl::unit_tenants
                .filter(dsl::unit_id.eq(unit))
                .filter(dsl::tenant_id.eq(tenant)),
        )
        .execute(conn)
        .await
    }
}
