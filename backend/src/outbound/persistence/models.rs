//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain.

use chrono::{DateTime, Utc};
use diesel::prelude::*;

use crate::domain::{Bean, BeanDraft, RoastLevel, Roaster, RoasterDraft, User};

use super::schema::{beans, roasters, users, users_permissions};

// ---------------------------------------------------------------------------
// Roasters
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = roasters)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct RoasterRow {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub name: String,
    pub description: String,
    pub website: String,
    pub location: String,
    pub version: i32,
}

impl From<RoasterRow> for Roaster {
    fn from(row: RoasterRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            website: row.website,
            location: row.location,
            created_at: row.created_at,
            version: row.version,
        }
    }
}

/// Insert and update payload; the version column is handled separately.
#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = roasters)]
pub(crate) struct RoasterFields<'a> {
    pub name: &'a str,
    pub description: &'a str,
    pub website: &'a str,
    pub location: &'a str,
}

impl<'a> From<&'a RoasterDraft> for RoasterFields<'a> {
    fn from(draft: &'a RoasterDraft) -> Self {
        Self {
            name: &draft.name,
            description: &draft.description,
            website: &draft.website,
            location: &draft.location,
        }
    }
}

// ---------------------------------------------------------------------------
// Beans
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = beans)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct BeanRow {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub name: String,
    pub roast_level: String,
    pub roaster_id: i64,
    pub version: i32,
}

impl TryFrom<BeanRow> for Bean {
    type Error = String;

    fn try_from(row: BeanRow) -> Result<Self, Self::Error> {
        let roast_level = row
            .roast_level
            .parse::<RoastLevel>()
            .map_err(|err| format!("bean {}: {err}", row.id))?;
        Ok(Self {
            id: row.id,
            name: row.name,
            roast_level,
            roaster_id: row.roaster_id,
            created_at: row.created_at,
            version: row.version,
        })
    }
}

#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = beans)]
pub(crate) struct BeanFields<'a> {
    pub name: &'a str,
    pub roast_level: &'static str,
    pub roaster_id: i64,
}

impl<'a> From<&'a BeanDraft> for BeanFields<'a> {
    fn from(draft: &'a BeanDraft) -> Self {
        Self {
            name: &draft.name,
            roast_level: draft.roast_level.as_str(),
            roaster_id: draft.roaster_id,
        }
    }
}

// ---------------------------------------------------------------------------
// Users and grants
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub activated: bool,
    pub version: i32,
    pub session_epoch: i32,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User::new(
            row.id,
            row.name,
            row.email,
            row.password_hash,
            row.activated,
            row.created_at,
            row.version,
        )
        .with_session_epoch(row.session_epoch)
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub activated: bool,
}

#[derive(Debug, Clone, Copy, Insertable)]
#[diesel(table_name = users_permissions)]
pub(crate) struct NewUserPermissionRow {
    pub user_id: i64,
    pub permission_id: i64,
}
