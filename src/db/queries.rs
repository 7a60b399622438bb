use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::license::LicenseType;
use crate::models::{LicenseRecord, StoreLicenseKey, UserProfile};

const SECONDS_PER_DAY: i64 = 86400;

fn now() -> i64 {
    Utc::now().timestamp()
}

fn gen_id() -> String {
    Uuid::new_v4().to_string()
}

fn profile_from_row(row: &Row<'_>) -> rusqlite::Result<UserProfile> {
    Ok(UserProfile {
        id: row.get(0)?,
        subscription_type: row.get(1)?,
        trial_activated_at: row.get(2)?,
        trial_ends_at: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

fn license_from_row(row: &Row<'_>) -> rusqlite::Result<LicenseRecord> {
    Ok(LicenseRecord {
        id: row.get(0)?,
        user_id: row.get(1)?,
        license_key: row.get(2)?,
        key_type: row.get(3)?,
        device_id: row.get(4)?,
        expires_at: row.get(5)?,
        is_activated: row.get(6)?,
        created_at: row.get(7)?,
    })
}

const PROFILE_COLS: &str =
    "id, subscription_type, trial_activated_at, trial_ends_at, created_at, updated_at";
const LICENSE_COLS: &str =
    "id, user_id, license_key, key_type, device_id, expires_at, is_activated, created_at";

// ============ User profiles ============

/// Creates the profile row if it doesn't exist yet. Idempotent: the
/// identity provider owns the account, this row only carries subscription
/// state keyed by its user id.
pub fn ensure_profile(conn: &Connection, user_id: &str) -> Result<UserProfile> {
    let now = now();
    conn.execute(
        "INSERT INTO user_profiles (id, subscription_type, created_at, updated_at)
         VALUES (?1, 'none', ?2, ?2)
         ON CONFLICT(id) DO NOTHING",
        params![user_id, now],
    )?;
    get_profile(conn, user_id)?
        .ok_or_else(|| AppError::Internal("profile missing after insert".into()))
}

pub fn get_profile(conn: &Connection, user_id: &str) -> Result<Option<UserProfile>> {
    let profile = conn
        .query_row(
            &format!("SELECT {PROFILE_COLS} FROM user_profiles WHERE id = ?1"),
            params![user_id],
            profile_from_row,
        )
        .optional()?;
    Ok(profile)
}

pub fn set_subscription_type(
    conn: &Connection,
    user_id: &str,
    subscription_type: &str,
) -> Result<bool> {
    let affected = conn.execute(
        "UPDATE user_profiles SET subscription_type = ?2, updated_at = ?3 WHERE id = ?1",
        params![user_id, subscription_type, now()],
    )?;
    Ok(affected > 0)
}

/// Stamps the trial window on the profile (subscription type + both trial
/// timestamps in one update).
pub fn mark_trial_activated(conn: &Connection, user_id: &str, days_valid: i64) -> Result<bool> {
    let now = now();
    let affected = conn.execute(
        "UPDATE user_profiles
         SET subscription_type = 'trial', trial_activated_at = ?2, trial_ends_at = ?3,
             updated_at = ?2
         WHERE id = ?1",
        params![user_id, now, now + days_valid * SECONDS_PER_DAY],
    )?;
    Ok(affected > 0)
}

// ============ License keys ============

/// Returns true if the user holds a currently valid license, optionally
/// restricted to one key type. Lifetime keys never expire; everything
/// else is compared against `expires_at`.
pub fn has_active_license(
    conn: &Connection,
    user_id: &str,
    key_type: Option<LicenseType>,
) -> Result<bool> {
    let licenses = match key_type {
        Some(t) => {
            let mut stmt = conn.prepare(&format!(
                "SELECT {LICENSE_COLS} FROM license_keys WHERE user_id = ?1 AND key_type = ?2"
            ))?;
            let rows = stmt.query_map(params![user_id, t.record_name()], license_from_row)?;
            rows.collect::<rusqlite::Result<Vec<_>>>()?
        }
        None => {
            let mut stmt = conn.prepare(&format!(
                "SELECT {LICENSE_COLS} FROM license_keys WHERE user_id = ?1"
            ))?;
            let rows = stmt.query_map(params![user_id], license_from_row)?;
            rows.collect::<rusqlite::Result<Vec<_>>>()?
        }
    };

    let now = now();
    Ok(licenses.iter().any(|license| {
        if license.key_type == "lifetime" {
            return true;
        }
        license.expires_at.is_some_and(|exp| exp > now)
    }))
}

/// Stores a generated key, enforcing the per-user invariants: at most one
/// active trial and at most one lifetime license. These checks live here,
/// not in the codec.
pub fn store_license_key(conn: &Connection, input: &StoreLicenseKey) -> Result<LicenseRecord> {
    match input.key_type {
        LicenseType::Trial => {
            if has_active_license(conn, &input.user_id, Some(LicenseType::Trial))? {
                return Err(AppError::Conflict(
                    "User already has an active trial license".into(),
                ));
            }
        }
        LicenseType::Lifetime => {
            if has_active_license(conn, &input.user_id, Some(LicenseType::Lifetime))? {
                return Err(AppError::Conflict(
                    "User already has a lifetime license".into(),
                ));
            }
        }
        LicenseType::Demo => {}
    }

    let now = now();
    let expires_at = match input.key_type {
        LicenseType::Lifetime => None,
        _ => input
            .days_valid
            .filter(|d| *d > 0)
            .map(|d| now + d * SECONDS_PER_DAY),
    };

    let id = gen_id();
    conn.execute(
        "INSERT INTO license_keys
            (id, user_id, license_key, key_type, device_id, expires_at, is_activated, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, ?7)",
        params![
            id,
            input.user_id,
            input.license_key,
            input.key_type.record_name(),
            input.device_id,
            expires_at,
            now
        ],
    )?;

    Ok(LicenseRecord {
        id,
        user_id: input.user_id.clone(),
        license_key: input.license_key.clone(),
        key_type: input.key_type.record_name().to_string(),
        device_id: input.device_id.clone(),
        expires_at,
        is_activated: false,
        created_at: now,
    })
}

/// Most recently created license for a user, optionally by type.
pub fn latest_license(
    conn: &Connection,
    user_id: &str,
    key_type: Option<LicenseType>,
) -> Result<Option<LicenseRecord>> {
    let record = match key_type {
        Some(t) => conn
            .query_row(
                &format!(
                    "SELECT {LICENSE_COLS} FROM license_keys
                     WHERE user_id = ?1 AND key_type = ?2
                     ORDER BY created_at DESC, rowid DESC LIMIT 1"
                ),
                params![user_id, t.record_name()],
                license_from_row,
            )
            .optional()?,
        None => conn
            .query_row(
                &format!(
                    "SELECT {LICENSE_COLS} FROM license_keys
                     WHERE user_id = ?1
                     ORDER BY created_at DESC, rowid DESC LIMIT 1"
                ),
                params![user_id],
                license_from_row,
            )
            .optional()?,
    };
    Ok(record)
}

pub fn list_licenses(conn: &Connection, user_id: &str) -> Result<Vec<LicenseRecord>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {LICENSE_COLS} FROM license_keys WHERE user_id = ?1
         ORDER BY created_at DESC, rowid DESC"
    ))?;
    let rows = stmt.query_map(params![user_id], license_from_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}
