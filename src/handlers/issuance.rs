//! License issuance orchestration shared by the trial-claim endpoint and
//! the payment webhook: generate with the codec, persist, update the
//! profile, hand the key to the email stub.

use crate::db::{queries, AppState};
use crate::error::{AppError, Result};
use crate::identity::AuthUser;
use crate::license::{LicenseType, TRIAL_DAYS};
use crate::models::{LicenseRecord, StoreLicenseKey};

/// Issues a 7-day trial key. Fails with `Conflict` if the user already
/// holds an active trial or a lifetime license; the profile row is
/// created on demand.
pub fn issue_trial(state: &AppState, user: &AuthUser) -> Result<LicenseRecord> {
    let conn = state.db.get()?;
    queries::ensure_profile(&conn, &user.id)?;

    // Lifetime holders cannot claim a trial on top.
    if queries::has_active_license(&conn, &user.id, Some(LicenseType::Lifetime))? {
        return Err(AppError::Conflict(
            "You already have a lifetime license. Cannot claim trial.".into(),
        ));
    }

    let generated = state.codec.generate_trial(&user.email, &user.email);

    let record = queries::store_license_key(
        &conn,
        &StoreLicenseKey {
            user_id: user.id.clone(),
            license_key: generated.key.clone(),
            key_type: LicenseType::Trial,
            days_valid: Some(TRIAL_DAYS),
            device_id: None,
        },
    )?;

    queries::mark_trial_activated(&conn, &user.id, TRIAL_DAYS)?;

    state
        .email
        .send_license_key(&user.email, &generated.key, "trial")?;

    tracing::info!(user_id = %user.id, "trial license issued");
    Ok(record)
}

/// Issues a lifetime key after a completed purchase. Fails with
/// `Conflict` if the user already holds one.
pub fn issue_lifetime(state: &AppState, user: &AuthUser) -> Result<LicenseRecord> {
    let conn = state.db.get()?;
    queries::ensure_profile(&conn, &user.id)?;

    let generated = state.codec.generate_lifetime(&user.email, &user.email);

    let record = queries::store_license_key(
        &conn,
        &StoreLicenseKey {
            user_id: user.id.clone(),
            license_key: generated.key.clone(),
            key_type: LicenseType::Lifetime,
            days_valid: None,
            device_id: None,
        },
    )?;

    queries::set_subscription_type(&conn, &user.id, "lifetime")?;

    state
        .email
        .send_license_key(&user.email, &generated.key, "lifetime")?;

    tracing::info!(user_id = %user.id, "lifetime license issued");
    Ok(record)
}
