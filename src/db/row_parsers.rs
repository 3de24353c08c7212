use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde_json::Value;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

use crate::models::profile::DbProfile;
use crate::models::user::DbIdentity;
use crate::store::StoreError;

pub fn parse_datetime(s: &str) -> Result<DateTime<Utc>, StoreError> {
    let s = s.trim();

    // Try RFC3339 first (e.g. 2025-11-19T12:34:56Z)
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    // Try SQLite default timestamp format: "YYYY-MM-DD HH:MM:SS" (with optional fractional seconds)
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return Ok(Utc.from_utc_datetime(&naive));
    }

    // Try date-only format: "YYYY-MM-DD"
    if let Ok(naive_date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        let ndt = naive_date
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| StoreError::corrupt("invalid datetime: date out of range"))?;
        return Ok(Utc.from_utc_datetime(&ndt));
    }

    Err(StoreError::corrupt(format!("invalid datetime: {}", s)))
}

fn column<'r, T>(row: &'r SqliteRow, name: &str) -> Result<T, StoreError>
where
    T: sqlx::Decode<'r, sqlx::Sqlite> + sqlx::Type<sqlx::Sqlite>,
{
    row.try_get(name)
        .map_err(|e| StoreError::corrupt(format!("missing {}: {}", name, e)))
}

fn parse_uuid(s: &str) -> Result<Uuid, StoreError> {
    Uuid::parse_str(s.trim()).map_err(|e| StoreError::corrupt(format!("invalid uuid: {}", e)))
}

/// Metadata is a JSON object; blank or malformed text reads as `{}`.
fn parse_metadata(s: Option<String>) -> Value {
    s.as_deref()
        .map(str::trim)
        .filter(|raw| !raw.is_empty())
        .and_then(|raw| serde_json::from_str::<Value>(raw).ok())
        .filter(Value::is_object)
        .unwrap_or_else(|| Value::Object(Default::default()))
}

pub fn db_identity_from_row(row: &SqliteRow) -> Result<DbIdentity, StoreError> {
    let id_s: String = column(row, "id")?;
    let email: String = column(row, "email")?;
    let password_hash: String = column(row, "password_hash")?;
    let metadata_s: Option<String> = column(row, "metadata")?;
    let created_at_s: String = column(row, "created_at")?;
    let updated_at_s: String = column(row, "updated_at")?;

    Ok(DbIdentity {
        id: parse_uuid(&id_s)?,
        email,
        password_hash,
        metadata: parse_metadata(metadata_s),
        created_at: parse_datetime(&created_at_s)?,
        updated_at: parse_datetime(&updated_at_s)?,
    })
}

pub fn db_profile_from_row(row: &SqliteRow) -> Result<DbProfile, StoreError> {
    let id_s: String = column(row, "id")?;
    let email: String = column(row, "email")?;
    let full_name: Option<String> = column(row, "full_name")?;
    let avatar_url: Option<String> = column(row, "avatar_url")?;
    let role: Option<String> = column(row, "role")?;
    let created_at_s: String = column(row, "created_at")?;
    let updated_at_s: String = column(row, "updated_at")?;

    Ok(DbProfile {
        id: parse_uuid(&id_s)?,
        email,
        full_name,
        avatar_url,
        role,
        created_at: parse_datetime(&created_at_s)?,
        updated_at: parse_datetime(&updated_at_s)?,
    })
}
