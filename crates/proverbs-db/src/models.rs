//! Account row types. These map directly to SQLite rows and keep
//! timestamps as stored text; catalogue rows map straight onto
//! proverbs-types records because they carry no conversions.

use anyhow::{Result, anyhow};
use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use uuid::Uuid;

use proverbs_crypto::ActivationKey;
use proverbs_types::models::UserProfile;

#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: String,
    pub username: String,
    pub password: String,
    pub is_active: bool,
}

#[derive(Debug, Clone)]
pub struct ProfileRow {
    pub user_id: String,
    pub username: String,
    pub default_version_id: i64,
    pub show_references: bool,
    pub activation_key: String,
    pub key_expires: String,
}

/// Values for a profile that does not exist yet.
pub struct NewProfile<'a> {
    pub user_id: &'a str,
    pub default_version_id: i64,
    pub show_references: bool,
    pub activation: &'a ActivationKey,
}

impl ProfileRow {
    pub fn activation(&self) -> Result<ActivationKey> {
        Ok(ActivationKey {
            key: self.activation_key.clone(),
            expires: parse_timestamp(&self.key_expires)?,
        })
    }

    pub fn into_profile(self) -> Result<UserProfile> {
        let user_id: Uuid = self
            .user_id
            .parse()
            .map_err(|e| anyhow!("Corrupt user id '{}': {}", self.user_id, e))?;
        let key_expires = parse_timestamp(&self.key_expires)?;

        Ok(UserProfile {
            user_id,
            username: self.username,
            default_version_id: self.default_version_id,
            show_references: self.show_references,
            activation_key: self.activation_key,
            key_expires,
        })
    }
}

/// Fixed-width RFC 3339 so stored values sort the same as the instants
/// they encode.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            // SQLite's datetime('now') has no timezone; treat it as UTC.
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .map_err(|e| anyhow!("Corrupt timestamp '{}': {}", raw, e))
}
