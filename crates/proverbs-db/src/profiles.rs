use anyhow::{Result, anyhow};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, Row};
use tracing::info;

use proverbs_crypto::{ActivationKey, new_activation_key};

use crate::Database;
use crate::models::{NewProfile, ProfileRow, UserRow, format_timestamp};
use crate::queries::OptionalExt;

/// Storage operations profile creation depends on. Passed explicitly to
/// `get_or_create_profile` so callers (and tests) choose the backing store.
pub trait ProfileStore {
    fn find_profile(&self, user_id: &str) -> Result<Option<ProfileRow>>;

    fn find_version_id(&self, full_name: &str) -> Result<Option<i64>>;

    /// Insert unless a profile for the user already exists.
    fn insert_profile(&self, profile: &NewProfile<'_>) -> Result<()>;
}

/// Return the user's profile, creating it on first access with the named
/// default version and a fresh activation key.
pub fn get_or_create_profile<S>(
    store: &S,
    user_id: &str,
    username: &str,
    default_version: &str,
    now: DateTime<Utc>,
) -> Result<ProfileRow>
where
    S: ProfileStore + ?Sized,
{
    if let Some(profile) = store.find_profile(user_id)? {
        return Ok(profile);
    }

    let version_id = store
        .find_version_id(default_version)?
        .ok_or_else(|| anyhow!("Default version '{}' does not exist", default_version))?;

    let activation = new_activation_key(username, now);
    store.insert_profile(&NewProfile {
        user_id,
        default_version_id: version_id,
        show_references: true,
        activation: &activation,
    })?;

    // Re-read: a concurrent creator may have won the insert
    let profile = store
        .find_profile(user_id)?
        .ok_or_else(|| anyhow!("Profile for user {} missing after insert", user_id))?;
    info!("Created profile for {}", profile.username);
    Ok(profile)
}

impl ProfileStore for Database {
    fn find_profile(&self, user_id: &str) -> Result<Option<ProfileRow>> {
        self.with_conn(|conn| query_profile(conn, user_id))
    }

    fn find_version_id(&self, full_name: &str) -> Result<Option<i64>> {
        Ok(self.get_version_by_full_name(full_name)?.map(|v| v.id))
    }

    fn insert_profile(&self, profile: &NewProfile<'_>) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT OR IGNORE INTO user_profiles
                    (user_id, default_version_id, show_references, activation_key, key_expires)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![
                    profile.user_id,
                    profile.default_version_id,
                    profile.show_references,
                    profile.activation.key,
                    format_timestamp(profile.activation.expires),
                ],
            )?;
            Ok(())
        })
    }
}

impl Database {
    // -- Users --

    pub fn create_user(&self, id: &str, username: &str, password_hash: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, username, password) VALUES (?1, ?2, ?3)",
                (id, username, password_hash),
            )?;
            Ok(())
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT id, username, password, is_active FROM users WHERE username = ?1",
                [username],
                user_from_row,
            )
            .optional()
        })
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT id, username, password, is_active FROM users WHERE id = ?1",
                [id],
                user_from_row,
            )
            .optional()
        })
    }

    pub fn activate_user(&self, id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            Ok(conn.execute("UPDATE users SET is_active = 1 WHERE id = ?1", [id])? > 0)
        })
    }

    /// Delete accounts that were never activated and whose key expired
    /// before `now`. Their profiles go with them.
    pub fn delete_expired_registrations(&self, now: DateTime<Utc>) -> Result<usize> {
        self.with_conn(|conn| {
            let removed = conn.execute(
                "DELETE FROM users
                 WHERE is_active = 0
                   AND id IN (SELECT user_id FROM user_profiles WHERE key_expires < ?1)",
                [format_timestamp(now)],
            )?;
            Ok(removed)
        })
    }

    // -- Profiles --

    pub fn update_profile(
        &self,
        user_id: &str,
        default_version_id: i64,
        show_references: bool,
    ) -> Result<Option<ProfileRow>> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE user_profiles SET default_version_id = ?2, show_references = ?3
                 WHERE user_id = ?1",
                rusqlite::params![user_id, default_version_id, show_references],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            query_profile(conn, user_id)
        })
    }

    pub fn replace_activation_key(&self, user_id: &str, activation: &ActivationKey) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE user_profiles SET activation_key = ?2, key_expires = ?3 WHERE user_id = ?1",
                rusqlite::params![user_id, activation.key, format_timestamp(activation.expires)],
            )?;
            Ok(changed > 0)
        })
    }
}

fn query_profile(conn: &Connection, user_id: &str) -> Result<Option<ProfileRow>> {
    conn.query_row(
        "SELECT p.user_id, u.username, p.default_version_id, p.show_references,
                p.activation_key, p.key_expires
         FROM user_profiles p
         JOIN users u ON u.id = p.user_id
         WHERE p.user_id = ?1",
        [user_id],
        |row| {
            Ok(ProfileRow {
                user_id: row.get(0)?,
                username: row.get(1)?,
                default_version_id: row.get(2)?,
                show_references: row.get(3)?,
                activation_key: row.get(4)?,
                key_expires: row.get(5)?,
            })
        },
    )
    .optional()
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        username: row.get(1)?,
        password: row.get(2)?,
        is_active: row.get(3)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use std::cell::RefCell;
    use std::collections::HashMap;

    use proverbs_types::forms::VersionForm;

    const NIV: &str = "New International Version - 1984";

    fn seeded_db() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.insert_version(&VersionForm {
            short_name: "NIV".into(),
            full_name: NIV.into(),
            publisher_name: "Zondervan".into(),
            permission_to_quote: "Up to 500 verses.".into(),
            copyright: "International Bible Society".into(),
        })
        .unwrap();
        db.create_user("u-1", "solomon", "hash").unwrap();
        db
    }

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, day, 12, 0, 0).unwrap()
    }

    #[test]
    fn creates_once_then_returns_existing() {
        let db = seeded_db();
        let first = get_or_create_profile(&db, "u-1", "solomon", NIV, at(16)).unwrap();
        assert_eq!(first.username, "solomon");
        assert!(first.show_references);
        assert_eq!(first.activation_key.len(), 40);

        let activation = first.activation().unwrap();
        assert_eq!(activation.expires, at(16) + Duration::days(2));

        let second = get_or_create_profile(&db, "u-1", "solomon", NIV, at(17)).unwrap();
        assert_eq!(second.activation_key, first.activation_key);
        assert_eq!(second.key_expires, first.key_expires);
    }

    #[test]
    fn missing_default_version_is_an_error() {
        let db = seeded_db();
        let err = get_or_create_profile(&db, "u-1", "solomon", "Vulgate", at(16)).unwrap_err();
        assert!(err.to_string().contains("Vulgate"));
        assert!(db.find_profile("u-1").unwrap().is_none());
    }

    #[test]
    fn profile_converts_to_record() {
        let db = seeded_db();
        db.create_user("9b2f6c1e-3f0a-4d55-8a61-0c3c0d7a1e11", "agur", "hash")
            .unwrap();
        let row = get_or_create_profile(
            &db,
            "9b2f6c1e-3f0a-4d55-8a61-0c3c0d7a1e11",
            "agur",
            NIV,
            at(16),
        )
        .unwrap();
        let profile = row.into_profile().unwrap();
        assert_eq!(profile.to_string(), "agur");
        assert_eq!(profile.key_expires, at(18));
    }

    #[test]
    fn update_and_rekey() {
        let db = seeded_db();
        let row = get_or_create_profile(&db, "u-1", "solomon", NIV, at(16)).unwrap();

        let updated = db
            .update_profile("u-1", row.default_version_id, false)
            .unwrap()
            .unwrap();
        assert!(!updated.show_references);
        assert!(db.update_profile("nobody", 1, true).unwrap().is_none());

        let fresh = new_activation_key("solomon", at(20));
        assert!(db.replace_activation_key("u-1", &fresh).unwrap());
        assert_eq!(db.find_profile("u-1").unwrap().unwrap().activation().unwrap(), fresh);
    }

    #[test]
    fn cleanup_removes_only_expired_inactive_accounts() {
        let db = seeded_db();
        db.create_user("u-2", "agur", "hash").unwrap();
        db.create_user("u-3", "lemuel", "hash").unwrap();

        get_or_create_profile(&db, "u-1", "solomon", NIV, at(1)).unwrap();
        get_or_create_profile(&db, "u-2", "agur", NIV, at(1)).unwrap();
        get_or_create_profile(&db, "u-3", "lemuel", NIV, at(10)).unwrap();
        db.activate_user("u-2").unwrap();

        let removed = db.delete_expired_registrations(at(5)).unwrap();
        assert_eq!(removed, 1);
        assert!(db.get_user_by_id("u-1").unwrap().is_none());
        assert!(db.find_profile("u-1").unwrap().is_none());
        assert!(db.get_user_by_id("u-2").unwrap().unwrap().is_active);
        assert!(!db.get_user_by_username("lemuel").unwrap().unwrap().is_active);
    }

    #[derive(Default)]
    struct MemoryStore {
        profiles: RefCell<HashMap<String, ProfileRow>>,
    }

    impl ProfileStore for MemoryStore {
        fn find_profile(&self, user_id: &str) -> Result<Option<ProfileRow>> {
            Ok(self.profiles.borrow().get(user_id).cloned())
        }

        fn find_version_id(&self, full_name: &str) -> Result<Option<i64>> {
            Ok((full_name == NIV).then_some(42))
        }

        fn insert_profile(&self, profile: &NewProfile<'_>) -> Result<()> {
            self.profiles
                .borrow_mut()
                .entry(profile.user_id.to_string())
                .or_insert_with(|| ProfileRow {
                    user_id: profile.user_id.to_string(),
                    username: "from-store".into(),
                    default_version_id: profile.default_version_id,
                    show_references: profile.show_references,
                    activation_key: profile.activation.key.clone(),
                    key_expires: format_timestamp(profile.activation.expires),
                });
            Ok(())
        }
    }

    #[test]
    fn works_against_any_store() {
        let store = MemoryStore::default();
        let row = get_or_create_profile(&store, "u-9", "solomon", NIV, at(16)).unwrap();
        assert_eq!(row.default_version_id, 42);
        assert_eq!(store.profiles.borrow().len(), 1);

        get_or_create_profile(&store, "u-9", "solomon", NIV, at(17)).unwrap();
        assert_eq!(store.profiles.borrow().len(), 1);
    }
}
