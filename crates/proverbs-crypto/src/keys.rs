use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Length of an activation key in hex characters.
pub const ACTIVATION_KEY_LEN: usize = 40;

/// How long a freshly issued key stays valid.
pub const ACTIVATION_WINDOW_DAYS: i64 = 2;

const SALT_LEN: usize = 16;

/// A registration activation key and the moment it stops being accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivationKey {
    pub key: String,
    pub expires: DateTime<Utc>,
}

impl ActivationKey {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires
    }

    /// Compare against a key supplied by the user without short-circuiting
    /// on the first differing byte.
    pub fn matches(&self, candidate: &str) -> bool {
        let a = self.key.as_bytes();
        let b = candidate.trim().as_bytes();
        if a.len() != b.len() {
            return false;
        }
        a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
    }
}

/// Issue a new key for `username`, expiring two days after `now`.
pub fn new_activation_key(username: &str, now: DateTime<Utc>) -> ActivationKey {
    let mut salt = [0u8; SALT_LEN];
    rand::rng().fill_bytes(&mut salt);

    let mut hasher = Sha256::new();
    hasher.update(hex::encode(salt).as_bytes());
    hasher.update(username.as_bytes());
    let mut key = hex::encode(hasher.finalize());
    key.truncate(ACTIVATION_KEY_LEN);

    ActivationKey {
        key,
        expires: now + Duration::days(ACTIVATION_WINDOW_DAYS),
    }
}

/// Issue a new key for `username` using the current time.
pub fn generate_activation_key(username: &str) -> ActivationKey {
    new_activation_key(username, Utc::now())
}
