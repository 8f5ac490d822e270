use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{ChapterVerse, Passage};

// -- JWT Claims --

/// JWT claims issued at login and checked by the auth middleware.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub username: String,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
}

/// The activation key is not part of the response; it is delivered out of
/// band.
#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub user_id: Uuid,
    pub key_expires: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ActivateRequest {
    pub username: String,
    pub activation_key: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReissueRequest {
    pub username: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReissueResponse {
    pub key_expires: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub user_id: Uuid,
    pub username: String,
    pub token: String,
}

// -- Passages --

#[derive(Debug, Serialize, Deserialize)]
pub struct PassageResponse {
    pub id: i64,
    pub version_id: i64,
    /// Display form, e.g. `3:1 - 5`.
    pub reference: String,
    pub references: Vec<ChapterVerse>,
}

impl From<&Passage> for PassageResponse {
    fn from(passage: &Passage) -> Self {
        let mut references: Vec<ChapterVerse> =
            passage.references.iter().map(|r| r.position()).collect();
        references.sort();

        Self {
            id: passage.id,
            version_id: passage.version_id,
            reference: passage.reference(),
            references,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ScriptureResponse {
    pub reference: String,
    pub version: String,
    pub scripture: String,
}

// -- Errors --

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}
