use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,                   // unique user ID
    pub name: String,               // display name
    pub email: String,              // unique, stored lowercased
    pub phone: String,              // contact number
    #[serde(skip_serializing)]
    pub password_hash: String,      // Argon2 hash, not exposed in JSON
    pub image: String,              // profile image URI
    pub email_verified: bool,       // flipped by account activation
    pub role: String,               // authorization role, defaults to "user"
    pub created_at: OffsetDateTime, // creation timestamp
}
