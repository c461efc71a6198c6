// src/models/user.rs

use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};
use validator::Validate;

/// Represents the 'users' table in the database.
///
/// The three relationship sets are JSONB arrays of user ids. Every entry is
/// one projection of a mirrored edge: the other endpoint's row holds the
/// matching entry, and the two are only ever written together inside a
/// single transaction (see `crate::relationship`).
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: i64,

    pub full_name: String,

    /// Unique login handle, stored lowercase.
    pub username: String,

    /// Argon2 password hash.
    /// Skipped during serialization to prevent leaking sensitive data.
    #[serde(skip)]
    pub password: String,

    /// User role: 'user' or 'admin'.
    pub role: String,

    /// Confirmed friends. Symmetric and deduplicated.
    pub friends: Json<Vec<i64>>,

    /// Outgoing pending requests; mirrored as `friend_requests_received`
    /// on each target's row.
    pub friend_requests_sent: Json<Vec<i64>>,

    /// Incoming pending requests.
    pub friend_requests_received: Json<Vec<i64>>,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Minimal public identity used in friend listings and suggestions.
#[derive(Debug, Serialize, FromRow)]
pub struct UserSummary {
    pub id: i64,
    pub full_name: String,
    pub username: String,
}

/// One ranked friend suggestion.
#[derive(Debug, PartialEq, Serialize)]
pub struct Suggestion {
    pub id: i64,
    pub full_name: String,
    pub username: String,
    pub mutual_count: usize,
}

/// Both directions of a user's pending requests.
#[derive(Debug, Serialize)]
pub struct RequestsResponse {
    pub received: Vec<UserSummary>,
    pub sent: Vec<UserSummary>,
}

/// DTO for registration.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 100, message = "Please provide a full name."))]
    pub full_name: String,
    #[validate(length(
        min = 3,
        max = 50,
        message = "Username length must be between 3 and 50 characters."
    ))]
    pub username: String,
    #[validate(length(
        min = 5,
        max = 128,
        message = "Password length must be between 5 and 128 characters."
    ))]
    pub password: String,
}

/// DTO for user login.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 50))]
    pub username: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

/// Body for the send/accept/cancel friend-request endpoints.
#[derive(Debug, Deserialize)]
pub struct FriendRequestBody {
    pub from: i64,
    pub to: i64,
}

/// Body for the unfriend endpoint.
#[derive(Debug, Deserialize)]
pub struct RemoveFriendBody {
    pub user_id: i64,
    pub friend_id: i64,
}
