//! Data Transfer Objects - request/response types for the API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Accounts
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub username_or_email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub user_id: Uuid,
    pub token: String,
    pub new_password: String,
}

/// A user's public profile. `email` is empty unless the viewer is that user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ============================================================================
// Posts
// ============================================================================

/// Body for both create and update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostInput {
    pub title: String,
    pub text: String,
}

/// Vote direction as sent by clients: `1` or `-1`.
///
/// Kept as raw JSON so that a wrong type or a missing field is reported as
/// a field error rather than a decode failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteRequest {
    #[serde(default)]
    pub value: serde_json::Value,
}

impl VoteRequest {
    /// The value as an `i16`, if it is an integer in range.
    pub fn as_i16(&self) -> Option<i16> {
        self.value.as_i64().and_then(|v| i16::try_from(v).ok())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeedQuery {
    pub limit: Option<i64>,
    /// RFC 3339 timestamp from the previous page.
    pub cursor: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostResponse {
    pub id: Uuid,
    pub title: String,
    pub text: String,
    pub text_snippet: String,
    pub points: i32,
    pub author: Option<UserResponse>,
    /// The viewer's vote: `1`, `-1`, or `0` for none.
    pub vote_type: i16,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedPostsResponse {
    pub total_count: u64,
    /// Pass back as `cursor` to fetch the next page. Null on an empty page.
    pub cursor: Option<String>,
    pub has_more: bool,
    pub posts: Vec<PostResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletePostResponse {
    pub id: Uuid,
    pub votes_removed: u64,
}
