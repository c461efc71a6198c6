// src/handlers/users.rs

use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;
use sqlx::PgPool;

use crate::{
    error::AppError,
    models::user::{FriendRequestBody, RemoveFriendBody, RequestsResponse, UserSummary},
    relationship,
};

/// Public profile. The credential hash is excluded by serialization.
pub async fn get_user(
    State(pool): State<PgPool>,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user = relationship::fetch_user(&pool, user_id)
        .await?
        .ok_or(AppError::NotFound("User not found".to_string()))?;

    Ok(Json(json!({
        "success": true,
        "data": user,
    })))
}

/// `from` sends `to` a friend request.
pub async fn send_friend_request(
    State(pool): State<PgPool>,
    Json(body): Json<FriendRequestBody>,
) -> Result<impl IntoResponse, AppError> {
    relationship::mutate_edge(&pool, body.from, body.to, relationship::send_request).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Friend request sent",
    })))
}

/// `to` accepts the request that `from` sent.
pub async fn accept_friend_request(
    State(pool): State<PgPool>,
    Json(body): Json<FriendRequestBody>,
) -> Result<impl IntoResponse, AppError> {
    relationship::mutate_edge(&pool, body.to, body.from, relationship::accept_request).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Friend request accepted",
    })))
}

/// `from` withdraws the request it sent to `to`.
pub async fn cancel_friend_request(
    State(pool): State<PgPool>,
    Json(body): Json<FriendRequestBody>,
) -> Result<impl IntoResponse, AppError> {
    relationship::mutate_edge(&pool, body.from, body.to, relationship::cancel_request).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Friend request canceled",
    })))
}

/// Symmetric unfriend; a no-op when the pair is not friends.
pub async fn remove_friend(
    State(pool): State<PgPool>,
    Json(body): Json<RemoveFriendBody>,
) -> Result<impl IntoResponse, AppError> {
    relationship::mutate_edge(
        &pool,
        body.user_id,
        body.friend_id,
        relationship::remove_friend,
    )
    .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Friend removed",
    })))
}

#[derive(Debug, Deserialize)]
pub struct SuggestionParams {
    pub limit: Option<i64>,
}

/// Ranked friend suggestions for a user.
pub async fn get_suggestions(
    State(pool): State<PgPool>,
    Path(user_id): Path<i64>,
    Query(params): Query<SuggestionParams>,
) -> Result<impl IntoResponse, AppError> {
    let limit = params.limit.unwrap_or(10).clamp(0, 100) as usize;

    let suggestions = relationship::suggest_friends(&pool, user_id, limit).await?;

    Ok(Json(json!({
        "success": true,
        "count": suggestions.len(),
        "data": suggestions,
    })))
}

/// A user's confirmed friends.
pub async fn get_friends(
    State(pool): State<PgPool>,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user = relationship::fetch_user(&pool, user_id)
        .await?
        .ok_or(AppError::NotFound("User not found".to_string()))?;

    let friends = load_summaries(&pool, &user.friends.0).await?;

    Ok(Json(json!({
        "success": true,
        "count": friends.len(),
        "data": friends,
    })))
}

/// A user's pending requests, both directions.
pub async fn get_requests(
    State(pool): State<PgPool>,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user = relationship::fetch_user(&pool, user_id)
        .await?
        .ok_or(AppError::NotFound("User not found".to_string()))?;

    let received = load_summaries(&pool, &user.friend_requests_received.0).await?;
    let sent = load_summaries(&pool, &user.friend_requests_sent.0).await?;

    Ok(Json(json!({
        "success": true,
        "data": RequestsResponse { received, sent },
    })))
}

async fn load_summaries(pool: &PgPool, ids: &[i64]) -> Result<Vec<UserSummary>, AppError> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let summaries = sqlx::query_as::<_, UserSummary>(
        "SELECT id, full_name, username FROM users WHERE id = ANY($1) ORDER BY id",
    )
    .bind(ids.to_vec())
    .fetch_all(pool)
    .await?;

    Ok(summaries)
}
