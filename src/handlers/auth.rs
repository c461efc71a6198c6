// src/handlers/auth.rs

use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::json;
use sqlx::PgPool;
use validator::Validate;

use crate::{
    config::Config,
    error::AppError,
    models::user::{LoginRequest, RegisterRequest, User},
    relationship,
    utils::{
        hash::{hash_password, verify_password},
        jwt::{Claims, sign_token},
    },
};

fn public_user_json(user: &User) -> serde_json::Value {
    json!({
        "id": user.id,
        "full_name": user.full_name,
        "username": user.username,
        "role": user.role,
    })
}

/// Registers a new user and signs them in.
///
/// Hashes the password with Argon2 before storing it; the raw value never
/// reaches the database. Returns 201 with a token and the public fields.
pub async fn register(
    State(pool): State<PgPool>,
    State(config): State<Config>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let username = payload.username.trim().to_lowercase();
    let hashed_password = hash_password(&payload.password)?;

    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (full_name, username, password)
        VALUES ($1, $2, $3)
        RETURNING id, full_name, username, password, role,
                  friends, friend_requests_sent, friend_requests_received,
                  created_at, updated_at
        "#,
    )
    .bind(payload.full_name.trim())
    .bind(&username)
    .bind(&hashed_password)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        // Postgres error code for unique violation is 23505
        if e.to_string().contains("unique constraint") || e.to_string().contains("23505") {
            AppError::Conflict(format!("Username '{}' already exists", username))
        } else {
            tracing::error!("Failed to register user: {:?}", e);
            AppError::from(e)
        }
    })?;

    let token = sign_token(user.id, &config.jwt_secret, config.jwt_expiration)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "token": token,
            "user": public_user_json(&user),
        })),
    ))
}

/// Verifies credentials and returns a fresh token.
///
/// Unknown username and wrong password produce the identical message, so
/// the endpoint cannot be used to enumerate accounts.
pub async fn login(
    State(pool): State<PgPool>,
    State(config): State<Config>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let username = payload.username.trim().to_lowercase();

    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT id, full_name, username, password, role,
               friends, friend_requests_sent, friend_requests_received,
               created_at, updated_at
        FROM users
        WHERE username = $1
        "#,
    )
    .bind(&username)
    .fetch_optional(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Login DB error: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    let user = user.ok_or(AppError::AuthError("Invalid credentials".to_string()))?;

    if !verify_password(&payload.password, &user.password)? {
        return Err(AppError::AuthError("Invalid credentials".to_string()));
    }

    let token = sign_token(user.id, &config.jwt_secret, config.jwt_expiration)?;

    Ok(Json(json!({
        "success": true,
        "token": token,
        "user": public_user_json(&user),
    })))
}

/// Current user, resolved from the bearer token.
/// The credential hash is excluded by serialization.
pub async fn me(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user = relationship::fetch_user(&pool, claims.user_id())
        .await?
        .ok_or(AppError::NotFound("User not found".to_string()))?;

    Ok(Json(json!({
        "success": true,
        "user": user,
    })))
}
