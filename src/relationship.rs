// src/relationship.rs

//! Friend-graph state machine.
//!
//! A relationship fact is a mirrored edge: it is stored on both endpoints'
//! rows (`friends`, `friend_requests_sent`, `friend_requests_received`) and
//! the two projections must always change together. The transitions below
//! are pure functions over the two endpoint documents; `mutate_edge` is the
//! single persistence path for all of them, writing both rows inside one
//! transaction with the rows locked in ascending-id order.

use std::collections::HashSet;

use sqlx::{PgPool, Postgres, Transaction};

use crate::{
    error::AppError,
    models::user::{Suggestion, User},
};

/// Business-rule violations of the friend-graph state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeError {
    /// Both endpoints are the same user.
    SelfReference,
    /// The endpoints are already friends.
    AlreadyFriends,
    /// An identical pending request already exists.
    DuplicateRequest,
    /// The other endpoint already sent a request; accept it instead.
    ReverseRequestExists,
    /// No pending request exists between the endpoints.
    NoSuchRequest,
}

impl From<EdgeError> for AppError {
    fn from(err: EdgeError) -> Self {
        match err {
            EdgeError::SelfReference => {
                AppError::BadRequest("Cannot befriend yourself".to_string())
            }
            EdgeError::AlreadyFriends => AppError::Conflict("Already friends".to_string()),
            EdgeError::DuplicateRequest => {
                AppError::Conflict("Friend request already sent".to_string())
            }
            EdgeError::ReverseRequestExists => AppError::Conflict(
                "This user has already sent you a friend request; accept it instead".to_string(),
            ),
            EdgeError::NoSuchRequest => {
                AppError::NotFound("No pending friend request between these users".to_string())
            }
        }
    }
}

fn insert_unique(set: &mut Vec<i64>, id: i64) {
    if !set.contains(&id) {
        set.push(id);
    }
}

fn remove_id(set: &mut Vec<i64>, id: i64) -> bool {
    let before = set.len();
    set.retain(|&x| x != id);
    before != set.len()
}

/// `from` asks `to` to become friends: records the pending edge on both rows.
pub fn send_request(from: &mut User, to: &mut User) -> Result<(), EdgeError> {
    if from.id == to.id {
        return Err(EdgeError::SelfReference);
    }
    if from.friends.0.contains(&to.id) || to.friends.0.contains(&from.id) {
        return Err(EdgeError::AlreadyFriends);
    }
    if from.friend_requests_sent.0.contains(&to.id) {
        return Err(EdgeError::DuplicateRequest);
    }
    if from.friend_requests_received.0.contains(&to.id) {
        return Err(EdgeError::ReverseRequestExists);
    }

    insert_unique(&mut from.friend_requests_sent.0, to.id);
    insert_unique(&mut to.friend_requests_received.0, from.id);
    Ok(())
}

/// `accepter` accepts the pending request from `requester`: the pending edge
/// leaves both request sets and the symmetric friends edge appears on both
/// rows. Set-union semantics keep the friends lists duplicate-free even if
/// one side was already present.
pub fn accept_request(accepter: &mut User, requester: &mut User) -> Result<(), EdgeError> {
    if accepter.id == requester.id {
        return Err(EdgeError::SelfReference);
    }
    if !remove_id(&mut accepter.friend_requests_received.0, requester.id) {
        return Err(EdgeError::NoSuchRequest);
    }
    remove_id(&mut requester.friend_requests_sent.0, accepter.id);

    insert_unique(&mut accepter.friends.0, requester.id);
    insert_unique(&mut requester.friends.0, accepter.id);
    Ok(())
}

/// `canceler` withdraws the request it sent to `target`.
pub fn cancel_request(canceler: &mut User, target: &mut User) -> Result<(), EdgeError> {
    if canceler.id == target.id {
        return Err(EdgeError::SelfReference);
    }
    if !remove_id(&mut canceler.friend_requests_sent.0, target.id) {
        return Err(EdgeError::NoSuchRequest);
    }
    remove_id(&mut target.friend_requests_received.0, canceler.id);
    Ok(())
}

/// Symmetric unfriend. Succeeds as a no-op when the edge is already gone.
pub fn remove_friend(a: &mut User, b: &mut User) -> Result<(), EdgeError> {
    if a.id == b.id {
        return Err(EdgeError::SelfReference);
    }
    remove_id(&mut a.friends.0, b.id);
    remove_id(&mut b.friends.0, a.id);
    Ok(())
}

const USER_COLUMNS: &str = "id, full_name, username, password, role, \
     friends, friend_requests_sent, friend_requests_received, \
     created_at, updated_at";

/// Loads a user without locking. Shared by handlers that only read.
pub async fn fetch_user(pool: &PgPool, id: i64) -> Result<Option<User>, AppError> {
    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

async fn lock_user(tx: &mut Transaction<'_, Postgres>, id: i64) -> Result<User, AppError> {
    sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE id = $1 FOR UPDATE"
    ))
    .bind(id)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or(AppError::NotFound("User not found".to_string()))
}

async fn store_sets(tx: &mut Transaction<'_, Postgres>, user: &User) -> Result<(), AppError> {
    sqlx::query(
        r#"
        UPDATE users
        SET friends = $1,
            friend_requests_sent = $2,
            friend_requests_received = $3,
            updated_at = now()
        WHERE id = $4
        "#,
    )
    .bind(&user.friends)
    .bind(&user.friend_requests_sent)
    .bind(&user.friend_requests_received)
    .bind(user.id)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

/// Applies one transition to the pair and persists both projections.
///
/// The only write path into the relationship sets: both rows are locked
/// `FOR UPDATE` (ascending-id order, so concurrent mutations of the same
/// pair cannot deadlock) and written in the same transaction, which rules
/// out one-sided edges even across a crash.
pub async fn mutate_edge<F>(
    pool: &PgPool,
    a_id: i64,
    b_id: i64,
    transition: F,
) -> Result<(), AppError>
where
    F: FnOnce(&mut User, &mut User) -> Result<(), EdgeError>,
{
    // A self-pair would alias the same row twice; reject before loading.
    if a_id == b_id {
        return Err(EdgeError::SelfReference.into());
    }

    let mut tx = pool.begin().await?;

    let (low, high) = if a_id < b_id { (a_id, b_id) } else { (b_id, a_id) };
    let low_user = lock_user(&mut tx, low).await?;
    let high_user = lock_user(&mut tx, high).await?;

    let (mut a, mut b) = if a_id < b_id {
        (low_user, high_user)
    } else {
        (high_user, low_user)
    };

    transition(&mut a, &mut b)?;

    store_sets(&mut tx, &a).await?;
    store_sets(&mut tx, &b).await?;

    tx.commit().await?;
    Ok(())
}

/// Ranks candidates by mutual-friend count for `user`.
///
/// Excludes the user itself, existing friends and both pending directions.
/// Hashed membership tests keep the intersection linear in the candidates'
/// total friend-list size. Candidates with zero mutual friends still rank.
pub fn rank_suggestions(user: &User, candidates: &[User], limit: usize) -> Vec<Suggestion> {
    let mut excluded: HashSet<i64> = HashSet::new();
    excluded.insert(user.id);
    excluded.extend(user.friends.0.iter().copied());
    excluded.extend(user.friend_requests_sent.0.iter().copied());
    excluded.extend(user.friend_requests_received.0.iter().copied());

    let own_friends: HashSet<i64> = user.friends.0.iter().copied().collect();

    let mut ranked: Vec<Suggestion> = candidates
        .iter()
        .filter(|c| !excluded.contains(&c.id))
        .map(|c| Suggestion {
            id: c.id,
            full_name: c.full_name.clone(),
            username: c.username.clone(),
            mutual_count: c
                .friends
                .0
                .iter()
                .filter(|id| own_friends.contains(id))
                .count(),
        })
        .collect();

    // Descending mutual count; ties fall back to the store's natural order.
    ranked.sort_by(|x, y| y.mutual_count.cmp(&x.mutual_count).then(x.id.cmp(&y.id)));
    ranked.truncate(limit);
    ranked
}

/// Loads the user and all candidate rows, then ranks in memory.
/// An unknown user yields an empty list rather than an error.
pub async fn suggest_friends(
    pool: &PgPool,
    user_id: i64,
    limit: usize,
) -> Result<Vec<Suggestion>, AppError> {
    let Some(user) = fetch_user(pool, user_id).await? else {
        return Ok(Vec::new());
    };

    let candidates = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE id <> $1 ORDER BY id"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rank_suggestions(&user, &candidates, limit))
}
