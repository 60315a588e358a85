// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel_async::RunQueryDsl;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info};
use uuid::Uuid;

use crate::auth::{AdminUser, CurrentUser, Principal};
use crate::db::DbConnection;
use crate::error::{ApiError, ApiResult};
use crate::models::account::{
    validate_email, validate_username, Account, AccountChanges, NewAccount, Visibility,
};
use crate::schema::{accounts, follows, posts};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    pub display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub website: Option<String>,
    pub location: Option<String>,
    pub profile_visibility: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UsersQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Account payload with follow/post statistics attached
#[derive(Debug, Serialize)]
pub struct AccountWithStats {
    #[serde(flatten)]
    pub account: Account,
    pub followers_count: i64,
    pub following_count: i64,
    pub posts_count: i64,
}

pub(crate) async fn load_account_with_stats(
    conn: &mut DbConnection,
    account_id: Uuid,
) -> ApiResult<AccountWithStats> {
    let account = accounts::table
        .find(account_id)
        .first::<Account>(conn)
        .await
        .optional()?
        .ok_or(ApiError::NotFound("User"))?;

    let followers_count = follows::table
        .filter(follows::following_id.eq(account_id))
        .count()
        .get_result::<i64>(conn)
        .await?;

    let following_count = follows::table
        .filter(follows::follower_id.eq(account_id))
        .count()
        .get_result::<i64>(conn)
        .await?;

    let posts_count = posts::table
        .filter(posts::author_id.eq(account_id))
        .filter(posts::is_active.eq(true))
        .count()
        .get_result::<i64>(conn)
        .await?;

    Ok(AccountWithStats {
        account,
        followers_count,
        following_count,
        posts_count,
    })
}

/// Register the account row for the authenticated principal.
///
/// Idempotent get-or-create keyed on the identity-service user id: repeating
/// the call returns the existing row. The role comes from the identity
/// claims at creation; there are no separate admin shadow rows.
pub async fn register_account(
    State(state): State<AppState>,
    Principal(claims): Principal,
    Json(body): Json<RegisterRequest>,
) -> ApiResult<impl IntoResponse> {
    validate_username(&body.username).map_err(ApiError::Validation)?;
    validate_email(&body.email).map_err(ApiError::Validation)?;

    let mut conn = state.db.get_connection().await?;

    let now = Utc::now();
    let row = NewAccount {
        id: claims.user_id,
        email: body.email,
        username: body.username,
        display_name: body.display_name,
        role: claims.role.as_str().to_string(),
        profile_visibility: Visibility::Public.as_str().to_string(),
        is_active: true,
        created_at: now,
        updated_at: now,
    };

    let inserted = diesel::insert_into(accounts::table)
        .values(&row)
        .on_conflict(accounts::id)
        .do_nothing()
        .execute(&mut conn)
        .await;

    match inserted {
        Ok(n) => {
            if n > 0 {
                info!("Registered account {}", claims.user_id);
            } else {
                debug!("Account {} already registered", claims.user_id);
            }
        }
        Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => {
            return Err(ApiError::Conflict(
                "Username or email already taken".to_string(),
            ));
        }
        Err(e) => return Err(e.into()),
    }

    let account = accounts::table
        .find(claims.user_id)
        .first::<Account>(&mut conn)
        .await?;

    Ok((StatusCode::CREATED, Json(account)))
}

/// List accounts (admin only), newest first
pub async fn list_users(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(query): Query<UsersQuery>,
) -> ApiResult<impl IntoResponse> {
    let limit = query.limit.unwrap_or(50).clamp(1, 100);
    let offset = query.offset.unwrap_or(0).max(0);

    let mut conn = state.db.get_connection().await?;

    let users = accounts::table
        .order_by(accounts::created_at.desc())
        .limit(limit)
        .offset(offset)
        .load::<Account>(&mut conn)
        .await?;

    Ok(Json(json!({
        "results": users,
        "count": users.len()
    })))
}

/// Get an account profile with follower/following/post counts
pub async fn get_user(
    State(state): State<AppState>,
    _viewer: CurrentUser,
    Path(user_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let mut conn = state.db.get_connection().await?;

    // The profile itself is viewable regardless of visibility mode; posts
    // are filtered separately.
    let profile = load_account_with_stats(&mut conn, user_id).await?;

    Ok(Json(profile))
}

/// Update profile fields and visibility mode (self or admin)
pub async fn update_user(
    State(state): State<AppState>,
    viewer: CurrentUser,
    Path(user_id): Path<Uuid>,
    Json(body): Json<UpdateUserRequest>,
) -> ApiResult<impl IntoResponse> {
    if viewer.id != user_id && !viewer.is_admin() {
        return Err(ApiError::Forbidden(
            "Cannot update another user's profile".to_string(),
        ));
    }

    if let Some(ref visibility) = body.profile_visibility {
        if Visibility::parse(visibility).is_none() {
            return Err(ApiError::Validation(format!(
                "Unknown visibility mode: {}",
                visibility
            )));
        }
    }

    let mut conn = state.db.get_connection().await?;

    let changes = AccountChanges {
        display_name: body.display_name,
        bio: body.bio,
        avatar_url: body.avatar_url,
        website: body.website,
        location: body.location,
        profile_visibility: body.profile_visibility,
        updated_at: Some(Utc::now()),
    };

    let account = diesel::update(accounts::table.find(user_id))
        .set(&changes)
        .get_result::<Account>(&mut conn)
        .await
        .optional()?
        .ok_or(ApiError::NotFound("User"))?;

    Ok(Json(account))
}
