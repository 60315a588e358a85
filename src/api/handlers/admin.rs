// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::auth::AdminUser;
use crate::error::{ApiError, ApiResult};
use crate::models::account::{Account, Role};
use crate::schema::{accounts, posts};
use crate::social::counters;
use crate::state::AppState;

use super::posts::load_post;
use super::users::load_account_with_stats;

/// Admin view of any account, including follow and post statistics
pub async fn admin_get_user(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(user_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let mut conn = state.db.get_connection().await?;
    let account = load_account_with_stats(&mut conn, user_id).await?;
    Ok(Json(account))
}

/// Promote an account to admin. One-directional; there is no demotion.
pub async fn promote_user(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(user_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let mut conn = state.db.get_connection().await?;

    let account = accounts::table
        .find(user_id)
        .first::<Account>(&mut conn)
        .await
        .optional()?
        .ok_or(ApiError::NotFound("User"))?;

    if account.is_admin() {
        return Err(ApiError::Conflict("User is already an admin".to_string()));
    }

    let account = diesel::update(accounts::table.find(user_id))
        .set((
            accounts::role.eq(Role::Admin.as_str()),
            accounts::updated_at.eq(Utc::now()),
        ))
        .get_result::<Account>(&mut conn)
        .await?;

    info!("Promoted {} to admin", user_id);

    Ok(Json(account))
}

/// Deactivate an account. The account's posts disappear from every listing
/// while the rows stay in place.
pub async fn deactivate_user(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(user_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    if admin.id == user_id {
        return Err(ApiError::Conflict(
            "Cannot deactivate your own account".to_string(),
        ));
    }

    let mut conn = state.db.get_connection().await?;

    let updated = diesel::update(accounts::table.find(user_id))
        .set((
            accounts::is_active.eq(false),
            accounts::updated_at.eq(Utc::now()),
        ))
        .get_result::<Account>(&mut conn)
        .await
        .optional()?
        .ok_or(ApiError::NotFound("User"))?;

    info!("Deactivated account {}", user_id);

    Ok(Json(updated))
}

/// Reactivate a previously deactivated account
pub async fn reactivate_user(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(user_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let mut conn = state.db.get_connection().await?;

    let updated = diesel::update(accounts::table.find(user_id))
        .set((
            accounts::is_active.eq(true),
            accounts::updated_at.eq(Utc::now()),
        ))
        .get_result::<Account>(&mut conn)
        .await
        .optional()?
        .ok_or(ApiError::NotFound("User"))?;

    info!("Reactivated account {}", user_id);

    Ok(Json(updated))
}

/// Remove any post, regardless of author
pub async fn admin_delete_post(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(post_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let mut conn = state.db.get_connection().await?;

    let post = load_post(&mut conn, post_id).await?;

    diesel::delete(posts::table.find(post.id))
        .execute(&mut conn)
        .await?;

    info!("Admin removed post {} by {}", post.id, post.author_id);

    Ok(Json(json!({
        "message": "Post deleted successfully"
    })))
}

/// Recompute a post's like/comment counters from the underlying rows
pub async fn reconcile_post(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(post_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let mut conn = state.db.get_connection().await?;

    load_post(&mut conn, post_id).await?;
    let post = counters::reconcile_post_counters(&mut conn, post_id).await?;

    info!(
        "Reconciled counters for post {}: likes={} comments={}",
        post.id, post.like_count, post.comment_count
    );

    Ok(Json(post))
}
