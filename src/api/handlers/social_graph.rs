// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde_json::json;
use tracing::debug;
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::error::ApiResult;
use crate::models::social_graph::FollowsQuery;
use crate::social::ledger;
use crate::state::AppState;

/// Follow a user. Self-follows and duplicate follows are conflicts; a
/// `follow` notification fans out to the target.
pub async fn follow_user(
    State(state): State<AppState>,
    viewer: CurrentUser,
    Path(user_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let mut conn = state.db.get_connection().await?;

    let follow = ledger::follow(&mut conn, &state.metrics, viewer.id, user_id).await?;

    Ok(Json(json!({
        "message": "Successfully followed user",
        "follow": follow
    })))
}

/// Unfollow a user. Idempotent: double-unfollow succeeds.
pub async fn unfollow_user(
    State(state): State<AppState>,
    viewer: CurrentUser,
    Path(user_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let mut conn = state.db.get_connection().await?;

    ledger::unfollow(&mut conn, viewer.id, user_id).await?;

    Ok(Json(json!({
        "message": "Successfully unfollowed user"
    })))
}

/// Check whether the viewer follows a user
pub async fn follow_status(
    State(state): State<AppState>,
    viewer: CurrentUser,
    Path(user_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let mut conn = state.db.get_connection().await?;

    let is_following = ledger::is_following(&mut conn, viewer.id, user_id).await?;

    debug!(
        "Follow status {} -> {}: {}",
        viewer.id, user_id, is_following
    );

    Ok(Json(json!({
        "is_following": is_following
    })))
}

/// Get a list of accounts that follow a user
pub async fn get_followers(
    State(state): State<AppState>,
    _viewer: CurrentUser,
    Path(user_id): Path<Uuid>,
    Query(query): Query<FollowsQuery>,
) -> ApiResult<impl IntoResponse> {
    let limit = query.limit.unwrap_or(50).clamp(1, 100);
    let offset = query.offset.unwrap_or(0).max(0);

    let mut conn = state.db.get_connection().await?;

    let followers = ledger::list_followers(&mut conn, user_id, limit, offset).await?;

    Ok(Json(json!({
        "results": followers,
        "count": followers.len()
    })))
}

/// Get a list of accounts that a user is following
pub async fn get_following(
    State(state): State<AppState>,
    _viewer: CurrentUser,
    Path(user_id): Path<Uuid>,
    Query(query): Query<FollowsQuery>,
) -> ApiResult<impl IntoResponse> {
    let limit = query.limit.unwrap_or(50).clamp(1, 100);
    let offset = query.offset.unwrap_or(0).max(0);

    let mut conn = state.db.get_connection().await?;

    let following = ledger::list_following(&mut conn, user_id, limit, offset).await?;

    Ok(Json(json!({
        "results": following,
        "count": following.len()
    })))
}
