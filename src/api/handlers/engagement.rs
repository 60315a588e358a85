// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::db::DbConnection;
use crate::error::{ApiError, ApiResult};
use crate::models::account::AccountSummary;
use crate::models::engagement::{Comment, CommentView, CommentsQuery};
use crate::schema::{accounts, comments};
use crate::social::counters;
use crate::state::AppState;

use super::posts::load_post;

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    pub content: String,
}

async fn load_comment(
    conn: &mut DbConnection,
    post_id: Uuid,
    comment_id: Uuid,
) -> ApiResult<Comment> {
    comments::table
        .find(comment_id)
        .filter(comments::post_id.eq(post_id))
        .first::<Comment>(conn)
        .await
        .optional()?
        .ok_or(ApiError::NotFound("Comment"))
}

/// Toggle the viewer's like on a post
pub async fn toggle_like(
    State(state): State<AppState>,
    viewer: CurrentUser,
    Path(post_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let mut conn = state.db.get_connection().await?;

    let post = load_post(&mut conn, post_id).await?;
    let outcome = counters::toggle_like(&mut conn, &state.metrics, viewer.id, &post).await?;

    Ok(Json(json!({
        "liked": outcome.liked,
        "like_count": outcome.like_count
    })))
}

/// Remove the viewer's like. Succeeds whether or not a like existed.
pub async fn unlike_post(
    State(state): State<AppState>,
    viewer: CurrentUser,
    Path(post_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let mut conn = state.db.get_connection().await?;

    load_post(&mut conn, post_id).await?;
    let outcome = counters::unlike(&mut conn, viewer.id, post_id).await?;

    Ok(Json(json!({
        "liked": outcome.liked,
        "like_count": outcome.like_count
    })))
}

/// List a post's comments, oldest first
pub async fn list_comments(
    State(state): State<AppState>,
    _viewer: CurrentUser,
    Path(post_id): Path<Uuid>,
    Query(query): Query<CommentsQuery>,
) -> ApiResult<impl IntoResponse> {
    let limit = query.limit.unwrap_or(50).clamp(1, 200);
    let offset = query.offset.unwrap_or(0).max(0);

    let mut conn = state.db.get_connection().await?;

    load_post(&mut conn, post_id).await?;

    let rows = comments::table
        .filter(comments::post_id.eq(post_id))
        .inner_join(accounts::table)
        .order_by(comments::created_at.asc())
        .limit(limit)
        .offset(offset)
        .select((Comment::as_select(), AccountSummary::as_select()))
        .load::<(Comment, AccountSummary)>(&mut conn)
        .await?;

    let results: Vec<CommentView> = rows
        .into_iter()
        .map(|(comment, author)| CommentView { comment, author })
        .collect();

    Ok(Json(json!({
        "results": results,
        "count": results.len()
    })))
}

/// Comment on a post
pub async fn create_comment(
    State(state): State<AppState>,
    viewer: CurrentUser,
    Path(post_id): Path<Uuid>,
    Json(body): Json<CommentRequest>,
) -> ApiResult<impl IntoResponse> {
    let mut conn = state.db.get_connection().await?;

    let post = load_post(&mut conn, post_id).await?;
    let comment =
        counters::add_comment(&mut conn, &state.metrics, viewer.id, &post, &body.content).await?;

    let author = AccountSummary {
        id: viewer.id,
        username: viewer.username.clone(),
        display_name: viewer.display_name.clone(),
        avatar_url: viewer.avatar_url.clone(),
        is_active: viewer.is_active,
    };

    Ok((StatusCode::CREATED, Json(CommentView { comment, author })))
}

/// Edit a comment (author or admin)
pub async fn update_comment(
    State(state): State<AppState>,
    viewer: CurrentUser,
    Path((post_id, comment_id)): Path<(Uuid, Uuid)>,
    Json(body): Json<CommentRequest>,
) -> ApiResult<impl IntoResponse> {
    let mut conn = state.db.get_connection().await?;

    let comment = load_comment(&mut conn, post_id, comment_id).await?;
    if comment.author_id != viewer.id && !viewer.is_admin() {
        return Err(ApiError::Forbidden("Forbidden".to_string()));
    }

    let comment = counters::edit_comment(&mut conn, comment_id, &body.content).await?;

    let author = accounts::table
        .find(comment.author_id)
        .select(AccountSummary::as_select())
        .first::<AccountSummary>(&mut conn)
        .await?;

    Ok(Json(CommentView { comment, author }))
}

/// Delete a comment (author or admin); the post's counter moves with it
pub async fn delete_comment(
    State(state): State<AppState>,
    viewer: CurrentUser,
    Path((post_id, comment_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<impl IntoResponse> {
    let mut conn = state.db.get_connection().await?;

    let comment = load_comment(&mut conn, post_id, comment_id).await?;
    if comment.author_id != viewer.id && !viewer.is_admin() {
        return Err(ApiError::Forbidden("Forbidden".to_string()));
    }

    counters::delete_comment(&mut conn, &comment).await?;

    Ok(Json(json!({
        "message": "Comment deleted successfully"
    })))
}
