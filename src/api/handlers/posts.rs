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
use diesel_async::RunQueryDsl;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::db::DbConnection;
use crate::error::{ApiError, ApiResult};
use crate::models::account::{Account, AccountSummary};
use crate::models::post::{
    validate_category, validate_post_content, NewPost, Post, PostChanges, PostView, PostsQuery,
};
use crate::schema::{accounts, posts};
use crate::social::{counters, ledger, visibility};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreatePostRequest {
    pub content: String,
    pub image_url: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePostRequest {
    pub content: Option<String>,
    /// Absent = keep the current image, `null` = clear it, string = replace.
    #[serde(default, deserialize_with = "double_option")]
    pub image_url: Option<Option<String>>,
    pub category: Option<String>,
}

/// Plain nested `Option`s collapse `null` and a missing field into one
/// case; this keeps them apart for clear-vs-keep update semantics.
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: serde::Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    serde::Deserialize::deserialize(deserializer).map(Some)
}

pub(crate) async fn load_post(conn: &mut DbConnection, post_id: Uuid) -> ApiResult<Post> {
    posts::table
        .find(post_id)
        .first::<Post>(conn)
        .await
        .optional()?
        .ok_or(ApiError::NotFound("Post"))
}

fn summary_of(account: &Account) -> AccountSummary {
    AccountSummary {
        id: account.id,
        username: account.username.clone(),
        display_name: account.display_name.clone(),
        avatar_url: account.avatar_url.clone(),
        is_active: account.is_active,
    }
}

/// List posts with the per-viewer visibility filter applied.
///
/// Supports the global listing, a single author's collection (`author_id`)
/// and the following-only feed (`feed=true`). Each post carries the
/// viewer's like state.
pub async fn list_posts(
    State(state): State<AppState>,
    viewer: CurrentUser,
    Query(query): Query<PostsQuery>,
) -> ApiResult<impl IntoResponse> {
    let limit = query.limit.unwrap_or(20).clamp(1, 100);
    let offset = query.offset.unwrap_or(0).max(0);

    let mut conn = state.db.get_connection().await?;

    let mut listing = posts::table
        .inner_join(accounts::table)
        .filter(posts::is_active.eq(true))
        .select((Post::as_select(), Account::as_select()))
        .into_boxed();

    if query.feed.unwrap_or(false) {
        let following = ledger::following_ids(&mut conn, viewer.id).await?;
        if following.is_empty() {
            return Ok(Json(json!({ "results": [], "count": 0 })));
        }
        listing = listing.filter(posts::author_id.eq_any(following));
    }

    if let Some(author_id) = query.author_id {
        listing = listing.filter(posts::author_id.eq(author_id));
    }

    let rows = listing
        .order_by(posts::created_at.desc())
        .limit(limit)
        .offset(offset)
        .load::<(Post, Account)>(&mut conn)
        .await?;

    let visible = visibility::filter_visible(&mut conn, &state.metrics, viewer.id, rows).await;

    let post_ids: Vec<Uuid> = visible.iter().map(|(post, _)| post.id).collect();
    let liked = counters::liked_post_ids(&mut conn, viewer.id, &post_ids).await?;

    let results: Vec<PostView> = visible
        .into_iter()
        .map(|(post, author)| PostView {
            is_liked: liked.contains(&post.id),
            author: summary_of(&author),
            post,
        })
        .collect();

    Ok(Json(json!({
        "results": results,
        "count": results.len()
    })))
}

/// Create a post authored by the viewer
pub async fn create_post(
    State(state): State<AppState>,
    viewer: CurrentUser,
    Json(body): Json<CreatePostRequest>,
) -> ApiResult<impl IntoResponse> {
    validate_post_content(&body.content).map_err(ApiError::Validation)?;

    let category = body.category.unwrap_or_else(|| "general".to_string());
    validate_category(&category).map_err(ApiError::Validation)?;

    if let Some(ref url) = body.image_url {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ApiError::Validation("image_url must be a URL".to_string()));
        }
    }

    let mut conn = state.db.get_connection().await?;

    let now = Utc::now();
    let row = NewPost {
        id: Uuid::new_v4(),
        author_id: viewer.id,
        content: body.content,
        image_url: body.image_url,
        category,
        is_active: true,
        like_count: 0,
        comment_count: 0,
        created_at: now,
        updated_at: now,
    };

    let post = diesel::insert_into(posts::table)
        .values(&row)
        .get_result::<Post>(&mut conn)
        .await?;

    debug!("Created post {} by {}", post.id, viewer.id);

    let view = PostView {
        author: summary_of(&viewer),
        is_liked: false,
        post,
    };

    Ok((StatusCode::CREATED, Json(view)))
}

/// Get a single post with its author and the viewer's like state
pub async fn get_post(
    State(state): State<AppState>,
    viewer: CurrentUser,
    Path(post_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let mut conn = state.db.get_connection().await?;

    let (post, author) = posts::table
        .find(post_id)
        .inner_join(accounts::table)
        .select((Post::as_select(), Account::as_select()))
        .first::<(Post, Account)>(&mut conn)
        .await
        .optional()?
        .ok_or(ApiError::NotFound("Post"))?;

    let liked = counters::liked_post_ids(&mut conn, viewer.id, &[post.id]).await?;

    Ok(Json(PostView {
        is_liked: liked.contains(&post.id),
        author: summary_of(&author),
        post,
    }))
}

/// Edit a post (author or admin)
pub async fn update_post(
    State(state): State<AppState>,
    viewer: CurrentUser,
    Path(post_id): Path<Uuid>,
    Json(body): Json<UpdatePostRequest>,
) -> ApiResult<impl IntoResponse> {
    if let Some(ref content) = body.content {
        validate_post_content(content).map_err(ApiError::Validation)?;
    }
    if let Some(ref category) = body.category {
        validate_category(category).map_err(ApiError::Validation)?;
    }

    let mut conn = state.db.get_connection().await?;

    let post = load_post(&mut conn, post_id).await?;
    if post.author_id != viewer.id && !viewer.is_admin() {
        return Err(ApiError::Forbidden("Forbidden".to_string()));
    }

    if let Some(Some(ref url)) = body.image_url {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ApiError::Validation("image_url must be a URL".to_string()));
        }
    }

    let changes = PostChanges {
        content: body.content,
        image_url: body.image_url,
        category: body.category,
        updated_at: Some(Utc::now()),
    };

    let post = diesel::update(posts::table.find(post_id))
        .set(&changes)
        .get_result::<Post>(&mut conn)
        .await?;

    let author = accounts::table
        .find(post.author_id)
        .select(AccountSummary::as_select())
        .first::<AccountSummary>(&mut conn)
        .await?;

    let liked = counters::liked_post_ids(&mut conn, viewer.id, &[post.id]).await?;

    Ok(Json(PostView {
        is_liked: liked.contains(&post.id),
        author,
        post,
    }))
}

/// Delete a post (author or admin)
pub async fn delete_post(
    State(state): State<AppState>,
    viewer: CurrentUser,
    Path(post_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let mut conn = state.db.get_connection().await?;

    let post = load_post(&mut conn, post_id).await?;
    if post.author_id != viewer.id && !viewer.is_admin() {
        return Err(ApiError::Forbidden("Forbidden".to_string()));
    }

    diesel::delete(posts::table.find(post_id))
        .execute(&mut conn)
        .await?;

    debug!("Deleted post {} by {}", post_id, viewer.id);

    Ok(Json(json!({
        "message": "Post deleted successfully"
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_request_distinguishes_absent_null_and_value() {
        let body: UpdatePostRequest = serde_json::from_str(r#"{"content": "hi"}"#).unwrap();
        assert_eq!(body.image_url, None);

        let body: UpdatePostRequest = serde_json::from_str(r#"{"image_url": null}"#).unwrap();
        assert_eq!(body.image_url, Some(None));

        let body: UpdatePostRequest =
            serde_json::from_str(r#"{"image_url": "https://cdn.example/a.png"}"#).unwrap();
        assert_eq!(
            body.image_url,
            Some(Some("https://cdn.example/a.png".to_string()))
        );
    }
}
