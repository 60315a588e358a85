// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

use chrono::Utc;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use serde::Serialize;
use std::collections::HashSet;
use tracing::debug;
use uuid::Uuid;

use crate::db::DbConnection;
use crate::error::{ApiError, ApiResult};
use crate::metrics::Metrics;
use crate::models::engagement::{
    validate_comment_content, Comment, NewComment, NewLike,
};
use crate::models::post::Post;
use crate::schema::{comments, likes, posts};
use crate::social::fanout::{self, FanoutEvent};

/// Result of a like toggle.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct LikeOutcome {
    pub liked: bool,
    pub like_count: i32,
}

/// Flip the viewer's like state on a post.
///
/// The insert is guarded by the (post_id, user_id) unique constraint: zero
/// rows inserted means the like already existed, which selects the unlike
/// path. The counter moves by an atomic single-row update inside the same
/// transaction as the row change, so both happen or neither does. The
/// `like` notification fires only on the like transition, after commit.
pub async fn toggle_like(
    conn: &mut DbConnection,
    metrics: &Metrics,
    viewer_id: Uuid,
    post: &Post,
) -> ApiResult<LikeOutcome> {
    let post_id = post.id;

    let outcome = conn
        .transaction::<LikeOutcome, ApiError, _>(|conn| {
            async move {
                let inserted = diesel::insert_into(likes::table)
                    .values(&NewLike {
                        id: Uuid::new_v4(),
                        post_id,
                        user_id: viewer_id,
                        created_at: Utc::now(),
                    })
                    .on_conflict((likes::post_id, likes::user_id))
                    .do_nothing()
                    .execute(conn)
                    .await?;

                if inserted > 0 {
                    let like_count = diesel::update(posts::table.find(post_id))
                        .set(posts::like_count.eq(posts::like_count + 1))
                        .returning(posts::like_count)
                        .get_result::<i32>(conn)
                        .await?;
                    return Ok(LikeOutcome {
                        liked: true,
                        like_count,
                    });
                }

                let removed = diesel::delete(
                    likes::table
                        .filter(likes::post_id.eq(post_id))
                        .filter(likes::user_id.eq(viewer_id)),
                )
                .execute(conn)
                .await?;

                let like_count = if removed > 0 {
                    diesel::update(posts::table.find(post_id))
                        .set(posts::like_count.eq(posts::like_count - 1))
                        .returning(posts::like_count)
                        .get_result::<i32>(conn)
                        .await?
                } else {
                    // A concurrent unlike already removed the row; report
                    // the current counter without touching it.
                    posts::table
                        .find(post_id)
                        .select(posts::like_count)
                        .get_result::<i32>(conn)
                        .await?
                };

                Ok(LikeOutcome {
                    liked: false,
                    like_count,
                })
            }
            .scope_boxed()
        })
        .await?;

    if outcome.liked {
        fanout::emit(
            conn,
            metrics,
            FanoutEvent::like(post.author_id, viewer_id, post_id),
        )
        .await;
    }

    debug!(
        "Like toggle on {} by {}: liked={} count={}",
        post_id, viewer_id, outcome.liked, outcome.like_count
    );

    Ok(outcome)
}

/// Explicit unlike. Idempotent: removing a like that does not exist leaves
/// the counter untouched and succeeds.
pub async fn unlike(
    conn: &mut DbConnection,
    viewer_id: Uuid,
    post_id: Uuid,
) -> ApiResult<LikeOutcome> {
    conn.transaction::<LikeOutcome, ApiError, _>(|conn| {
        async move {
            let removed = diesel::delete(
                likes::table
                    .filter(likes::post_id.eq(post_id))
                    .filter(likes::user_id.eq(viewer_id)),
            )
            .execute(conn)
            .await?;

            let like_count = if removed > 0 {
                diesel::update(posts::table.find(post_id))
                    .set(posts::like_count.eq(posts::like_count - 1))
                    .returning(posts::like_count)
                    .get_result::<i32>(conn)
                    .await?
            } else {
                posts::table
                    .find(post_id)
                    .select(posts::like_count)
                    .get_result::<i32>(conn)
                    .await?
            };

            Ok(LikeOutcome {
                liked: false,
                like_count,
            })
        }
        .scope_boxed()
    })
    .await
}

/// Create a comment, bump the post's comment counter in the same
/// transaction, and fan out a `comment` notification to the post author.
pub async fn add_comment(
    conn: &mut DbConnection,
    metrics: &Metrics,
    author_id: Uuid,
    post: &Post,
    content: &str,
) -> ApiResult<Comment> {
    validate_comment_content(content).map_err(ApiError::Validation)?;

    let post_id = post.id;
    let now = Utc::now();
    let row = NewComment {
        id: Uuid::new_v4(),
        post_id,
        author_id,
        content: content.to_string(),
        created_at: now,
        updated_at: now,
    };

    let comment = conn
        .transaction::<Comment, ApiError, _>(|conn| {
            async move {
                let comment = diesel::insert_into(comments::table)
                    .values(&row)
                    .get_result::<Comment>(conn)
                    .await?;

                diesel::update(posts::table.find(post_id))
                    .set(posts::comment_count.eq(posts::comment_count + 1))
                    .execute(conn)
                    .await?;

                Ok(comment)
            }
            .scope_boxed()
        })
        .await?;

    fanout::emit(
        conn,
        metrics,
        FanoutEvent::comment(post.author_id, author_id, post_id, comment.id),
    )
    .await;

    Ok(comment)
}

/// Edit a comment's content. Authorization is checked by the caller; edits
/// never re-trigger notifications.
pub async fn edit_comment(
    conn: &mut DbConnection,
    comment_id: Uuid,
    content: &str,
) -> ApiResult<Comment> {
    validate_comment_content(content).map_err(ApiError::Validation)?;

    let comment = diesel::update(comments::table.find(comment_id))
        .set((
            comments::content.eq(content),
            comments::updated_at.eq(Utc::now()),
        ))
        .get_result::<Comment>(conn)
        .await?;

    Ok(comment)
}

/// Delete a comment and decrement the parent post's counter in the same
/// transaction. Does not resurrect or remove notifications.
pub async fn delete_comment(conn: &mut DbConnection, comment: &Comment) -> ApiResult<()> {
    let comment_id = comment.id;
    let post_id = comment.post_id;

    conn.transaction::<(), ApiError, _>(|conn| {
        async move {
            let removed = diesel::delete(comments::table.find(comment_id))
                .execute(conn)
                .await?;

            if removed > 0 {
                diesel::update(posts::table.find(post_id))
                    .set(posts::comment_count.eq(posts::comment_count - 1))
                    .execute(conn)
                    .await?;
            }

            Ok(())
        }
        .scope_boxed()
    })
    .await
}

/// The subset of `post_ids` the viewer has liked; one batched query per page.
pub async fn liked_post_ids(
    conn: &mut DbConnection,
    viewer_id: Uuid,
    post_ids: &[Uuid],
) -> ApiResult<HashSet<Uuid>> {
    if post_ids.is_empty() {
        return Ok(HashSet::new());
    }

    let ids = likes::table
        .filter(likes::user_id.eq(viewer_id))
        .filter(likes::post_id.eq_any(post_ids))
        .select(likes::post_id)
        .load::<Uuid>(conn)
        .await?;

    Ok(ids.into_iter().collect())
}

/// Recompute both denormalized counters for a post from the underlying
/// like/comment sets. This is the drift repair path; the read path never
/// counts rows.
pub async fn reconcile_post_counters(conn: &mut DbConnection, post_id: Uuid) -> ApiResult<Post> {
    diesel::sql_query(
        "UPDATE posts
         SET like_count = (
             SELECT COUNT(*) FROM likes WHERE post_id = $1
         ),
         comment_count = (
             SELECT COUNT(*) FROM comments WHERE post_id = $1
         )
         WHERE id = $1",
    )
    .bind::<diesel::sql_types::Uuid, _>(post_id)
    .execute(conn)
    .await?;

    let post = posts::table
        .find(post_id)
        .first::<Post>(conn)
        .await?;

    Ok(post)
}
