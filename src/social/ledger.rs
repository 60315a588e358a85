// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel_async::RunQueryDsl;
use tracing::debug;
use uuid::Uuid;

use crate::db::DbConnection;
use crate::error::{ApiError, ApiResult};
use crate::metrics::Metrics;
use crate::models::account::AccountSummary;
use crate::models::social_graph::{Follow, FollowDetail, NewFollow};
use crate::schema::{accounts, follows};
use crate::social::fanout::{self, FanoutEvent};

/// Create a follow edge from `follower_id` to `target_id` and fan out a
/// `follow` notification to the target.
///
/// The (follower, following) unique constraint guards the insert; a
/// constraint violation means the edge already exists.
pub async fn follow(
    conn: &mut DbConnection,
    metrics: &Metrics,
    follower_id: Uuid,
    target_id: Uuid,
) -> ApiResult<Follow> {
    if follower_id == target_id {
        return Err(ApiError::Conflict("Cannot follow yourself".to_string()));
    }

    let target_exists = accounts::table
        .filter(accounts::id.eq(target_id))
        .count()
        .get_result::<i64>(conn)
        .await?
        > 0;
    if !target_exists {
        return Err(ApiError::NotFound("User"));
    }

    let new_edge = NewFollow {
        id: Uuid::new_v4(),
        follower_id,
        following_id: target_id,
        created_at: Utc::now(),
    };

    let edge = match diesel::insert_into(follows::table)
        .values(&new_edge)
        .get_result::<Follow>(conn)
        .await
    {
        Ok(edge) => edge,
        Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => {
            return Err(ApiError::Conflict(
                "Already following this user".to_string(),
            ));
        }
        Err(e) => return Err(e.into()),
    };

    debug!("Created follow edge {} -> {}", follower_id, target_id);

    fanout::emit(conn, metrics, FanoutEvent::follow(target_id, follower_id)).await;

    Ok(edge)
}

/// Remove a follow edge. Idempotent: removing a missing edge succeeds.
pub async fn unfollow(
    conn: &mut DbConnection,
    follower_id: Uuid,
    target_id: Uuid,
) -> ApiResult<()> {
    let deleted = diesel::delete(
        follows::table
            .filter(follows::follower_id.eq(follower_id))
            .filter(follows::following_id.eq(target_id)),
    )
    .execute(conn)
    .await?;

    debug!(
        "Unfollow {} -> {}: {} edge(s) removed",
        follower_id, target_id, deleted
    );

    Ok(())
}

/// Check whether a follow edge exists.
pub async fn is_following(
    conn: &mut DbConnection,
    follower_id: Uuid,
    target_id: Uuid,
) -> ApiResult<bool> {
    let count = follows::table
        .filter(follows::follower_id.eq(follower_id))
        .filter(follows::following_id.eq(target_id))
        .count()
        .get_result::<i64>(conn)
        .await?;

    Ok(count > 0)
}

/// List accounts following `account_id`, newest edge first.
pub async fn list_followers(
    conn: &mut DbConnection,
    account_id: Uuid,
    limit: i64,
    offset: i64,
) -> ApiResult<Vec<FollowDetail>> {
    let rows = follows::table
        .filter(follows::following_id.eq(account_id))
        .inner_join(accounts::table.on(accounts::id.eq(follows::follower_id)))
        .select((AccountSummary::as_select(), follows::created_at))
        .order_by(follows::created_at.desc())
        .limit(limit)
        .offset(offset)
        .load::<(AccountSummary, DateTime<Utc>)>(conn)
        .await?;

    Ok(rows.into_iter().map(into_detail).collect())
}

/// List accounts that `account_id` follows, newest edge first.
pub async fn list_following(
    conn: &mut DbConnection,
    account_id: Uuid,
    limit: i64,
    offset: i64,
) -> ApiResult<Vec<FollowDetail>> {
    let rows = follows::table
        .filter(follows::follower_id.eq(account_id))
        .inner_join(accounts::table.on(accounts::id.eq(follows::following_id)))
        .select((AccountSummary::as_select(), follows::created_at))
        .order_by(follows::created_at.desc())
        .limit(limit)
        .offset(offset)
        .load::<(AccountSummary, DateTime<Utc>)>(conn)
        .await?;

    Ok(rows.into_iter().map(into_detail).collect())
}

fn into_detail((account, followed_at): (AccountSummary, DateTime<Utc>)) -> FollowDetail {
    FollowDetail {
        id: account.id,
        username: account.username,
        display_name: account.display_name,
        avatar_url: account.avatar_url,
        followed_at,
    }
}

/// Ids of every account `follower_id` follows; used by the following-only
/// feed listing.
pub async fn following_ids(conn: &mut DbConnection, follower_id: Uuid) -> ApiResult<Vec<Uuid>> {
    let ids = follows::table
        .filter(follows::follower_id.eq(follower_id))
        .select(follows::following_id)
        .load::<Uuid>(conn)
        .await?;

    Ok(ids)
}
