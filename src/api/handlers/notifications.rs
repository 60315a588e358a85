// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use serde_json::json;
use tracing::debug;
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::error::ApiResult;
use crate::models::account::AccountSummary;
use crate::models::notification::{Notification, NotificationView, NotificationsQuery};
use crate::schema::{accounts, notifications};
use crate::state::AppState;

/// List the viewer's notifications, newest first, with the unread total
pub async fn list_notifications(
    State(state): State<AppState>,
    viewer: CurrentUser,
    Query(query): Query<NotificationsQuery>,
) -> ApiResult<impl IntoResponse> {
    let limit = query.limit.unwrap_or(20).clamp(1, 100);
    let offset = query.offset.unwrap_or(0).max(0);

    let mut conn = state.db.get_connection().await?;

    let mut listing = notifications::table
        .inner_join(accounts::table.on(accounts::id.eq(notifications::actor_id)))
        .filter(notifications::recipient_id.eq(viewer.id))
        .select((Notification::as_select(), AccountSummary::as_select()))
        .into_boxed();

    if query.unread_only.unwrap_or(false) {
        listing = listing.filter(notifications::is_read.eq(false));
    }

    let rows = listing
        .order_by(notifications::created_at.desc())
        .limit(limit)
        .offset(offset)
        .load::<(Notification, AccountSummary)>(&mut conn)
        .await?;

    let unread_count: i64 = notifications::table
        .filter(notifications::recipient_id.eq(viewer.id))
        .filter(notifications::is_read.eq(false))
        .count()
        .get_result(&mut conn)
        .await?;

    let results: Vec<NotificationView> = rows
        .into_iter()
        .map(|(notification, actor)| NotificationView {
            notification,
            actor,
        })
        .collect();

    Ok(Json(json!({
        "notifications": results,
        "unread_count": unread_count,
        "count": results.len()
    })))
}

/// Mark every unread notification of the viewer as read
pub async fn mark_all_read(
    State(state): State<AppState>,
    viewer: CurrentUser,
) -> ApiResult<impl IntoResponse> {
    let mut conn = state.db.get_connection().await?;

    let updated = diesel::update(
        notifications::table
            .filter(notifications::recipient_id.eq(viewer.id))
            .filter(notifications::is_read.eq(false)),
    )
    .set(notifications::is_read.eq(true))
    .execute(&mut conn)
    .await?;

    debug!("Marked {} notifications read for {}", updated, viewer.id);

    Ok(Json(json!({
        "message": "Notifications marked as read",
        "updated": updated
    })))
}

/// Mark a single notification as read.
///
/// The update is scoped to the viewer's own rows, so a foreign or unknown id
/// changes nothing. Re-marking an already-read notification succeeds.
pub async fn mark_read(
    State(state): State<AppState>,
    viewer: CurrentUser,
    Path(notification_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let mut conn = state.db.get_connection().await?;

    let updated = diesel::update(
        notifications::table
            .find(notification_id)
            .filter(notifications::recipient_id.eq(viewer.id)),
    )
    .set(notifications::is_read.eq(true))
    .execute(&mut conn)
    .await?;

    Ok(Json(json!({
        "message": "Notification marked as read",
        "updated": updated
    })))
}
