// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

use chrono::Utc;
use diesel_async::RunQueryDsl;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::db::DbConnection;
use crate::metrics::Metrics;
use crate::models::notification::{NewNotification, NotificationKind};
use crate::schema::notifications;

/// A notification derived from a primary write.
#[derive(Debug, Clone, Copy)]
pub struct FanoutEvent {
    pub recipient_id: Uuid,
    pub actor_id: Uuid,
    pub kind: NotificationKind,
    pub post_id: Option<Uuid>,
    pub comment_id: Option<Uuid>,
}

impl FanoutEvent {
    pub fn follow(recipient_id: Uuid, actor_id: Uuid) -> Self {
        Self {
            recipient_id,
            actor_id,
            kind: NotificationKind::Follow,
            post_id: None,
            comment_id: None,
        }
    }

    pub fn like(recipient_id: Uuid, actor_id: Uuid, post_id: Uuid) -> Self {
        Self {
            recipient_id,
            actor_id,
            kind: NotificationKind::Like,
            post_id: Some(post_id),
            comment_id: None,
        }
    }

    pub fn comment(recipient_id: Uuid, actor_id: Uuid, post_id: Uuid, comment_id: Uuid) -> Self {
        Self {
            recipient_id,
            actor_id,
            kind: NotificationKind::Comment,
            post_id: Some(post_id),
            comment_id: Some(comment_id),
        }
    }

    /// Self-notifications are never produced.
    pub fn should_emit(&self) -> bool {
        self.recipient_id != self.actor_id
    }
}

/// Emit a notification for an already-committed write.
///
/// Fan-out is a best-effort side effect: a write failure here is logged and
/// counted but never propagated, so the originating action still succeeds.
pub async fn emit(conn: &mut DbConnection, metrics: &Metrics, event: FanoutEvent) {
    let kind = event.kind.as_str();

    if !event.should_emit() {
        debug!("Suppressing self-notification of kind {}", kind);
        metrics.notifications_suppressed.with_label_values(&[kind]).inc();
        return;
    }

    let row = NewNotification {
        id: Uuid::new_v4(),
        recipient_id: event.recipient_id,
        kind: kind.to_string(),
        actor_id: event.actor_id,
        post_id: event.post_id,
        comment_id: event.comment_id,
        is_read: false,
        created_at: Utc::now(),
    };

    match diesel::insert_into(notifications::table)
        .values(&row)
        .execute(conn)
        .await
    {
        Ok(_) => {
            debug!(
                "Notified {} of {} by {}",
                event.recipient_id, kind, event.actor_id
            );
            metrics.notifications_emitted.with_label_values(&[kind]).inc();
        }
        Err(e) => {
            warn!("Failed to write {} notification: {}", kind, e);
            metrics.notifications_failed.inc();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn self_notifications_are_suppressed() {
        let user = Uuid::new_v4();
        let post = Uuid::new_v4();
        assert!(!FanoutEvent::like(user, user, post).should_emit());
        assert!(!FanoutEvent::follow(user, user).should_emit());
    }

    #[test]
    fn foreign_actions_notify() {
        let author = Uuid::new_v4();
        let actor = Uuid::new_v4();
        let post = Uuid::new_v4();
        let comment = Uuid::new_v4();

        let event = FanoutEvent::comment(author, actor, post, comment);
        assert!(event.should_emit());
        assert_eq!(event.kind, NotificationKind::Comment);
        assert_eq!(event.post_id, Some(post));
        assert_eq!(event.comment_id, Some(comment));
    }

    #[test]
    fn follow_events_carry_no_post_reference() {
        let event = FanoutEvent::follow(Uuid::new_v4(), Uuid::new_v4());
        assert_eq!(event.post_id, None);
        assert_eq!(event.comment_id, None);
    }
}
