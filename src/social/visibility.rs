// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use std::collections::HashSet;
use tracing::warn;
use uuid::Uuid;

use crate::db::DbConnection;
use crate::metrics::Metrics;
use crate::models::account::{Account, Visibility};
use crate::models::post::Post;
use crate::schema::follows;

/// Decide whether `viewer_id` may see a post authored by `author`.
///
/// Posts from a deactivated author are hidden from everyone, the author
/// included. `followers_only` is treated identically to `private` for
/// posts; only profile-page copy distinguishes the two modes.
pub fn can_view_post(viewer_id: Uuid, author: &Account, follows_author: bool) -> bool {
    if !author.is_active {
        return false;
    }
    if viewer_id == author.id {
        return true;
    }
    match author.visibility() {
        Visibility::Public => true,
        Visibility::Private | Visibility::FollowersOnly => follows_author,
    }
}

/// Author ids in `rows` whose posts require a follow check for this viewer.
fn authors_needing_follow_check(viewer_id: Uuid, rows: &[(Post, Account)]) -> Vec<Uuid> {
    let mut ids: Vec<Uuid> = rows
        .iter()
        .map(|(_, author)| author)
        .filter(|author| {
            author.is_active
                && author.id != viewer_id
                && author.visibility() != Visibility::Public
        })
        .map(|author| author.id)
        .collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}

/// Apply the per-viewer visibility filter to one page of posts.
///
/// Follow status is resolved with a single batched query per page. If that
/// lookup fails the filter fails closed: the affected posts are hidden and
/// the listing request still succeeds.
pub async fn filter_visible(
    conn: &mut DbConnection,
    metrics: &Metrics,
    viewer_id: Uuid,
    rows: Vec<(Post, Account)>,
) -> Vec<(Post, Account)> {
    let check_ids = authors_needing_follow_check(viewer_id, &rows);

    let followed: HashSet<Uuid> = if check_ids.is_empty() {
        HashSet::new()
    } else {
        let lookup = follows::table
            .filter(follows::follower_id.eq(viewer_id))
            .filter(follows::following_id.eq_any(&check_ids))
            .select(follows::following_id)
            .load::<Uuid>(conn)
            .await;

        match lookup {
            Ok(ids) => ids.into_iter().collect(),
            Err(e) => {
                warn!("Follow lookup failed, hiding restricted posts: {}", e);
                metrics.visibility_lookup_failures.inc();
                HashSet::new()
            }
        }
    };

    let before = rows.len();
    let visible: Vec<(Post, Account)> = rows
        .into_iter()
        .filter(|(_, author)| can_view_post(viewer_id, author, followed.contains(&author.id)))
        .collect();

    metrics.posts_filtered.inc_by((before - visible.len()) as u64);
    visible
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn account(visibility: &str, active: bool) -> Account {
        Account {
            id: Uuid::new_v4(),
            email: "a@example.com".to_string(),
            username: "author".to_string(),
            display_name: None,
            bio: None,
            avatar_url: None,
            website: None,
            location: None,
            role: "user".to_string(),
            profile_visibility: visibility.to_string(),
            is_active: active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn inactive_author_is_hidden_from_everyone() {
        let author = account("public", false);
        let viewer = Uuid::new_v4();
        assert!(!can_view_post(viewer, &author, true));
        // Even the author cannot see their own posts once deactivated.
        assert!(!can_view_post(author.id, &author, false));
    }

    #[test]
    fn author_always_sees_own_active_posts() {
        let author = account("private", true);
        assert!(can_view_post(author.id, &author, false));
    }

    #[test]
    fn public_author_is_visible_to_strangers() {
        let author = account("public", true);
        assert!(can_view_post(Uuid::new_v4(), &author, false));
    }

    #[test]
    fn private_author_requires_follow() {
        let author = account("private", true);
        let viewer = Uuid::new_v4();
        assert!(!can_view_post(viewer, &author, false));
        assert!(can_view_post(viewer, &author, true));
    }

    #[test]
    fn followers_only_matches_private_for_posts() {
        let author = account("followers_only", true);
        let viewer = Uuid::new_v4();
        assert!(!can_view_post(viewer, &author, false));
        assert!(can_view_post(viewer, &author, true));
    }

    #[test]
    fn follow_check_skips_public_self_and_inactive_authors() {
        let viewer = Uuid::new_v4();
        let mut me = account("private", true);
        me.id = viewer;
        let public = account("public", true);
        let private = account("private", true);
        let dormant = account("followers_only", false);

        let post = |author: &Account| Post {
            id: Uuid::new_v4(),
            author_id: author.id,
            content: "hi".to_string(),
            image_url: None,
            category: "general".to_string(),
            is_active: true,
            like_count: 0,
            comment_count: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let rows = vec![
            (post(&me), me.clone()),
            (post(&public), public),
            (post(&private), private.clone()),
            (post(&private), private.clone()),
            (post(&dormant), dormant),
        ];

        let ids = authors_needing_follow_check(viewer, &rows);
        assert_eq!(ids, vec![private.id].into_iter().collect::<Vec<_>>());
    }
}
