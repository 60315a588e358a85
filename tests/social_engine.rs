// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

//! Integration tests for the ledger and counter transactions against a
//! live Postgres database. Set TEST_DATABASE_URL to run them; without it
//! each test is a no-op pass.

use chrono::Utc;
use diesel::prelude::*;
use diesel::{Connection, PgConnection};
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use diesel_migrations::MigrationHarness;
use std::sync::Once;
use uuid::Uuid;

use mys_social_api::db::{DbConnection, DbPool, MIGRATIONS};
use mys_social_api::error::ApiError;
use mys_social_api::metrics::Metrics;
use mys_social_api::models::account::{Account, NewAccount, Visibility};
use mys_social_api::models::post::{NewPost, Post};
use mys_social_api::schema::{accounts, notifications, posts};
use mys_social_api::social::{counters, ledger};

static MIGRATE: Once = Once::new();

fn database_url() -> Option<String> {
    std::env::var("TEST_DATABASE_URL").ok()
}

fn run_migrations(url: &str) {
    MIGRATE.call_once(|| {
        let mut conn = PgConnection::establish(url).expect("connect for migrations");
        conn.run_pending_migrations(MIGRATIONS)
            .expect("run migrations");
    });
}

async fn test_pool(url: &str) -> DbPool {
    let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(url);
    DbPool::builder(manager)
        .max_size(4)
        .runtime(deadpool::Runtime::Tokio1)
        .build()
        .expect("build pool")
}

async fn create_account(conn: &mut DbConnection, prefix: &str) -> Account {
    let id = Uuid::new_v4();
    let tag = id.simple().to_string();
    let now = Utc::now();
    let row = NewAccount {
        id,
        email: format!("{}-{}@example.com", prefix, tag),
        username: format!("{}_{}", prefix, &tag[..12]),
        display_name: None,
        role: "user".to_string(),
        profile_visibility: Visibility::Public.as_str().to_string(),
        is_active: true,
        created_at: now,
        updated_at: now,
    };
    diesel::insert_into(accounts::table)
        .values(&row)
        .get_result::<Account>(conn)
        .await
        .expect("insert account")
}

async fn create_post(conn: &mut DbConnection, author: &Account) -> Post {
    let now = Utc::now();
    let row = NewPost {
        id: Uuid::new_v4(),
        author_id: author.id,
        content: "hello".to_string(),
        image_url: None,
        category: "general".to_string(),
        is_active: true,
        like_count: 0,
        comment_count: 0,
        created_at: now,
        updated_at: now,
    };
    diesel::insert_into(posts::table)
        .values(&row)
        .get_result::<Post>(conn)
        .await
        .expect("insert post")
}

async fn reload_post(conn: &mut DbConnection, id: Uuid) -> Post {
    posts::table
        .find(id)
        .first::<Post>(conn)
        .await
        .expect("reload post")
}

#[tokio::test]
async fn like_toggle_round_trips_counter() {
    let Some(url) = database_url() else { return };
    run_migrations(&url);
    let pool = test_pool(&url).await;
    let mut conn = pool.get().await.expect("get connection");
    let metrics = Metrics::new().expect("metrics");

    let author = create_account(&mut conn, "author").await;
    let viewer = create_account(&mut conn, "viewer").await;
    let post = create_post(&mut conn, &author).await;

    let first = counters::toggle_like(&mut conn, &metrics, viewer.id, &post)
        .await
        .expect("first toggle");
    assert!(first.liked);
    assert_eq!(first.like_count, 1);

    let second = counters::toggle_like(&mut conn, &metrics, viewer.id, &post)
        .await
        .expect("second toggle");
    assert!(!second.liked);
    assert_eq!(second.like_count, 0);

    assert_eq!(reload_post(&mut conn, post.id).await.like_count, 0);
}

#[tokio::test]
async fn duplicate_follow_conflicts_and_unfollow_is_idempotent() {
    let Some(url) = database_url() else { return };
    run_migrations(&url);
    let pool = test_pool(&url).await;
    let mut conn = pool.get().await.expect("get connection");
    let metrics = Metrics::new().expect("metrics");

    let a = create_account(&mut conn, "follower").await;
    let b = create_account(&mut conn, "followed").await;

    ledger::follow(&mut conn, &metrics, a.id, b.id)
        .await
        .expect("first follow");
    assert!(ledger::is_following(&mut conn, a.id, b.id).await.unwrap());

    let err = ledger::follow(&mut conn, &metrics, a.id, b.id)
        .await
        .expect_err("duplicate follow");
    assert!(matches!(err, ApiError::Conflict(_)));

    ledger::unfollow(&mut conn, a.id, b.id).await.expect("unfollow");
    ledger::unfollow(&mut conn, a.id, b.id)
        .await
        .expect("double unfollow");
    assert!(!ledger::is_following(&mut conn, a.id, b.id).await.unwrap());
}

#[tokio::test]
async fn comment_round_trip_restores_counter_and_keeps_notification() {
    let Some(url) = database_url() else { return };
    run_migrations(&url);
    let pool = test_pool(&url).await;
    let mut conn = pool.get().await.expect("get connection");
    let metrics = Metrics::new().expect("metrics");

    let author = create_account(&mut conn, "author").await;
    let commenter = create_account(&mut conn, "commenter").await;
    let post = create_post(&mut conn, &author).await;

    let comment = counters::add_comment(&mut conn, &metrics, commenter.id, &post, "nice post")
        .await
        .expect("add comment");
    assert_eq!(reload_post(&mut conn, post.id).await.comment_count, 1);

    let emitted: i64 = notifications::table
        .filter(notifications::recipient_id.eq(author.id))
        .filter(notifications::kind.eq("comment"))
        .count()
        .get_result(&mut conn)
        .await
        .unwrap();
    assert_eq!(emitted, 1);

    counters::delete_comment(&mut conn, &comment)
        .await
        .expect("delete comment");
    assert_eq!(reload_post(&mut conn, post.id).await.comment_count, 0);

    // The notification outlives the comment; only its reference clears.
    let (comment_ref, post_ref) = notifications::table
        .filter(notifications::recipient_id.eq(author.id))
        .filter(notifications::kind.eq("comment"))
        .select((notifications::comment_id, notifications::post_id))
        .first::<(Option<Uuid>, Option<Uuid>)>(&mut conn)
        .await
        .expect("notification row");
    assert_eq!(comment_ref, None);
    assert_eq!(post_ref, Some(post.id));
}

#[tokio::test]
async fn deleting_a_post_keeps_its_notifications() {
    let Some(url) = database_url() else { return };
    run_migrations(&url);
    let pool = test_pool(&url).await;
    let mut conn = pool.get().await.expect("get connection");
    let metrics = Metrics::new().expect("metrics");

    let author = create_account(&mut conn, "author").await;
    let viewer = create_account(&mut conn, "viewer").await;
    let post = create_post(&mut conn, &author).await;

    counters::toggle_like(&mut conn, &metrics, viewer.id, &post)
        .await
        .expect("like");

    diesel::delete(posts::table.find(post.id))
        .execute(&mut conn)
        .await
        .expect("delete post");

    let post_ref = notifications::table
        .filter(notifications::recipient_id.eq(author.id))
        .filter(notifications::kind.eq("like"))
        .select(notifications::post_id)
        .first::<Option<Uuid>>(&mut conn)
        .await
        .expect("notification row");
    assert_eq!(post_ref, None);
}
