// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

// Import diesel table macros
use diesel::{allow_tables_to_appear_in_same_query, joinable, table};

// Define accounts table
table! {
    accounts (id) {
        id -> Uuid,
        email -> Varchar,
        username -> Varchar,
        display_name -> Nullable<Varchar>,
        bio -> Nullable<Text>,
        avatar_url -> Nullable<Varchar>,
        website -> Nullable<Varchar>,
        location -> Nullable<Varchar>,
        role -> Varchar,
        profile_visibility -> Varchar,
        is_active -> Bool,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

// Define posts table with denormalized engagement counters
table! {
    posts (id) {
        id -> Uuid,
        author_id -> Uuid,
        content -> Text,
        image_url -> Nullable<Varchar>,
        category -> Varchar,
        is_active -> Bool,
        like_count -> Integer,
        comment_count -> Integer,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

// Define follows table (directed edges, unique per ordered pair)
table! {
    follows (id) {
        id -> Uuid,
        follower_id -> Uuid,
        following_id -> Uuid,
        created_at -> Timestamptz,
    }
}

// Define likes table (unique per (post, user) pair)
table! {
    likes (id) {
        id -> Uuid,
        post_id -> Uuid,
        user_id -> Uuid,
        created_at -> Timestamptz,
    }
}

// Define comments table
table! {
    comments (id) {
        id -> Uuid,
        post_id -> Uuid,
        author_id -> Uuid,
        content -> Text,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

// Define notifications table
table! {
    notifications (id) {
        id -> Uuid,
        recipient_id -> Uuid,
        kind -> Varchar,
        actor_id -> Uuid,
        post_id -> Nullable<Uuid>,
        comment_id -> Nullable<Uuid>,
        is_read -> Bool,
        created_at -> Timestamptz,
    }
}

joinable!(posts -> accounts (author_id));
joinable!(comments -> posts (post_id));
joinable!(comments -> accounts (author_id));
joinable!(likes -> posts (post_id));

// follows and notifications reference accounts twice, so joins against
// accounts use explicit ON clauses at the query sites.

allow_tables_to_appear_in_same_query!(
    accounts,
    posts,
    follows,
    likes,
    comments,
    notifications,
);
