// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::account::AccountSummary;
use crate::schema::posts;

pub const MAX_POST_CONTENT_CHARS: usize = 280;

pub const POST_CATEGORIES: [&str; 3] = ["general", "announcement", "question"];

/// Model for a post row
#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = posts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    pub content: String,
    pub image_url: Option<String>,
    pub category: String,
    pub is_active: bool,
    pub like_count: i32,
    pub comment_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// DTO for creating a new post
#[derive(Debug, Insertable)]
#[diesel(table_name = posts)]
pub struct NewPost {
    pub id: Uuid,
    pub author_id: Uuid,
    pub content: String,
    pub image_url: Option<String>,
    pub category: String,
    pub is_active: bool,
    pub like_count: i32,
    pub comment_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Changeset for post edits
#[derive(Debug, Default, AsChangeset)]
#[diesel(table_name = posts)]
pub struct PostChanges {
    pub content: Option<String>,
    pub image_url: Option<Option<String>>,
    pub category: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Post with its author and the viewer's like state attached, as returned
/// by the listing and detail endpoints.
#[derive(Debug, Serialize)]
pub struct PostView {
    #[serde(flatten)]
    pub post: Post,
    pub author: AccountSummary,
    pub is_liked: bool,
}

/// Query parameters for the post listing endpoint
#[derive(Debug, Deserialize)]
pub struct PostsQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    /// When true, restrict the listing to authors the viewer follows.
    pub feed: Option<bool>,
    pub author_id: Option<Uuid>,
}

/// Validate post content length; shared by create and edit.
pub fn validate_post_content(content: &str) -> Result<(), String> {
    let len = content.chars().count();
    if len == 0 {
        return Err("Content must not be empty".to_string());
    }
    if len > MAX_POST_CONTENT_CHARS {
        return Err(format!(
            "Content must be {} characters or less",
            MAX_POST_CONTENT_CHARS
        ));
    }
    Ok(())
}

/// Validate a post category value.
pub fn validate_category(category: &str) -> Result<(), String> {
    if POST_CATEGORIES.contains(&category) {
        Ok(())
    } else {
        Err(format!("Unknown category: {}", category))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_length_bounds() {
        assert!(validate_post_content("hello").is_ok());
        assert!(validate_post_content("").is_err());
        assert!(validate_post_content(&"x".repeat(MAX_POST_CONTENT_CHARS)).is_ok());
        assert!(validate_post_content(&"x".repeat(MAX_POST_CONTENT_CHARS + 1)).is_err());
    }

    #[test]
    fn category_values() {
        assert!(validate_category("general").is_ok());
        assert!(validate_category("announcement").is_ok());
        assert!(validate_category("question").is_ok());
        assert!(validate_category("memes").is_err());
    }
}
