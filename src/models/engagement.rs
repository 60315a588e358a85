// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::account::AccountSummary;
use crate::schema::{comments, likes};

pub const MAX_COMMENT_CONTENT_CHARS: usize = 1000;

/// Model for a like row
#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = likes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Like {
    pub id: Uuid,
    pub post_id: Uuid,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// DTO for creating a new like
#[derive(Debug, Insertable)]
#[diesel(table_name = likes)]
pub struct NewLike {
    pub id: Uuid,
    pub post_id: Uuid,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Model for a comment row
#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = comments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Comment {
    pub id: Uuid,
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// DTO for creating a new comment
#[derive(Debug, Insertable)]
#[diesel(table_name = comments)]
pub struct NewComment {
    pub id: Uuid,
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Comment with its author attached
#[derive(Debug, Serialize)]
pub struct CommentView {
    #[serde(flatten)]
    pub comment: Comment,
    pub author: AccountSummary,
}

/// Query parameters for comment listings
#[derive(Debug, Deserialize)]
pub struct CommentsQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Validate comment content length; shared by create and edit.
pub fn validate_comment_content(content: &str) -> Result<(), String> {
    let len = content.chars().count();
    if len == 0 {
        return Err("Comment must not be empty".to_string());
    }
    if len > MAX_COMMENT_CONTENT_CHARS {
        return Err(format!(
            "Comment must be {} characters or less",
            MAX_COMMENT_CONTENT_CHARS
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comment_length_bounds() {
        assert!(validate_comment_content("nice").is_ok());
        assert!(validate_comment_content("").is_err());
        assert!(validate_comment_content(&"y".repeat(MAX_COMMENT_CONTENT_CHARS)).is_ok());
        assert!(validate_comment_content(&"y".repeat(MAX_COMMENT_CONTENT_CHARS + 1)).is_err());
    }
}
